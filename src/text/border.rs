use std::path::Path;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::error::{RastermarkError, RastermarkResult};
use crate::text::{TEXT_OPS, Text};

/// The eight unit offsets around the baseline position, in the fixed order
/// the stroke passes are drawn.
pub const BORDER_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Wraps a text component with a colored outline.
///
/// The rasterizer has no native outline support, so the glyph string is
/// redrawn once per entry of [`BORDER_OFFSETS`] in the border color before
/// the wrapped component draws the fill on top. The stroke passes force the
/// border color fully opaque: overlapping semi-transparent overdraws would
/// double-blend where adjacent passes meet.
pub struct BorderDecorator {
    inner: Box<dyn Text>,
    border_color: Option<Color>,
}

impl BorderDecorator {
    pub fn new(inner: Box<dyn Text>) -> Self {
        Self {
            inner,
            border_color: None,
        }
    }

    pub fn set_border_color(&mut self, color: Color) {
        self.border_color = Some(color);
    }

    pub fn border_color(&self) -> Option<Color> {
        self.border_color
    }

    /// Draw only the outline passes. The wrapped component's color is
    /// swapped to the opaque border color for the duration and restored
    /// afterwards, also when a pass fails.
    pub fn insert_text_border(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
    ) -> RastermarkResult<&mut Self> {
        let Some(border_color) = self.border_color else {
            return Err(RastermarkError::invalid_state(
                "attempt to render text border without setting a color",
            ));
        };

        // stroke copy at forced alpha 0; the stored border color keeps the
        // caller's alpha
        let mut stroke = border_color;
        stroke.set_alpha(0)?;

        let original = self.inner.color();
        self.inner.set_color(stroke);

        let passes = (|| -> RastermarkResult<()> {
            for (dx, dy) in BORDER_OFFSETS {
                self.inner.insert_text(x + dx, y + dy, text)?;
            }
            Ok(())
        })();

        match original {
            Some(color) => self.inner.set_color(color),
            None => self.inner.clear_color(),
        }

        passes?;
        Ok(self)
    }
}

impl Text for BorderDecorator {
    fn set_canvas(&mut self, canvas: Canvas) {
        self.inner.set_canvas(canvas);
    }

    fn canvas(&self) -> Option<&Canvas> {
        self.inner.canvas()
    }

    fn take_canvas(&mut self) -> Option<Canvas> {
        self.inner.take_canvas()
    }

    fn set_color(&mut self, color: Color) {
        self.inner.set_color(color);
    }

    fn clear_color(&mut self) {
        self.inner.clear_color();
    }

    fn color(&self) -> Option<Color> {
        self.inner.color()
    }

    fn set_font(&mut self, path: &Path) -> RastermarkResult<()> {
        self.inner.set_font(path)
    }

    fn font(&self) -> Option<&Path> {
        self.inner.font()
    }

    fn set_size(&mut self, size: f32) {
        self.inner.set_size(size);
    }

    fn size(&self) -> f32 {
        self.inner.size()
    }

    /// Outline passes first, then the fill pass in the original text color.
    fn insert_text(&mut self, x: i32, y: i32, text: &str) -> RastermarkResult<()> {
        self.insert_text_border(x, y, text)?;
        self.inner.insert_text(x, y, text)
    }

    fn supports(&self, operation: &str) -> bool {
        matches!(
            operation,
            "set_border_color" | "border_color" | "insert_text_border"
        ) || TEXT_OPS.contains(&operation)
            || self.inner.supports(operation)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct DrawCall {
        x: i32,
        y: i32,
        text: String,
        color: Option<Color>,
    }

    /// Test double recording every draw with the color active at call time.
    #[derive(Default)]
    struct RecordingText {
        color: Option<Color>,
        calls: Rc<RefCell<Vec<DrawCall>>>,
        fail_on_call: Option<usize>,
    }

    impl RecordingText {
        fn new() -> (Self, Rc<RefCell<Vec<DrawCall>>>) {
            let recorder = Self::default();
            let calls = Rc::clone(&recorder.calls);
            (recorder, calls)
        }
    }

    impl Text for RecordingText {
        fn set_canvas(&mut self, _canvas: Canvas) {}

        fn canvas(&self) -> Option<&Canvas> {
            None
        }

        fn take_canvas(&mut self) -> Option<Canvas> {
            None
        }

        fn set_color(&mut self, color: Color) {
            self.color = Some(color);
        }

        fn clear_color(&mut self) {
            self.color = None;
        }

        fn color(&self) -> Option<Color> {
            self.color
        }

        fn set_font(&mut self, _path: &Path) -> RastermarkResult<()> {
            Ok(())
        }

        fn font(&self) -> Option<&Path> {
            None
        }

        fn set_size(&mut self, _size: f32) {}

        fn size(&self) -> f32 {
            crate::text::DEFAULT_TEXT_SIZE
        }

        fn insert_text(&mut self, x: i32, y: i32, text: &str) -> RastermarkResult<()> {
            if self.color.is_none() {
                return Err(RastermarkError::invalid_state(
                    "attempt to render text without setting a color",
                ));
            }
            let call_index = self.calls.borrow().len();
            if self.fail_on_call == Some(call_index) {
                return Err(RastermarkError::resource("simulated draw failure"));
            }
            self.calls.borrow_mut().push(DrawCall {
                x,
                y,
                text: text.to_string(),
                color: self.color,
            });
            Ok(())
        }

        fn supports(&self, operation: &str) -> bool {
            TEXT_OPS.contains(&operation)
        }
    }

    #[test]
    fn insert_text_without_border_color_fails() {
        let (inner, _calls) = RecordingText::new();
        let mut decorator = BorderDecorator::new(Box::new(inner));
        decorator.set_color(Color::rgb(255, 255, 255).unwrap());

        let err = decorator.insert_text(10, 10, "hi").unwrap_err();
        assert!(
            err.to_string()
                .contains("attempt to render text border without setting a color")
        );
    }

    #[test]
    fn eight_opaque_stroke_passes_then_one_fill_pass() {
        let (inner, calls) = RecordingText::new();
        let mut decorator = BorderDecorator::new(Box::new(inner));

        let text_color = Color::new(10, 20, 30, 40).unwrap();
        let border_color = Color::new(200, 210, 220, 51).unwrap();
        decorator.set_color(text_color);
        decorator.set_border_color(border_color);

        decorator.insert_text(100, 50, "ok").unwrap();

        let calls = calls.borrow();
        assert_eq!(calls.len(), 9);

        let opaque_border = Color::new(200, 210, 220, 0).unwrap();
        for (call, (dx, dy)) in calls.iter().zip(BORDER_OFFSETS) {
            assert_eq!((call.x, call.y), (100 + dx, 50 + dy));
            assert_eq!(call.color, Some(opaque_border));
            assert_eq!(call.text, "ok");
        }

        let fill = &calls[8];
        assert_eq!((fill.x, fill.y), (100, 50));
        assert_eq!(fill.color, Some(text_color));

        // the stored border color still carries the caller's alpha
        assert_eq!(decorator.border_color(), Some(border_color));
        assert_eq!(decorator.color(), Some(text_color));
    }

    #[test]
    fn stroke_pass_order_is_fixed() {
        assert_eq!(
            BORDER_OFFSETS,
            [
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, -1),
                (0, 1),
                (1, -1),
                (1, 0),
                (1, 1)
            ]
        );
    }

    #[test]
    fn unset_text_color_surfaces_after_the_border_phase() {
        let (inner, calls) = RecordingText::new();
        let mut decorator = BorderDecorator::new(Box::new(inner));
        decorator.set_border_color(Color::rgb(0, 0, 0).unwrap());

        let err = decorator.insert_text(0, 0, "hi").unwrap_err();
        assert!(
            err.to_string()
                .contains("attempt to render text without setting a color")
        );

        // all eight border passes ran; the fill pass is what failed
        assert_eq!(calls.borrow().len(), 8);
        // the swapped-in stroke color was cleared back out
        assert_eq!(decorator.color(), None);
    }

    #[test]
    fn failed_stroke_pass_still_restores_the_text_color() {
        let (mut inner, calls) = RecordingText::new();
        inner.fail_on_call = Some(2);
        let mut decorator = BorderDecorator::new(Box::new(inner));

        let text_color = Color::rgb(1, 2, 3).unwrap();
        decorator.set_color(text_color);
        decorator.set_border_color(Color::rgb(9, 9, 9).unwrap());

        let err = decorator.insert_text(0, 0, "hi").unwrap_err();
        assert!(err.to_string().contains("simulated draw failure"));
        assert_eq!(calls.borrow().len(), 2);
        assert_eq!(decorator.color(), Some(text_color));
    }

    #[test]
    fn supports_walks_the_wrap_chain() {
        let (inner, _calls) = RecordingText::new();
        let decorator = BorderDecorator::new(Box::new(inner));

        assert!(decorator.supports("set_border_color"));
        assert!(decorator.supports("insert_text_border"));
        assert!(decorator.supports("insert_text"));
        assert!(!decorator.supports("no_such_operation"));

        // stacked decorators keep answering down the chain
        let outer = BorderDecorator::new(Box::new(decorator));
        assert!(outer.supports("set_border_color"));
        assert!(outer.supports("set_font"));
        assert!(!outer.supports("no_such_operation"));
    }
}
