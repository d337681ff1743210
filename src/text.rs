use std::fs;
use std::path::{Path, PathBuf};

use crate::canvas::Canvas;
use crate::color::Color;
use crate::error::{RastermarkError, RastermarkResult};

pub mod border;

/// Default glyph size in points.
pub const DEFAULT_TEXT_SIZE: f32 = 7.0;

/// Operation names every [`Text`] implementation answers for in
/// [`Text::supports`]. Decorators add their own names on top and delegate
/// the rest down the wrap chain.
pub(crate) const TEXT_OPS: &[&str] = &[
    "set_canvas",
    "canvas",
    "take_canvas",
    "set_color",
    "clear_color",
    "color",
    "set_font",
    "font",
    "set_size",
    "size",
    "insert_text",
];

/// Text-overlay component: a renderer or a decorator wrapping one.
///
/// The wrap relationship is ownership: a decorator exclusively owns its
/// inner component and forwards every operation it does not override.
pub trait Text {
    /// Attach the canvas that subsequent text operations draw onto.
    fn set_canvas(&mut self, canvas: Canvas);

    fn canvas(&self) -> Option<&Canvas>;

    /// Detach and return the canvas, typically after drawing is done.
    fn take_canvas(&mut self) -> Option<Canvas>;

    fn set_color(&mut self, color: Color);

    fn clear_color(&mut self);

    fn color(&self) -> Option<Color>;

    /// Set the TrueType font file used for rendering. The path must point at
    /// an existing readable file at set time; it is re-checked on every
    /// draw.
    fn set_font(&mut self, path: &Path) -> RastermarkResult<()>;

    fn font(&self) -> Option<&Path>;

    fn set_size(&mut self, size: f32);

    fn size(&self) -> f32;

    /// Draw `text` with its baseline at (`x`, `y`). Drawing is additive;
    /// each call adds glyphs on top of previous content.
    fn insert_text(&mut self, x: i32, y: i32, text: &str) -> RastermarkResult<()>;

    /// Report whether `operation` is supported by this component or, for
    /// decorators, anywhere further down the wrap chain.
    fn supports(&self, operation: &str) -> bool;
}

/// Renders font strings onto a canvas at a fixed baseline position.
#[derive(Debug)]
pub struct TextRenderer {
    canvas: Option<Canvas>,
    color: Option<Color>,
    font_path: Option<PathBuf>,
    size: f32,
    angle: f32,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self {
            canvas: None,
            color: None,
            font_path: None,
            size: DEFAULT_TEXT_SIZE,
            angle: 0.0,
        }
    }

    pub fn with_canvas(canvas: Canvas) -> Self {
        let mut renderer = Self::new();
        renderer.set_canvas(canvas);
        renderer
    }
}

impl Text for TextRenderer {
    fn set_canvas(&mut self, canvas: Canvas) {
        self.canvas = Some(canvas);
    }

    fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    fn take_canvas(&mut self) -> Option<Canvas> {
        self.canvas.take()
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

    fn set_font(&mut self, path: &Path) -> RastermarkResult<()> {
        if !path.is_file() || fs::File::open(path).is_err() {
            return Err(RastermarkError::invalid_config(format!(
                "unable to load font file at {}",
                path.display()
            )));
        }
        // keep the caller's spelling; later error messages echo it verbatim
        self.font_path = Some(path.to_path_buf());
        Ok(())
    }

    fn font(&self) -> Option<&Path> {
        self.font_path.as_deref()
    }

    fn set_size(&mut self, size: f32) {
        self.size = size;
    }

    fn size(&self) -> f32 {
        self.size
    }

    fn insert_text(&mut self, x: i32, y: i32, text: &str) -> RastermarkResult<()> {
        let canvas_live = self
            .canvas
            .as_ref()
            .is_some_and(|canvas| !canvas.is_released());
        if !canvas_live {
            return Err(RastermarkError::invalid_state(
                "attempt to render text onto invalid image resource",
            ));
        }

        let Some(color) = self.color else {
            return Err(RastermarkError::invalid_state(
                "attempt to render text without setting a color",
            ));
        };

        let Some(font_path) = self.font_path.as_deref() else {
            return Err(RastermarkError::invalid_state(
                "no font file selected for rendering text overlay",
            ));
        };

        // the font file may have vanished since set_font
        let font_bytes = fs::read(font_path).map_err(|_| {
            RastermarkError::resource(format!(
                "failed to read font file '{}'",
                font_path.display()
            ))
        })?;

        let Some(canvas) = self.canvas.as_mut() else {
            return Err(RastermarkError::invalid_state(
                "attempt to render text onto invalid image resource",
            ));
        };
        let backend = canvas.backend();
        let Some(buffer) = canvas.buffer_mut() else {
            return Err(RastermarkError::invalid_state(
                "attempt to render text onto invalid image resource",
            ));
        };

        backend.draw_text(
            buffer,
            &font_bytes,
            self.size,
            self.angle,
            x,
            y,
            color.to_rgba8(),
            text,
        )
    }

    fn supports(&self, operation: &str) -> bool {
        TEXT_OPS.contains(&operation)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::{BackendKind, GraphicsBackend, create_backend};

    fn backend() -> Arc<dyn GraphicsBackend> {
        create_backend(BackendKind::Cpu)
    }

    fn font_file(dir: &tempfile::TempDir) -> PathBuf {
        // set_font only validates existence/readability; parsing happens at
        // draw time
        let path = dir.path().join("font.ttf");
        fs::write(&path, b"pretend font data").unwrap();
        path
    }

    #[test]
    fn defaults() {
        let renderer = TextRenderer::new();
        assert_eq!(renderer.size(), DEFAULT_TEXT_SIZE);
        assert!(renderer.canvas().is_none());
        assert!(renderer.color().is_none());
        assert!(renderer.font().is_none());
    }

    #[test]
    fn set_font_rejects_missing_file() {
        let mut renderer = TextRenderer::new();
        let err = renderer.set_font(Path::new("/no/such/font.ttf")).unwrap_err();
        assert!(err.to_string().contains("unable to load font file at"));
    }

    #[test]
    fn set_font_keeps_the_supplied_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = font_file(&dir);

        let mut renderer = TextRenderer::new();
        renderer.set_font(&path).unwrap();
        assert_eq!(renderer.font(), Some(path.as_path()));
    }

    #[test]
    fn insert_text_requires_canvas_first() {
        let mut renderer = TextRenderer::new();
        let err = renderer.insert_text(0, 0, "hi").unwrap_err();
        assert!(
            err.to_string()
                .contains("attempt to render text onto invalid image resource")
        );
    }

    #[test]
    fn insert_text_rejects_released_canvas() {
        let mut canvas = Canvas::blank(backend(), 4, 4);
        canvas.release();

        let mut renderer = TextRenderer::with_canvas(canvas);
        let err = renderer.insert_text(0, 0, "hi").unwrap_err();
        assert!(
            err.to_string()
                .contains("attempt to render text onto invalid image resource")
        );
    }

    #[test]
    fn insert_text_requires_color_second() {
        let mut renderer = TextRenderer::with_canvas(Canvas::blank(backend(), 4, 4));
        let err = renderer.insert_text(0, 0, "hi").unwrap_err();
        assert!(
            err.to_string()
                .contains("attempt to render text without setting a color")
        );
    }

    #[test]
    fn insert_text_requires_font_third() {
        let mut renderer = TextRenderer::with_canvas(Canvas::blank(backend(), 4, 4));
        renderer.set_color(Color::rgb(255, 255, 255).unwrap());

        let err = renderer.insert_text(0, 0, "hi").unwrap_err();
        assert!(
            err.to_string()
                .contains("no font file selected for rendering text overlay")
        );
    }

    #[test]
    fn insert_text_rechecks_font_file_at_call_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = font_file(&dir);

        let mut renderer = TextRenderer::with_canvas(Canvas::blank(backend(), 4, 4));
        renderer.set_color(Color::rgb(255, 255, 255).unwrap());
        renderer.set_font(&path).unwrap();

        fs::remove_file(renderer.font().unwrap()).unwrap();

        let err = renderer.insert_text(0, 0, "hi").unwrap_err();
        assert!(err.to_string().contains("failed to read font file '"));
    }

    #[test]
    fn insert_text_surfaces_backend_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = font_file(&dir);

        let mut renderer = TextRenderer::with_canvas(Canvas::blank(backend(), 4, 4));
        renderer.set_color(Color::rgb(255, 255, 255).unwrap());
        renderer.set_font(&path).unwrap();

        // readable but not a TrueType font
        let err = renderer.insert_text(0, 0, "hi").unwrap_err();
        assert!(err.to_string().contains("failed to parse font data"));
    }

    #[test]
    fn take_canvas_detaches() {
        let mut renderer = TextRenderer::with_canvas(Canvas::blank(backend(), 4, 4));
        assert!(renderer.take_canvas().is_some());
        assert!(renderer.canvas().is_none());
        assert!(renderer.take_canvas().is_none());
    }

    #[test]
    fn supports_answers_for_the_fixed_method_set() {
        let renderer = TextRenderer::new();
        assert!(renderer.supports("insert_text"));
        assert!(renderer.supports("set_font"));
        assert!(!renderer.supports("set_border_color"));
        assert!(!renderer.supports("no_such_operation"));
    }
}
