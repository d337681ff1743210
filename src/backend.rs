use std::sync::Arc;

use image::{ImageFormat, RgbaImage};

use crate::error::RastermarkResult;

pub mod cpu;

/// Mime type of a decoded or allocated canvas. Only the three formats the
/// engine decodes are representable; everything else is reported through
/// [`crate::RastermarkError::UnsupportedFormat`] at sniff time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ImageMime {
    Gif,
    Jpeg,
    Png,
}

impl ImageMime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gif => "image/gif",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub(crate) fn format(self) -> ImageFormat {
        match self {
            Self::Gif => ImageFormat::Gif,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

impl std::fmt::Display for ImageMime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header-signature classification of a raw byte stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Sniffed {
    /// One of the three decodable formats.
    Supported(ImageMime),
    /// Recognized signature the engine does not decode; carries the detected
    /// mime type for error reporting.
    Unsupported(&'static str),
}

/// Classify image bytes by file header, never by extension. Returns `None`
/// for empty or unrecognizable payloads.
pub(crate) fn sniff_bytes(bytes: &[u8]) -> Option<Sniffed> {
    let format = image::guess_format(bytes).ok()?;
    Some(match format {
        ImageFormat::Gif => Sniffed::Supported(ImageMime::Gif),
        ImageFormat::Jpeg => Sniffed::Supported(ImageMime::Jpeg),
        ImageFormat::Png => Sniffed::Supported(ImageMime::Png),
        other => Sniffed::Unsupported(other.to_mime_type()),
    })
}

/// Pixel-level capability surface the engine is built against.
///
/// Canvas and compositing code never touch pixels directly; they hold an
/// `Arc<dyn GraphicsBackend>` and call through this trait. `copy_resampled`
/// and `copy_merge` cannot fail once the caller's preconditions hold, so
/// they return nothing; out-of-bounds regions are clipped.
pub trait GraphicsBackend: Send + Sync {
    /// Decode pre-sniffed image bytes into a straight-alpha RGBA8 buffer.
    fn decode(&self, bytes: &[u8], format: ImageFormat) -> RastermarkResult<RgbaImage>;

    /// Allocate a true-color buffer, opaque black like GD's
    /// `imagecreatetruecolor`.
    fn create(&self, width: u32, height: u32) -> RgbaImage;

    /// Resample `src`'s full extent to `dst_w` x `dst_h` and alpha-blend it
    /// into `dst` at (`dst_x`, `dst_y`).
    fn copy_resampled(
        &self,
        dst: &mut RgbaImage,
        src: &RgbaImage,
        dst_x: i64,
        dst_y: i64,
        dst_w: u32,
        dst_h: u32,
    );

    /// Blend `src` into `dst` at native size and uniform opacity
    /// `percent` (1..=100). Below 100 only RGB channels are mixed and `dst`
    /// alpha is kept; at 100 the copy includes the alpha channel, like GD's
    /// `imagecopymerge`.
    fn copy_merge(&self, dst: &mut RgbaImage, src: &RgbaImage, dst_x: i64, dst_y: i64, percent: u8);

    /// Draw `text` with its baseline at (`x`, `y`) using the TrueType font in
    /// `font_bytes`. `angle_deg` is part of the interface for parity with the
    /// rasterizer contract; only 0.0 is exercised by this engine.
    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &self,
        dst: &mut RgbaImage,
        font_bytes: &[u8],
        size_pt: f32,
        angle_deg: f32,
        x: i32,
        y: i32,
        rgba: [u8; 4],
        text: &str,
    ) -> RastermarkResult<()>;

    /// Encode a buffer as PNG at maximum compression with adaptive
    /// filtering.
    fn encode_png(&self, src: &RgbaImage) -> RastermarkResult<Vec<u8>>;
}

#[derive(Clone, Copy, Debug, Default)]
pub enum BackendKind {
    #[default]
    Cpu,
}

pub fn create_backend(kind: BackendKind) -> Arc<dyn GraphicsBackend> {
    match kind {
        BackendKind::Cpu => Arc::new(cpu::CpuBackend::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_recognizes_supported_signatures() {
        assert_eq!(
            sniff_bytes(b"GIF89a\x01\x00\x01\x00"),
            Some(Sniffed::Supported(ImageMime::Gif))
        );
        assert_eq!(
            sniff_bytes(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]),
            Some(Sniffed::Supported(ImageMime::Png))
        );
        assert_eq!(
            sniff_bytes(&[0xff, 0xd8, 0xff, 0xe0]),
            Some(Sniffed::Supported(ImageMime::Jpeg))
        );
    }

    #[test]
    fn sniff_names_unsupported_mime() {
        // little-endian TIFF magic
        assert_eq!(
            sniff_bytes(b"II*\x00rest"),
            Some(Sniffed::Unsupported("image/tiff"))
        );
        assert_eq!(
            sniff_bytes(b"BMxxxxxx"),
            Some(Sniffed::Unsupported("image/bmp"))
        );
    }

    #[test]
    fn sniff_rejects_empty_and_garbage() {
        assert_eq!(sniff_bytes(b""), None);
        assert_eq!(sniff_bytes(b"not an image at all"), None);
    }

    #[test]
    fn mime_strings_are_canonical() {
        assert_eq!(ImageMime::Gif.as_str(), "image/gif");
        assert_eq!(ImageMime::Jpeg.as_str(), "image/jpeg");
        assert_eq!(ImageMime::Png.to_string(), "image/png");
    }
}
