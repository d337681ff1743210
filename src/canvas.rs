use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;

use crate::backend::{GraphicsBackend, ImageMime, Sniffed, sniff_bytes};
use crate::cache::CacheLoader;
use crate::composite::{self, MergeStrategy};
use crate::error::{RastermarkError, RastermarkResult};

/// Content type to send when a rendered canvas is delivered over HTTP.
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// An in-memory pixel buffer plus metadata, the unit of drawing and
/// compositing.
///
/// A canvas owns its buffer exclusively; compositing copies pixel data
/// between buffers and never aliases another canvas. After [`release`]
/// every pixel operation fails with an invalid-state error and the canvas
/// cannot be revived.
///
/// [`release`]: Canvas::release
pub struct Canvas {
    backend: Arc<dyn GraphicsBackend>,
    buffer: Option<RgbaImage>,
    width: u32,
    height: u32,
    mimetype: ImageMime,
    modified: u64,
    source_path: Option<PathBuf>,
    cache_path: Option<PathBuf>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mimetype", &self.mimetype)
            .field("modified", &self.modified)
            .field("released", &self.buffer.is_none())
            .field("source_path", &self.source_path)
            .field("cache_path", &self.cache_path)
            .finish()
    }
}

impl Canvas {
    /// Decode a canvas from a local or cached-remote image file.
    ///
    /// With a cache directory, the source is first resolved through a
    /// [`CacheLoader`] with the default freshness window. The format is
    /// classified by file header; GIF, JPEG and PNG are decodable.
    pub fn from_path(
        backend: Arc<dyn GraphicsBackend>,
        path: &Path,
        cache_dir: Option<&Path>,
    ) -> RastermarkResult<Self> {
        match cache_dir {
            Some(dir) => Self::from_path_cached(backend, path, &CacheLoader::new(dir)?),
            None => Self::read_image(backend, path, path.to_path_buf(), None),
        }
    }

    /// [`from_path`] with a caller-configured loader.
    ///
    /// [`from_path`]: Canvas::from_path
    pub fn from_path_cached(
        backend: Arc<dyn GraphicsBackend>,
        path: &Path,
        loader: &CacheLoader,
    ) -> RastermarkResult<Self> {
        let cache_path = loader.cache_path(path)?;
        let effective = loader.resolve(path)?;
        Self::read_image(backend, path, effective, Some(cache_path))
    }

    /// Allocate a blank true-color canvas. Reports as `image/png`, modified
    /// now.
    pub fn blank(backend: Arc<dyn GraphicsBackend>, width: u32, height: u32) -> Self {
        let buffer = backend.create(width, height);
        Self {
            backend,
            buffer: Some(buffer),
            width,
            height,
            mimetype: ImageMime::Png,
            modified: epoch_secs(SystemTime::now()),
            source_path: None,
            cache_path: None,
        }
    }

    #[tracing::instrument(skip(backend), fields(path = %source.display()))]
    fn read_image(
        backend: Arc<dyn GraphicsBackend>,
        source: &Path,
        effective: PathBuf,
        cache_path: Option<PathBuf>,
    ) -> RastermarkResult<Self> {
        let unreadable =
            || RastermarkError::resource(format!("couldn't read image at {}", effective.display()));

        let bytes = fs::read(&effective).map_err(|_| unreadable())?;

        let mime = match sniff_bytes(&bytes) {
            Some(Sniffed::Supported(mime)) => mime,
            Some(Sniffed::Unsupported(detected)) => {
                return Err(RastermarkError::unsupported_format(detected));
            }
            // empty or header-corrupt payload
            None => return Err(unreadable()),
        };

        // format recognition and pixel decoding are independent failure
        // points, surfaced uniformly
        let buffer = backend
            .decode(&bytes, mime.format())
            .map_err(|_| unreadable())?;
        let (width, height) = buffer.dimensions();

        let modified = fs::metadata(&effective)
            .and_then(|m| m.modified())
            .map(epoch_secs)
            .unwrap_or(0);

        tracing::debug!(width, height, mime = %mime, "decoded image");

        Ok(Self {
            backend,
            buffer: Some(buffer),
            width,
            height,
            mimetype: mime,
            modified,
            source_path: Some(source.to_path_buf()),
            cache_path,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mimetype(&self) -> ImageMime {
        self.mimetype
    }

    /// Last-modified time of the source file (or creation time for blank
    /// canvases), in seconds since the epoch.
    pub fn modified(&self) -> u64 {
        self.modified
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// Free the backing buffer. Releasing twice is a no-op; all later pixel
    /// operations fail with an invalid-state error.
    pub fn release(&mut self) {
        self.buffer = None;
    }

    pub fn is_released(&self) -> bool {
        self.buffer.is_none()
    }

    /// Resample-copy `src` into this canvas at (`dst_x`, `dst_y`) under the
    /// given scaling strategy.
    pub fn merge(
        &mut self,
        src: &Canvas,
        dst_x: i64,
        dst_y: i64,
        strategy: MergeStrategy,
    ) -> RastermarkResult<&mut Self> {
        composite::merge(self, src, dst_x, dst_y, strategy)?;
        Ok(self)
    }

    /// Blend `src` into this canvas at native size and the uniform opacity
    /// derived from `alpha` (0 opaque ..= 127 transparent).
    pub fn merge_alpha(
        &mut self,
        src: &Canvas,
        dst_x: i64,
        dst_y: i64,
        alpha: i32,
    ) -> RastermarkResult<&mut Self> {
        composite::merge_alpha(self, src, dst_x, dst_y, alpha)?;
        Ok(self)
    }

    /// Encode the canvas as PNG bytes (maximum compression, all filters).
    /// Serve with [`PNG_CONTENT_TYPE`].
    pub fn render(&self) -> RastermarkResult<Vec<u8>> {
        let Some(buffer) = self.buffer.as_ref() else {
            return Err(RastermarkError::invalid_state(
                "attempt to render invalid resource as image",
            ));
        };
        self.backend.encode_png(buffer)
    }

    pub(crate) fn backend(&self) -> Arc<dyn GraphicsBackend> {
        Arc::clone(&self.backend)
    }

    pub(crate) fn buffer_ref(&self) -> Option<&RgbaImage> {
        self.buffer.as_ref()
    }

    pub(crate) fn buffer_mut(&mut self) -> Option<&mut RgbaImage> {
        self.buffer.as_mut()
    }
}

fn epoch_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
