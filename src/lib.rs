//! Rastermark is an image-composition and text-overlay engine.
//!
//! It loads raster images from local or cached-remote sources, creates blank
//! canvases, composites canvases into each other under configurable scaling
//! strategies, alpha-blends overlays, and draws font-rendered text,
//! including an outline effect the underlying rasterizer does not support
//! natively.
//!
//! # Pipeline overview
//!
//! 1. **Acquire**: [`CacheLoader`] resolves a source path (TTL-bounded local
//!    cache for remote content); [`Canvas::from_path`] sniffs the format and
//!    decodes, or [`Canvas::blank`] allocates.
//! 2. **Composite**: [`merge`] resamples one canvas into another per
//!    [`MergeStrategy`]; [`merge_alpha`] blends at a uniform opacity.
//! 3. **Overlay**: [`TextRenderer`] draws baseline-positioned text;
//!    [`BorderDecorator`] wraps it with an eight-pass outline.
//! 4. **Deliver**: [`Canvas::render`] encodes PNG bytes
//!    (serve with [`PNG_CONTENT_TYPE`]).
//!
//! Everything is synchronous and single-threaded; canvases own their pixel
//! buffers exclusively and compositing copies, never aliases. Pixel work is
//! delegated to a [`GraphicsBackend`], with a software implementation in
//! [`backend::cpu`].
#![forbid(unsafe_code)]

pub mod backend;
pub mod cache;
pub mod canvas;
pub mod color;
pub mod composite;
pub mod error;
pub mod text;

pub use backend::{BackendKind, GraphicsBackend, ImageMime, create_backend};
pub use cache::{CACHE_TTL, COPY_CHUNK_SIZE, CacheLoader};
pub use canvas::{Canvas, PNG_CONTENT_TYPE};
pub use color::{ALPHA_MAX, CHANNEL_MAX, Color};
pub use composite::{MergeStrategy, merge, merge_alpha, merge_percent, target_dimensions};
pub use error::{RastermarkError, RastermarkResult};
pub use text::border::{BORDER_OFFSETS, BorderDecorator};
pub use text::{DEFAULT_TEXT_SIZE, Text, TextRenderer};
