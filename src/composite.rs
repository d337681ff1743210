use crate::canvas::Canvas;
use crate::color::validate_alpha;
use crate::error::{RastermarkError, RastermarkResult};

/// How a source canvas is scaled when merged into a destination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MergeStrategy {
    /// Draw the source at its native size.
    #[default]
    SourceSize,
    /// Stretch the source to fill the destination.
    DestinationSize,
    /// Fill the destination but never upscale beyond the source's native
    /// size (component-wise).
    DestinationSizeNoUpscale,
}

/// Resolve the resample target dimensions for a merge.
pub fn target_dimensions(
    strategy: MergeStrategy,
    dst: (u32, u32),
    src: (u32, u32),
) -> (u32, u32) {
    match strategy {
        MergeStrategy::SourceSize => src,
        MergeStrategy::DestinationSize => dst,
        MergeStrategy::DestinationSizeNoUpscale => (dst.0.min(src.0), dst.1.min(src.1)),
    }
}

/// Resample-copy `src`'s full extent into `dst` at (`dst_x`, `dst_y`),
/// scaled per `strategy`. Cannot fail once both canvases hold live buffers;
/// out-of-bounds regions are clipped by the backend.
pub fn merge(
    dst: &mut Canvas,
    src: &Canvas,
    dst_x: i64,
    dst_y: i64,
    strategy: MergeStrategy,
) -> RastermarkResult<()> {
    let Some(src_buf) = src.buffer_ref() else {
        return Err(merge_state_error());
    };
    if dst.buffer_ref().is_none() {
        return Err(merge_state_error());
    }

    let (target_w, target_h) = target_dimensions(
        strategy,
        (dst.width(), dst.height()),
        (src.width(), src.height()),
    );

    let backend = dst.backend();
    let Some(dst_buf) = dst.buffer_mut() else {
        return Err(merge_state_error());
    };
    backend.copy_resampled(dst_buf, src_buf, dst_x, dst_y, target_w, target_h);
    Ok(())
}

/// Blend `src` into `dst` at native size and a uniform opacity derived from
/// `alpha` (0 opaque ..= 127 transparent).
pub fn merge_alpha(
    dst: &mut Canvas,
    src: &Canvas,
    dst_x: i64,
    dst_y: i64,
    alpha: i32,
) -> RastermarkResult<()> {
    let alpha = validate_alpha(alpha)?;

    let Some(src_buf) = src.buffer_ref() else {
        return Err(merge_state_error());
    };
    if dst.buffer_ref().is_none() {
        return Err(merge_state_error());
    }

    let percent = merge_percent(alpha);
    let backend = dst.backend();
    let Some(dst_buf) = dst.buffer_mut() else {
        return Err(merge_state_error());
    };
    backend.copy_merge(dst_buf, src_buf, dst_x, dst_y, percent);
    Ok(())
}

/// Convert a 0..=127 alpha (0 opaque) to a backend merge percent in 1..=100.
///
/// The relationship is inverted: opaque alpha maps to a high percent. The
/// floor of 1 keeps a trace of the source visible even at full
/// transparency.
pub fn merge_percent(alpha: u8) -> u8 {
    let scaled = (f64::from(alpha) / 127.0 * 100.0).round() as i32;
    (100 - scaled).clamp(1, 100) as u8
}

fn merge_state_error() -> RastermarkError {
    RastermarkError::invalid_state("attempt to merge image data using an invalid image resource")
}
