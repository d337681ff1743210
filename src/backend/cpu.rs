use ab_glyph::{Font, FontRef, ScaleFont, point};
use anyhow::Context;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, ImageFormat, Rgba, RgbaImage};

use crate::backend::GraphicsBackend;
use crate::error::{RastermarkError, RastermarkResult};

/// Software rasterizer: `image`-crate codecs and resampling, `ab_glyph`
/// TrueType rendering.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }
}

impl GraphicsBackend for CpuBackend {
    fn decode(&self, bytes: &[u8], format: ImageFormat) -> RastermarkResult<RgbaImage> {
        let dyn_img = image::load_from_memory_with_format(bytes, format)
            .context("decode image from memory")?;
        Ok(dyn_img.to_rgba8())
    }

    fn create(&self, width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
    }

    fn copy_resampled(
        &self,
        dst: &mut RgbaImage,
        src: &RgbaImage,
        dst_x: i64,
        dst_y: i64,
        dst_w: u32,
        dst_h: u32,
    ) {
        if dst_w == 0 || dst_h == 0 || src.width() == 0 || src.height() == 0 {
            return;
        }

        if (dst_w, dst_h) == src.dimensions() {
            imageops::overlay(dst, src, dst_x, dst_y);
        } else {
            let resized = imageops::resize(src, dst_w, dst_h, FilterType::Triangle);
            imageops::overlay(dst, &resized, dst_x, dst_y);
        }
    }

    fn copy_merge(
        &self,
        dst: &mut RgbaImage,
        src: &RgbaImage,
        dst_x: i64,
        dst_y: i64,
        percent: u8,
    ) {
        let pct = u32::from(percent.min(100));
        if pct == 0 {
            return;
        }

        let (dst_w, dst_h) = dst.dimensions();
        for (sx, sy, s) in src.enumerate_pixels() {
            let dx = dst_x + i64::from(sx);
            let dy = dst_y + i64::from(sy);
            if dx < 0 || dy < 0 || dx >= i64::from(dst_w) || dy >= i64::from(dst_h) {
                continue;
            }

            let d = dst.get_pixel_mut(dx as u32, dy as u32);
            if pct == 100 {
                // GD's imagecopymerge degenerates to a plain copy here,
                // alpha included
                *d = *s;
                continue;
            }
            for c in 0..3 {
                let mixed = (u32::from(s.0[c]) * pct + u32::from(d.0[c]) * (100 - pct)) / 100;
                d.0[c] = mixed as u8;
            }
            // below 100 the destination alpha channel is left alone
        }
    }

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
    ) -> RastermarkResult<()> {
        let font = FontRef::try_from_slice(font_bytes)
            .map_err(|e| RastermarkError::resource(format!("failed to parse font data: {e}")))?;
        let scale = font
            .pt_to_px_scale(size_pt)
            .ok_or_else(|| RastermarkError::resource("font reports invalid unit metrics"))?;
        let scaled = font.as_scaled(scale);

        // Rotated baselines are not exercised by this engine.
        let _ = angle_deg;

        let (dst_w, dst_h) = dst.dimensions();
        let baseline = y as f32;
        let mut cursor = x as f32;
        let mut prev = None;

        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev_id) = prev {
                cursor += scaled.kern(prev_id, id);
            }

            let glyph = id.with_scale_and_position(scale, point(cursor, baseline));
            cursor += scaled.h_advance(id);
            prev = Some(id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue; // whitespace and glyphs without outlines advance only
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + i64::from(gx);
                let py = bounds.min.y as i64 + i64::from(gy);
                if px < 0 || py < 0 || px >= i64::from(dst_w) || py >= i64::from(dst_h) {
                    return;
                }
                let alpha = coverage.clamp(0.0, 1.0) * f32::from(rgba[3]) / 255.0;
                blend_straight(
                    dst.get_pixel_mut(px as u32, py as u32),
                    [rgba[0], rgba[1], rgba[2]],
                    alpha,
                );
            });
        }

        Ok(())
    }

    fn encode_png(&self, src: &RgbaImage) -> RastermarkResult<Vec<u8>> {
        let mut out = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut out, CompressionType::Best, PngFilterType::Adaptive);
        encoder
            .write_image(src.as_raw(), src.width(), src.height(), ExtendedColorType::Rgba8)
            .context("encode png")?;
        Ok(out)
    }
}

/// Source-over blend of a straight-alpha color at fractional `src_a` onto a
/// straight-alpha destination pixel.
fn blend_straight(d: &mut Rgba<u8>, rgb: [u8; 3], src_a: f32) {
    if src_a <= 0.0 {
        return;
    }
    let sa = src_a.min(1.0);
    let da = f32::from(d.0[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *d = Rgba([0, 0, 0, 0]);
        return;
    }

    for c in 0..3 {
        let sc = f32::from(rgb[c]);
        let dc = f32::from(d.0[c]);
        d.0[c] = ((sc * sa + dc * da * (1.0 - sa)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8;
    }
    d.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
