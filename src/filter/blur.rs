use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::{RenderMode, required_int};
use crate::canvas::Canvas;
use crate::error::FilterError;
use crate::field::{FieldSet, FieldType};
use crate::geometry::PixelRect;

pub(super) fn apply(
    canvas: &mut Canvas,
    fields: &FieldSet,
    _apply_rect: PixelRect,
    mode: RenderMode,
) -> Result<(), FilterError> {
    let radius = required_int(fields, FieldType::BlurRadius)?;
    if radius <= 0 {
        return Ok(());
    }
    // Only what is visible through the clip gets recomputed.
    let area = canvas.clip_bounds();
    if area.is_empty() {
        return Ok(());
    }
    let region = canvas.copy_region(area);
    let quality = fields.float(FieldType::PreviewQuality).unwrap_or(1.0).clamp(0.1, 1.0);
    let blurred = if mode == RenderMode::Edit && quality < 1.0 {
        preview_blur(&region, radius as f32, quality)
    } else {
        imageops::blur(&region, radius as f32)
    };
    canvas.draw_image(&blurred, area.x, area.y);
    Ok(())
}

/// Blur a downscaled copy and stretch it back; cheaper while the user is editing.
fn preview_blur(region: &RgbaImage, sigma: f32, quality: f32) -> RgbaImage {
    let (width, height) = region.dimensions();
    let small_width = ((width as f32 * quality).round() as u32).max(1);
    let small_height = ((height as f32 * quality).round() as u32).max(1);
    let small = imageops::resize(region, small_width, small_height, FilterType::Triangle);
    let blurred = imageops::blur(&small, (sigma * quality).max(0.5));
    imageops::resize(&blurred, width, height, FilterType::Triangle)
}
