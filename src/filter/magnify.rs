use image::RgbaImage;

use super::{RenderMode, required_int};
use crate::canvas::Canvas;
use crate::error::FilterError;
use crate::field::{FieldSet, FieldType};
use crate::geometry::PixelRect;

/// Stretch the centre `1 / factor` of the apply rect over all of it, nearest neighbour.
pub(super) fn apply(
    canvas: &mut Canvas,
    fields: &FieldSet,
    apply_rect: PixelRect,
    _mode: RenderMode,
) -> Result<(), FilterError> {
    let factor = required_int(fields, FieldType::MagnificationFactor)?.max(1);
    let width = apply_rect.width;
    let height = apply_rect.height;

    let source_width = (width / factor).max(1);
    let source_height = (height / factor).max(1);
    let source_rect = PixelRect::new(
        apply_rect.x + width / 2 - source_width / 2,
        apply_rect.y + height / 2 - source_height / 2,
        source_width,
        source_height,
    );
    let source = canvas.copy_region(source_rect);
    let (sw, sh) = source.dimensions();
    if sw == 0 || sh == 0 {
        return Err(FilterError::Buffer { width: sw, height: sh });
    }

    let output = RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        let sx = (x as u64 * sw as u64 / width as u64) as u32;
        let sy = (y as u64 * sh as u64 / height as u64) as u32;
        *source.get_pixel(sx.min(sw - 1), sy.min(sh - 1))
    });
    canvas.draw_image(&output, apply_rect.x, apply_rect.y);
    Ok(())
}
