use image::{Rgba, RgbaImage};

use super::{RenderMode, required_int};
use crate::canvas::Canvas;
use crate::error::FilterError;
use crate::field::{FieldSet, FieldType};
use crate::geometry::PixelRect;

/// Replace each `pixel_size` block with the mean of its pixels.
///
/// The grid is anchored at the top-left of the apply rect, not of the clip,
/// so a partial repaint produces the same blocks as a full one.
pub(super) fn apply(
    canvas: &mut Canvas,
    fields: &FieldSet,
    apply_rect: PixelRect,
    _mode: RenderMode,
) -> Result<(), FilterError> {
    let mut pixel_size = required_int(fields, FieldType::PixelSize)?;
    if pixel_size <= 1 || apply_rect.is_empty() {
        return Ok(());
    }
    pixel_size = pixel_size.min(apply_rect.width).min(apply_rect.height);

    let source = canvas.copy_region(apply_rect);
    let (width, height) = source.dimensions();
    let visible = canvas.clip_bounds();
    let mut output = RgbaImage::from_raw(width, height, source.as_raw().clone())
        .ok_or(FilterError::Buffer { width, height })?;

    let step = pixel_size as usize;
    for block_y in (0..height as i32).step_by(step) {
        for block_x in (0..width as i32).step_by(step) {
            let block = PixelRect::new(block_x, block_y, pixel_size, pixel_size)
                .intersect(&PixelRect::new(0, 0, width as i32, height as i32));
            let on_canvas = PixelRect::new(apply_rect.x + block.x, apply_rect.y + block.y, block.width, block.height);
            if on_canvas.intersect(&visible).is_empty() {
                continue;
            }
            let average = average_color(&source, block);
            for y in block.top()..block.bottom() {
                for x in block.left()..block.right() {
                    output.put_pixel(x as u32, y as u32, average);
                }
            }
        }
    }

    canvas.draw_image(&output, apply_rect.x, apply_rect.y);
    Ok(())
}

/// Independent mean of every channel over the pixels of `block`.
fn average_color(source: &RgbaImage, block: PixelRect) -> Rgba<u8> {
    let mut sums = [0u64; 4];
    let mut count = 0u64;
    for y in block.top()..block.bottom() {
        for x in block.left()..block.right() {
            let pixel = source.get_pixel(x as u32, y as u32);
            for (sum, channel) in sums.iter_mut().zip(pixel.0) {
                *sum += channel as u64;
            }
            count += 1;
        }
    }
    if count == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    Rgba(sums.map(|sum| (sum / count) as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_of_partial_block_uses_only_its_samples() {
        let mut source = RgbaImage::from_pixel(3, 1, Rgba([0, 0, 0, 255]));
        source.put_pixel(2, 0, Rgba([90, 30, 60, 255]));
        let avg = average_color(&source, PixelRect::new(2, 0, 1, 1));
        assert_eq!(avg, Rgba([90, 30, 60, 255]));
        let avg = average_color(&source, PixelRect::new(1, 0, 2, 1));
        assert_eq!(avg, Rgba([45, 15, 30, 255]));
    }
}
