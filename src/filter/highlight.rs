use image::Rgba;

use super::RenderMode;
use crate::canvas::Canvas;
use crate::error::FilterError;
use crate::field::{FieldSet, FieldType};
use crate::geometry::PixelRect;

/// Darken each channel down to the highlight color where the pixel is lighter.
pub(super) fn apply(
    canvas: &mut Canvas,
    fields: &FieldSet,
    _apply_rect: PixelRect,
    _mode: RenderMode,
) -> Result<(), FilterError> {
    let color = fields
        .color(FieldType::FillColor)
        .ok_or(FilterError::MissingField(FieldType::FillColor))?;
    let [hr, hg, hb, _] = color.to_srgba_unmultiplied();

    let area = canvas.clip_bounds();
    if area.is_empty() {
        return Ok(());
    }
    let mut region = canvas.copy_region(area);
    for pixel in region.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        *pixel = Rgba([r.min(hr), g.min(hg), b.min(hb), a]);
    }
    canvas.draw_image(&region, area.x, area.y);
    Ok(())
}
