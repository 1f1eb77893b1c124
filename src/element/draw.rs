use egui::{Color32, Pos2, Vec2};

use super::{ContainerKind, DrawableContainer};
use crate::canvas::Canvas;
use crate::field::{ArrowHeads, FieldType, FieldValue};
use crate::geometry::PixelRect;

/// Length of an arrow head for a given line thickness.
pub(crate) fn arrow_head_length(thickness: f32) -> f32 {
    (thickness * 4.0).max(8.0)
}

/// Rasterize a container's own shape. Glyphs of text kinds are left to the host painter.
pub(super) fn draw_content(container: &DrawableContainer, canvas: &mut Canvas) {
    let fields = container.fields();
    let thickness = container.line_thickness();
    let line_color = fields.color(FieldType::LineColor).unwrap_or(Color32::TRANSPARENT);
    let fill_color = fields.color(FieldType::FillColor).unwrap_or(Color32::TRANSPARENT);
    let rect = PixelRect::enclosing(container.bounds());

    match container.kind() {
        ContainerKind::Rectangle | ContainerKind::Text(_) => {
            canvas.fill_rect(rect, fill_color);
            canvas.stroke_rect(rect, thickness, line_color);
        }
        ContainerKind::Ellipse => {
            canvas.draw_ellipse(rect, None, fill_color);
            if thickness > 0 {
                canvas.draw_ellipse(rect, Some(thickness), line_color);
            }
        }
        ContainerKind::Line { .. } | ContainerKind::Arrow { .. } => {
            let Some((start, end)) = container.endpoints() else {
                return;
            };
            canvas.draw_line(start, end, thickness as f32, line_color);
            if let Some(heads) = fields.get(FieldType::ArrowHeads).and_then(FieldValue::as_arrow_heads) {
                if matches!(heads, ArrowHeads::End | ArrowHeads::Both) {
                    draw_arrow_head(canvas, start, end, thickness as f32, line_color);
                }
                if matches!(heads, ArrowHeads::Start | ArrowHeads::Both) {
                    draw_arrow_head(canvas, end, start, thickness as f32, line_color);
                }
            }
        }
        ContainerKind::SpeechBubble { target, .. } => {
            let bounds = container.bounds();
            let tail = tail_polygon(bounds.center(), bounds.size(), *target);
            canvas.fill_polygon(&tail, fill_color);
            canvas.fill_rect(rect, fill_color);
            canvas.stroke_rect(rect, thickness, line_color);
            if thickness > 0 {
                canvas.draw_line(tail[0], tail[1], thickness as f32, line_color);
                canvas.draw_line(tail[2], tail[1], thickness as f32, line_color);
            }
        }
        ContainerKind::Highlight | ContainerKind::Obfuscate => {
            canvas.stroke_rect(rect, thickness, line_color);
        }
    }
}

fn draw_arrow_head(canvas: &mut Canvas, from: Pos2, tip: Pos2, thickness: f32, color: Color32) {
    let direction = tip - from;
    if direction.length() <= f32::EPSILON {
        return;
    }
    let direction = direction.normalized();
    let length = arrow_head_length(thickness);
    let base = tip - direction * length;
    let side = Vec2::new(-direction.y, direction.x) * (length * 0.6);
    canvas.fill_polygon(&[tip, base + side, base - side], color);
}

/// Triangle from the bubble's centre out to the target point.
fn tail_polygon(center: Pos2, size: Vec2, target: Pos2) -> [Pos2; 3] {
    let direction = target - center;
    let normal = if direction.length() <= f32::EPSILON {
        Vec2::X
    } else {
        Vec2::new(-direction.y, direction.x).normalized()
    };
    let half_width = size.min_elem().max(2.0) / 6.0;
    [center + normal * half_width, target, center - normal * half_width]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::element::factory;
    use egui::Rect;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_rectangle_border_only_touches_edges() {
        let config = EditorConfig { remember_field_values: false, ..EditorConfig::default() };
        let rect = factory::create_rectangle(Rect::from_min_size(Pos2::new(2.0, 2.0), Vec2::splat(6.0)), &config);
        let mut canvas = Canvas::new(RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255])));
        draw_content(&rect, &mut canvas);
        assert_eq!(canvas.pixel(2, 2), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(canvas.pixel(5, 5), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(canvas.pixel(0, 0), Some(Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_arrow_head_points_at_end() {
        let config = EditorConfig { remember_field_values: false, ..EditorConfig::default() };
        let arrow = factory::create_arrow(Pos2::new(2.0, 20.0), Pos2::new(38.0, 20.0), &config);
        let mut canvas = Canvas::new(RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255])));
        draw_content(&arrow, &mut canvas);
        // the head is wider than the shaft near the tip, not near the tail
        assert_eq!(canvas.pixel(31, 22), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(canvas.pixel(5, 22), Some(Rgba([0, 0, 0, 255])));
    }
}
