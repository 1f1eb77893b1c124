use egui::{Pos2, Rect, Vec2};

use super::bounds::normalized;

/// Screen rect of a square handle centred on `center`.
pub fn handle_rect(center: Pos2, size: f32) -> Rect {
    Rect::from_center_size(center, Vec2::splat(size))
}

/// True when `point` lands on a handle, allowing `tolerance` extra pixels on each side.
pub fn is_point_near_handle(point: Pos2, center: Pos2, size: f32, tolerance: f32) -> bool {
    handle_rect(center, size).expand(tolerance).contains(point)
}

/// Hit test for an element body; thin elements get `tolerance` around their bounds.
pub fn is_point_in_bounds(point: Pos2, bounds: Rect, tolerance: f32) -> bool {
    normalized(bounds).expand(tolerance).contains(point)
}

/// Distance from a point to a line segment, used for line and arrow hit testing.
pub fn distance_to_line_segment(point: Pos2, line_start: Pos2, line_end: Pos2) -> f32 {
    let line_vec = line_end - line_start;
    let point_vec = point - line_start;

    let line_len = line_vec.length();
    if line_len == 0.0 {
        return point_vec.length();
    }

    let t = ((point_vec.x * line_vec.x + point_vec.y * line_vec.y) / line_len).clamp(0.0, line_len);
    let projection = line_start + (line_vec * t / line_len);
    (point - projection).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_extends_handle() {
        let center = Pos2::new(10.0, 10.0);
        assert!(!is_point_near_handle(Pos2::new(15.5, 10.0), center, 8.0, 0.0));
        assert!(is_point_near_handle(Pos2::new(15.5, 10.0), center, 8.0, 2.0));
    }

    #[test]
    fn test_distance_to_segment_clamps_to_endpoints() {
        let d = distance_to_line_segment(Pos2::new(-3.0, 4.0), Pos2::ZERO, Pos2::new(10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-5);
    }
}
