use egui::{Pos2, Rect};

use crate::geometry::normalized;

/// Anything thinner than this on either axis is dropped when a drawing gesture ends.
pub const MIN_ELEMENT_SIZE: f32 = 2.0;

/// Horizontal advance of one glyph relative to the font size, used for wrapping.
pub(crate) const GLYPH_WIDTH_RATIO: f32 = 0.6;

pub(crate) fn is_large_enough(rect: &Rect, min_size: f32) -> bool {
    let rect = normalized(*rect);
    rect.width() >= min_size && rect.height() >= min_size
}

/// Which axes of a line-like element run against the bounds' natural order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Flip {
    pub x: bool,
    pub y: bool,
}

impl Flip {
    pub(crate) fn of(rect: &Rect) -> Self {
        Self { x: rect.max.x < rect.min.x, y: rect.max.y < rect.min.y }
    }

    /// Start and end point of a line spanning `bounds`.
    pub(crate) fn endpoints(&self, bounds: Rect) -> (Pos2, Pos2) {
        let (x0, x1) = if self.x { (bounds.max.x, bounds.min.x) } else { (bounds.min.x, bounds.max.x) };
        let (y0, y1) = if self.y { (bounds.max.y, bounds.min.y) } else { (bounds.min.y, bounds.max.y) };
        (Pos2::new(x0, y0), Pos2::new(x1, y1))
    }
}
