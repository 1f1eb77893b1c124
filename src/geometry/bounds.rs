use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Integer rectangle in bitmap coordinates.
///
/// Width and height may be negative when built from a drag that went up or
/// left; call [`PixelRect::normalize`] before iterating pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub const EMPTY: PixelRect = PixelRect { x: 0, y: 0, width: 0, height: 0 };

    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// The full bounds of a `width` x `height` bitmap.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Smallest pixel rect covering a floating point rect.
    pub fn enclosing(rect: Rect) -> Self {
        let rect = normalized(rect);
        let left = rect.min.x.floor() as i32;
        let top = rect.min.y.floor() as i32;
        let right = rect.max.x.ceil() as i32;
        let bottom = rect.max.y.ceil() as i32;
        Self::new(left, top, right - left, bottom - top)
    }

    /// Same area with non-negative width and height.
    pub fn normalize(self) -> Self {
        let (x, width) = if self.width < 0 { (self.x + self.width, -self.width) } else { (self.x, self.width) };
        let (y, height) = if self.height < 0 { (self.y + self.height, -self.height) } else { (self.y, self.height) };
        Self { x, y, width, height }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> i64 {
        let r = self.normalize();
        r.width as i64 * r.height as i64
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        let r = self.normalize();
        x >= r.left() && x < r.right() && y >= r.top() && y < r.bottom()
    }

    /// Overlap of two rects; empty (at the origin of `self`) when they are disjoint.
    pub fn intersect(&self, other: &PixelRect) -> PixelRect {
        let a = self.normalize();
        let b = other.normalize();
        let left = a.left().max(b.left());
        let top = a.top().max(b.top());
        let right = a.right().min(b.right());
        let bottom = a.bottom().min(b.bottom());
        if right <= left || bottom <= top {
            return PixelRect::new(a.x, a.y, 0, 0);
        }
        PixelRect::new(left, top, right - left, bottom - top)
    }

    pub fn union(&self, other: &PixelRect) -> PixelRect {
        let a = self.normalize();
        let b = other.normalize();
        if a.is_empty() {
            return b;
        }
        if b.is_empty() {
            return a;
        }
        let left = a.left().min(b.left());
        let top = a.top().min(b.top());
        let right = a.right().max(b.right());
        let bottom = a.bottom().max(b.bottom());
        PixelRect::new(left, top, right - left, bottom - top)
    }

    pub fn inflate(&self, amount: i32) -> PixelRect {
        let r = self.normalize();
        PixelRect::new(r.x - amount, r.y - amount, r.width + 2 * amount, r.height + 2 * amount)
    }

    pub fn to_rect(&self) -> Rect {
        let r = self.normalize();
        Rect::from_min_size(
            Pos2::new(r.x as f32, r.y as f32),
            Vec2::new(r.width as f32, r.height as f32),
        )
    }
}

/// Accumulated area that needs repainting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyRegion(Option<PixelRect>);

impl DirtyRegion {
    pub fn add(&mut self, rect: Rect) {
        self.add_pixels(PixelRect::enclosing(rect));
    }

    pub fn add_pixels(&mut self, rect: PixelRect) {
        let rect = rect.normalize();
        if rect.is_empty() {
            return;
        }
        self.0 = Some(match self.0 {
            Some(current) => current.union(&rect),
            None => rect,
        });
    }

    pub fn is_clean(&self) -> bool {
        self.0.is_none()
    }

    pub fn bounds(&self) -> Option<PixelRect> {
        self.0
    }

    pub fn take(&mut self) -> Option<PixelRect> {
        self.0.take()
    }
}

/// Rect with `min <= max` on both axes, whichever corners it was built from.
pub fn normalized(rect: Rect) -> Rect {
    Rect::from_two_pos(rect.min, rect.max)
}

pub fn rect_from_location_size(location: Pos2, size: Vec2) -> Rect {
    normalized(Rect::from_min_size(location, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_inverted_rect() {
        let rect = PixelRect::new(10, 10, -4, -6).normalize();
        assert_eq!(rect, PixelRect::new(6, 4, 4, 6));
    }

    #[test]
    fn test_intersect_disjoint_is_empty() {
        let a = PixelRect::new(0, 0, 10, 10);
        let b = PixelRect::new(20, 20, 5, 5);
        assert!(a.intersect(&b).is_empty());
    }

    #[test]
    fn test_intersect_with_inverted_input() {
        let bitmap = PixelRect::from_size(100, 100);
        let rect = PixelRect::new(90, 90, -20, -20);
        assert_eq!(bitmap.intersect(&rect), PixelRect::new(70, 70, 20, 20));
    }

    #[test]
    fn test_enclosing_rounds_outward() {
        let rect = Rect::from_min_max(Pos2::new(1.5, 2.2), Pos2::new(3.1, 4.0));
        assert_eq!(PixelRect::enclosing(rect), PixelRect::new(1, 2, 3, 2));
    }

    #[test]
    fn test_union_ignores_empty() {
        let a = PixelRect::new(5, 5, 0, 0);
        let b = PixelRect::new(1, 1, 2, 2);
        assert_eq!(a.union(&b), b);
    }

    #[test]
    fn test_dirty_region_unions_and_ignores_empty() {
        let mut dirty = DirtyRegion::default();
        dirty.add_pixels(PixelRect::new(5, 5, 0, 10));
        assert!(dirty.is_clean());
        dirty.add_pixels(PixelRect::new(0, 0, 4, 4));
        dirty.add(Rect::from_min_max(Pos2::new(10.2, 10.0), Pos2::new(12.5, 11.0)));
        assert_eq!(dirty.take(), Some(PixelRect::new(0, 0, 13, 11)));
        assert!(dirty.is_clean());
    }
}
