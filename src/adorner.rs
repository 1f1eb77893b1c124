//! Interactive handles that turn pointer drags into bounded geometry changes.
//!
//! An adorner never touches history or its owner directly: it snapshots the
//! owner on mouse-down and, on every move, computes the candidate geometry
//! from that snapshot and the pointer. The surface applies the result and
//! takes care of the undo step, so a click without a drag records nothing.

use egui::{CursorIcon, Modifiers, Pos2, Rect};
use serde::{Deserialize, Serialize};

use crate::element::{DrawableContainer, EditStatus};
use crate::geometry::hit_testing::is_point_near_handle;
use crate::geometry::normalized;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Position {
    pub const ALL: [Position; 8] = [
        Position::TopLeft,
        Position::Top,
        Position::TopRight,
        Position::Right,
        Position::BottomRight,
        Position::Bottom,
        Position::BottomLeft,
        Position::Left,
    ];

    /// Where the handle sits on `bounds`.
    pub fn point_on(&self, bounds: Rect) -> Pos2 {
        let bounds = normalized(bounds);
        match self {
            Position::TopLeft => bounds.left_top(),
            Position::Top => bounds.center_top(),
            Position::TopRight => bounds.right_top(),
            Position::Right => bounds.right_center(),
            Position::BottomRight => bounds.right_bottom(),
            Position::Bottom => bounds.center_bottom(),
            Position::BottomLeft => bounds.left_bottom(),
            Position::Left => bounds.left_center(),
        }
    }

    pub fn is_corner(&self) -> bool {
        matches!(self, Position::TopLeft | Position::TopRight | Position::BottomRight | Position::BottomLeft)
    }

    /// Which edges follow the pointer: (left, top, right, bottom).
    fn moving_edges(&self) -> (bool, bool, bool, bool) {
        match self {
            Position::TopLeft => (true, true, false, false),
            Position::Top => (false, true, false, false),
            Position::TopRight => (false, true, true, false),
            Position::Right => (false, false, true, false),
            Position::BottomRight => (false, false, true, true),
            Position::Bottom => (false, false, false, true),
            Position::BottomLeft => (true, false, false, true),
            Position::Left => (true, false, false, false),
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            Position::TopLeft | Position::BottomRight => CursorIcon::ResizeNwSe,
            Position::TopRight | Position::BottomLeft => CursorIcon::ResizeNeSw,
            Position::Top | Position::Bottom => CursorIcon::ResizeVertical,
            Position::Left | Position::Right => CursorIcon::ResizeHorizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdornerKind {
    /// Drags one edge or corner of the owner's bounds
    Resize(Position),
    /// Drags the owner's target point (a speech bubble tail)
    Target,
}

/// Geometry an adorner proposes for its owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdornerChange {
    Bounds(Rect),
    Target(Pos2),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Adorner {
    kind: AdornerKind,
    status: EditStatus,
    origin_bounds: Rect,
    origin_target: Pos2,
}

impl Adorner {
    pub fn new(kind: AdornerKind, status: EditStatus) -> Self {
        Self { kind, status, origin_bounds: Rect::NOTHING, origin_target: Pos2::ZERO }
    }

    pub fn kind(&self) -> AdornerKind {
        self.kind
    }

    pub fn status(&self) -> EditStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: EditStatus) {
        self.status = status;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, EditStatus::Moving | EditStatus::Resizing)
    }

    /// Centre of the handle for the given owner.
    pub fn location(&self, owner: &DrawableContainer) -> Option<Pos2> {
        match self.kind {
            AdornerKind::Resize(position) => Some(position.point_on(owner.bounds())),
            AdornerKind::Target => owner.target(),
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self.kind {
            AdornerKind::Resize(position) => position.cursor_icon(),
            AdornerKind::Target => CursorIcon::Crosshair,
        }
    }

    pub fn hit_test(&self, owner: &DrawableContainer, point: Pos2, size: f32, tolerance: f32) -> bool {
        if self.status == EditStatus::Undrawn {
            return false;
        }
        self.location(owner)
            .is_some_and(|center| is_point_near_handle(point, center, size, tolerance))
    }

    /// Start a drag from the owner's current bounds and target.
    pub fn mouse_down(&mut self, bounds: Rect, target: Option<Pos2>) {
        self.origin_bounds = bounds;
        self.origin_target = target.unwrap_or(Pos2::ZERO);
        self.status = match self.kind {
            AdornerKind::Resize(_) => EditStatus::Resizing,
            AdornerKind::Target => EditStatus::Moving,
        };
    }

    /// Candidate geometry for the pointer at `point`; `None` unless a drag is running.
    pub fn mouse_move(&self, point: Pos2, modifiers: Modifiers, image_bounds: Rect, min_size: f32) -> Option<AdornerChange> {
        if !self.is_active() {
            return None;
        }
        Some(match self.kind {
            AdornerKind::Resize(position) => {
                AdornerChange::Bounds(scale_bounds(self.origin_bounds, position, point, modifiers.shift, min_size))
            }
            AdornerKind::Target => AdornerChange::Target(reflect_into(point, image_bounds)),
        })
    }

    pub fn mouse_up(&mut self) {
        self.status = EditStatus::Idle;
    }

    /// Where the drag started from.
    pub fn origin(&self) -> (Rect, Pos2) {
        (self.origin_bounds, self.origin_target)
    }
}

/// New bounds when the handle at `position` is dragged to `point`.
///
/// The opposite edges stay put. Moving edges stop `min_size` short of their
/// counterpart, so the rect never flips or collapses mid-drag. With
/// `keep_aspect`, corner drags keep the original width/height ratio.
pub fn scale_bounds(original: Rect, position: Position, point: Pos2, keep_aspect: bool, min_size: f32) -> Rect {
    let original = normalized(original);
    let (mut left, mut top, mut right, mut bottom) = (original.min.x, original.min.y, original.max.x, original.max.y);
    let (moves_left, moves_top, moves_right, moves_bottom) = position.moving_edges();

    if moves_left {
        left = point.x.min(right - min_size);
    }
    if moves_right {
        right = point.x.max(left + min_size);
    }
    if moves_top {
        top = point.y.min(bottom - min_size);
    }
    if moves_bottom {
        bottom = point.y.max(top + min_size);
    }

    if keep_aspect && position.is_corner() && original.width() > 0.0 && original.height() > 0.0 {
        let ratio = original.width() / original.height();
        let width = right - left;
        let height = bottom - top;
        if width / height > ratio {
            let width = height * ratio;
            if moves_left {
                left = right - width;
            } else {
                right = left + width;
            }
        } else {
            let height = width / ratio;
            if moves_top {
                top = bottom - height;
            } else {
                bottom = top + height;
            }
        }
    }

    Rect::from_min_max(Pos2::new(left, top), Pos2::new(right, bottom))
}

/// Mirror a point that left `bounds` back across the edge it crossed, then clamp.
pub fn reflect_into(point: Pos2, bounds: Rect) -> Pos2 {
    let bounds = normalized(bounds);
    let reflect = |value: f32, low: f32, high: f32| {
        let mirrored = if value < low {
            low + (low - value)
        } else if value > high {
            high - (value - high)
        } else {
            value
        };
        mirrored.clamp(low, high)
    };
    Pos2::new(
        reflect(point.x, bounds.min.x, bounds.max.x),
        reflect(point.y, bounds.min.y, bounds.max.y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_min_size(Pos2::new(x, y), egui::vec2(w, h))
    }

    #[test]
    fn test_bottom_right_follows_pointer() {
        let scaled = scale_bounds(rect(10.0, 10.0, 50.0, 50.0), Position::BottomRight, Pos2::new(90.0, 90.0), false, 2.0);
        assert_eq!(scaled, rect(10.0, 10.0, 80.0, 80.0));
    }

    #[test]
    fn test_edge_handle_moves_one_side_only() {
        let scaled = scale_bounds(rect(10.0, 10.0, 50.0, 50.0), Position::Left, Pos2::new(0.0, 500.0), false, 2.0);
        assert_eq!(scaled, rect(0.0, 10.0, 60.0, 50.0));
    }

    #[test]
    fn test_dragging_past_anchor_clamps_to_min_size() {
        let scaled = scale_bounds(rect(10.0, 10.0, 50.0, 50.0), Position::TopLeft, Pos2::new(200.0, 200.0), false, 4.0);
        assert_eq!(scaled, rect(56.0, 56.0, 4.0, 4.0));
    }

    #[test]
    fn test_keep_aspect_on_corner() {
        let scaled = scale_bounds(rect(0.0, 0.0, 40.0, 20.0), Position::BottomRight, Pos2::new(100.0, 20.0), true, 1.0);
        assert_eq!(scaled, rect(0.0, 0.0, 40.0, 20.0));
        let scaled = scale_bounds(rect(0.0, 0.0, 40.0, 20.0), Position::BottomRight, Pos2::new(80.0, 60.0), true, 1.0);
        assert_eq!(scaled, rect(0.0, 0.0, 80.0, 40.0));
    }

    #[test]
    fn test_reflect_into_mirrors_overshoot() {
        let bounds = rect(0.0, 0.0, 100.0, 50.0);
        assert_eq!(reflect_into(Pos2::new(-10.0, 60.0), bounds), Pos2::new(10.0, 40.0));
        assert_eq!(reflect_into(Pos2::new(-500.0, 25.0), bounds), Pos2::new(100.0, 25.0));
    }
}
