//! Pointer gestures on the surface.
//!
//! A mouse-down decides what the gesture is (drawing a new container, dragging
//! an adorner, or moving the selection) and the following moves feed it.
//! History is only touched once something actually changes, so a click
//! without a drag leaves the undo stack alone.

use egui::{CursorIcon, Modifiers, Pos2};
use log::debug;

use super::Surface;
use crate::adorner::{AdornerChange, reflect_into};
use crate::element::{ContainerId, ContainerKind, DrawableContainer, EditStatus, Flip, TextContent};
use crate::error::{EditorError, EditorResult};
use crate::event::EditorEvent;
use crate::memento::Memento;

/// What a mouse-down on empty canvas creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingMode {
    Rectangle,
    Ellipse,
    Line,
    Arrow,
    Text,
    SpeechBubble,
    Highlight,
    Obfuscate,
}

impl DrawingMode {
    fn container_kind(&self, origin: Pos2) -> ContainerKind {
        match self {
            DrawingMode::Rectangle => ContainerKind::Rectangle,
            DrawingMode::Ellipse => ContainerKind::Ellipse,
            DrawingMode::Line => ContainerKind::Line { flip: Flip::default() },
            DrawingMode::Arrow => ContainerKind::Arrow { flip: Flip::default() },
            DrawingMode::Text => ContainerKind::Text(TextContent::default()),
            DrawingMode::SpeechBubble => ContainerKind::SpeechBubble { text: TextContent::default(), target: origin },
            DrawingMode::Highlight => ContainerKind::Highlight,
            DrawingMode::Obfuscate => ContainerKind::Obfuscate,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) enum Gesture {
    #[default]
    None,
    Drawing {
        id: ContainerId,
        origin: Pos2,
    },
    Adorner {
        id: ContainerId,
        index: usize,
        first_change: bool,
    },
    Moving {
        ids: Vec<ContainerId>,
        last: Pos2,
        first_change: bool,
    },
}

impl Surface {
    pub fn drawing_mode(&self) -> Option<DrawingMode> {
        self.drawing_mode
    }

    /// Choose what the next drag on empty canvas draws; `None` selects and moves instead.
    pub fn set_drawing_mode(&mut self, mode: Option<DrawingMode>) {
        self.drawing_mode = mode;
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.gesture, Gesture::None)
    }

    /// Returns whether the press started a gesture.
    pub fn mouse_down(&mut self, point: Pos2, modifiers: Modifiers) -> EditorResult<bool> {
        if let Some((id, index)) = self.adorner_at(point) {
            let (bounds, target) = {
                let container = self.elements.get(id).ok_or(EditorError::UnknownContainer(id))?;
                (container.bounds(), container.target())
            };
            let status = self.with_container(id, |container| {
                let adorner = container.adorner_mut(index)?;
                adorner.mouse_down(bounds, target);
                let status = adorner.status();
                container.set_status(status);
                Some(status)
            })?;
            debug!("adorner {index} of {id} grabbed ({status:?})");
            self.gesture = Gesture::Adorner { id, index, first_change: true };
            return Ok(true);
        }

        if let Some(mode) = self.drawing_mode {
            let container = DrawableContainer::undrawn(mode.container_kind(point), point, &self.config);
            let id = container.id();
            self.elements.push(container)?;
            self.gesture = Gesture::Drawing { id, origin: point };
            return Ok(true);
        }

        let tolerance = self.config.hit_tolerance;
        match self.elements.topmost_at(point, tolerance) {
            Some(id) => {
                let already_selected = self.elements.get(id).is_some_and(DrawableContainer::is_selected);
                if modifiers.shift {
                    self.select(id)?;
                } else if !already_selected {
                    self.select_only(id)?;
                }
                let ids = self.elements.selected_ids();
                for id in &ids {
                    self.with_container(*id, |c| c.set_status(EditStatus::Moving))?;
                }
                self.gesture = Gesture::Moving { ids, last: point, first_change: true };
                Ok(true)
            }
            None => {
                self.deselect_all();
                Ok(false)
            }
        }
    }

    pub fn mouse_move(&mut self, point: Pos2, modifiers: Modifiers) -> EditorResult<()> {
        match std::mem::take(&mut self.gesture) {
            Gesture::None => {}
            Gesture::Drawing { id, origin } => {
                self.with_container(id, |c| c.draw_to(origin, point))?;
                self.gesture = Gesture::Drawing { id, origin };
            }
            Gesture::Adorner { id, index, first_change } => {
                let image_rect = self.image_rect();
                let min_size = self.config.min_element_size;
                let change = self
                    .elements
                    .get(id)
                    .and_then(|c| c.adorners().get(index))
                    .and_then(|adorner| adorner.mouse_move(point, modifiers, image_rect, min_size));
                let changed = match change {
                    Some(change) => self.apply_adorner_change(id, change, first_change)?,
                    None => false,
                };
                self.gesture = Gesture::Adorner { id, index, first_change: first_change && !changed };
            }
            Gesture::Moving { ids, last, first_change } => {
                let delta = point - last;
                self.move_elements(&ids, delta, first_change)?;
                let moved = delta != egui::Vec2::ZERO;
                self.gesture = Gesture::Moving { ids, last: point, first_change: first_change && !moved };
            }
        }
        Ok(())
    }

    /// Apply what an adorner proposes; returns whether anything changed.
    fn apply_adorner_change(&mut self, id: ContainerId, change: AdornerChange, first_change: bool) -> EditorResult<bool> {
        match change {
            AdornerChange::Bounds(bounds) => {
                let unchanged = self.elements.get(id).is_some_and(|c| c.bounds() == bounds);
                if unchanged {
                    return Ok(false);
                }
                self.make_bounds_change_undoable(&[id], first_change)?;
                self.apply_bounds(id, bounds)?;
                Ok(true)
            }
            AdornerChange::Target(target) => {
                let unchanged = self.elements.get(id).and_then(DrawableContainer::target) == Some(target);
                if unchanged {
                    return Ok(false);
                }
                self.set_target(id, target, first_change)?;
                Ok(true)
            }
        }
    }

    pub fn mouse_up(&mut self, point: Pos2, modifiers: Modifiers) -> EditorResult<()> {
        self.mouse_move(point, modifiers)?;
        match std::mem::take(&mut self.gesture) {
            Gesture::None => {}
            Gesture::Drawing { id, .. } => self.finish_drawing(id)?,
            Gesture::Adorner { id, index, .. } => {
                self.with_container(id, |container| {
                    if let Some(adorner) = container.adorner_mut(index) {
                        adorner.mouse_up();
                    }
                    container.set_status(EditStatus::Idle);
                })?;
            }
            Gesture::Moving { ids, .. } => {
                for id in ids {
                    self.with_container(id, |c| c.set_status(EditStatus::Idle))?;
                }
            }
        }
        Ok(())
    }

    /// Keep a drawn container (one undo step, selected) or drop it if it is too small.
    fn finish_drawing(&mut self, id: ContainerId) -> EditorResult<()> {
        let min_size = self.config.min_element_size;
        let keep = self.elements.get(id).is_some_and(|c| c.is_large_enough(min_size));
        if !keep {
            let (_, container) = self.elements.remove(id)?;
            let surface = self.bounds();
            container.invalidate(&mut self.dirty, surface);
            debug!("dropped undersized container {id}");
            return Ok(());
        }
        let image_rect = self.image_rect();
        self.with_container(id, |c| {
            c.set_status(EditStatus::Idle);
            // park a fresh speech bubble's tail below its lower left quarter
            let bounds = c.bounds();
            let tail = Pos2::new(bounds.left() + bounds.width() / 4.0, bounds.bottom() + bounds.height() / 2.0);
            c.set_target(reflect_into(tail, image_rect));
        })?;
        self.history.record(Memento::AddElements { ids: vec![id] }, false);
        self.events.emit(EditorEvent::ElementsAdded(vec![id]));
        self.select_only(id)?;
        self.mark_modified();
        Ok(())
    }

    /// Topmost adorner of a selected container under `point`.
    fn adorner_at(&self, point: Pos2) -> Option<(ContainerId, usize)> {
        let size = self.config.adorner_size;
        let tolerance = self.config.hit_tolerance;
        self.elements
            .iter()
            .rev()
            .filter(|c| c.is_selected())
            .find_map(|c| c.adorner_at(point, size, tolerance).map(|index| (c.id(), index)))
    }

    /// Cursor the host should show over `point`.
    pub fn cursor_at(&self, point: Pos2) -> CursorIcon {
        if let Some((id, index)) = self.adorner_at(point) {
            if let Some(adorner) = self.elements.get(id).and_then(|c| c.adorners().get(index)) {
                return adorner.cursor_icon();
            }
        }
        if self.drawing_mode.is_some() {
            return CursorIcon::Crosshair;
        }
        if self.elements.topmost_at(point, self.config.hit_tolerance).is_some() {
            return CursorIcon::Move;
        }
        CursorIcon::Default
    }
}
