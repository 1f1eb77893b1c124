//! The editing canvas: background bitmap, elements, history and repaint state.
//!
//! Every user-facing mutation here follows the same order: capture a
//! [`Memento`] of the state it is about to change, record it, then mutate and
//! invalidate. Undo and redo hand the surface to [`Memento::restore`], which
//! uses the crate-internal accessors at the bottom of this file.

mod background;
mod interaction;
mod shared;

use egui::{Pos2, Rect, Vec2};
use image::{RgbaImage, imageops};
use log::{debug, info, warn};

use crate::canvas::{Canvas, CompositingMode};
use crate::config::EditorConfig;
use crate::element::{ContainerId, DrawableContainer, DrawableContainerList, Geometry};
use crate::error::{EditorError, EditorResult};
use crate::event::{EditorEvent, EventBus, EventHandler, SubscriptionId};
use crate::field::{FieldOwner, FieldSet, FieldType, FieldValue};
use crate::filter::{Filter, RenderMode};
use crate::geometry::{DirtyRegion, Matrix, PixelRect};
use crate::memento::{Memento, RemovedContainer, UndoHistory};

pub use background::RotateDirection;
pub use interaction::DrawingMode;
pub use shared::{RenderSnapshot, SharedSurface};

use interaction::Gesture;

pub struct Surface {
    background: RgbaImage,
    elements: DrawableContainerList,
    history: UndoHistory,
    config: EditorConfig,
    events: EventBus,
    dirty: DirtyRegion,
    /// Composited edit-mode bitmap, brought up to date by [`Surface::repaint`]
    display: Canvas,
    modified: bool,
    drawing_mode: Option<DrawingMode>,
    gesture: Gesture,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("size", &(self.background.width(), self.background.height()))
            .field("elements", &self.elements.len())
            .field("undo", &self.history.undo_len())
            .field("redo", &self.history.redo_len())
            .field("modified", &self.modified)
            .finish()
    }
}

impl Surface {
    pub fn new(background: RgbaImage, config: EditorConfig) -> Self {
        info!("🖼️ new surface {}x{}", background.width(), background.height());
        let display = Canvas::new(background.clone());
        let mut surface = Self {
            background,
            elements: DrawableContainerList::new(),
            history: UndoHistory::new(),
            config,
            events: EventBus::new(),
            dirty: DirtyRegion::default(),
            display,
            modified: false,
            drawing_mode: None,
            gesture: Gesture::None,
        };
        surface.invalidate();
        surface
    }

    pub fn background(&self) -> &RgbaImage {
        &self.background
    }

    pub fn width(&self) -> u32 {
        self.background.width()
    }

    pub fn height(&self) -> u32 {
        self.background.height()
    }

    /// Full bitmap area in pixels.
    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_size(self.width(), self.height())
    }

    pub fn image_rect(&self) -> Rect {
        self.bounds().to_rect()
    }

    pub fn elements(&self) -> &DrawableContainerList {
        &self.elements
    }

    pub fn get(&self, id: ContainerId) -> Option<&DrawableContainer> {
        self.elements.get(id)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EditorConfig {
        &mut self.config
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Forget the modified flag, e.g. after the result was saved or exported.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    // ---------------------------------------------------------------------
    // Elements
    // ---------------------------------------------------------------------

    pub fn add_element(&mut self, container: DrawableContainer, undoable: bool) -> EditorResult<ContainerId> {
        let id = container.id();
        self.add_elements(vec![container], undoable)?;
        Ok(id)
    }

    /// Add containers on top of the existing ones. Nothing is added if any id is already present.
    pub fn add_elements(&mut self, containers: Vec<DrawableContainer>, undoable: bool) -> EditorResult<Vec<ContainerId>> {
        let ids: Vec<ContainerId> = containers.iter().map(DrawableContainer::id).collect();
        for (i, id) in ids.iter().enumerate() {
            if self.elements.contains(*id) || ids[..i].contains(id) {
                return Err(EditorError::DuplicateContainer(*id));
            }
        }
        let surface = self.bounds();
        for container in containers {
            container.invalidate(&mut self.dirty, surface);
            self.elements.push(container)?;
        }
        if undoable {
            self.history.record(Memento::AddElements { ids: ids.clone() }, false);
        }
        debug!("added {} element(s)", ids.len());
        self.events.emit(EditorEvent::ElementsAdded(ids.clone()));
        self.mark_modified();
        Ok(ids)
    }

    pub fn remove_element(&mut self, id: ContainerId, undoable: bool) -> EditorResult<DrawableContainer> {
        let mut removed = self.remove_elements(&[id], undoable)?;
        removed.pop().ok_or(EditorError::UnknownContainer(id))
    }

    /// Remove containers. Nothing is removed if any id is unknown or listed twice.
    ///
    /// With `undoable`, the removed containers move into the history and
    /// clones are returned; otherwise they are handed back to the caller.
    pub fn remove_elements(&mut self, ids: &[ContainerId], undoable: bool) -> EditorResult<Vec<DrawableContainer>> {
        for (i, id) in ids.iter().enumerate() {
            if !self.elements.contains(*id) {
                return Err(EditorError::UnknownContainer(*id));
            }
            if ids[..i].contains(id) {
                return Err(EditorError::DuplicateContainer(*id));
            }
        }
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            let (index, container) = self.take_container(*id)?;
            removed.push(RemovedContainer { index, container });
        }
        let containers = removed.iter().map(|r| r.container.clone()).collect();
        if undoable {
            self.history.record(Memento::DeleteElements { removed }, false);
        }
        self.mark_modified();
        Ok(containers)
    }

    pub fn delete_selected(&mut self) -> EditorResult<()> {
        let selected = self.elements.selected_ids();
        if selected.is_empty() {
            return Ok(());
        }
        self.remove_elements(&selected, true).map(|_| ())
    }

    /// Add a loaded element list under fresh ids, so it can sit next to what is already here.
    pub fn load_elements(&mut self, list: DrawableContainerList, undoable: bool) -> EditorResult<Vec<ContainerId>> {
        let containers: Vec<DrawableContainer> = list
            .into_vec()
            .into_iter()
            .map(|mut container| {
                container.regenerate_id();
                container.restore_transient();
                container
            })
            .collect();
        info!("📂 loading {} element(s)", containers.len());
        self.add_elements(containers, undoable)
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    pub fn selected_ids(&self) -> Vec<ContainerId> {
        self.elements.selected_ids()
    }

    pub fn select(&mut self, id: ContainerId) -> EditorResult<()> {
        if self.elements.select(id)? {
            self.selection_changed();
        }
        Ok(())
    }

    pub fn deselect(&mut self, id: ContainerId) -> EditorResult<()> {
        if self.elements.deselect(id)? {
            self.selection_changed();
        }
        Ok(())
    }

    pub fn deselect_all(&mut self) {
        if !self.elements.deselect_all().is_empty() {
            self.selection_changed();
        }
    }

    /// Make `id` the only selected container.
    pub fn select_only(&mut self, id: ContainerId) -> EditorResult<()> {
        if !self.elements.contains(id) {
            return Err(EditorError::UnknownContainer(id));
        }
        let mut changed = !self.elements.deselect_all().iter().all(|other| *other == id);
        changed |= self.elements.select(id)?;
        if changed {
            self.selection_changed();
        }
        Ok(())
    }

    fn selection_changed(&mut self) {
        let selected = self.elements.selected_ids();
        let surface = self.bounds();
        for id in &selected {
            if let Some(container) = self.elements.get(*id) {
                container.invalidate(&mut self.dirty, surface);
            }
        }
        self.events.emit(EditorEvent::SelectionChanged(selected));
    }

    // ---------------------------------------------------------------------
    // Geometry
    // ---------------------------------------------------------------------

    /// Record the current bounds of `ids` before they change.
    ///
    /// Call with `first_change_in_gesture` set on the first change of a drag
    /// and cleared on every later one: the later ones fold into the first, so
    /// the whole drag is one undo step.
    pub fn make_bounds_change_undoable(&mut self, ids: &[ContainerId], first_change_in_gesture: bool) -> EditorResult<()> {
        let memento = Memento::bounds_of(&self.elements, ids)?;
        self.history.record(memento, !first_change_in_gesture);
        Ok(())
    }

    /// Set a container's bounds without recording history.
    pub fn apply_bounds(&mut self, id: ContainerId, bounds: Rect) -> EditorResult<()> {
        self.with_container(id, |container| container.apply_bounds(bounds))?;
        self.mark_modified();
        Ok(())
    }

    /// Resize one container as a single undo step.
    pub fn resize_element(&mut self, id: ContainerId, bounds: Rect) -> EditorResult<()> {
        self.make_bounds_change_undoable(&[id], true)?;
        self.apply_bounds(id, bounds)
    }

    /// Shift containers by `delta`. Later moves of the same set fold into the first one unless it is `first_change_in_gesture`.
    pub fn move_elements(&mut self, ids: &[ContainerId], delta: Vec2, first_change_in_gesture: bool) -> EditorResult<()> {
        if delta == Vec2::ZERO || ids.is_empty() {
            return Ok(());
        }
        self.make_bounds_change_undoable(ids, first_change_in_gesture)?;
        for id in ids {
            self.with_container(*id, |container| {
                container.set_location_size(container.location() + delta, container.size());
            })?;
        }
        self.mark_modified();
        Ok(())
    }

    /// Keyboard nudge of the selection; every nudge is its own undo step.
    pub fn move_selected(&mut self, delta: Vec2) -> EditorResult<()> {
        let selected = self.elements.selected_ids();
        self.move_elements(&selected, delta, true)
    }

    // ---------------------------------------------------------------------
    // Fields, text, targets and filters
    // ---------------------------------------------------------------------

    pub fn field_value(&self, owner: FieldOwner, field_type: FieldType) -> EditorResult<&FieldValue> {
        self.field_set(owner)?.get(field_type).ok_or(EditorError::UnknownField(field_type))
    }

    /// Change a field as an undoable step.
    ///
    /// Consecutive changes of the same field on the same owner fold into one
    /// step (a slider drag). The value also becomes the default for the next
    /// container of that kind, and a changed prepared filter rebuilds the
    /// owner's filters.
    pub fn set_field_value(&mut self, owner: FieldOwner, field_type: FieldType, value: FieldValue) -> EditorResult<()> {
        let fields = self.field_set(owner)?;
        let key = fields.key(field_type).ok_or(EditorError::UnknownField(field_type))?;
        let current = fields.get(field_type).ok_or(EditorError::UnknownField(field_type))?;
        if *current == value {
            return Ok(());
        }
        let rebuilds_filters = field_type == FieldType::PreparedFilter;
        let filters = match (rebuilds_filters, owner) {
            (true, FieldOwner::Container(id)) => self.elements.get(id).map(|c| c.filters().to_vec()),
            _ => None,
        };
        let memento = Memento::Field { owner, key, value: current.clone(), filters };
        self.history.record(memento, true);

        self.write_field(owner, field_type, value.clone())?;
        self.config.remember(key, &value);
        if rebuilds_filters {
            let config = self.config.clone();
            self.with_container(owner.container(), |c| c.configure_prepared_filters(&config))?;
        }
        self.mark_modified();
        Ok(())
    }

    /// Replace the text of a text container; consecutive edits fold together unless `first_change_in_gesture`.
    pub fn set_text(&mut self, id: ContainerId, text: impl Into<String>, first_change_in_gesture: bool) -> EditorResult<()> {
        let text = text.into();
        let container = self.elements.get(id).ok_or(EditorError::UnknownContainer(id))?;
        let current = container.text().ok_or(EditorError::NoText(id))?;
        if current == text {
            return Ok(());
        }
        let memento = Memento::Text { container: id, text: current.to_string() };
        self.history.record(memento, !first_change_in_gesture);
        self.with_container(id, |c| c.set_text(text))?;
        self.mark_modified();
        Ok(())
    }

    pub fn set_target(&mut self, id: ContainerId, target: Pos2, first_change_in_gesture: bool) -> EditorResult<()> {
        let container = self.elements.get(id).ok_or(EditorError::UnknownContainer(id))?;
        let current = container.target().ok_or(EditorError::NoTarget(id))?;
        if current == target {
            return Ok(());
        }
        self.history.record(Memento::Target { container: id, target: current }, !first_change_in_gesture);
        self.with_container(id, |c| c.set_target(target))?;
        self.mark_modified();
        Ok(())
    }

    /// Append a filter to a container as an undoable step; returns its index.
    pub fn add_filter(&mut self, id: ContainerId, filter: Filter) -> EditorResult<usize> {
        let container = self.elements.get(id).ok_or(EditorError::UnknownContainer(id))?;
        let memento = Memento::Filters { container: id, filters: container.filters().to_vec() };
        self.history.record(memento, false);
        debug!("adding {:?} filter to {id}", filter.kind());
        let index = self.with_container(id, |c| {
            c.filters_mut().push(filter);
            c.filters().len() - 1
        })?;
        self.mark_modified();
        Ok(index)
    }

    pub fn remove_filter(&mut self, id: ContainerId, index: usize) -> EditorResult<Filter> {
        let container = self.elements.get(id).ok_or(EditorError::UnknownContainer(id))?;
        if index >= container.filters().len() {
            return Err(EditorError::UnknownFilter { container: id, index });
        }
        let memento = Memento::Filters { container: id, filters: container.filters().to_vec() };
        self.history.record(memento, false);
        let filter = self.with_container(id, |c| c.filters_mut().remove(index))?;
        self.mark_modified();
        Ok(filter)
    }

    // ---------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Revert the newest change. A change that no longer fits the surface
    /// stays on the undo stack and nothing is modified.
    pub fn undo(&mut self) -> EditorResult<()> {
        let memento = self.history.pop_undo().ok_or(EditorError::NothingToUndo)?;
        if let Err(err) = memento.check(self) {
            warn!("cannot undo {}: {err}", memento.name());
            self.history.push_undo(memento);
            return Err(err);
        }
        info!("↩️ undo {}", memento.name());
        let inverse = memento.restore(self)?;
        self.history.push_redo(inverse);
        Ok(())
    }

    pub fn redo(&mut self) -> EditorResult<()> {
        let memento = self.history.pop_redo().ok_or(EditorError::NothingToRedo)?;
        if let Err(err) = memento.check(self) {
            warn!("cannot redo {}: {err}", memento.name());
            self.history.push_redo(memento);
            return Err(err);
        }
        info!("↪️ redo {}", memento.name());
        let inverse = memento.restore(self)?;
        self.history.push_undo(inverse);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Painting
    // ---------------------------------------------------------------------

    /// Mark the whole surface for repainting.
    pub fn invalidate(&mut self) {
        self.dirty.add_pixels(self.bounds());
    }

    pub fn invalidate_element(&mut self, id: ContainerId) -> EditorResult<()> {
        let surface = self.bounds();
        let container = self.elements.get(id).ok_or(EditorError::UnknownContainer(id))?;
        container.invalidate(&mut self.dirty, surface);
        Ok(())
    }

    pub fn dirty_region(&self) -> Option<PixelRect> {
        self.dirty.bounds()
    }

    /// Bring the display bitmap up to date and return the area that was recomposited.
    pub fn repaint(&mut self) -> Option<PixelRect> {
        let area = self.bounds().intersect(&self.dirty.take()?);
        if area.is_empty() {
            return None;
        }
        let background = imageops::crop_imm(
            &self.background,
            area.x as u32,
            area.y as u32,
            area.width as u32,
            area.height as u32,
        )
        .to_image();
        let mut canvas = self.display.save();
        canvas.intersect_clip(area);
        canvas.set_compositing(CompositingMode::SourceCopy);
        canvas.draw_image(&background, area.x, area.y);
        canvas.set_compositing(CompositingMode::SourceOver);
        self.elements.draw(&mut canvas, RenderMode::Edit);
        Some(area)
    }

    /// The composited edit view as of the last [`Surface::repaint`].
    pub fn display_image(&self) -> &RgbaImage {
        self.display.image()
    }

    /// Flatten background, elements and filters into a new bitmap.
    pub fn render(&self, mode: RenderMode) -> RgbaImage {
        self.snapshot().render(mode)
    }

    /// Owned copy of everything needed to render, for use off this thread.
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::new(self.background.clone(), self.elements.clone())
    }

    // ---------------------------------------------------------------------
    // Crate-internal access for mementos and interaction
    // ---------------------------------------------------------------------

    /// Run `f` on a container, invalidating it before and after.
    pub(crate) fn with_container<R>(
        &mut self,
        id: ContainerId,
        f: impl FnOnce(&mut DrawableContainer) -> R,
    ) -> EditorResult<R> {
        let surface = self.bounds();
        let container = self.elements.get_mut(id).ok_or(EditorError::UnknownContainer(id))?;
        container.invalidate(&mut self.dirty, surface);
        let result = f(container);
        container.invalidate(&mut self.dirty, surface);
        Ok(result)
    }

    pub(crate) fn field_set(&self, owner: FieldOwner) -> EditorResult<&FieldSet> {
        let id = owner.container();
        let container = self.elements.get(id).ok_or(EditorError::UnknownContainer(id))?;
        match owner {
            FieldOwner::Container(_) => Ok(container.fields()),
            FieldOwner::Filter { index, .. } => container
                .filters()
                .get(index)
                .map(Filter::fields)
                .ok_or(EditorError::UnknownFilter { container: id, index }),
        }
    }

    /// Set a field without recording history; returns the old value.
    pub(crate) fn write_field(&mut self, owner: FieldOwner, field_type: FieldType, value: FieldValue) -> EditorResult<FieldValue> {
        let id = owner.container();
        let (key, old) = self.with_container(id, |container| -> EditorResult<_> {
            let fields = match owner {
                FieldOwner::Container(_) => container.fields_mut(),
                FieldOwner::Filter { index, .. } => container
                    .filters_mut()
                    .get_mut(index)
                    .map(Filter::fields_mut)
                    .ok_or(EditorError::UnknownFilter { container: id, index })?,
            };
            let key = fields.key(field_type).ok_or(EditorError::UnknownField(field_type))?;
            let old = fields.set(field_type, value.clone())?;
            if field_type == FieldType::FontSize {
                container.relayout_text();
            }
            Ok((key, old))
        })??;
        self.events.emit(EditorEvent::FieldChanged { owner, key, value });
        Ok(old)
    }

    /// Take a container out of the list, keeping its selection flag.
    pub(crate) fn take_container(&mut self, id: ContainerId) -> EditorResult<(usize, DrawableContainer)> {
        let (index, container) = self.elements.remove(id)?;
        let surface = self.bounds();
        container.invalidate(&mut self.dirty, surface);
        self.events.emit(EditorEvent::ElementsRemoved(vec![id]));
        if container.is_selected() {
            self.events.emit(EditorEvent::SelectionChanged(self.elements.selected_ids()));
        }
        Ok((index, container))
    }

    pub(crate) fn put_container(&mut self, index: usize, container: DrawableContainer) -> EditorResult<()> {
        let id = container.id();
        let selected = container.is_selected();
        let surface = self.bounds();
        container.invalidate(&mut self.dirty, surface);
        self.elements.insert(index, container)?;
        self.events.emit(EditorEvent::ElementsAdded(vec![id]));
        if selected {
            self.events.emit(EditorEvent::SelectionChanged(self.elements.selected_ids()));
        }
        Ok(())
    }

    /// Swap in a new background and move every container onto it.
    ///
    /// Containers listed in `geometry` get that exact placement back; all
    /// others are mapped through `matrix`. Returns the old background and the
    /// placements that were replaced.
    pub(crate) fn replace_background(
        &mut self,
        image: RgbaImage,
        matrix: &Matrix,
        geometry: &[(ContainerId, Geometry)],
    ) -> (RgbaImage, Vec<(ContainerId, Geometry)>) {
        let old = std::mem::replace(&mut self.background, image);
        let mut replaced = Vec::with_capacity(self.elements.len());
        for container in self.elements.iter_mut() {
            replaced.push((container.id(), container.geometry()));
            match geometry.iter().find(|(id, _)| *id == container.id()) {
                Some((_, saved)) => container.set_geometry(*saved),
                None => container.transform(matrix),
            }
        }
        self.display = Canvas::new(self.background.clone());
        self.dirty = DirtyRegion::default();
        self.invalidate();
        self.events.emit(EditorEvent::BackgroundChanged { width: self.width(), height: self.height() });
        (old, replaced)
    }

    pub(crate) fn mark_modified(&mut self) {
        self.modified = true;
        self.events.emit(EditorEvent::Modified);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::factory;
    use image::Rgba;

    fn surface() -> Surface {
        let config = EditorConfig { remember_field_values: false, ..EditorConfig::default() };
        Surface::new(RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255])), config)
    }

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_min_size(Pos2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_repaint_consumes_dirty_region() {
        let mut surface = surface();
        assert_eq!(surface.repaint(), Some(PixelRect::new(0, 0, 100, 100)));
        assert_eq!(surface.repaint(), None);

        let container = factory::create_rectangle(rect(10.0, 10.0, 20.0, 20.0), surface.config());
        surface.add_element(container, true).unwrap();
        let area = surface.repaint().unwrap();
        assert!(area.contains(10, 10) && area.contains(29, 29));
        assert_eq!(surface.display_image().get_pixel(10, 10), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_add_rejects_duplicates_atomically() {
        let mut surface = surface();
        let a = factory::create_rectangle(rect(0.0, 0.0, 5.0, 5.0), surface.config());
        let result = surface.add_elements(vec![a.clone(), a], true);
        assert!(matches!(result, Err(EditorError::DuplicateContainer(_))));
        assert!(surface.elements().is_empty());
        assert!(!surface.can_undo());
    }

    #[test]
    fn test_unchanged_field_value_records_nothing() {
        let mut surface = surface();
        let container = factory::create_rectangle(rect(0.0, 0.0, 5.0, 5.0), surface.config());
        let id = surface.add_element(container, false).unwrap();
        let current = surface.field_value(FieldOwner::Container(id), FieldType::LineThickness).unwrap().clone();
        surface.set_field_value(FieldOwner::Container(id), FieldType::LineThickness, current).unwrap();
        assert!(!surface.can_undo());
    }
}
