use egui::{Pos2, Rect};
use serde::{Deserialize, Serialize};

use super::{ContainerId, DrawableContainer};
use crate::canvas::Canvas;
use crate::error::{EditorError, EditorResult};
use crate::filter::RenderMode;

/// The elements of one surface in paint order (last is topmost).
///
/// Ids are unique within a list; inserting a container whose id is already
/// present is rejected. Selection is the `selected` flag of each member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawableContainerList {
    containers: Vec<DrawableContainer>,
}

impl DrawableContainerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DrawableContainer> {
        self.containers.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut DrawableContainer> {
        self.containers.iter_mut()
    }

    pub fn get(&self, id: ContainerId) -> Option<&DrawableContainer> {
        self.containers.iter().find(|c| c.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: ContainerId) -> Option<&mut DrawableContainer> {
        self.containers.iter_mut().find(|c| c.id() == id)
    }

    pub fn index_of(&self, id: ContainerId) -> Option<usize> {
        self.containers.iter().position(|c| c.id() == id)
    }

    pub fn contains(&self, id: ContainerId) -> bool {
        self.index_of(id).is_some()
    }

    /// Append on top of everything else.
    pub fn push(&mut self, container: DrawableContainer) -> EditorResult<()> {
        let index = self.containers.len();
        self.insert(index, container)
    }

    /// Insert at `index` (clamped to the end of the list).
    pub fn insert(&mut self, index: usize, container: DrawableContainer) -> EditorResult<()> {
        if self.contains(container.id()) {
            return Err(EditorError::DuplicateContainer(container.id()));
        }
        let index = index.min(self.containers.len());
        self.containers.insert(index, container);
        Ok(())
    }

    /// Take a container out, returning the index it had.
    pub fn remove(&mut self, id: ContainerId) -> EditorResult<(usize, DrawableContainer)> {
        let index = self.index_of(id).ok_or(EditorError::UnknownContainer(id))?;
        Ok((index, self.containers.remove(index)))
    }

    pub fn ids(&self) -> Vec<ContainerId> {
        self.containers.iter().map(DrawableContainer::id).collect()
    }

    pub fn selected_ids(&self) -> Vec<ContainerId> {
        self.containers.iter().filter(|c| c.is_selected()).map(DrawableContainer::id).collect()
    }

    pub fn has_selection(&self) -> bool {
        self.containers.iter().any(DrawableContainer::is_selected)
    }

    /// Returns whether the selection changed.
    pub fn select(&mut self, id: ContainerId) -> EditorResult<bool> {
        let container = self.get_mut(id).ok_or(EditorError::UnknownContainer(id))?;
        let changed = !container.is_selected();
        container.set_selected(true);
        Ok(changed)
    }

    pub fn deselect(&mut self, id: ContainerId) -> EditorResult<bool> {
        let container = self.get_mut(id).ok_or(EditorError::UnknownContainer(id))?;
        let changed = container.is_selected();
        container.set_selected(false);
        Ok(changed)
    }

    /// Clear the selection, returning the ids that were selected.
    pub fn deselect_all(&mut self) -> Vec<ContainerId> {
        let mut cleared = Vec::new();
        for container in self.containers.iter_mut().filter(|c| c.is_selected()) {
            container.set_selected(false);
            cleared.push(container.id());
        }
        cleared
    }

    /// Topmost container hit by `point`.
    pub fn topmost_at(&self, point: Pos2, tolerance: f32) -> Option<ContainerId> {
        self.containers.iter().rev().find(|c| c.hit_test(point, tolerance)).map(DrawableContainer::id)
    }

    /// Union of the given containers' bounds; unknown ids are skipped.
    pub fn bounds_of(&self, ids: &[ContainerId]) -> Rect {
        ids.iter()
            .filter_map(|id| self.get(*id))
            .fold(Rect::NOTHING, |acc, c| acc.union(c.bounds()))
    }

    /// Whether two id lists name the same set of containers.
    ///
    /// Bounds mementos use this to decide whether a new change continues
    /// the drag they describe.
    pub fn same_containers(a: &[ContainerId], b: &[ContainerId]) -> bool {
        a.len() == b.len() && a.iter().all(|id| b.contains(id))
    }

    /// Paint every container in z-order.
    pub fn draw(&self, canvas: &mut Canvas, mode: RenderMode) {
        for container in &self.containers {
            container.draw(canvas, mode);
        }
    }

    pub(crate) fn into_vec(self) -> Vec<DrawableContainer> {
        self.containers
    }
}

impl From<Vec<DrawableContainer>> for DrawableContainerList {
    fn from(containers: Vec<DrawableContainer>) -> Self {
        Self { containers }
    }
}
