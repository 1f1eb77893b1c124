//! Reversible records of single mutations.
//!
//! A [`Memento`] is captured before the mutation it guards and holds only the
//! state needed to put things back. [`Memento::restore`] consumes it, applies
//! that state to the surface and returns a new memento describing what it
//! just replaced, so redo is the undo of the undo. Mementos refer to
//! containers by id; a container that was removed and re-added is found again
//! under the same id.

mod history;

use egui::{Pos2, Vec2};
use image::RgbaImage;
use log::debug;

use crate::element::{ContainerId, DrawableContainer, DrawableContainerList, Geometry};
use crate::error::{EditorError, EditorResult};
use crate::field::{FieldKey, FieldOwner, FieldValue};
use crate::filter::Filter;
use crate::geometry::Matrix;
use crate::surface::Surface;

pub use history::UndoHistory;

/// Location and size of one container at capture time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsSnapshot {
    pub id: ContainerId,
    pub location: Pos2,
    pub size: Vec2,
}

impl BoundsSnapshot {
    pub fn capture(container: &DrawableContainer) -> Self {
        Self { id: container.id(), location: container.location(), size: container.size() }
    }
}

/// A container taken out of the list, with the index it had.
#[derive(Debug, Clone)]
pub struct RemovedContainer {
    pub index: usize,
    pub container: DrawableContainer,
}

#[derive(Debug, Clone)]
pub enum Memento {
    /// Old bounds of one or more containers
    Bounds { bounds: Vec<BoundsSnapshot> },
    /// Old value of one field. Changing the prepared filter also rebuilds the
    /// owner's filters, so that change keeps the old filter list as well.
    Field {
        owner: FieldOwner,
        key: FieldKey,
        value: FieldValue,
        filters: Option<Vec<Filter>>,
    },
    Text { container: ContainerId, text: String },
    Target { container: ContainerId, target: Pos2 },
    /// Containers that were added; restoring removes them again
    AddElements { ids: Vec<ContainerId> },
    /// Containers that were removed, in removal order; restoring re-inserts them
    DeleteElements { removed: Vec<RemovedContainer> },
    /// Old filter list of one container
    Filters { container: ContainerId, filters: Vec<Filter> },
    /// Old background plus the matrix that maps containers back onto it.
    /// The exact old placements are kept too, so repeated round trips never drift.
    Background {
        image: RgbaImage,
        matrix: Matrix,
        inverse: Matrix,
        geometry: Vec<(ContainerId, Geometry)>,
    },
}

impl Memento {
    /// Old bounds of every container in `ids`, in that order.
    pub fn bounds_of(elements: &DrawableContainerList, ids: &[ContainerId]) -> EditorResult<Self> {
        let bounds = ids
            .iter()
            .map(|id| elements.get(*id).map(BoundsSnapshot::capture).ok_or(EditorError::UnknownContainer(*id)))
            .collect::<EditorResult<Vec<_>>>()?;
        Ok(Memento::Bounds { bounds })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Memento::Bounds { .. } => "bounds",
            Memento::Field { .. } => "field",
            Memento::Text { .. } => "text",
            Memento::Target { .. } => "target",
            Memento::AddElements { .. } => "add elements",
            Memento::DeleteElements { .. } => "delete elements",
            Memento::Filters { .. } => "filters",
            Memento::Background { .. } => "background",
        }
    }

    /// Whether `other`, recorded right after this one, continues the same edit.
    ///
    /// A `true` answer means the history keeps `self` (the oldest state of the
    /// run) and drops `other`, so one undo reverts the whole drag or edit.
    pub fn merge(&self, other: &Memento) -> bool {
        match (self, other) {
            (Memento::Bounds { bounds: mine }, Memento::Bounds { bounds: theirs }) => {
                let mine: Vec<_> = mine.iter().map(|b| b.id).collect();
                let theirs: Vec<_> = theirs.iter().map(|b| b.id).collect();
                DrawableContainerList::same_containers(&mine, &theirs)
            }
            (Memento::Field { owner, key, .. }, Memento::Field { owner: other_owner, key: other_key, .. }) => {
                owner == other_owner && key == other_key
            }
            (Memento::Text { container, .. }, Memento::Text { container: other, .. })
            | (Memento::Target { container, .. }, Memento::Target { container: other, .. }) => container == other,
            _ => false,
        }
    }

    /// Fail with the error [`Memento::restore`] would hit, without touching the surface.
    ///
    /// A restore that gets past this check changes every container it names,
    /// so a failing memento never leaves a half-restored surface behind.
    pub fn check(&self, surface: &Surface) -> EditorResult<()> {
        let elements = surface.elements();
        let present = |id: ContainerId| {
            if elements.contains(id) { Ok(()) } else { Err(EditorError::UnknownContainer(id)) }
        };
        match self {
            Memento::Bounds { bounds } => bounds.iter().try_for_each(|snapshot| present(snapshot.id)),
            Memento::Field { owner, key, .. } => {
                let fields = surface.field_set(*owner)?;
                fields.key(key.field_type).map(|_| ()).ok_or(EditorError::UnknownField(key.field_type))
            }
            Memento::Text { container, .. } => match elements.get(*container) {
                Some(c) if c.text().is_some() => Ok(()),
                Some(_) => Err(EditorError::NoText(*container)),
                None => Err(EditorError::UnknownContainer(*container)),
            },
            Memento::Target { container, .. } => match elements.get(*container) {
                Some(c) if c.target().is_some() => Ok(()),
                Some(_) => Err(EditorError::NoTarget(*container)),
                None => Err(EditorError::UnknownContainer(*container)),
            },
            Memento::AddElements { ids } => ids.iter().try_for_each(|id| present(*id)),
            Memento::DeleteElements { removed } => removed.iter().try_for_each(|r| {
                let id = r.container.id();
                if elements.contains(id) { Err(EditorError::DuplicateContainer(id)) } else { Ok(()) }
            }),
            Memento::Filters { container, .. } => present(*container),
            Memento::Background { .. } => Ok(()),
        }
    }

    /// Put the captured state back and return the memento that undoes this restore.
    ///
    /// Every touched container is invalidated before and after the change and
    /// the surface is marked modified.
    pub fn restore(self, surface: &mut Surface) -> EditorResult<Memento> {
        debug!("restoring {} memento", self.name());
        let inverse = match self {
            Memento::Bounds { bounds } => {
                let mut replaced = Vec::with_capacity(bounds.len());
                for snapshot in bounds {
                    let current = surface.with_container(snapshot.id, |container| {
                        let current = BoundsSnapshot::capture(container);
                        container.set_location_size(snapshot.location, snapshot.size);
                        current
                    })?;
                    replaced.push(current);
                }
                Memento::Bounds { bounds: replaced }
            }
            Memento::Field { owner, key, value, filters } => {
                let value = surface.write_field(owner, key.field_type, value)?;
                let filters = match filters {
                    Some(filters) => Some(surface.with_container(owner.container(), |c| c.replace_filters(filters))?),
                    None => None,
                };
                Memento::Field { owner, key, value, filters }
            }
            Memento::Text { container, text } => {
                let text = surface
                    .with_container(container, |c| c.set_text(text))?
                    .ok_or(EditorError::NoText(container))?;
                Memento::Text { container, text }
            }
            Memento::Target { container, target } => {
                let target = surface
                    .with_container(container, |c| c.set_target(target))?
                    .ok_or(EditorError::NoTarget(container))?;
                Memento::Target { container, target }
            }
            Memento::AddElements { ids } => {
                let mut removed = Vec::with_capacity(ids.len());
                for id in ids {
                    let (index, container) = surface.take_container(id)?;
                    removed.push(RemovedContainer { index, container });
                }
                Memento::DeleteElements { removed }
            }
            Memento::DeleteElements { removed } => {
                let ids: Vec<ContainerId> = removed.iter().map(|r| r.container.id()).collect();
                for RemovedContainer { index, container } in removed.into_iter().rev() {
                    surface.put_container(index, container)?;
                }
                Memento::AddElements { ids }
            }
            Memento::Filters { container, filters } => {
                let filters = surface.with_container(container, |c| c.replace_filters(filters))?;
                Memento::Filters { container, filters }
            }
            Memento::Background { image, matrix, inverse, geometry } => {
                let (image, geometry) = surface.replace_background(image, &matrix, &geometry);
                Memento::Background { image, matrix: inverse, inverse: matrix, geometry }
            }
        };
        surface.mark_modified();
        Ok(inverse)
    }
}
