use crate::element::ContainerId;
use crate::field::{FieldKey, FieldOwner, FieldValue};

/// Change notifications broadcast by a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ElementsAdded(Vec<ContainerId>),
    ElementsRemoved(Vec<ContainerId>),
    FieldChanged {
        owner: FieldOwner,
        key: FieldKey,
        value: FieldValue,
    },
    /// The ids selected after the change
    SelectionChanged(Vec<ContainerId>),
    BackgroundChanged {
        width: u32,
        height: u32,
    },
    /// The surface now differs from what was last saved or exported
    Modified,
}
