//! Typed, named properties attached to containers and filters.
//!
//! A field is identified by its [`FieldKey`]: the scope that declared it plus
//! its [`FieldType`]. Setting a value here never records history; the surface
//! wraps every user-facing change in a memento first.

mod set;
mod value;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::element::ContainerId;

pub use set::{Field, FieldSet};
pub use value::{Alignment, ArrowHeads, FieldValue, PreparedFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldType {
    ArrowHeads,
    BlurRadius,
    FillColor,
    FontBold,
    FontFamily,
    FontItalic,
    FontSize,
    HorizontalAlignment,
    LineColor,
    LineThickness,
    MagnificationFactor,
    PixelSize,
    PreparedFilter,
    PreviewQuality,
    VerticalAlignment,
}

/// The container or filter type that declared a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldScope {
    Rectangle,
    Ellipse,
    Line,
    Arrow,
    Text,
    SpeechBubble,
    Highlight,
    Obfuscate,
    BlurFilter,
    PixelizeFilter,
    HighlightFilter,
    MagnifyFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldKey {
    pub scope: FieldScope,
    pub field_type: FieldType,
}

impl FieldKey {
    pub const fn new(scope: FieldScope, field_type: FieldType) -> Self {
        Self { scope, field_type }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}.{:?}", self.scope, self.field_type)
    }
}

/// Who holds a field: a container, or one of the filters a container owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldOwner {
    Container(ContainerId),
    Filter { container: ContainerId, index: usize },
}

impl FieldOwner {
    pub fn container(&self) -> ContainerId {
        match self {
            FieldOwner::Container(id) => *id,
            FieldOwner::Filter { container, .. } => *container,
        }
    }
}
