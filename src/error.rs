use thiserror::Error;

use crate::element::ContainerId;
use crate::field::FieldType;
use crate::geometry::PixelRect;

/// Errors returned by surface operations.
///
/// These all describe a caller asking for something the model cannot do
/// (an id it does not own, a field a container never declared). None of them
/// leave the surface half-modified.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("container {0} is not part of this surface")]
    UnknownContainer(ContainerId),

    #[error("container {0} is already part of this surface")]
    DuplicateContainer(ContainerId),

    #[error("field {0:?} is not declared by its owner")]
    UnknownField(FieldType),

    #[error("container {container} has no filter at index {index}")]
    UnknownFilter { container: ContainerId, index: usize },

    #[error("container {0} has no target point")]
    NoTarget(ContainerId),

    #[error("container {0} does not hold text")]
    NoText(ContainerId),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("crop rectangle {0:?} does not overlap the image")]
    InvalidCrop(PixelRect),

    #[error("transform cannot be inverted")]
    SingularTransform,

    #[error("surface is no longer available")]
    SurfaceGone,
}

/// Failures inside a single filter pass. They never escape [`crate::filter::Filter::apply`].
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("filter field missing: {0:?}")]
    MissingField(FieldType),

    #[error("could not build a {width}x{height} pixel buffer")]
    Buffer { width: u32, height: u32 },
}

/// Result type for surface operations
pub type EditorResult<T> = Result<T, EditorError>;
