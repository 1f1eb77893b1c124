#![warn(clippy::all, rust_2018_idioms)]

pub mod adorner;
pub mod app;
pub mod canvas;
pub mod config;
pub mod element;
pub mod error;
pub mod event;
pub mod field;
pub mod filter;
pub mod geometry;
pub mod memento;
pub mod persistence;
pub mod surface;

pub use app::EditorApp;
pub use canvas::Canvas;
pub use config::EditorConfig;
pub use element::{ContainerId, ContainerKind, DrawableContainer, DrawableContainerList, EditStatus};
pub use error::{EditorError, EditorResult};
pub use event::{EditorEvent, EventHandler};
pub use field::{FieldOwner, FieldType, FieldValue};
pub use filter::{Filter, RenderMode};
pub use memento::{Memento, UndoHistory};
pub use surface::{DrawingMode, SharedSurface, Surface};
