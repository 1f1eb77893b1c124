//! Saving and loading the editable element list as JSON.
//!
//! Only the element model is stored: geometry, field values, filters with
//! their fields, and z-order. The background bitmap is the capture source's
//! business. Transient state (selection, adorners, text layout) is rebuilt
//! when a document is loaded into a surface.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::element::{ContainerId, DrawableContainerList};
use crate::error::EditorError;
use crate::surface::Surface;

/// Errors that can occur while saving or loading documents and config
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize document: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to read or write file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Could not add loaded elements: {0}")]
    Editor(#[from] EditorError),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// What goes into a saved file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDocument {
    /// Version of the application that wrote the file
    pub version: String,
    /// Seconds since the UNIX epoch
    pub timestamp: u64,
    pub elements: DrawableContainerList,
}

impl ElementDocument {
    pub fn new(elements: DrawableContainerList) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self { version: env!("CARGO_PKG_VERSION").to_string(), timestamp, elements }
    }
}

pub fn save_elements(elements: &DrawableContainerList) -> PersistenceResult<String> {
    Ok(serde_json::to_string_pretty(&ElementDocument::new(elements.clone()))?)
}

pub fn load_elements(json: &str) -> PersistenceResult<DrawableContainerList> {
    let document: ElementDocument = serde_json::from_str(json)?;
    if document.version != env!("CARGO_PKG_VERSION") {
        warn!("document version {} differs from {}", document.version, env!("CARGO_PKG_VERSION"));
    }
    Ok(document.elements)
}

pub fn save_to_path(elements: &DrawableContainerList, path: impl AsRef<Path>) -> PersistenceResult<()> {
    let path = path.as_ref();
    fs::write(path, save_elements(elements)?)?;
    info!("💾 saved {} element(s) to {}", elements.len(), path.display());
    Ok(())
}

pub fn load_from_path(path: impl AsRef<Path>) -> PersistenceResult<DrawableContainerList> {
    let path = path.as_ref();
    let elements = load_elements(&fs::read_to_string(path)?)?;
    info!("📂 read {} element(s) from {}", elements.len(), path.display());
    Ok(elements)
}

impl Surface {
    pub fn save_elements(&self) -> PersistenceResult<String> {
        save_elements(self.elements())
    }

    /// Parse a saved document and add its elements as one undoable step.
    pub fn load_elements_from_str(&mut self, json: &str) -> PersistenceResult<Vec<ContainerId>> {
        let elements = load_elements(json)?;
        Ok(self.load_elements(elements, true)?)
    }
}
