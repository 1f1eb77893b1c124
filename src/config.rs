use egui::Color32;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::element::MIN_ELEMENT_SIZE;
use crate::field::{FieldKey, FieldValue};
use crate::persistence::PersistenceResult;

/// Defaults and tunables handed to containers and filters when they are created.
///
/// Nothing in the editor reads global state: a surface owns one config and
/// passes it down. `last_used` remembers the most recent value set for each
/// field key so the next element of the same kind starts with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub line_color: Color32,
    pub line_thickness: i32,
    pub fill_color: Color32,
    pub font_family: String,
    pub font_size: f32,
    pub blur_radius: i32,
    pub preview_quality: f32,
    pub pixel_size: i32,
    pub highlight_color: Color32,
    pub magnification_factor: i32,
    /// Edge length of an adorner handle in screen pixels
    pub adorner_size: f32,
    /// Extra slack around handles and thin elements for hit testing
    pub hit_tolerance: f32,
    pub min_element_size: f32,
    pub remember_field_values: bool,
    pub last_used: BTreeMap<String, FieldValue>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            line_color: Color32::RED,
            line_thickness: 2,
            fill_color: Color32::TRANSPARENT,
            font_family: "Sans".to_string(),
            font_size: 16.0,
            blur_radius: 3,
            preview_quality: 1.0,
            pixel_size: 5,
            highlight_color: Color32::YELLOW,
            magnification_factor: 2,
            adorner_size: 8.0,
            hit_tolerance: 2.0,
            min_element_size: MIN_ELEMENT_SIZE,
            remember_field_values: true,
            last_used: BTreeMap::new(),
        }
    }
}

impl EditorConfig {
    pub fn load(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> PersistenceResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Starting value for a newly declared field.
    pub fn field_default(&self, key: FieldKey, fallback: FieldValue) -> FieldValue {
        if self.remember_field_values {
            if let Some(value) = self.last_used.get(&key.to_string()) {
                if value.same_kind(&fallback) {
                    return value.clone();
                }
            }
        }
        fallback
    }

    pub fn remember(&mut self, key: FieldKey, value: &FieldValue) {
        if self.remember_field_values {
            self.last_used.insert(key.to_string(), value.clone());
        }
    }
}
