use serde::{Deserialize, Serialize};

use super::{FieldKey, FieldScope, FieldType, FieldValue};
use crate::config::EditorConfig;
use crate::error::EditorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub key: FieldKey,
    pub value: FieldValue,
}

/// The ordered set of fields a single container or filter declares.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSet {
    fields: Vec<Field>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declare a field, taking its starting value from the config when it has one.
    pub fn declare(&mut self, config: &EditorConfig, scope: FieldScope, field_type: FieldType, fallback: FieldValue) {
        let key = FieldKey::new(scope, field_type);
        let value = config.field_default(key, fallback);
        match self.fields.iter_mut().find(|f| f.key.field_type == field_type) {
            Some(existing) => *existing = Field { key, value },
            None => self.fields.push(Field { key, value }),
        }
    }

    pub fn has(&self, field_type: FieldType) -> bool {
        self.fields.iter().any(|f| f.key.field_type == field_type)
    }

    pub fn key(&self, field_type: FieldType) -> Option<FieldKey> {
        self.fields.iter().find(|f| f.key.field_type == field_type).map(|f| f.key)
    }

    pub fn get(&self, field_type: FieldType) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.key.field_type == field_type).map(|f| &f.value)
    }

    /// Replace a value and hand back the previous one.
    pub fn set(&mut self, field_type: FieldType, value: FieldValue) -> Result<FieldValue, EditorError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.key.field_type == field_type)
            .ok_or(EditorError::UnknownField(field_type))?;
        debug_assert!(field.value.same_kind(&value), "field {} set to a different kind of value", field.key);
        Ok(std::mem::replace(&mut field.value, value))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn int(&self, field_type: FieldType) -> Option<i32> {
        self.get(field_type).and_then(FieldValue::as_int)
    }

    pub fn float(&self, field_type: FieldType) -> Option<f32> {
        self.get(field_type).and_then(FieldValue::as_float)
    }

    pub fn bool(&self, field_type: FieldType) -> Option<bool> {
        self.get(field_type).and_then(FieldValue::as_bool)
    }

    pub fn color(&self, field_type: FieldType) -> Option<egui::Color32> {
        self.get(field_type).and_then(FieldValue::as_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Color32;

    fn rectangle_fields() -> FieldSet {
        let config = EditorConfig::default();
        let mut fields = FieldSet::new();
        fields.declare(&config, FieldScope::Rectangle, FieldType::LineThickness, FieldValue::Int(2));
        fields.declare(&config, FieldScope::Rectangle, FieldType::LineColor, FieldValue::Color(Color32::RED));
        fields
    }

    #[test]
    fn test_set_returns_old_value() {
        let mut fields = rectangle_fields();
        let old = fields.set(FieldType::LineThickness, FieldValue::Int(7)).unwrap();
        assert_eq!(old, FieldValue::Int(2));
        assert_eq!(fields.int(FieldType::LineThickness), Some(7));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut fields = rectangle_fields();
        assert!(fields.set(FieldType::PixelSize, FieldValue::Int(3)).is_err());
        assert!(fields.get(FieldType::PixelSize).is_none());
    }

    #[test]
    fn test_key_carries_declaring_scope() {
        let fields = rectangle_fields();
        let key = fields.key(FieldType::LineColor).unwrap();
        assert_eq!(key.scope, FieldScope::Rectangle);
    }
}
