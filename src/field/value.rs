use egui::Color32;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrowHeads {
    None,
    Start,
    End,
    Both,
}

/// Preset filter stacks a filter container can be switched between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreparedFilter {
    Blur,
    Pixelize,
    TextHighlight,
    AreaHighlight,
    Magnification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    Color(Color32),
    Text(String),
    ArrowHeads(ArrowHeads),
    PreparedFilter(PreparedFilter),
    Alignment(Alignment),
}

impl FieldValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color32> {
        match self {
            FieldValue::Color(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_arrow_heads(&self) -> Option<ArrowHeads> {
        match self {
            FieldValue::ArrowHeads(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_prepared_filter(&self) -> Option<PreparedFilter> {
        match self {
            FieldValue::PreparedFilter(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_alignment(&self) -> Option<Alignment> {
        match self {
            FieldValue::Alignment(v) => Some(*v),
            _ => None,
        }
    }

    /// True when both values are the same variant, whatever they hold.
    pub fn same_kind(&self, other: &FieldValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}
