//! Pixel effects applied over a bounded part of the canvas.
//!
//! Every filter follows the same contract: work out the apply rect (the part
//! of `rect` inside the bitmap, or everything outside `rect` when inverted),
//! do nothing when it is empty, and never write a pixel outside it. The clip
//! and compositing changes a filter makes are undone by a [`StateGuard`]
//! even when the pass bails out early.
//!
//! [`StateGuard`]: crate::canvas::StateGuard

mod blur;
mod highlight;
mod magnify;
mod pixelize;

use egui::Color32;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::canvas::{Canvas, CompositingMode};
use crate::config::EditorConfig;
use crate::error::FilterError;
use crate::field::{FieldScope, FieldSet, FieldType, FieldValue};
use crate::geometry::PixelRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    Blur,
    Pixelize,
    Highlight,
    Magnify,
}

impl FilterKind {
    pub fn scope(&self) -> FieldScope {
        match self {
            FilterKind::Blur => FieldScope::BlurFilter,
            FilterKind::Pixelize => FieldScope::PixelizeFilter,
            FilterKind::Highlight => FieldScope::HighlightFilter,
            FilterKind::Magnify => FieldScope::MagnifyFilter,
        }
    }
}

/// Whether a pass is for the interactive editor or for the final export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Edit,
    Export,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    kind: FilterKind,
    fields: FieldSet,
    invert: bool,
}

impl Filter {
    pub fn new(kind: FilterKind, invert: bool, config: &EditorConfig) -> Self {
        let scope = kind.scope();
        let mut fields = FieldSet::new();
        match kind {
            FilterKind::Blur => {
                fields.declare(config, scope, FieldType::BlurRadius, FieldValue::Int(config.blur_radius));
                fields.declare(config, scope, FieldType::PreviewQuality, FieldValue::Float(config.preview_quality));
            }
            FilterKind::Pixelize => {
                fields.declare(config, scope, FieldType::PixelSize, FieldValue::Int(config.pixel_size));
            }
            FilterKind::Highlight => {
                fields.declare(config, scope, FieldType::FillColor, FieldValue::Color(config.highlight_color));
            }
            FilterKind::Magnify => {
                fields.declare(
                    config,
                    scope,
                    FieldType::MagnificationFactor,
                    FieldValue::Int(config.magnification_factor),
                );
            }
        }
        Self { kind, fields, invert }
    }

    pub fn blur(radius: i32) -> Self {
        Self::with_value(FilterKind::Blur, FieldType::BlurRadius, FieldValue::Int(radius))
    }

    pub fn pixelize(pixel_size: i32) -> Self {
        Self::with_value(FilterKind::Pixelize, FieldType::PixelSize, FieldValue::Int(pixel_size))
    }

    pub fn highlight(color: Color32) -> Self {
        Self::with_value(FilterKind::Highlight, FieldType::FillColor, FieldValue::Color(color))
    }

    pub fn magnify(factor: i32) -> Self {
        Self::with_value(FilterKind::Magnify, FieldType::MagnificationFactor, FieldValue::Int(factor))
    }

    fn with_value(kind: FilterKind, field_type: FieldType, value: FieldValue) -> Self {
        let config = EditorConfig { remember_field_values: false, ..EditorConfig::default() };
        let mut filter = Self::new(kind, false, &config);
        if let Err(err) = filter.fields.set(field_type, value) {
            warn!("{kind:?} filter: {err}");
        }
        filter
    }

    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn invert(&self) -> bool {
        self.invert
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }

    /// Run this filter over `rect` of the canvas.
    ///
    /// A failing pass is logged and leaves the canvas as it was: every filter
    /// computes its output off to the side and only draws it once complete.
    pub fn apply(&self, canvas: &mut Canvas, rect: PixelRect, mode: RenderMode) {
        let rect = rect.normalize();
        let apply_rect = apply_rect(canvas.bounds(), rect, self.invert);
        if apply_rect.is_empty() {
            return;
        }

        let mut canvas = canvas.save();
        canvas.intersect_clip(apply_rect);
        if self.invert {
            canvas.exclude_clip(rect);
        }
        canvas.set_compositing(CompositingMode::SourceCopy);

        let result = match self.kind {
            FilterKind::Blur => blur::apply(&mut canvas, &self.fields, apply_rect, mode),
            FilterKind::Pixelize => pixelize::apply(&mut canvas, &self.fields, apply_rect, mode),
            FilterKind::Highlight => highlight::apply(&mut canvas, &self.fields, apply_rect, mode),
            FilterKind::Magnify => magnify::apply(&mut canvas, &self.fields, apply_rect, mode),
        };
        if let Err(err) = result {
            warn!("{:?} filter skipped over {:?}: {}", self.kind, apply_rect, err);
        }
    }
}

/// The part of the bitmap a filter may touch.
///
/// For an inverted filter this is the whole bitmap (the hole is cut out by
/// the clip), unless `rect` already covers all of it.
pub fn apply_rect(bitmap: PixelRect, rect: PixelRect, invert: bool) -> PixelRect {
    let rect = rect.normalize();
    if rect.is_empty() {
        return PixelRect::EMPTY;
    }
    let inside = bitmap.intersect(&rect);
    if !invert {
        return inside;
    }
    if inside == bitmap.normalize() {
        return PixelRect::EMPTY;
    }
    bitmap.normalize()
}

fn required_int(fields: &FieldSet, field_type: FieldType) -> Result<i32, FilterError> {
    fields.int(field_type).ok_or(FilterError::MissingField(field_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_rect_clamps_to_bitmap() {
        let bitmap = PixelRect::from_size(20, 20);
        assert_eq!(apply_rect(bitmap, PixelRect::new(15, 15, 10, 10), false), PixelRect::new(15, 15, 5, 5));
    }

    #[test]
    fn test_inverted_apply_rect_is_whole_bitmap() {
        let bitmap = PixelRect::from_size(20, 20);
        assert_eq!(apply_rect(bitmap, PixelRect::new(5, 5, 5, 5), true), bitmap);
    }

    #[test]
    fn test_inverted_rect_covering_bitmap_is_empty() {
        let bitmap = PixelRect::from_size(20, 20);
        assert!(apply_rect(bitmap, PixelRect::new(-5, -5, 40, 40), true).is_empty());
    }

    #[test]
    fn test_zero_area_rect_is_empty_even_when_inverted() {
        let bitmap = PixelRect::from_size(20, 20);
        assert!(apply_rect(bitmap, PixelRect::new(5, 5, 0, 8), true).is_empty());
    }
}
