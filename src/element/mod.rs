//! Placed annotation elements and the ordered list that owns them.
//!
//! Every element is a [`DrawableContainer`]: one struct holding geometry,
//! fields and filters, with the per-kind data in [`ContainerKind`]. Kind
//! specific behavior (which fields exist, how it rasterizes, how it is hit)
//! dispatches on that enum.

mod common;
mod draw;
mod list;
mod text;

use egui::{Pos2, Rect, Vec2};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::adorner::{Adorner, AdornerKind, Position};
use crate::canvas::Canvas;
use crate::config::EditorConfig;
use crate::field::{Alignment, ArrowHeads, FieldScope, FieldSet, FieldType, FieldValue, PreparedFilter};
use crate::filter::{Filter, FilterKind, RenderMode};
use crate::geometry::hit_testing::{distance_to_line_segment, is_point_in_bounds};
use crate::geometry::{DirtyRegion, Matrix, PixelRect, normalized, rect_from_location_size};

pub use common::{Flip, MIN_ELEMENT_SIZE};
pub use list::DrawableContainerList;
pub use text::TextContent;

/// Stable identity of a container. Mementos and adorners refer to containers by id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(Uuid);

impl ContainerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Interaction state shared by containers and their adorners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EditStatus {
    /// Still being drawn; not part of history yet
    Undrawn,
    #[default]
    Idle,
    Moving,
    Resizing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContainerKind {
    Rectangle,
    Ellipse,
    Line { flip: Flip },
    Arrow { flip: Flip },
    Text(TextContent),
    SpeechBubble { text: TextContent, target: Pos2 },
    /// Filter container over text or an area; its filters come from the prepared filter field
    Highlight,
    /// Filter container hiding what is below it
    Obfuscate,
}

impl ContainerKind {
    pub fn scope(&self) -> FieldScope {
        match self {
            ContainerKind::Rectangle => FieldScope::Rectangle,
            ContainerKind::Ellipse => FieldScope::Ellipse,
            ContainerKind::Line { .. } => FieldScope::Line,
            ContainerKind::Arrow { .. } => FieldScope::Arrow,
            ContainerKind::Text(_) => FieldScope::Text,
            ContainerKind::SpeechBubble { .. } => FieldScope::SpeechBubble,
            ContainerKind::Highlight => FieldScope::Highlight,
            ContainerKind::Obfuscate => FieldScope::Obfuscate,
        }
    }

    fn flip(&self) -> Option<Flip> {
        match self {
            ContainerKind::Line { flip } | ContainerKind::Arrow { flip } => Some(*flip),
            _ => None,
        }
    }

    fn text_content(&self) -> Option<&TextContent> {
        match self {
            ContainerKind::Text(text) | ContainerKind::SpeechBubble { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Everything about a container's placement that a background transform changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub location: Pos2,
    pub size: Vec2,
    pub flip: Option<Flip>,
    pub target: Option<Pos2>,
}

/// A single placed element.
///
/// `location` and `size` always describe a normalized rect (`size` is never
/// negative). Line-like kinds remember their direction in a [`Flip`].
/// Equality is identity: two containers are equal when their ids are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawableContainer {
    id: ContainerId,
    kind: ContainerKind,
    location: Pos2,
    size: Vec2,
    fields: FieldSet,
    filters: Vec<Filter>,
    #[serde(skip)]
    selected: bool,
    #[serde(skip)]
    status: EditStatus,
    #[serde(skip)]
    adorners: Vec<Adorner>,
}

impl PartialEq for DrawableContainer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DrawableContainer {}

impl DrawableContainer {
    pub fn new(kind: ContainerKind, bounds: Rect, config: &EditorConfig) -> Self {
        let fields = declare_fields(&kind, config);
        let mut container = Self {
            id: ContainerId::new(),
            kind,
            location: Pos2::ZERO,
            size: Vec2::ZERO,
            fields,
            filters: Vec::new(),
            selected: false,
            status: EditStatus::Idle,
            adorners: Vec::new(),
        };
        container.configure_prepared_filters(config);
        container.draw_to(bounds.min, bounds.max);
        container.restore_transient();
        container
    }

    /// A container that the user is still drawing, starting as a point at `origin`.
    pub fn undrawn(kind: ContainerKind, origin: Pos2, config: &EditorConfig) -> Self {
        let mut container = Self::new(kind, Rect::from_min_max(origin, origin), config);
        container.set_status(EditStatus::Undrawn);
        container
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub(crate) fn regenerate_id(&mut self) {
        self.id = ContainerId::new();
    }

    pub fn kind(&self) -> &ContainerKind {
        &self.kind
    }

    pub fn location(&self) -> Pos2 {
        self.location
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn bounds(&self) -> Rect {
        rect_from_location_size(self.location, self.size)
    }

    /// Area touched when this container is painted, including line width, arrow heads and tails.
    pub fn draw_bounds(&self) -> Rect {
        let thickness = self.line_thickness().max(0) as f32;
        let mut rect = self.bounds();
        if let Some(target) = self.target() {
            rect.extend_with(target);
        }
        let margin = match self.kind {
            ContainerKind::Arrow { .. } => draw::arrow_head_length(thickness),
            _ => thickness / 2.0,
        };
        rect.expand(margin + 1.0)
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub(crate) fn filters_mut(&mut self) -> &mut Vec<Filter> {
        &mut self.filters
    }

    /// Swap in a whole filter list, returning the previous one.
    pub(crate) fn replace_filters(&mut self, filters: Vec<Filter>) -> Vec<Filter> {
        std::mem::replace(&mut self.filters, filters)
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn status(&self) -> EditStatus {
        self.status
    }

    /// Update the container's status. Leaving `Undrawn` wakes its adorners up.
    pub(crate) fn set_status(&mut self, status: EditStatus) {
        let was_undrawn = self.status == EditStatus::Undrawn;
        self.status = status;
        if status == EditStatus::Undrawn {
            self.adorners.iter_mut().for_each(|adorner| adorner.set_status(EditStatus::Undrawn));
        } else if was_undrawn {
            self.adorners.iter_mut().for_each(|adorner| adorner.set_status(EditStatus::Idle));
        }
    }

    pub fn line_thickness(&self) -> i32 {
        self.fields.int(FieldType::LineThickness).unwrap_or(0)
    }

    /// Set location and size from `bounds`.
    ///
    /// An inverted rect is normalized; for lines and arrows it reverses the
    /// direction along the inverted axis. Callers that want the change to be
    /// undoable go through the surface, which records a bounds memento first.
    pub fn apply_bounds(&mut self, bounds: Rect) {
        let flip = Flip::of(&bounds);
        if let ContainerKind::Line { flip: current } | ContainerKind::Arrow { flip: current } = &mut self.kind {
            current.x ^= flip.x;
            current.y ^= flip.y;
        }
        self.set_normalized_bounds(bounds);
    }

    /// Span the container from `start` to `end`, as when it is drawn.
    pub fn draw_to(&mut self, start: Pos2, end: Pos2) {
        let bounds = Rect::from_min_max(start, end);
        if let ContainerKind::Line { flip } | ContainerKind::Arrow { flip } = &mut self.kind {
            *flip = Flip::of(&bounds);
        }
        self.set_normalized_bounds(bounds);
    }

    pub fn geometry(&self) -> Geometry {
        Geometry { location: self.location, size: self.size, flip: self.kind.flip(), target: self.target() }
    }

    /// Put back a placement captured with [`DrawableContainer::geometry`], bit for bit.
    pub(crate) fn set_geometry(&mut self, geometry: Geometry) {
        if let (Some(saved), ContainerKind::Line { flip } | ContainerKind::Arrow { flip }) = (geometry.flip, &mut self.kind) {
            *flip = saved;
        }
        if let (Some(saved), ContainerKind::SpeechBubble { target, .. }) = (geometry.target, &mut self.kind) {
            *target = saved;
        }
        self.set_location_size(geometry.location, geometry.size);
    }

    /// Put back a location and size captured earlier, bit for bit.
    pub(crate) fn set_location_size(&mut self, location: Pos2, size: Vec2) {
        self.location = location;
        self.size = size.max(Vec2::ZERO);
        self.relayout_text();
    }

    fn set_normalized_bounds(&mut self, bounds: Rect) {
        let bounds = normalized(bounds);
        self.location = bounds.min;
        self.size = bounds.size();
        self.relayout_text();
    }

    /// Whether a freshly drawn container is big enough to keep.
    pub fn is_large_enough(&self, min_size: f32) -> bool {
        match self.endpoints() {
            Some((start, end)) => start.distance(end) >= min_size,
            None => common::is_large_enough(&self.bounds(), min_size),
        }
    }

    /// Start and end point, for lines and arrows.
    pub fn endpoints(&self) -> Option<(Pos2, Pos2)> {
        self.kind.flip().map(|flip| flip.endpoints(self.bounds()))
    }

    /// Mark the painted area dirty. Has no effect on history.
    ///
    /// An inverted filter paints everything outside the container, so then
    /// the whole `surface` is dirty.
    pub fn invalidate(&self, dirty: &mut DirtyRegion, surface: PixelRect) {
        if self.filters.iter().any(Filter::invert) {
            dirty.add_pixels(surface);
        } else {
            dirty.add(self.draw_bounds());
        }
    }

    pub fn hit_test(&self, point: Pos2, tolerance: f32) -> bool {
        let reach = self.line_thickness().max(1) as f32 / 2.0 + tolerance;
        match &self.kind {
            ContainerKind::Line { .. } | ContainerKind::Arrow { .. } => self
                .endpoints()
                .is_some_and(|(start, end)| distance_to_line_segment(point, start, end) <= reach),
            ContainerKind::Ellipse => {
                let bounds = self.bounds().expand(tolerance);
                let radius = bounds.size() / 2.0;
                if radius.x <= 0.0 || radius.y <= 0.0 {
                    return false;
                }
                let d = point - bounds.center();
                (d.x / radius.x).powi(2) + (d.y / radius.y).powi(2) <= 1.0
            }
            _ => is_point_in_bounds(point, self.bounds(), tolerance),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.kind.text_content().map(TextContent::text)
    }

    /// Replace the text and re-run its layout; returns the old text, or `None` for kinds without text.
    pub(crate) fn set_text(&mut self, new_text: impl Into<String>) -> Option<String> {
        let width = self.size.x;
        let font_size = self.font_size();
        match &mut self.kind {
            ContainerKind::Text(text) | ContainerKind::SpeechBubble { text, .. } => {
                Some(text.set_text(new_text.into(), width, font_size))
            }
            _ => None,
        }
    }

    pub fn text_lines(&self) -> &[String] {
        self.kind.text_content().map(TextContent::lines).unwrap_or_default()
    }

    pub fn font_size(&self) -> f32 {
        self.fields.float(FieldType::FontSize).unwrap_or(12.0)
    }

    pub(crate) fn relayout_text(&mut self) {
        let width = self.size.x;
        let font_size = self.font_size();
        if let ContainerKind::Text(text) | ContainerKind::SpeechBubble { text, .. } = &mut self.kind {
            text.relayout(width, font_size);
        }
    }

    pub fn target(&self) -> Option<Pos2> {
        match &self.kind {
            ContainerKind::SpeechBubble { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Move the target point; returns the old one, or `None` when this kind has no target.
    pub(crate) fn set_target(&mut self, point: Pos2) -> Option<Pos2> {
        match &mut self.kind {
            ContainerKind::SpeechBubble { target, .. } => Some(std::mem::replace(target, point)),
            _ => None,
        }
    }

    /// Map the container through `matrix`, as when the background is cropped or rotated.
    pub fn transform(&mut self, matrix: &Matrix) {
        if let Some((start, end)) = self.endpoints() {
            self.draw_to(matrix.transform_point(start), matrix.transform_point(end));
        } else {
            self.set_normalized_bounds(matrix.transform_rect(self.bounds()));
        }
        if let ContainerKind::SpeechBubble { target, .. } = &mut self.kind {
            *target = matrix.transform_point(*target);
        }
    }

    /// Rebuild the filter list from the prepared filter field, if this kind has one.
    pub(crate) fn configure_prepared_filters(&mut self, config: &EditorConfig) {
        let Some(prepared) = self.fields.get(FieldType::PreparedFilter).and_then(FieldValue::as_prepared_filter) else {
            return;
        };
        self.filters = match prepared {
            PreparedFilter::TextHighlight => vec![Filter::new(FilterKind::Highlight, false, config)],
            PreparedFilter::AreaHighlight => vec![
                Filter::new(FilterKind::Highlight, true, config),
                Filter::new(FilterKind::Blur, true, config),
            ],
            PreparedFilter::Magnification => vec![Filter::new(FilterKind::Magnify, false, config)],
            PreparedFilter::Blur => vec![Filter::new(FilterKind::Blur, false, config)],
            PreparedFilter::Pixelize => vec![Filter::new(FilterKind::Pixelize, false, config)],
        };
        debug!("container {} now uses {:?} filters", self.id, prepared);
    }

    /// Paint this container: its filters over its bounds, then its own content.
    ///
    /// Filters are skipped in edit mode while the container is being drawn or
    /// dragged, so interaction stays responsive.
    pub fn draw(&self, canvas: &mut Canvas, mode: RenderMode) {
        let manipulating = self.status != EditStatus::Idle;
        if !(mode == RenderMode::Edit && manipulating) {
            let rect = PixelRect::enclosing(self.bounds());
            for filter in &self.filters {
                filter.apply(canvas, rect, mode);
            }
        }
        draw::draw_content(self, canvas);
    }

    pub fn adorners(&self) -> &[Adorner] {
        &self.adorners
    }

    pub(crate) fn adorner_mut(&mut self, index: usize) -> Option<&mut Adorner> {
        self.adorners.get_mut(index)
    }

    /// Index of the first adorner under `point`.
    pub fn adorner_at(&self, point: Pos2, size: f32, tolerance: f32) -> Option<usize> {
        self.adorners.iter().position(|adorner| adorner.hit_test(self, point, size, tolerance))
    }

    /// Rebuild state that is not serialized: adorners and text layout.
    pub(crate) fn restore_transient(&mut self) {
        let status = if self.status == EditStatus::Undrawn { EditStatus::Undrawn } else { EditStatus::Idle };
        let mut adorners: Vec<Adorner> = Position::ALL
            .iter()
            .map(|position| Adorner::new(AdornerKind::Resize(*position), status))
            .collect();
        if self.target().is_some() {
            adorners.push(Adorner::new(AdornerKind::Target, status));
        }
        self.adorners = adorners;
        self.relayout_text();
    }
}

fn declare_fields(kind: &ContainerKind, config: &EditorConfig) -> FieldSet {
    let scope = kind.scope();
    let mut fields = FieldSet::new();
    let mut declare = |field_type, fallback| fields.declare(config, scope, field_type, fallback);
    match kind {
        ContainerKind::Rectangle | ContainerKind::Ellipse => {
            declare(FieldType::LineThickness, FieldValue::Int(config.line_thickness));
            declare(FieldType::LineColor, FieldValue::Color(config.line_color));
            declare(FieldType::FillColor, FieldValue::Color(config.fill_color));
        }
        ContainerKind::Line { .. } => {
            declare(FieldType::LineThickness, FieldValue::Int(config.line_thickness));
            declare(FieldType::LineColor, FieldValue::Color(config.line_color));
        }
        ContainerKind::Arrow { .. } => {
            declare(FieldType::LineThickness, FieldValue::Int(config.line_thickness));
            declare(FieldType::LineColor, FieldValue::Color(config.line_color));
            declare(FieldType::ArrowHeads, FieldValue::ArrowHeads(ArrowHeads::End));
        }
        ContainerKind::Text(_) | ContainerKind::SpeechBubble { .. } => {
            declare(FieldType::LineThickness, FieldValue::Int(config.line_thickness));
            declare(FieldType::LineColor, FieldValue::Color(config.line_color));
            declare(FieldType::FillColor, FieldValue::Color(config.fill_color));
            declare(FieldType::FontFamily, FieldValue::Text(config.font_family.clone()));
            declare(FieldType::FontSize, FieldValue::Float(config.font_size));
            declare(FieldType::FontBold, FieldValue::Bool(false));
            declare(FieldType::FontItalic, FieldValue::Bool(false));
            declare(FieldType::HorizontalAlignment, FieldValue::Alignment(Alignment::Center));
            declare(FieldType::VerticalAlignment, FieldValue::Alignment(Alignment::Center));
        }
        ContainerKind::Highlight => {
            declare(FieldType::LineThickness, FieldValue::Int(0));
            declare(FieldType::LineColor, FieldValue::Color(config.line_color));
            declare(FieldType::PreparedFilter, FieldValue::PreparedFilter(PreparedFilter::TextHighlight));
        }
        ContainerKind::Obfuscate => {
            declare(FieldType::LineThickness, FieldValue::Int(0));
            declare(FieldType::LineColor, FieldValue::Color(config.line_color));
            declare(FieldType::PreparedFilter, FieldValue::PreparedFilter(PreparedFilter::Pixelize));
        }
    }
    fields
}

/// Factory functions for creating containers
pub mod factory {
    use super::*;

    pub fn create_rectangle(bounds: Rect, config: &EditorConfig) -> DrawableContainer {
        DrawableContainer::new(ContainerKind::Rectangle, bounds, config)
    }

    pub fn create_ellipse(bounds: Rect, config: &EditorConfig) -> DrawableContainer {
        DrawableContainer::new(ContainerKind::Ellipse, bounds, config)
    }

    pub fn create_line(start: Pos2, end: Pos2, config: &EditorConfig) -> DrawableContainer {
        DrawableContainer::new(ContainerKind::Line { flip: Flip::default() }, Rect::from_min_max(start, end), config)
    }

    pub fn create_arrow(start: Pos2, end: Pos2, config: &EditorConfig) -> DrawableContainer {
        DrawableContainer::new(ContainerKind::Arrow { flip: Flip::default() }, Rect::from_min_max(start, end), config)
    }

    pub fn create_text(bounds: Rect, text: &str, config: &EditorConfig) -> DrawableContainer {
        DrawableContainer::new(ContainerKind::Text(TextContent::new(text)), bounds, config)
    }

    pub fn create_speech_bubble(bounds: Rect, text: &str, target: Pos2, config: &EditorConfig) -> DrawableContainer {
        DrawableContainer::new(ContainerKind::SpeechBubble { text: TextContent::new(text), target }, bounds, config)
    }

    pub fn create_highlight(bounds: Rect, config: &EditorConfig) -> DrawableContainer {
        DrawableContainer::new(ContainerKind::Highlight, bounds, config)
    }

    pub fn create_obfuscate(bounds: Rect, config: &EditorConfig) -> DrawableContainer {
        DrawableContainer::new(ContainerKind::Obfuscate, bounds, config)
    }
}
