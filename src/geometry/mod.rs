//! Rectangle, point and matrix helpers shared by every other module.
//!
//! Container geometry lives in floating point (`egui::Rect`), pixel work in
//! integer [`PixelRect`]s. [`Matrix`] is the affine transform used when the
//! whole surface is cropped or rotated.

mod bounds;
pub mod hit_testing;
mod matrix;

pub use bounds::{DirtyRegion, PixelRect, normalized, rect_from_location_size};
pub use matrix::Matrix;
