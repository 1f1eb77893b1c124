//! The raster target containers and filters draw into.
//!
//! A [`Canvas`] pairs an `RgbaImage` with the current [`GraphicsState`]: a
//! clip region and a compositing mode. Code that changes the state takes a
//! [`StateGuard`] from [`Canvas::save`]; the previous state comes back when
//! the guard is dropped, including on early returns through `?`.

use egui::{Color32, Pos2};
use image::{Rgba, RgbaImage, imageops};
use std::ops::{Deref, DerefMut};
use tiny_skia::{ColorU8, FillRule, LineCap, Mask, Path, PathBuilder, PremultipliedColorU8, Stroke, Transform};

use crate::geometry::PixelRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositingMode {
    /// Blend with straight alpha over what is already there
    #[default]
    SourceOver,
    /// Replace the destination pixel
    SourceCopy,
}

/// Where drawing is allowed: inside `bounds` (everywhere when `None`) and outside every hole.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClipRegion {
    bounds: Option<PixelRect>,
    holes: Vec<PixelRect>,
}

impl ClipRegion {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn rect(rect: PixelRect) -> Self {
        Self { bounds: Some(rect.normalize()), holes: Vec::new() }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        if let Some(bounds) = &self.bounds {
            if !bounds.contains(x, y) {
                return false;
            }
        }
        !self.holes.iter().any(|hole| hole.contains(x, y))
    }

    pub fn intersect(&mut self, rect: PixelRect) {
        self.bounds = Some(match self.bounds {
            Some(bounds) => bounds.intersect(&rect),
            None => rect.normalize(),
        });
    }

    pub fn exclude(&mut self, rect: PixelRect) {
        let rect = rect.normalize();
        if !rect.is_empty() {
            self.holes.push(rect);
        }
    }

    /// Bounding box of the drawable area inside `area`.
    pub fn bounding_box(&self, area: PixelRect) -> PixelRect {
        match self.bounds {
            Some(bounds) => area.intersect(&bounds),
            None => area.normalize(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphicsState {
    pub clip: ClipRegion,
    pub compositing: CompositingMode,
}

#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
    state: GraphicsState,
}

impl Canvas {
    pub fn new(image: RgbaImage) -> Self {
        Self { image, state: GraphicsState::default() }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_size(self.image.width(), self.image.height())
    }

    /// Remember the graphics state until the returned guard is dropped.
    pub fn save(&mut self) -> StateGuard<'_> {
        let saved = self.state.clone();
        StateGuard { canvas: self, saved: Some(saved) }
    }

    pub fn state(&self) -> &GraphicsState {
        &self.state
    }

    pub fn intersect_clip(&mut self, rect: PixelRect) {
        self.state.clip.intersect(rect);
    }

    pub fn exclude_clip(&mut self, rect: PixelRect) {
        self.state.clip.exclude(rect);
    }

    pub fn set_compositing(&mut self, mode: CompositingMode) {
        self.state.compositing = mode;
    }

    /// Part of the bitmap that drawing can currently touch, as a bounding box.
    pub fn clip_bounds(&self) -> PixelRect {
        self.state.clip.bounding_box(self.bounds())
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        Some(*self.image.get_pixel(x as u32, y as u32))
    }

    /// Copy of the pixels under `rect`, clamped to the bitmap.
    pub fn copy_region(&self, rect: PixelRect) -> RgbaImage {
        let rect = self.bounds().intersect(&rect);
        imageops::crop_imm(&self.image, rect.x as u32, rect.y as u32, rect.width as u32, rect.height as u32).to_image()
    }

    /// Write one pixel, honouring the clip region and compositing mode.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if !self.bounds().contains(x, y) || !self.state.clip.contains(x, y) {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        *dst = match self.state.compositing {
            CompositingMode::SourceCopy => color,
            CompositingMode::SourceOver => blend_over(color, *dst),
        };
    }

    /// Draw `source` with its top-left corner at (`x`, `y`).
    pub fn draw_image(&mut self, source: &RgbaImage, x: i32, y: i32) {
        for (sx, sy, pixel) in source.enumerate_pixels() {
            self.put_pixel(x + sx as i32, y + sy as i32, *pixel);
        }
    }

    pub fn fill_rect(&mut self, rect: PixelRect, color: Color32) {
        let rect = self.clip_bounds().intersect(&rect);
        let color = to_rgba(color);
        if color[3] == 0 {
            return;
        }
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                self.put_pixel(x, y, color);
            }
        }
    }

    pub fn stroke_rect(&mut self, rect: PixelRect, thickness: i32, color: Color32) {
        let rect = rect.normalize();
        if thickness <= 0 || rect.is_empty() {
            return;
        }
        let t = thickness.min(rect.width).min(rect.height);
        self.fill_rect(PixelRect::new(rect.x, rect.y, rect.width, t), color);
        self.fill_rect(PixelRect::new(rect.x, rect.bottom() - t, rect.width, t), color);
        self.fill_rect(PixelRect::new(rect.x, rect.y + t, t, rect.height - 2 * t), color);
        self.fill_rect(PixelRect::new(rect.right() - t, rect.y + t, t, rect.height - 2 * t), color);
    }

    /// Fill the ellipse inscribed in `rect`; with `thickness` set, only its outline.
    pub fn draw_ellipse(&mut self, rect: PixelRect, thickness: Option<i32>, color: Color32) {
        let rect = rect.normalize();
        let Some(outer) = skia_rect(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32) else {
            return;
        };
        let mut builder = PathBuilder::new();
        builder.push_oval(outer);
        if let Some(t) = thickness {
            let t = t as f32;
            if let Some(inner) = skia_rect(outer.x() + t, outer.y() + t, outer.width() - 2.0 * t, outer.height() - 2.0 * t) {
                builder.push_oval(inner);
            }
        }
        if let Some(path) = builder.finish() {
            self.fill_path(&path, FillRule::EvenOdd, color);
        }
    }

    /// Stroke from `from` to `to` with round caps.
    pub fn draw_line(&mut self, from: Pos2, to: Pos2, thickness: f32, color: Color32) {
        if thickness <= 0.0 {
            return;
        }
        let mut builder = PathBuilder::new();
        builder.move_to(from.x, from.y);
        builder.line_to(to.x, to.y);
        let stroke = Stroke { width: thickness, line_cap: LineCap::Round, ..Stroke::default() };
        let Some(outline) = builder.finish().and_then(|path| path.stroke(&stroke, 1.0)) else {
            return;
        };
        self.fill_path(&outline, FillRule::Winding, color);
    }

    /// Even-odd fill of a closed polygon.
    pub fn fill_polygon(&mut self, points: &[Pos2], color: Color32) {
        let [first, rest @ ..] = points else {
            return;
        };
        if rest.len() < 2 {
            return;
        }
        let mut builder = PathBuilder::new();
        builder.move_to(first.x, first.y);
        for p in rest {
            builder.line_to(p.x, p.y);
        }
        builder.close();
        if let Some(path) = builder.finish() {
            self.fill_path(&path, FillRule::EvenOdd, color);
        }
    }

    /// Anti-aliased fill of `path` through the clip region.
    ///
    /// Coverage is rasterized into a mask over the visible part of the path
    /// only; fully covered pixels follow the compositing mode, edge pixels are
    /// always blended over what is there.
    fn fill_path(&mut self, path: &Path, rule: FillRule, color: Color32) {
        let color = to_rgba(color);
        if color[3] == 0 {
            return;
        }
        let reach = path.bounds();
        let reach = egui::Rect::from_min_max(Pos2::new(reach.left(), reach.top()), Pos2::new(reach.right(), reach.bottom()));
        let area = self.clip_bounds().intersect(&PixelRect::enclosing(reach));
        if area.is_empty() {
            return;
        }
        let Some(mut mask) = Mask::new(area.width as u32, area.height as u32) else {
            return;
        };
        mask.fill_path(path, rule, true, Transform::from_translate(-area.x as f32, -area.y as f32));
        let width = area.width as usize;
        for (i, coverage) in mask.data().iter().enumerate() {
            if *coverage == 0 {
                continue;
            }
            let x = area.x + (i % width) as i32;
            let y = area.y + (i / width) as i32;
            self.put_covered(x, y, color, *coverage);
        }
    }

    fn put_covered(&mut self, x: i32, y: i32, color: Rgba<u8>, coverage: u8) {
        if coverage == u8::MAX {
            self.put_pixel(x, y, color);
            return;
        }
        if !self.bounds().contains(x, y) || !self.state.clip.contains(x, y) {
            return;
        }
        let alpha = mul_div_255(color[3], coverage);
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        *dst = blend_over(Rgba([color[0], color[1], color[2], alpha]), *dst);
    }
}

/// Restores the saved [`GraphicsState`] when dropped.
pub struct StateGuard<'a> {
    canvas: &'a mut Canvas,
    saved: Option<GraphicsState>,
}

impl Deref for StateGuard<'_> {
    type Target = Canvas;

    fn deref(&self) -> &Canvas {
        &*self.canvas
    }
}

impl DerefMut for StateGuard<'_> {
    fn deref_mut(&mut self) -> &mut Canvas {
        &mut *self.canvas
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.canvas.state = saved;
        }
    }
}

pub fn to_rgba(color: Color32) -> Rgba<u8> {
    Rgba(color.to_srgba_unmultiplied())
}

/// Straight-alpha source-over, computed on premultiplied colors.
fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match src[3] {
        u8::MAX => return src,
        0 => return dst,
        _ => {}
    }
    let s = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    let d = ColorU8::from_rgba(dst[0], dst[1], dst[2], dst[3]).premultiply();
    let keep = u8::MAX - s.alpha();
    let over = |s: u8, d: u8| s + mul_div_255(d, keep);
    let blended = PremultipliedColorU8::from_rgba(
        over(s.red(), d.red()),
        over(s.green(), d.green()),
        over(s.blue(), d.blue()),
        over(s.alpha(), d.alpha()),
    );
    match blended {
        Some(color) => {
            let color = color.demultiply();
            Rgba([color.red(), color.green(), color.blue(), color.alpha()])
        }
        None => src,
    }
}

fn mul_div_255(value: u8, factor: u8) -> u8 {
    ((value as u32 * factor as u32 + 127) / 255) as u8
}

fn skia_rect(x: f32, y: f32, width: f32, height: f32) -> Option<tiny_skia::Rect> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    tiny_skia::Rect::from_xywh(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_canvas() -> Canvas {
        Canvas::new(RgbaImage::from_pixel(10, 10, Rgba([50, 50, 50, 255])))
    }

    #[test]
    fn test_guard_restores_state_on_drop() {
        let mut canvas = gray_canvas();
        {
            let mut guard = canvas.save();
            guard.intersect_clip(PixelRect::new(0, 0, 2, 2));
            guard.set_compositing(CompositingMode::SourceCopy);
            assert_eq!(guard.clip_bounds(), PixelRect::new(0, 0, 2, 2));
        }
        assert_eq!(canvas.state(), &GraphicsState::default());
    }

    #[test]
    fn test_guard_restores_state_on_early_return() {
        fn failing_pass(canvas: &mut Canvas) -> Result<(), ()> {
            let mut guard = canvas.save();
            guard.exclude_clip(PixelRect::new(0, 0, 5, 5));
            Err(())
        }
        let mut canvas = gray_canvas();
        assert!(failing_pass(&mut canvas).is_err());
        assert_eq!(canvas.state(), &GraphicsState::default());
    }

    #[test]
    fn test_excluded_hole_is_not_painted() {
        let mut canvas = gray_canvas();
        canvas.exclude_clip(PixelRect::new(2, 2, 3, 3));
        canvas.fill_rect(PixelRect::new(0, 0, 10, 10), Color32::WHITE);
        assert_eq!(canvas.pixel(3, 3), Some(Rgba([50, 50, 50, 255])));
        assert_eq!(canvas.pixel(0, 0), Some(Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_ellipse_outline_leaves_centre() {
        let mut canvas = gray_canvas();
        canvas.draw_ellipse(PixelRect::new(0, 0, 10, 10), Some(2), Color32::WHITE);
        assert_eq!(canvas.pixel(5, 5), Some(Rgba([50, 50, 50, 255])));
        assert_eq!(canvas.pixel(1, 5), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(canvas.pixel(0, 0), Some(Rgba([50, 50, 50, 255])));
    }

    #[test]
    fn test_line_edges_are_blended() {
        let mut canvas = Canvas::new(RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255])));
        canvas.draw_line(Pos2::new(0.0, 5.0), Pos2::new(10.0, 5.0), 3.0, Color32::WHITE);
        // the row under the middle of the stroke is fully covered, the edge rows half
        assert_eq!(canvas.pixel(5, 4), Some(Rgba([255, 255, 255, 255])));
        let edge = canvas.pixel(5, 3).unwrap();
        assert!(edge[0] > 0 && edge[0] < 255, "edge pixel {edge:?}");
        assert_eq!(canvas.pixel(5, 1), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_polygon_respects_clip_hole() {
        let mut canvas = gray_canvas();
        canvas.exclude_clip(PixelRect::new(0, 0, 10, 5));
        let square = [Pos2::new(0.0, 0.0), Pos2::new(10.0, 0.0), Pos2::new(10.0, 10.0), Pos2::new(0.0, 10.0)];
        canvas.fill_polygon(&square, Color32::WHITE);
        assert_eq!(canvas.pixel(5, 2), Some(Rgba([50, 50, 50, 255])));
        assert_eq!(canvas.pixel(5, 7), Some(Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_half_transparent_blend() {
        let mut canvas = Canvas::new(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255])));
        canvas.put_pixel(0, 0, Rgba([200, 100, 0, 128]));
        let pixel = canvas.pixel(0, 0).unwrap();
        assert_eq!(pixel[3], 255);
        assert!((pixel[0] as i32 - 100).abs() <= 1);
    }
}
