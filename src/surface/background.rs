use image::imageops;
use log::{debug, info};

use super::Surface;
use crate::error::{EditorError, EditorResult};
use crate::geometry::{Matrix, PixelRect};
use crate::memento::Memento;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Clockwise,
    CounterClockwise,
}

impl Surface {
    /// Cut the background down to `rect` and shift every container with it.
    ///
    /// Cropping to the whole image does nothing; a rect that misses the image is rejected.
    pub fn crop(&mut self, rect: PixelRect) -> EditorResult<()> {
        let area = self.bounds().intersect(&rect);
        if area.is_empty() {
            return Err(EditorError::InvalidCrop(rect));
        }
        if area == self.bounds() {
            debug!("crop covers the whole image, nothing to do");
            return Ok(());
        }
        info!("✂️ crop to {area:?}");
        let image = imageops::crop_imm(&self.background, area.x as u32, area.y as u32, area.width as u32, area.height as u32)
            .to_image();
        let matrix = Matrix::translation(-(area.x as f32), -(area.y as f32));
        self.change_background(image, matrix)
    }

    /// Turn the background a quarter and every container along with it.
    pub fn rotate(&mut self, direction: RotateDirection) -> EditorResult<()> {
        info!("🔄 rotate {direction:?}");
        let (image, matrix) = match direction {
            RotateDirection::Clockwise => (
                imageops::rotate90(&self.background),
                Matrix::rotate_clockwise(self.height() as f32),
            ),
            RotateDirection::CounterClockwise => (
                imageops::rotate270(&self.background),
                Matrix::rotate_counter_clockwise(self.width() as f32),
            ),
        };
        self.change_background(image, matrix)
    }

    /// Swap the background as one undoable step; `matrix` maps old coordinates onto the new image.
    fn change_background(&mut self, image: image::RgbaImage, matrix: Matrix) -> EditorResult<()> {
        let inverse = matrix.invert().ok_or(EditorError::SingularTransform)?;
        let (old, geometry) = self.replace_background(image, &matrix, &[]);
        self.history.record(Memento::Background { image: old, matrix: inverse, inverse: matrix, geometry }, false);
        self.mark_modified();
        Ok(())
    }
}
