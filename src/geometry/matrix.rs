use egui::{Pos2, Rect};
use serde::{Deserialize, Serialize};

/// Affine transform in homogeneous form.
///
/// Only the first two rows carry data; the last row is always `[0, 0, 1]`.
/// Crops and quarter turns build their matrices from exact integer entries,
/// so applying a matrix and then its inverse gives back the same floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix(pub [[f32; 3]; 3]);

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    pub fn translation(dx: f32, dy: f32) -> Self {
        Matrix([[1.0, 0.0, dx], [0.0, 1.0, dy], [0.0, 0.0, 1.0]])
    }

    /// Quarter turn clockwise of an image that was `height` pixels tall.
    pub fn rotate_clockwise(height: f32) -> Self {
        Matrix([[0.0, -1.0, height], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Quarter turn counter-clockwise of an image that was `width` pixels wide.
    pub fn rotate_counter_clockwise(width: f32) -> Self {
        Matrix([[0.0, 1.0, 0.0], [-1.0, 0.0, width], [0.0, 0.0, 1.0]])
    }

    /// `self` followed by `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix(multiply_matrices(&other.0, &self.0))
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Inverse transform, `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Matrix> {
        let [[a, b, c], [d, e, f], _] = self.0;
        let det = a * e - b * d;
        if det == 0.0 {
            return None;
        }
        let ia = e / det;
        let ib = -b / det;
        let id = -d / det;
        let ie = a / det;
        let ic = -(ia * c + ib * f);
        let if_ = -(id * c + ie * f);
        Some(Matrix([[ia, ib, ic], [id, ie, if_], [0.0, 0.0, 1.0]]))
    }

    pub fn transform_point(&self, point: Pos2) -> Pos2 {
        let m = &self.0;
        Pos2::new(
            m[0][0] * point.x + m[0][1] * point.y + m[0][2],
            m[1][0] * point.x + m[1][1] * point.y + m[1][2],
        )
    }

    /// Bounding box of the transformed corners.
    pub fn transform_rect(&self, rect: Rect) -> Rect {
        Rect::from_two_pos(self.transform_point(rect.min), self.transform_point(rect.max))
    }
}

const fn const_multiply_matrices(a: &[[f32; 3]; 3], b: &[[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let mut result = [[0.0; 3]; 3];
    let mut i = 0;
    while i < 3 {
        let mut j = 0;
        while j < 3 {
            let mut k = 0;
            while k < 3 {
                result[i][j] += a[i][k] * b[k][j];
                k += 1;
            }
            j += 1;
        }
        i += 1;
    }
    result
}

fn multiply_matrices(a: &[[f32; 3]; 3], b: &[[f32; 3]; 3]) -> [[f32; 3]; 3] {
    const_multiply_matrices(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_round_trip_is_exact() {
        let rotate = Matrix::rotate_clockwise(80.0);
        let back = rotate.invert().unwrap();
        let rect = Rect::from_min_max(Pos2::new(10.0, 20.0), Pos2::new(35.5, 41.25));
        assert_eq!(back.transform_rect(rotate.transform_rect(rect)), rect);
    }

    #[test]
    fn test_clockwise_maps_top_left_to_top_right() {
        let rotate = Matrix::rotate_clockwise(50.0);
        assert_eq!(rotate.transform_point(Pos2::new(0.0, 0.0)), Pos2::new(50.0, 0.0));
    }

    #[test]
    fn test_then_composes_in_order() {
        let m = Matrix::translation(5.0, 0.0).then(&Matrix::translation(0.0, 3.0));
        assert_eq!(m.transform_point(Pos2::ZERO), Pos2::new(5.0, 3.0));
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        let m = Matrix([[0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]]);
        assert!(m.invert().is_none());
    }
}
