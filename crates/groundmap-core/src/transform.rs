use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::point::{GroundPoint, PixelPoint};

/// Projective mapping from the (undistorted) camera plane to the ground
/// plane.
///
/// This is a value type only: estimating the transform from
/// correspondences is the job of an external solver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanarTransform {
    pub h: Matrix3<f64>,
}

impl PlanarTransform {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    /// Build from row-major nested arrays, the wire representation.
    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    /// Map a corrected camera pixel to the ground plane.
    #[inline]
    pub fn apply(&self, p: PixelPoint) -> GroundPoint {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        GroundPoint::new(v[0] / v[2], v[1] / v[2])
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}
