//! Validated camera model: pinhole intrinsics plus Brown-Conrady
//! distortion, with iterative undistortion of pixel coordinates.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{check_document, read_field, CalibrationConfigError, CALIBRATION_KEY};
use crate::point::{NormalizedPoint, PixelPoint};
use crate::FOCAL_EPSILON;

/// Pinhole intrinsic parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length along x, in pixels.
    pub fx: f64,
    /// Focal length along y, in pixels.
    pub fy: f64,
    /// Principal point x.
    pub cx: f64,
    /// Principal point y.
    pub cy: f64,
    /// Axis coupling coefficient.
    pub skew: f64,
}

/// Brown-Conrady distortion coefficients: three radial terms (polynomial
/// in squared radius) and two tangential terms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DistortionCoefficients {
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub p1: f64,
    pub p2: f64,
}

/// Iteration control for [`CameraModel::undistort_with`].
///
/// The defaults reproduce the reference behavior: at most 100 iterations
/// and an absolute per-axis tolerance of 1e-7 in normalized-plane units.
/// A stricter stepper (e.g. a Newton step on the distortion map) can be
/// swapped in behind the same contract by tightening these.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UndistortParams {
    /// Hard ceiling on fixed-point iterations.
    pub max_iterations: u32,
    /// Absolute convergence threshold on the x axis.
    pub threshold_x: f64,
    /// Absolute convergence threshold on the y axis.
    pub threshold_y: f64,
}

impl Default for UndistortParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            threshold_x: 1e-7,
            threshold_y: 1e-7,
        }
    }
}

/// Immutable, validated camera model.
///
/// Construction goes through a validating factory: a value of this type
/// always satisfies `|fx| >= FOCAL_EPSILON` and `|fy| >= FOCAL_EPSILON`,
/// checked once and relied upon by every geometric operation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraModel {
    intrinsics: CameraIntrinsics,
    distortion: DistortionCoefficients,
}

impl CameraModel {
    /// Build a model from already-parsed parameters.
    ///
    /// Fails with [`CalibrationConfigError::DegenerateFocalLength`] if
    /// either focal length is too close to zero.
    pub fn new(
        intrinsics: CameraIntrinsics,
        distortion: DistortionCoefficients,
    ) -> Result<Self, CalibrationConfigError> {
        for (name, value) in [("fx", intrinsics.fx), ("fy", intrinsics.fy)] {
            if value.abs() < FOCAL_EPSILON {
                return Err(CalibrationConfigError::DegenerateFocalLength { name, value });
            }
        }
        Ok(Self {
            intrinsics,
            distortion,
        })
    }

    /// Build a model from an untyped configuration document.
    ///
    /// Runs the full document checks first, then reads the ten fields. A
    /// field that passed the numeric type check but does not coerce falls
    /// back to 0.0 instead of failing the parse.
    pub fn from_document(doc: &Value) -> Result<Self, CalibrationConfigError> {
        check_document(doc)?;
        let section = doc
            .get(CALIBRATION_KEY)
            .ok_or(CalibrationConfigError::MissingSection)?;

        let intrinsics = CameraIntrinsics {
            fx: read_field(section, "fx"),
            fy: read_field(section, "fy"),
            cx: read_field(section, "cx"),
            cy: read_field(section, "cy"),
            skew: read_field(section, "skew"),
        };
        let distortion = DistortionCoefficients {
            k1: read_field(section, "k1"),
            k2: read_field(section, "k2"),
            k3: read_field(section, "k3"),
            p1: read_field(section, "p1"),
            p2: read_field(section, "p2"),
        };

        Self::new(intrinsics, distortion)
    }

    #[inline]
    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    #[inline]
    pub fn distortion(&self) -> &DistortionCoefficients {
        &self.distortion
    }

    /// Convert a pixel coordinate to the focal-plane-normalized plane.
    pub fn normalize(&self, pt: PixelPoint) -> NormalizedPoint {
        let c = &self.intrinsics;
        // y first; the skew correction of x uses it.
        let ny = (pt.y - c.cy) / c.fy;
        let nx = (pt.x - c.cx) / c.fx - c.skew * ny;
        NormalizedPoint::new(nx, ny)
    }

    /// Exact algebraic inverse of [`CameraModel::normalize`].
    pub fn denormalize(&self, pt: NormalizedPoint) -> PixelPoint {
        let c = &self.intrinsics;
        let px = c.fx * (pt.x + c.skew * pt.y) + c.cx;
        let py = c.fy * pt.y + c.cy;
        PixelPoint::new(px, py)
    }

    /// Apply the forward distortion model to an undistorted normalized
    /// coordinate.
    ///
    /// This map has no general closed-form inverse; see
    /// [`CameraModel::undistort`] for the iterative inversion.
    pub fn distort(&self, pt: NormalizedPoint) -> NormalizedPoint {
        let d = &self.distortion;
        let (x, y) = (pt.x, pt.y);
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        let radial = 1.0 + d.k1 * r2 + d.k2 * r4 + d.k3 * r6;
        let tan_x = 2.0 * d.p1 * x * y + d.p2 * (r2 + 2.0 * x * x);
        let tan_y = d.p1 * (r2 + 2.0 * y * y) + 2.0 * d.p2 * x * y;

        NormalizedPoint::new(radial * x + tan_x, radial * y + tan_y)
    }

    /// Undistort a pixel coordinate with the default iteration budget.
    pub fn undistort(&self, pt: PixelPoint) -> Option<PixelPoint> {
        self.undistort_with(pt, &UndistortParams::default())
    }

    /// Undistort a pixel coordinate by iteratively inverting the
    /// distortion map.
    ///
    /// Successive substitution: starting from the observed distorted
    /// normalized coordinate, each step subtracts the residual of the
    /// forward model. Converges only for sufficiently small distortion;
    /// divergence is reported as `None`, never masked.
    pub fn undistort_with(&self, pt: PixelPoint, params: &UndistortParams) -> Option<PixelPoint> {
        // Observed distorted coordinate on the normalized plane.
        let target = self.normalize(pt);

        // Small-distortion initial guess.
        let mut estimate = target;

        for _ in 0..params.max_iterations {
            let distorted = self.distort(estimate);
            let err_x = distorted.x - target.x;
            let err_y = distorted.y - target.y;

            estimate.x -= err_x;
            estimate.y -= err_y;

            // Both axes must satisfy the bound in the same iteration.
            if err_x.abs() < params.threshold_x && err_y.abs() < params.threshold_y {
                return Some(self.denormalize(estimate));
            }
        }

        warn!(
            "undistortion did not converge within {} iterations for ({:.2}, {:.2})",
            params.max_iterations, pt.x, pt.y
        );
        None
    }
}
