//! Seam to the external planar-transform estimator.
//!
//! The robust solver itself lives outside this crate; here it is an opaque
//! collaborator consuming two parallel point lists.

use groundmap_core::{GroundPoint, PixelPoint, PlanarTransform};

/// Failure reported by an external estimator, relayed unmodified.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("planar transform estimation failed: {0}")]
pub struct EstimationError(pub String);

/// An external planar-transform solver.
///
/// Implementations receive two equal-length, order-matched lists of at
/// least [`MIN_CORRESPONDENCES`](crate::MIN_CORRESPONDENCES) pairs and
/// return the camera-to-ground transform or a failure.
pub trait PlanarMapEstimator {
    fn estimate(
        &self,
        camera: &[PixelPoint],
        ground: &[GroundPoint],
    ) -> Result<PlanarTransform, EstimationError>;
}

/// Any plain function over the two point lists is an estimator.
impl<F> PlanarMapEstimator for F
where
    F: Fn(&[PixelPoint], &[GroundPoint]) -> Result<PlanarTransform, EstimationError>,
{
    fn estimate(
        &self,
        camera: &[PixelPoint],
        ground: &[GroundPoint],
    ) -> Result<PlanarTransform, EstimationError> {
        self(camera, ground)
    }
}
