//! Builds filtered correspondence lists out of raw survey entries.

use groundmap_core::{CameraModel, GroundPoint, PixelPoint, UndistortParams};
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::survey::SurveyEntry;

/// A planar transform needs at least this many independent point pairs.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Controls for one correspondence-building pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildParams {
    /// Minimum number of surviving correspondences.
    pub min_correspondences: usize,
    /// Iteration budget for per-point undistortion.
    pub undistort: UndistortParams,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            min_correspondences: MIN_CORRESPONDENCES,
            undistort: UndistortParams::default(),
        }
    }
}

/// Two equal-length, order-matched point lists ready for transform
/// estimation, plus the per-batch bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceSet {
    /// Undistorted camera points, in input order.
    pub camera: Vec<PixelPoint>,
    /// Ground points matched to `camera` by position.
    pub ground: Vec<GroundPoint>,
    /// Number of entries the builder attempted.
    pub attempted: usize,
    /// Input indices of entries whose undistortion did not converge.
    pub dropped: Vec<usize>,
}

impl CorrespondenceSet {
    /// Number of surviving correspondences.
    #[inline]
    pub fn len(&self) -> usize {
        self.camera.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.camera.is_empty()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CorrespondenceError {
    #[error("only {kept} of {attempted} survey point(s) were calibratable (minimum {min})")]
    InsufficientCorrespondences {
        attempted: usize,
        kept: usize,
        min: usize,
    },
}

/// Undistort every entry's camera point and collect the survivors.
///
/// A point whose undistortion fails to converge is dropped together with
/// its ground point; the rest of the batch continues. Relative input order
/// is preserved. Fails only when fewer than `params.min_correspondences`
/// entries survive.
///
/// With the `rayon` feature the per-entry undistortion runs in parallel;
/// assembly stays sequential, so ordering is identical to the serial path.
pub fn build_correspondences(
    model: &CameraModel,
    entries: &[SurveyEntry],
    params: &BuildParams,
) -> Result<CorrespondenceSet, CorrespondenceError> {
    #[cfg(feature = "rayon")]
    let corrected: Vec<Option<PixelPoint>> = entries
        .par_iter()
        .map(|entry| model.undistort_with(entry.camera, &params.undistort))
        .collect();

    #[cfg(not(feature = "rayon"))]
    let corrected: Vec<Option<PixelPoint>> = entries
        .iter()
        .map(|entry| model.undistort_with(entry.camera, &params.undistort))
        .collect();

    let mut set = CorrespondenceSet {
        attempted: entries.len(),
        ..CorrespondenceSet::default()
    };

    for (index, (entry, corrected)) in entries.iter().zip(corrected).enumerate() {
        match corrected {
            Some(camera) => {
                set.camera.push(camera);
                set.ground.push(entry.ground);
            }
            None => {
                warn!(
                    "dropping survey point {index}: undistortion failed for ({:.2}, {:.2})",
                    entry.camera.x, entry.camera.y
                );
                set.dropped.push(index);
            }
        }
    }

    info!(
        "correspondence build kept {}/{} point pair(s)",
        set.len(),
        set.attempted
    );

    if set.len() < params.min_correspondences {
        return Err(CorrespondenceError::InsufficientCorrespondences {
            attempted: set.attempted,
            kept: set.len(),
            min: params.min_correspondences,
        });
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundmap_core::{CameraIntrinsics, DistortionCoefficients};

    fn strong_radial_model() -> CameraModel {
        CameraModel::new(
            CameraIntrinsics {
                fx: 1000.0,
                fy: 1000.0,
                cx: 500.0,
                cy: 500.0,
                skew: 0.0,
            },
            DistortionCoefficients {
                k1: 50.0,
                ..DistortionCoefficients::default()
            },
        )
        .unwrap()
    }

    fn entry(px: f64, py: f64, gx: f64, gy: f64) -> SurveyEntry {
        SurveyEntry {
            camera: PixelPoint::new(px, py),
            ground: GroundPoint::new(gx, gy),
        }
    }

    #[test]
    fn one_divergent_point_in_five_leaves_four() {
        let entries = vec![
            entry(510.0, 500.0, 1.0, 0.0),
            entry(500.0, 510.0, 0.0, 1.0),
            // Far off-axis under strong distortion: does not converge.
            entry(2500.0, 500.0, 9.0, 9.0),
            entry(490.0, 500.0, -1.0, 0.0),
            entry(500.0, 490.0, 0.0, -1.0),
        ];

        let set =
            build_correspondences(&strong_radial_model(), &entries, &BuildParams::default())
                .expect("four survivors meet the minimum");

        assert_eq!(set.attempted, 5);
        assert_eq!(set.len(), 4);
        assert_eq!(set.dropped, vec![2]);
        // Survivors keep their relative input order.
        assert_eq!(set.ground[0], GroundPoint::new(1.0, 0.0));
        assert_eq!(set.ground[2], GroundPoint::new(-1.0, 0.0));
    }

    #[test]
    fn three_survivors_are_not_enough() {
        let entries = vec![
            entry(510.0, 500.0, 1.0, 0.0),
            entry(500.0, 510.0, 0.0, 1.0),
            entry(490.0, 500.0, -1.0, 0.0),
        ];

        let err =
            build_correspondences(&strong_radial_model(), &entries, &BuildParams::default())
                .unwrap_err();
        assert_eq!(
            err,
            CorrespondenceError::InsufficientCorrespondences {
                attempted: 3,
                kept: 3,
                min: MIN_CORRESPONDENCES,
            }
        );
    }

    #[test]
    fn minimum_is_configurable() {
        let entries = vec![entry(510.0, 500.0, 1.0, 0.0)];
        let params = BuildParams {
            min_correspondences: 1,
            ..BuildParams::default()
        };
        let set = build_correspondences(&strong_radial_model(), &entries, &params).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.dropped.is_empty());
    }
}
