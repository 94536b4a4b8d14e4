//! Pre-transport report types.
//!
//! The transport layer is out of scope here; these types are the neutral
//! JSON shape it serializes, carrying either the transform or a structured
//! failure with the attempted/kept counts.

use serde::{Deserialize, Serialize};

use crate::correspondence::CorrespondenceError;
use crate::mapping::{GroundMapping, MappingError};

/// Batch bookkeeping attached to every report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsSummary {
    /// Survey entries the pipeline attempted.
    pub attempted: usize,
    /// Correspondences that survived filtering.
    pub kept: usize,
}

/// Outcome of one mapping request, ready for serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MappingReport {
    pub success: bool,
    /// Row-major camera-to-ground transform, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<[[f64; 3]; 3]>,
    /// Number of point pairs handed to the estimator, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_used: Option<usize>,
    /// Failure reason, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_summary: Option<PointsSummary>,
}

impl MappingReport {
    pub fn from_outcome(outcome: &Result<GroundMapping, MappingError>) -> Self {
        match outcome {
            Ok(mapping) => Self::success(mapping),
            Err(err) => Self::failure(err),
        }
    }

    pub fn success(mapping: &GroundMapping) -> Self {
        Self {
            success: true,
            transform: Some(mapping.transform.to_array()),
            points_used: Some(mapping.correspondences.len()),
            error: None,
            points_summary: Some(PointsSummary {
                attempted: mapping.correspondences.attempted,
                kept: mapping.correspondences.len(),
            }),
        }
    }

    pub fn failure(err: &MappingError) -> Self {
        let points_summary = match err {
            MappingError::InsufficientCorrespondences(
                CorrespondenceError::InsufficientCorrespondences { attempted, kept, .. },
            ) => Some(PointsSummary {
                attempted: *attempted,
                kept: *kept,
            }),
            _ => None,
        };
        Self {
            success: false,
            transform: None,
            points_used: None,
            error: Some(err.to_string()),
            points_summary,
        }
    }
}
