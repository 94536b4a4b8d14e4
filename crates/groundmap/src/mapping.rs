//! End-to-end mapping pipeline: configuration document + survey batch in,
//! planar transform out.

use groundmap_core::{CalibrationConfigError, CameraModel, PlanarTransform};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::correspondence::{build_correspondences, BuildParams, CorrespondenceError, CorrespondenceSet};
use crate::estimator::{EstimationError, PlanarMapEstimator};
use crate::survey::{extract_entries, MalformedCoordPolicy, SurveyError, SurveyLayout};

/// Knobs for one mapping request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MappingParams {
    pub layout: SurveyLayout,
    pub build: BuildParams,
    pub malformed: MalformedCoordPolicy,
}

/// Successful mapping outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundMapping {
    /// Camera-to-ground transform returned by the external estimator.
    pub transform: PlanarTransform,
    /// The correspondences it was estimated from.
    pub correspondences: CorrespondenceSet,
}

/// Structured pipeline failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error(transparent)]
    InvalidConfiguration(#[from] CalibrationConfigError),
    #[error(transparent)]
    Survey(#[from] SurveyError),
    #[error(transparent)]
    InsufficientCorrespondences(#[from] CorrespondenceError),
    #[error(transparent)]
    Estimation(#[from] EstimationError),
}

/// Run the full pipeline for one request.
///
/// Constructs a fresh camera model from the configuration document,
/// extracts the survey entries, builds the filtered correspondence lists
/// and, only if enough pairs survive, invokes the external estimator. The
/// estimator's result or failure is relayed unmodified.
pub fn solve_ground_mapping<E>(
    config: &Value,
    survey: &Value,
    estimator: &E,
    params: &MappingParams,
) -> Result<GroundMapping, MappingError>
where
    E: PlanarMapEstimator + ?Sized,
{
    let model = CameraModel::from_document(config)?;
    let entries = extract_entries(survey, &params.layout, params.malformed)?;
    let correspondences = build_correspondences(&model, &entries, &params.build)?;

    info!(
        "estimating planar transform from {} point pair(s)",
        correspondences.len()
    );
    let transform = estimator.estimate(&correspondences.camera, &correspondences.ground)?;

    Ok(GroundMapping {
        transform,
        correspondences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundmap_core::{GroundPoint, PixelPoint};
    use serde_json::json;
    use std::cell::Cell;

    fn zero_distortion_config() -> Value {
        json!({
            "CalibrationInfo": {
                "fx": 1000.0, "fy": 1000.0, "cx": 500.0, "cy": 500.0, "skew": 0.0,
                "k1": 0.0, "k2": 0.0, "k3": 0.0, "p1": 0.0, "p2": 0.0,
            }
        })
    }

    fn survey_of(n: usize) -> Value {
        let data: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "camera_coords": [500.0 + i as f64 * 10.0, 500.0],
                    "ground_coords": [i as f64, 0.0],
                })
            })
            .collect();
        json!({ "data": data })
    }

    struct CountingEstimator {
        calls: Cell<usize>,
    }

    impl PlanarMapEstimator for CountingEstimator {
        fn estimate(
            &self,
            camera: &[PixelPoint],
            ground: &[GroundPoint],
        ) -> Result<PlanarTransform, EstimationError> {
            assert_eq!(camera.len(), ground.len());
            self.calls.set(self.calls.get() + 1);
            Ok(PlanarTransform::identity())
        }
    }

    #[test]
    fn relays_the_estimator_result() {
        let estimator = CountingEstimator { calls: Cell::new(0) };
        let mapping = solve_ground_mapping(
            &zero_distortion_config(),
            &survey_of(5),
            &estimator,
            &MappingParams::default(),
        )
        .expect("pipeline succeeds");

        assert_eq!(estimator.calls.get(), 1);
        assert_eq!(mapping.correspondences.len(), 5);
        assert_eq!(mapping.transform, PlanarTransform::identity());
    }

    #[test]
    fn insufficient_correspondences_short_circuit_the_estimator() {
        let estimator = CountingEstimator { calls: Cell::new(0) };
        let err = solve_ground_mapping(
            &zero_distortion_config(),
            &survey_of(3),
            &estimator,
            &MappingParams::default(),
        )
        .unwrap_err();

        assert_eq!(estimator.calls.get(), 0);
        assert_eq!(
            err,
            MappingError::InsufficientCorrespondences(
                CorrespondenceError::InsufficientCorrespondences {
                    attempted: 3,
                    kept: 3,
                    min: 4,
                }
            )
        );
    }

    #[test]
    fn degenerate_configuration_fails_before_any_point() {
        let mut config = zero_distortion_config();
        config["CalibrationInfo"]["fy"] = json!(0.0);

        let estimator = CountingEstimator { calls: Cell::new(0) };
        let err = solve_ground_mapping(
            &config,
            &survey_of(5),
            &estimator,
            &MappingParams::default(),
        )
        .unwrap_err();

        assert_eq!(estimator.calls.get(), 0);
        assert!(matches!(err, MappingError::InvalidConfiguration(_)));
    }

    #[test]
    fn estimator_failure_is_relayed_unmodified() {
        let failing = |_: &[PixelPoint], _: &[GroundPoint]| {
            Err::<PlanarTransform, _>(EstimationError("no consensus set".to_owned()))
        };
        let err = solve_ground_mapping(
            &zero_distortion_config(),
            &survey_of(4),
            &failing,
            &MappingParams::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            MappingError::Estimation(EstimationError("no consensus set".to_owned()))
        );
    }
}
