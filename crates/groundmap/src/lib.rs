//! Correspondence pipeline for camera-to-ground coordinate mapping.
//!
//! Given a calibration configuration document and a batch of raw
//! (camera-pixel, ground) survey points, this crate undistorts each camera
//! point through [`groundmap_core`], filters out points whose undistortion
//! fails, and hands the surviving correspondences to an external
//! planar-transform estimator.
//!
//! The crate holds no state across calls: every mapping request constructs
//! its own camera model and its own correspondence lists.
//!
//! ## Quickstart
//!
//! ```
//! use groundmap::{solve_ground_mapping, EstimationError, MappingParams};
//! use groundmap_core::{GroundPoint, PixelPoint, PlanarTransform};
//! use serde_json::json;
//!
//! let config = json!({
//!     "CalibrationInfo": {
//!         "fx": 1000.0, "fy": 1000.0, "cx": 500.0, "cy": 500.0, "skew": 0.0,
//!         "k1": 0.0, "k2": 0.0, "k3": 0.0, "p1": 0.0, "p2": 0.0,
//!     }
//! });
//! let survey = json!({
//!     "data": [
//!         { "camera_coords": [100.0, 100.0], "ground_coords": [0.0, 0.0] },
//!         { "camera_coords": [900.0, 100.0], "ground_coords": [8.0, 0.0] },
//!         { "camera_coords": [900.0, 700.0], "ground_coords": [8.0, 6.0] },
//!         { "camera_coords": [100.0, 700.0], "ground_coords": [0.0, 6.0] },
//!     ]
//! });
//!
//! // Any closure over two parallel point lists can act as the estimator.
//! let estimator = |_cam: &[PixelPoint], _gnd: &[GroundPoint]| {
//!     Ok::<_, EstimationError>(PlanarTransform::identity())
//! };
//!
//! let mapping = solve_ground_mapping(&config, &survey, &estimator, &MappingParams::default())
//!     .expect("mapping succeeds");
//! assert_eq!(mapping.correspondences.len(), 4);
//! ```

mod correspondence;
mod estimator;
mod mapping;
mod report;
mod survey;

pub use correspondence::{
    build_correspondences, BuildParams, CorrespondenceError, CorrespondenceSet,
    MIN_CORRESPONDENCES,
};
pub use estimator::{EstimationError, PlanarMapEstimator};
pub use mapping::{solve_ground_mapping, GroundMapping, MappingError, MappingParams};
pub use report::{MappingReport, PointsSummary};
pub use survey::{
    coord_from_array, extract_entries, CoordAccessError, MalformedCoordPolicy, SurveyEntry,
    SurveyError, SurveyLayout,
};
