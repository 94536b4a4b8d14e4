//! Access to raw survey batches.
//!
//! A survey batch is an untyped JSON document holding an ordered array of
//! point records, each with a camera-coordinate array and a
//! ground-coordinate array. Malformed records never abort the batch; what
//! happens to them is an explicit caller choice.

use groundmap_core::{GroundPoint, PixelPoint};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where coordinates live inside a survey document.
///
/// The element positions of x and y are independently configurable; by
/// default the first two array elements are read as (x, y).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurveyLayout {
    /// Key of the ordered points array in the survey document.
    pub points_key: String,
    /// Key of the camera-coordinate array in each point record.
    pub camera_key: String,
    /// Key of the ground-coordinate array in each point record.
    pub ground_key: String,
    /// Element position of the x coordinate.
    pub index_x: usize,
    /// Element position of the y coordinate.
    pub index_y: usize,
}

impl Default for SurveyLayout {
    fn default() -> Self {
        Self {
            points_key: "data".to_owned(),
            camera_key: "camera_coords".to_owned(),
            ground_key: "ground_coords".to_owned(),
            index_x: 0,
            index_y: 1,
        }
    }
}

/// What to do with a point record whose coordinate array is malformed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedCoordPolicy {
    /// Substitute (0, 0) for the malformed coordinate and keep the record.
    #[default]
    ZeroFill,
    /// Drop the whole record.
    Skip,
}

/// A raw (camera pixel, ground) pair as submitted by a caller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurveyEntry {
    pub camera: PixelPoint,
    pub ground: GroundPoint,
}

/// Rejection reasons for one coordinate array inside a point record.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordAccessError {
    #[error("point record has no '{0}' key")]
    MissingKey(String),
    #[error("'{0}' is not an array")]
    NotAnArray(String),
    #[error("'{key}' has {len} element(s), need at least {needed}")]
    TooShort {
        key: String,
        len: usize,
        needed: usize,
    },
    #[error("'{key}' element {index} is not a number")]
    NotANumber { key: String, index: usize },
}

/// Batch-level failure: the survey document itself has the wrong shape.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SurveyError {
    #[error("survey document must contain a '{0}' array")]
    MissingPointsArray(String),
}

/// Read an (x, y) pair out of a coordinate array inside a point record.
///
/// Returns a tagged error instead of substituting a default, so callers
/// decide the degradation policy themselves.
pub fn coord_from_array(
    record: &Value,
    key: &str,
    index_x: usize,
    index_y: usize,
) -> Result<(f64, f64), CoordAccessError> {
    let value = record
        .get(key)
        .ok_or_else(|| CoordAccessError::MissingKey(key.to_owned()))?;
    let array = value
        .as_array()
        .ok_or_else(|| CoordAccessError::NotAnArray(key.to_owned()))?;

    let needed = index_x.max(index_y) + 1;
    if array.len() < needed {
        return Err(CoordAccessError::TooShort {
            key: key.to_owned(),
            len: array.len(),
            needed,
        });
    }

    let read = |index: usize| {
        array[index]
            .as_f64()
            .ok_or_else(|| CoordAccessError::NotANumber {
                key: key.to_owned(),
                index,
            })
    };

    Ok((read(index_x)?, read(index_y)?))
}

/// Extract the ordered survey entries from a batch document.
///
/// Non-object items in the points array are skipped with a warning. A
/// malformed coordinate array is degraded according to `policy`, also with
/// a warning; it never aborts the batch.
pub fn extract_entries(
    doc: &Value,
    layout: &SurveyLayout,
    policy: MalformedCoordPolicy,
) -> Result<Vec<SurveyEntry>, SurveyError> {
    let records = doc
        .get(&layout.points_key)
        .and_then(Value::as_array)
        .ok_or_else(|| SurveyError::MissingPointsArray(layout.points_key.clone()))?;

    log::info!("processing {} survey point record(s)", records.len());

    let mut entries = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        if !record.is_object() {
            warn!("skipping survey item {index}: not an object");
            continue;
        }

        let camera = coord_from_array(record, &layout.camera_key, layout.index_x, layout.index_y);
        let ground = coord_from_array(record, &layout.ground_key, layout.index_x, layout.index_y);

        let (camera, ground) = match (camera, ground) {
            (Ok(c), Ok(g)) => (c, g),
            (camera, ground) => {
                for err in [camera.as_ref().err(), ground.as_ref().err()]
                    .into_iter()
                    .flatten()
                {
                    warn!("survey item {index}: {err}");
                }
                match policy {
                    MalformedCoordPolicy::ZeroFill => (
                        camera.unwrap_or((0.0, 0.0)),
                        ground.unwrap_or((0.0, 0.0)),
                    ),
                    MalformedCoordPolicy::Skip => continue,
                }
            }
        };

        entries.push(SurveyEntry {
            camera: PixelPoint::new(camera.0, camera.1),
            ground: GroundPoint::new(ground.0, ground.1),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_first_two_elements_by_default() {
        let record = json!({ "camera_coords": [3.5, 7.25, 99.0] });
        assert_eq!(
            coord_from_array(&record, "camera_coords", 0, 1),
            Ok((3.5, 7.25))
        );
    }

    #[test]
    fn x_and_y_positions_are_independent() {
        let record = json!({ "camera_coords": [10.0, 20.0, 30.0] });
        assert_eq!(
            coord_from_array(&record, "camera_coords", 2, 0),
            Ok((30.0, 10.0))
        );
    }

    #[test]
    fn tags_each_malformed_shape() {
        let record = json!({
            "camera_coords": "oops",
            "ground_coords": [1.0],
            "other": [1.0, "two"],
        });
        assert!(matches!(
            coord_from_array(&record, "missing", 0, 1),
            Err(CoordAccessError::MissingKey(_))
        ));
        assert!(matches!(
            coord_from_array(&record, "camera_coords", 0, 1),
            Err(CoordAccessError::NotAnArray(_))
        ));
        assert_eq!(
            coord_from_array(&record, "ground_coords", 0, 1),
            Err(CoordAccessError::TooShort {
                key: "ground_coords".to_owned(),
                len: 1,
                needed: 2,
            })
        );
        assert!(matches!(
            coord_from_array(&record, "other", 0, 1),
            Err(CoordAccessError::NotANumber { index: 1, .. })
        ));
    }

    fn batch() -> Value {
        json!({
            "data": [
                { "camera_coords": [1.0, 2.0], "ground_coords": [10.0, 20.0] },
                "not-an-object",
                { "camera_coords": [3.0], "ground_coords": [30.0, 40.0] },
            ]
        })
    }

    #[test]
    fn zero_fill_keeps_malformed_records() {
        let entries =
            extract_entries(&batch(), &SurveyLayout::default(), MalformedCoordPolicy::ZeroFill)
                .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].camera, PixelPoint::new(1.0, 2.0));
        // Short camera array zero-filled, intact ground side kept.
        assert_eq!(entries[1].camera, PixelPoint::new(0.0, 0.0));
        assert_eq!(entries[1].ground, GroundPoint::new(30.0, 40.0));
    }

    #[test]
    fn skip_drops_malformed_records() {
        let entries =
            extract_entries(&batch(), &SurveyLayout::default(), MalformedCoordPolicy::Skip)
                .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ground, GroundPoint::new(10.0, 20.0));
    }

    #[test]
    fn missing_points_array_is_a_batch_failure() {
        let doc = json!({ "data": 42 });
        assert_eq!(
            extract_entries(&doc, &SurveyLayout::default(), MalformedCoordPolicy::ZeroFill),
            Err(SurveyError::MissingPointsArray("data".to_owned()))
        );
    }
}
