//! Static validation of calibration configuration documents.
//!
//! A configuration document is an untyped JSON value holding a
//! [`CALIBRATION_KEY`] object with the ten numeric camera fields. Checks
//! run in field order and stop at the first failure.

use log::warn;
use serde_json::Value;

use crate::FOCAL_EPSILON;

/// Top-level key holding the calibration parameters.
pub const CALIBRATION_KEY: &str = "CalibrationInfo";

/// Required fields of the calibration object, in check order.
pub(crate) const REQUIRED_FIELDS: [&str; 10] = [
    "fx", "fy", "cx", "cy", "skew", "k1", "k2", "k3", "p1", "p2",
];

/// Rejection reasons for a calibration configuration document.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationConfigError {
    #[error("configuration document is empty or missing the '{CALIBRATION_KEY}' object")]
    MissingSection,
    #[error("calibration field '{0}' is missing")]
    MissingField(&'static str),
    #[error("calibration field '{0}' is not a number")]
    NotANumber(&'static str),
    #[error("focal length '{name}' ({value:e}) is too close to zero")]
    DegenerateFocalLength { name: &'static str, value: f64 },
}

/// Check a configuration document, reporting the first offending field.
///
/// Checks, in order: the document is a non-empty object containing
/// [`CALIBRATION_KEY`]; every required field is present; every field is
/// numeric; `fx` and `fy` each have magnitude at least
/// [`FOCAL_EPSILON`](crate::FOCAL_EPSILON).
pub fn check_document(doc: &Value) -> Result<(), CalibrationConfigError> {
    let section = match doc.as_object() {
        Some(map) if !map.is_empty() => match map.get(CALIBRATION_KEY) {
            Some(section) => section,
            None => return Err(CalibrationConfigError::MissingSection),
        },
        _ => return Err(CalibrationConfigError::MissingSection),
    };

    for name in REQUIRED_FIELDS {
        let value = section
            .get(name)
            .ok_or(CalibrationConfigError::MissingField(name))?;
        if !value.is_number() {
            return Err(CalibrationConfigError::NotANumber(name));
        }
        if name == "fx" || name == "fy" {
            let value = value.as_f64().unwrap_or(0.0);
            if value.abs() < FOCAL_EPSILON {
                return Err(CalibrationConfigError::DegenerateFocalLength { name, value });
            }
        }
    }

    Ok(())
}

/// Boolean validation surface: `true` iff [`check_document`] accepts.
///
/// Never panics and never propagates an error; the rejection reason is
/// logged at warn level.
pub fn validate_document(doc: &Value) -> bool {
    match check_document(doc) {
        Ok(()) => true,
        Err(err) => {
            warn!("calibration document rejected: {err}");
            false
        }
    }
}

/// Read one numeric field, falling back to 0.0 if the value does not
/// coerce despite having passed the numeric type check.
pub(crate) fn read_field(section: &Value, name: &str) -> f64 {
    section.get(name).and_then(Value::as_f64).unwrap_or(0.0)
}
