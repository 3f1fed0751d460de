//! # Channel & Visit Weights
//!
//! Fixed multiplier tables that correct structural bias in the raw 1-5
//! scores before clinics are compared:
//!
//! - channel: a patient answering on their own device made an active choice,
//!   an unrecognized shared kiosk invites staff curation;
//! - visit type: emergency patients score low no matter how good the care
//!   was, routine checkup patients score high.
//!
//! The tables are part of the scoring contract and therefore compile-time
//! constants, not configuration. Lookups are case-insensitive on trimmed
//! tags; anything unknown stays neutral at 1.0.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::model::{DeviceType, PatientAttributes};
use crate::stats::round2;

pub const DEFAULT_VISIT_WEIGHT: f64 = 1.0;

/// Channel weight. The authorized in-clinic kiosk is the neutral baseline.
pub fn device_weight(device: DeviceType) -> f64 {
    match device {
        DeviceType::PatientUrl => 1.5,
        DeviceType::KioskAuthorized => 1.0,
        DeviceType::KioskUnauthorized => 0.8,
    }
}

static VISIT_WEIGHTS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        // urgent visits skew scores down
        ("emergency", 1.2),
        ("pain", 1.2),
        // routine visits skew scores up
        ("periodontal", 0.9),
        ("checkup", 0.9),
        ("preventive", 0.9),
        ("general", 1.0),
    ])
});

/// Weight for a single visit tag; unknown tags are neutral.
pub fn visit_tag_weight(tag: &str) -> f64 {
    let key = normalize(tag);
    VISIT_WEIGHTS
        .get(key.as_str())
        .copied()
        .unwrap_or(DEFAULT_VISIT_WEIGHT)
}

/// Combined visit weight for a submission's patient attributes.
///
/// The chief complaint is more specific than the stated purpose, so it is
/// consulted first; the first tag with a table entry decides. Missing
/// attributes are neutral.
pub fn visit_weight(attrs: Option<&PatientAttributes>) -> f64 {
    let Some(attrs) = attrs else {
        return DEFAULT_VISIT_WEIGHT;
    };
    for tag in [attrs.complaint.as_deref(), attrs.purpose.as_deref()]
        .into_iter()
        .flatten()
    {
        let key = normalize(tag);
        if let Some(w) = VISIT_WEIGHTS.get(key.as_str()) {
            return *w;
        }
    }
    DEFAULT_VISIT_WEIGHT
}

/// Raw 1-5 average adjusted for channel and visit bias, 2 decimals.
pub fn weighted_score(raw_score: f64, device: DeviceType, attrs: Option<&PatientAttributes>) -> f64 {
    round2(raw_score * device_weight(device) * visit_weight(attrs))
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}
