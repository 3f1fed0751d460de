//! Core data types shared across the engine.
//!
//! Everything here is plain data: the submission handed over by the
//! collection layer, the verdict the engine hands back, and the windowing
//! primitive every time-based check is anchored on.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resolved submission channel. The channel is a trust signal, not a score:
/// its weight lives in [`crate::weighting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Patient's own device via a personal survey link.
    PatientUrl,
    /// Registered, approved in-clinic tablet.
    KioskAuthorized,
    /// Kiosk flow from a device the platform does not recognize.
    KioskUnauthorized,
}

/// Optional visit attributes attached by the patient flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientAttributes {
    /// Visit purpose, e.g. "checkup" or "emergency".
    #[serde(default)]
    pub purpose: Option<String>,
    /// Chief complaint, e.g. "pain". More specific than the purpose.
    #[serde(default)]
    pub complaint: Option<String>,
}

/// One incoming survey submission as delivered by the collection layer.
///
/// `responded_at` is the authoritative clock for every windowed check; the
/// engine never reads wall time while verifying, so replaying a submission
/// yields the same verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionInput {
    pub clinic_id: Uuid,
    #[serde(default)]
    pub staff_id: Option<Uuid>,
    pub template_id: Uuid,
    /// Average of the per-question 1-5 ratings. Out-of-range values are
    /// clamped, not rejected.
    pub raw_score: f64,
    pub question_count: u32,
    /// Milliseconds from survey open to submit, when the client measured it.
    #[serde(default)]
    pub response_duration_ms: Option<u64>,
    #[serde(default)]
    pub free_text: Option<String>,
    #[serde(default)]
    pub patient: Option<PatientAttributes>,
    /// Kiosk hardware id; only meaningful when `from_kiosk` is set.
    #[serde(default)]
    pub device_id: Option<Uuid>,
    pub from_kiosk: bool,
    pub responded_at: DateTime<Utc>,
}

/// Per-trap pass/fail map kept for audit trails. `true` means the check saw
/// nothing suspicious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapOutcomes {
    pub speed: bool,
    pub continuity: bool,
    pub capacity: bool,
    pub similarity: bool,
}

impl TrapOutcomes {
    pub fn all_passed(&self) -> bool {
        self.speed && self.continuity && self.capacity && self.similarity
    }
}

/// Combined verdict for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    /// Weighted share of passed checks, rounded to 2 decimals.
    pub trust_factor: f64,
    /// Strict AND over all four checks. One failed trap reads as likely
    /// fraud even when the factor stays high.
    pub is_verified: bool,
    pub outcomes: TrapOutcomes,
}

/// Everything the caller persists onto the response row. Computed exactly
/// once at ingestion and never recomputed retroactively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedSubmission {
    /// Raw score adjusted for channel and visit-type bias, 2 decimals.
    pub weighted_score: f64,
    pub trust_factor: f64,
    pub is_verified: bool,
    pub device_type: DeviceType,
    pub outcomes: TrapOutcomes,
}

/// Clinic master data the engine reads (never writes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicProfile {
    /// Treatment chairs. The capacity trap is skipped when unknown.
    #[serde(default)]
    pub unit_count: Option<u32>,
    /// Reporting timezone as a fixed offset from UTC, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Classification tag used for peer grouping, e.g. "orthodontics".
    #[serde(default)]
    pub specialty: Option<String>,
}

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// Window covering `duration` immediately before `end`. The anchor
    /// itself is excluded, so a submission never counts against itself.
    pub fn preceding(end: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            start: end - duration,
            end,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// One clinic's row in a normalization batch. Ephemeral: recomputed on
/// every batch run and cached by the caller, never authoritative storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicPxValue {
    pub clinic_id: Uuid,
    /// T-score: the cohort mean maps to 50.0, one population standard
    /// deviation to 10 points. 1 decimal.
    pub px_value: f64,
    /// Mean effective score of the verified responses in the window.
    pub weighted_avg: f64,
    /// Verified responses feeding `weighted_avg`.
    pub response_count: u64,
    /// Percent of all window responses that passed every trap. 1 decimal.
    pub trust_authenticity_rate: f64,
    /// 1 = best. Dense permutation 1..=N, ties broken by clinic id.
    pub rank: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_is_half_open() {
        let end = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let w = Window::preceding(end, Duration::seconds(60));
        assert!(w.contains(end - Duration::seconds(60)));
        assert!(w.contains(end - Duration::seconds(1)));
        assert!(!w.contains(end));
        assert!(!w.contains(end - Duration::seconds(61)));
    }

    #[test]
    fn device_type_serde_uses_snake_case() {
        let json = serde_json::to_string(&DeviceType::KioskUnauthorized).unwrap();
        assert_eq!(json, "\"kiosk_unauthorized\"");
        let back: DeviceType = serde_json::from_str("\"patient_url\"").unwrap();
        assert_eq!(back, DeviceType::PatientUrl);
    }

    #[test]
    fn px_row_serializes_camel_case() {
        let row = ClinicPxValue {
            clinic_id: Uuid::nil(),
            px_value: 62.2,
            weighted_avg: 5.0,
            response_count: 12,
            trust_authenticity_rate: 92.3,
            rank: 1,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("pxValue").is_some());
        assert!(json.get("trustAuthenticityRate").is_some());
        assert!(json.get("responseCount").is_some());
        assert!(json.get("px_value").is_none());
    }

    #[test]
    fn submission_input_tolerates_missing_optionals() {
        let json = r#"{
            "clinic_id": "00000000-0000-0000-0000-000000000001",
            "template_id": "00000000-0000-0000-0000-000000000002",
            "raw_score": 4.5,
            "question_count": 5,
            "from_kiosk": false,
            "responded_at": "2026-03-01T12:00:00Z"
        }"#;
        let input: SubmissionInput = serde_json::from_str(json).unwrap();
        assert!(input.staff_id.is_none());
        assert!(input.response_duration_ms.is_none());
        assert!(input.free_text.is_none());
        assert!(input.patient.is_none());
        assert!(input.device_id.is_none());
    }
}
