//! # Submission Processor
//!
//! Per-request entry point: resolves the device channel, runs the trap
//! checks and attaches the weighted score. Persistence stays with the
//! caller; everything here is computed against the state of the store at
//! `responded_at` and is never recomputed for old rows, so trust metadata
//! reflects what the engine could know when the response arrived.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics::counter;
use tracing::debug;

use crate::config::EngineConfig;
use crate::model::{DeviceType, ProcessedSubmission, SubmissionInput};
use crate::store::SurveyStore;
use crate::telemetry::{anon_hash, ensure_metrics_described};
use crate::verify::{self, SubmissionContext};
use crate::weighting;

pub struct SubmissionProcessor {
    store: Arc<dyn SurveyStore>,
    config: Arc<EngineConfig>,
}

impl SubmissionProcessor {
    pub fn new(store: Arc<dyn SurveyStore>, config: Arc<EngineConfig>) -> Self {
        Self { store, config }
    }

    /// Process one submission end to end.
    ///
    /// Store errors propagate to the caller, which decides between retry
    /// and rejection; a submission is never silently marked verified on a
    /// broken lookup.
    pub async fn process(&self, input: &SubmissionInput) -> Result<ProcessedSubmission> {
        ensure_metrics_described();
        counter!("survey_submissions_total").increment(1);

        // 1) resolve the channel; it feeds both a trap signal and a weight
        let device_type = self
            .resolve_device_type(input)
            .await
            .context("resolving device type")?;

        // 2) out-of-range scores are clamped, not rejected
        let raw_score = input.raw_score.clamp(1.0, 5.0);

        // 3) trap checks, anchored at the submission's own timestamp
        let ctx = SubmissionContext {
            clinic_id: input.clinic_id,
            staff_id: input.staff_id,
            device_type: Some(device_type),
            question_count: input.question_count,
            response_duration_ms: input.response_duration_ms,
            free_text: input.free_text.as_deref(),
            responded_at: input.responded_at,
        };
        let verification = verify::verify(self.store.as_ref(), &ctx, &self.config.verify)
            .await
            .context("running trap checks")?;

        if verification.is_verified {
            counter!("survey_verified_total").increment(1);
        }

        // 4) bias correction is independent of the trust verdict
        let weighted_score = weighting::weighted_score(raw_score, device_type, input.patient.as_ref());

        // free text never reaches the logs raw; patients put names in there
        debug!(
            clinic = %input.clinic_id,
            device = ?device_type,
            trust = verification.trust_factor,
            verified = verification.is_verified,
            text_id = %input.free_text.as_deref().map(anon_hash).unwrap_or_default(),
            "submission processed"
        );

        Ok(ProcessedSubmission {
            weighted_score,
            trust_factor: verification.trust_factor,
            is_verified: verification.is_verified,
            device_type,
            outcomes: verification.outcomes,
        })
    }

    /// Channel resolution. Non-kiosk traffic is always the patient's own
    /// link; a kiosk submission is authorized only when its device id is
    /// present, registered and approved. An authorized device id on a
    /// non-kiosk submission does not upgrade it.
    async fn resolve_device_type(&self, input: &SubmissionInput) -> Result<DeviceType> {
        if !input.from_kiosk {
            return Ok(DeviceType::PatientUrl);
        }
        if let Some(device_id) = input.device_id {
            if self.store.device_authorized(device_id).await? {
                return Ok(DeviceType::KioskAuthorized);
            }
        }
        Ok(DeviceType::KioskUnauthorized)
    }
}
