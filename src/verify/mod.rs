// src/verify/mod.rs
//! Verification pipeline: four independent trap checks combined into a
//! weighted trust factor and a strict verified flag.
//!
//! The speed trap is pure; continuity, capacity and similarity consult the
//! store and are fanned out concurrently, so one submission costs at most
//! one slow query of latency. A store error anywhere fails the whole
//! verification closed: an unreadable fraud signal must never count as a
//! pass.

pub mod capacity;
pub mod continuity;
pub mod similarity;
pub mod speed;

use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::counter;
use uuid::Uuid;

use crate::config::VerifyConfig;
use crate::model::{DeviceType, TrapOutcomes, Verification};
use crate::stats::round2;
use crate::store::SurveyStore;
use crate::telemetry::ensure_metrics_described;

/// Fixed combination weights, summing to 1.00. Part of the scoring
/// contract, so constants rather than configuration.
pub const SPEED_WEIGHT: f64 = 0.30;
pub const CONTINUITY_WEIGHT: f64 = 0.25;
pub const CAPACITY_WEIGHT: f64 = 0.20;
pub const SIMILARITY_WEIGHT: f64 = 0.25;

/// Everything a trap check may consult about one submission, anchored at
/// `responded_at`. Wall time is never read during verification.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionContext<'a> {
    pub clinic_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub device_type: Option<DeviceType>,
    pub question_count: u32,
    pub response_duration_ms: Option<u64>,
    pub free_text: Option<&'a str>,
    pub responded_at: DateTime<Utc>,
}

/// Run all four traps for one submission and combine the outcomes.
pub async fn verify(
    store: &dyn SurveyStore,
    ctx: &SubmissionContext<'_>,
    cfg: &VerifyConfig,
) -> Result<Verification> {
    ensure_metrics_described();

    // 1) pure check first, store-backed checks fanned out together
    let speed = speed::check(ctx, cfg);
    let (continuity, capacity, similarity) = tokio::try_join!(
        continuity::check(store, ctx, cfg),
        capacity::check(store, ctx, cfg),
        similarity::check(store, ctx, cfg),
    )?;

    let outcomes = TrapOutcomes {
        speed,
        continuity,
        capacity,
        similarity,
    };

    // 2) per-trap failure counters for dashboards
    for (trap, passed) in [
        ("speed", speed),
        ("continuity", continuity),
        ("capacity", capacity),
        ("similarity", similarity),
    ] {
        if !passed {
            counter!("survey_trap_failures_total", "trap" => trap).increment(1);
        }
    }

    Ok(combine(outcomes))
}

/// Weighted combination of trap outcomes. Pure, and the only place the
/// weights are applied.
pub fn combine(outcomes: TrapOutcomes) -> Verification {
    let mut factor = 0.0;
    if outcomes.speed {
        factor += SPEED_WEIGHT;
    }
    if outcomes.continuity {
        factor += CONTINUITY_WEIGHT;
    }
    if outcomes.capacity {
        factor += CAPACITY_WEIGHT;
    }
    if outcomes.similarity {
        factor += SIMILARITY_WEIGHT;
    }

    Verification {
        trust_factor: round2(factor),
        // stricter than the factor: one failed trap already reads as fraud
        is_verified: outcomes.all_passed(),
        outcomes,
    }
}
