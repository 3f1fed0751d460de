// src/verify/capacity.rs
//! Capacity trap: more responses than the clinic could physically have
//! treated patients in the lookback window.
//!
//! The ceiling is `unit_count * capacity_per_unit` over the committed rows
//! of the preceding window; the submission being checked is not yet stored
//! and so not part of the count. Clinics without a registered unit count
//! skip the trap rather than fail it.

use anyhow::Result;
use chrono::Duration;

use crate::config::VerifyConfig;
use crate::model::Window;
use crate::store::{CountFilter, SurveyStore};
use crate::verify::SubmissionContext;

pub async fn check(
    store: &dyn SurveyStore,
    ctx: &SubmissionContext<'_>,
    cfg: &VerifyConfig,
) -> Result<bool> {
    let Some(profile) = store.clinic_profile(ctx.clinic_id).await? else {
        return Ok(true);
    };
    let Some(unit_count) = profile.unit_count else {
        return Ok(true);
    };

    let window = Window::preceding(
        ctx.responded_at,
        Duration::seconds(cfg.capacity_window_secs as i64),
    );
    let count = store
        .count_responses(ctx.clinic_id, CountFilter::Any, window)
        .await?;

    Ok(count <= u64::from(unit_count) * u64::from(cfg.capacity_per_unit))
}
