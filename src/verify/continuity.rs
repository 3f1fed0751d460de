// src/verify/continuity.rs
//! Continuity trap: rapid-fire submissions from the same staff member or
//! the same device channel at one clinic.
//!
//! Real patients trickle in; a staffer filling out surveys produces bursts.
//! The window is `[responded_at - continuity_window_ms, responded_at)`, so
//! a prior response exactly one full window ago does not count.

use anyhow::Result;
use chrono::Duration;

use crate::config::VerifyConfig;
use crate::model::Window;
use crate::store::{CountFilter, SurveyStore};
use crate::verify::SubmissionContext;

/// Any prior hit on either signal fails the check. With neither a staff id
/// nor a device type known there is nothing to correlate on and the check
/// passes by default.
pub async fn check(
    store: &dyn SurveyStore,
    ctx: &SubmissionContext<'_>,
    cfg: &VerifyConfig,
) -> Result<bool> {
    let window = Window::preceding(
        ctx.responded_at,
        Duration::milliseconds(cfg.continuity_window_ms as i64),
    );

    let (staff_hits, device_hits) = match (ctx.staff_id, ctx.device_type) {
        (None, None) => return Ok(true),
        (Some(staff_id), Some(device_type)) => tokio::try_join!(
            store.count_responses(ctx.clinic_id, CountFilter::ByStaff(staff_id), window),
            store.count_responses(ctx.clinic_id, CountFilter::ByDevice(device_type), window),
        )?,
        (Some(staff_id), None) => (
            store
                .count_responses(ctx.clinic_id, CountFilter::ByStaff(staff_id), window)
                .await?,
            0,
        ),
        (None, Some(device_type)) => (
            0,
            store
                .count_responses(ctx.clinic_id, CountFilter::ByDevice(device_type), window)
                .await?,
        ),
    };

    Ok(staff_hits == 0 && device_hits == 0)
}
