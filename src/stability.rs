//! # Stability Scorer
//!
//! Day-to-day volatility of a clinic's verified scores as a 0-100 score:
//! 100 is perfectly steady, lower means the daily average swings. The
//! underlying measure is the coefficient of variation of daily mean scores
//! over the lookback window, scaled so a CV of 0.5 already reads as 0.
//!
//! Responses are bucketed by the clinic's local calendar day. Bucketing in
//! UTC would split an evening's responses across two days for non-UTC
//! clinics and make the score depend on server geography.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use uuid::Uuid;

use crate::config::StabilityConfig;
use crate::model::Window;
use crate::stats::{mean, population_stddev};
use crate::store::{ScoreSample, SurveyStore};

/// Reported when a clinic lacks enough distinct days to judge.
pub const NEUTRAL_STABILITY: u32 = 50;

/// Stability score for one clinic over the lookback window ending at `now`.
pub async fn stability_score(
    store: &dyn SurveyStore,
    clinic_id: Uuid,
    now: DateTime<Utc>,
    cfg: &StabilityConfig,
) -> Result<u32> {
    let window = Window::preceding(now, Duration::days(cfg.lookback_days));
    let samples = store.verified_scores(clinic_id, window).await?;
    let offset_minutes = store
        .clinic_profile(clinic_id)
        .await?
        .map(|p| p.utc_offset_minutes)
        .unwrap_or(0);
    Ok(score_from_samples(&samples, offset_minutes, cfg))
}

/// Pure scoring over fetched samples.
pub fn score_from_samples(
    samples: &[ScoreSample],
    utc_offset_minutes: i32,
    cfg: &StabilityConfig,
) -> u32 {
    let daily = daily_means(samples, utc_offset_minutes);
    if daily.len() < cfg.min_distinct_days {
        return NEUTRAL_STABILITY;
    }

    let means: Vec<f64> = daily.into_values().collect();
    let m = mean(&means);
    let cv = if m <= 0.0 {
        0.0
    } else {
        population_stddev(&means) / m
    };
    let scaled = ((1.0 - cv * 2.0) * 100.0).round();
    scaled.clamp(0.0, 100.0) as u32
}

/// Mean score per local calendar day.
fn daily_means(samples: &[ScoreSample], utc_offset_minutes: i32) -> BTreeMap<NaiveDate, f64> {
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
    let mut buckets: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for sample in samples {
        let local_day = sample.responded_at.with_timezone(&offset).date_naive();
        buckets.entry(local_day).or_default().push(sample.score);
    }
    buckets
        .into_iter()
        .map(|(day, scores)| (day, mean(&scores)))
        .collect()
}
