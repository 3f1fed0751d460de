//! # Seasonal Index Engine
//!
//! Dental revenue and patient volume breathe with the calendar: December
//! collapses, back-to-school season spikes. Comparing a clinic's March
//! against its August without correction reads seasonality as performance.
//! This module produces twelve multiplicative per-month indices (1.0 =
//! typical month) through an ordered fallback chain:
//!
//! 1. self: the clinic's own history, when it spans enough months;
//! 2. specialty: median over same-specialty peers;
//! 3. platform: median over every clinic on the platform;
//! 4. none: explicit neutral indices, so "no adjustment applied" stays
//!    distinguishable from "adjustment that happens to be 1.0".
//!
//! A merge across peers uses the per-month median, so one clinic with a
//! freak year cannot bend the platform curve.

use std::collections::BTreeSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::SeasonalConfig;
use crate::stats::{mean, median};
use crate::store::{MonthlyMetrics, SurveyStore};

/// Which tier produced the indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalLevel {
    #[serde(rename = "self")]
    SelfData,
    Specialty,
    Platform,
    None,
}

/// Twelve per-month factors, index 0 = January. Every month is always
/// present; months without data stay at 1.0 so downstream multiplication
/// never hits a hole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthIndices(pub [f64; 12]);

impl MonthIndices {
    pub fn neutral() -> Self {
        Self([1.0; 12])
    }

    /// Factor for calendar month 1..=12; out-of-range months read neutral.
    pub fn for_month(&self, month: u32) -> f64 {
        if (1..=12).contains(&month) {
            self.0[(month - 1) as usize]
        } else {
            1.0
        }
    }
}

/// Seasonal profile for one clinic, one set of indices per metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalIndices {
    pub level: SeasonalLevel,
    pub revenue: MonthIndices,
    pub patient_count: MonthIndices,
    /// Clinics whose data produced the indices; 0 on the neutral tier.
    pub clinic_count: u32,
    /// Human-readable provenance shown next to adjusted charts.
    pub label: String,
}

impl SeasonalIndices {
    fn neutral() -> Self {
        Self {
            level: SeasonalLevel::None,
            revenue: MonthIndices::neutral(),
            patient_count: MonthIndices::neutral(),
            clinic_count: 0,
            label: "no seasonal data".to_string(),
        }
    }
}

/// Compute seasonal indices for one clinic. The first tier whose gate is
/// met wins; tiers are never blended.
pub async fn seasonal_indices(
    store: &dyn SurveyStore,
    clinic_id: Uuid,
    cfg: &SeasonalConfig,
) -> Result<SeasonalIndices> {
    // 1) self tier: enough months of own history
    let own_rows = store.monthly_metrics(clinic_id).await?;
    if distinct_months(&own_rows) >= cfg.min_self_months {
        debug!(clinic = %clinic_id, "seasonal indices from own history");
        return Ok(SeasonalIndices {
            level: SeasonalLevel::SelfData,
            revenue: self_index(&own_rows, Metric::Revenue),
            patient_count: self_index(&own_rows, Metric::PatientCount),
            clinic_count: 1,
            label: "self data".to_string(),
        });
    }

    // 2) specialty tier: same-specialty peers, target excluded
    if let Some(specialty) = store
        .clinic_profile(clinic_id)
        .await?
        .and_then(|p| p.specialty)
    {
        let peers = store.clinics_in_specialty(&specialty).await?;
        if let Some(merged) = peer_indices(store, clinic_id, &peers, cfg).await? {
            debug!(
                clinic = %clinic_id,
                peers = merged.peer_count,
                specialty = %specialty,
                "seasonal indices from specialty peers"
            );
            let label = format!("{} peer median ({} clinics)", specialty, merged.peer_count);
            return Ok(SeasonalIndices {
                level: SeasonalLevel::Specialty,
                revenue: merged.revenue,
                patient_count: merged.patient_count,
                clinic_count: merged.peer_count,
                label,
            });
        }
    }

    // 3) platform tier: everyone qualifies as a peer candidate
    let everyone = store.all_clinic_ids().await?;
    if let Some(merged) = peer_indices(store, clinic_id, &everyone, cfg).await? {
        debug!(
            clinic = %clinic_id,
            peers = merged.peer_count,
            "seasonal indices from platform median"
        );
        let label = format!("platform median ({} clinics)", merged.peer_count);
        return Ok(SeasonalIndices {
            level: SeasonalLevel::Platform,
            revenue: merged.revenue,
            patient_count: merged.patient_count,
            clinic_count: merged.peer_count,
            label,
        });
    }

    // 4) nothing qualified anywhere
    debug!(clinic = %clinic_id, "no seasonal tier qualified, neutral indices");
    Ok(SeasonalIndices::neutral())
}

#[derive(Clone, Copy)]
enum Metric {
    Revenue,
    PatientCount,
}

fn metric_value(row: &MonthlyMetrics, metric: Metric) -> Option<f64> {
    match metric {
        Metric::Revenue => row.total_revenue,
        Metric::PatientCount => row.total_patient_count,
    }
}

/// Distinct (year, month) pairs carrying at least one metric value.
fn distinct_months(rows: &[MonthlyMetrics]) -> usize {
    let mut seen = BTreeSet::new();
    for row in rows {
        if row.total_revenue.is_some() || row.total_patient_count.is_some() {
            seen.insert((row.year, row.month));
        }
    }
    seen.len()
}

/// One clinic's per-month index for one metric: month average over overall
/// average, pooled across every reported year. Months without data (or a
/// non-positive overall average) stay neutral.
fn self_index(rows: &[MonthlyMetrics], metric: Metric) -> MonthIndices {
    let mut sums = [0.0f64; 12];
    let mut counts = [0u32; 12];
    let mut all = Vec::new();
    for row in rows {
        if !(1..=12).contains(&row.month) {
            continue;
        }
        if let Some(v) = metric_value(row, metric) {
            let slot = (row.month - 1) as usize;
            sums[slot] += v;
            counts[slot] += 1;
            all.push(v);
        }
    }
    if all.is_empty() {
        return MonthIndices::neutral();
    }
    let overall = mean(&all);
    if overall <= 0.0 {
        return MonthIndices::neutral();
    }

    let mut out = [1.0f64; 12];
    for (slot, out_slot) in out.iter_mut().enumerate() {
        if counts[slot] > 0 {
            *out_slot = (sums[slot] / f64::from(counts[slot])) / overall;
        }
    }
    MonthIndices(out)
}

struct MergedIndices {
    revenue: MonthIndices,
    patient_count: MonthIndices,
    peer_count: u32,
}

/// Collect qualifying peers (each needs the same month span as the self
/// tier), apply the peer-count gate, then merge month-by-month medians.
async fn peer_indices(
    store: &dyn SurveyStore,
    target: Uuid,
    candidates: &[Uuid],
    cfg: &SeasonalConfig,
) -> Result<Option<MergedIndices>> {
    let mut peer_revenue: Vec<MonthIndices> = Vec::new();
    let mut peer_patients: Vec<MonthIndices> = Vec::new();
    for &peer in candidates {
        if peer == target {
            continue;
        }
        let rows = store.monthly_metrics(peer).await?;
        if distinct_months(&rows) < cfg.min_self_months {
            continue;
        }
        peer_revenue.push(self_index(&rows, Metric::Revenue));
        peer_patients.push(self_index(&rows, Metric::PatientCount));
    }

    if peer_revenue.len() < cfg.min_peer_clinics {
        return Ok(None);
    }
    Ok(Some(MergedIndices {
        revenue: median_merge(&peer_revenue),
        patient_count: median_merge(&peer_patients),
        peer_count: peer_revenue.len() as u32,
    }))
}

fn median_merge(peers: &[MonthIndices]) -> MonthIndices {
    let mut out = [1.0f64; 12];
    for (slot, out_slot) in out.iter_mut().enumerate() {
        let column: Vec<f64> = peers.iter().map(|p| p.0[slot]).collect();
        if !column.is_empty() {
            *out_slot = median(&column);
        }
    }
    MonthIndices(out)
}
