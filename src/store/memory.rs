// src/store/memory.rs
//! In-memory [`SurveyStore`] used by the demo binary and the test suites.
//!
//! A plain `Mutex<Inner>` is enough here: every operation copies what it
//! needs under a short lock and no lock is held across an await point.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{ClinicProfile, DeviceType, ProcessedSubmission, SubmissionInput, Window};
use crate::store::{ClinicAggregate, CountFilter, MonthlyMetrics, ScoreSample, SurveyStore};

/// One committed response row, the shape the relational table would have.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRow {
    pub clinic_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub device_type: DeviceType,
    pub raw_score: f64,
    /// `None` mimics legacy rows stored before weighting existed.
    pub weighted_score: Option<f64>,
    pub is_verified: bool,
    pub free_text: Option<String>,
    pub responded_at: DateTime<Utc>,
}

impl ResponseRow {
    fn effective_score(&self) -> f64 {
        self.weighted_score.unwrap_or(self.raw_score)
    }
}

#[derive(Debug, Default)]
struct Inner {
    responses: Vec<ResponseRow>,
    clinics: HashMap<Uuid, ClinicProfile>,
    authorized_devices: HashSet<Uuid>,
    monthly: Vec<MonthlyMetrics>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_clinic(&self, clinic_id: Uuid, profile: ClinicProfile) {
        let mut inner = self.lock();
        inner.clinics.insert(clinic_id, profile);
    }

    pub fn authorize_device(&self, device_id: Uuid) {
        let mut inner = self.lock();
        inner.authorized_devices.insert(device_id);
    }

    pub fn insert_response(&self, row: ResponseRow) {
        let mut inner = self.lock();
        inner.responses.push(row);
    }

    /// Persist a processed submission the way the host service would.
    pub fn record(&self, input: &SubmissionInput, processed: &ProcessedSubmission) {
        self.insert_response(ResponseRow {
            clinic_id: input.clinic_id,
            staff_id: input.staff_id,
            device_type: processed.device_type,
            raw_score: input.raw_score.clamp(1.0, 5.0),
            weighted_score: Some(processed.weighted_score),
            is_verified: processed.is_verified,
            free_text: input.free_text.clone(),
            responded_at: input.responded_at,
        });
    }

    pub fn insert_monthly(&self, row: MonthlyMetrics) {
        let mut inner = self.lock();
        inner.monthly.push(row);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }
}

#[async_trait]
impl SurveyStore for MemoryStore {
    async fn device_authorized(&self, device_id: Uuid) -> Result<bool> {
        Ok(self.lock().authorized_devices.contains(&device_id))
    }

    async fn clinic_profile(&self, clinic_id: Uuid) -> Result<Option<ClinicProfile>> {
        Ok(self.lock().clinics.get(&clinic_id).cloned())
    }

    async fn count_responses(
        &self,
        clinic_id: Uuid,
        filter: CountFilter,
        window: Window,
    ) -> Result<u64> {
        let inner = self.lock();
        let count = inner
            .responses
            .iter()
            .filter(|r| r.clinic_id == clinic_id && window.contains(r.responded_at))
            .filter(|r| match filter {
                CountFilter::Any => true,
                CountFilter::ByStaff(staff_id) => r.staff_id == Some(staff_id),
                CountFilter::ByDevice(device_type) => r.device_type == device_type,
            })
            .count();
        Ok(count as u64)
    }

    async fn recent_free_texts(
        &self,
        clinic_id: Uuid,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>> {
        let inner = self.lock();
        let mut with_ts: Vec<(DateTime<Utc>, &str)> = inner
            .responses
            .iter()
            .filter(|r| r.clinic_id == clinic_id && r.responded_at < before)
            .filter_map(|r| {
                let text = r.free_text.as_deref()?;
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some((r.responded_at, text))
                }
            })
            .collect();
        // stable sort, then walk backwards: newest first, insertion order
        // breaking timestamp ties
        with_ts.sort_by_key(|(ts, _)| *ts);
        Ok(with_ts
            .iter()
            .rev()
            .take(limit)
            .map(|(_, text)| text.to_string())
            .collect())
    }

    async fn clinic_aggregates(&self, window: Window) -> Result<Vec<ClinicAggregate>> {
        let inner = self.lock();
        let mut grouped: BTreeMap<Uuid, (Vec<f64>, u64, u64)> = BTreeMap::new();
        for row in inner
            .responses
            .iter()
            .filter(|r| window.contains(r.responded_at))
        {
            let entry = grouped.entry(row.clinic_id).or_default();
            entry.2 += 1;
            if row.is_verified {
                entry.0.push(row.effective_score());
                entry.1 += 1;
            }
        }
        Ok(grouped
            .into_iter()
            .map(|(clinic_id, (scores, verified, total))| ClinicAggregate {
                clinic_id,
                verified_avg: if scores.is_empty() {
                    None
                } else {
                    Some(scores.iter().sum::<f64>() / scores.len() as f64)
                },
                verified_count: verified,
                total_count: total,
            })
            .collect())
    }

    async fn verified_scores(&self, clinic_id: Uuid, window: Window) -> Result<Vec<ScoreSample>> {
        let inner = self.lock();
        Ok(inner
            .responses
            .iter()
            .filter(|r| r.clinic_id == clinic_id && r.is_verified && window.contains(r.responded_at))
            .map(|r| ScoreSample {
                responded_at: r.responded_at,
                score: r.effective_score(),
            })
            .collect())
    }

    async fn monthly_metrics(&self, clinic_id: Uuid) -> Result<Vec<MonthlyMetrics>> {
        let inner = self.lock();
        Ok(inner
            .monthly
            .iter()
            .filter(|m| m.clinic_id == clinic_id)
            .cloned()
            .collect())
    }

    async fn clinics_in_specialty(&self, specialty: &str) -> Result<Vec<Uuid>> {
        let inner = self.lock();
        let mut ids: Vec<Uuid> = inner
            .clinics
            .iter()
            .filter(|(_, profile)| {
                profile
                    .specialty
                    .as_deref()
                    .is_some_and(|tag| tag.eq_ignore_ascii_case(specialty))
            })
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn all_clinic_ids(&self) -> Result<Vec<Uuid>> {
        let inner = self.lock();
        let mut ids: Vec<Uuid> = inner.clinics.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}
