// src/store/mod.rs
//! Read contract against the survey store.
//!
//! The engine never owns the relational store. It sees committed, immutable
//! response rows plus clinic master data through this trait; writes stay
//! with the surrounding service. Every windowed query takes an explicit
//! [`Window`] so callers control the anchor timestamp.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{ClinicProfile, DeviceType, Window};

/// Row filter for windowed response counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountFilter {
    /// Every response of the clinic.
    Any,
    /// Responses recorded by one staff member.
    ByStaff(Uuid),
    /// Responses that arrived over one device channel.
    ByDevice(DeviceType),
}

/// Per-clinic aggregate over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicAggregate {
    pub clinic_id: Uuid,
    /// Mean effective score of verified responses; `None` when there are
    /// none. Effective score is the weighted score, falling back to the raw
    /// score for legacy rows stored before weighting existed.
    pub verified_avg: Option<f64>,
    pub verified_count: u64,
    pub total_count: u64,
}

/// One verified response's effective score and arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSample {
    pub responded_at: DateTime<Utc>,
    pub score: f64,
}

/// Row of the monthly business-metrics table. Either metric may be absent;
/// clinics report revenue and patient counts independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMetrics {
    pub clinic_id: Uuid,
    pub year: i32,
    /// Calendar month 1-12.
    pub month: u32,
    #[serde(default)]
    pub total_revenue: Option<f64>,
    #[serde(default)]
    pub total_patient_count: Option<f64>,
}

#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Is this kiosk device registered and approved?
    async fn device_authorized(&self, device_id: Uuid) -> Result<bool>;

    /// Clinic master data; `None` for unknown clinics.
    async fn clinic_profile(&self, clinic_id: Uuid) -> Result<Option<ClinicProfile>>;

    /// Number of the clinic's responses matching `filter` inside `window`.
    async fn count_responses(
        &self,
        clinic_id: Uuid,
        filter: CountFilter,
        window: Window,
    ) -> Result<u64>;

    /// Most recent non-empty free-text comments strictly before `before`,
    /// newest first, at most `limit`.
    async fn recent_free_texts(
        &self,
        clinic_id: Uuid,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>>;

    /// Grouped verified average and counts for every clinic with at least
    /// one response in `window`.
    async fn clinic_aggregates(&self, window: Window) -> Result<Vec<ClinicAggregate>>;

    /// Effective scores of one clinic's verified responses across `window`.
    async fn verified_scores(&self, clinic_id: Uuid, window: Window) -> Result<Vec<ScoreSample>>;

    /// All monthly metric rows of one clinic, any order.
    async fn monthly_metrics(&self, clinic_id: Uuid) -> Result<Vec<MonthlyMetrics>>;

    /// Clinics carrying `specialty` (tag match is case-insensitive).
    async fn clinics_in_specialty(&self, specialty: &str) -> Result<Vec<Uuid>>;

    /// Every clinic known to the platform.
    async fn all_clinic_ids(&self) -> Result<Vec<Uuid>>;
}
