// src/config.rs
//! Engine tuning knobs: windows, thresholds and minimum-sample gates.
//!
//! Loaded from TOML with env var + fallback:
//! 1) $PX_ENGINE_CONFIG_PATH (must exist when set)
//! 2) config/engine.toml
//! 3) built-in defaults
//!
//! The four trap weights and the device/visit weight tables are not
//! configurable: they are part of the scoring contract, and stored rows from
//! different deployments must stay comparable.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "PX_ENGINE_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/engine.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub verify: VerifyConfig,
    pub population: PopulationConfig,
    pub stability: StabilityConfig,
    pub seasonal: SeasonalConfig,
}

/// Trap-check thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// A response faster than this many ms per question fails the speed trap.
    pub ms_per_question: u64,
    /// Duplicate window for the continuity trap.
    pub continuity_window_ms: u64,
    /// Lookback for the capacity trap.
    pub capacity_window_secs: u64,
    /// Plausible patients per treatment chair per capacity window.
    pub capacity_per_unit: u32,
    /// Bigram-Jaccard score at or above which free text counts as duplicate.
    pub similarity_threshold: f64,
    /// How many recent comments the similarity trap compares against.
    pub similarity_lookback: usize,
    /// Trimmed free text shorter than this many chars skips the trap.
    pub min_free_text_chars: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            ms_per_question: 2_000,
            continuity_window_ms: 60_000,
            capacity_window_secs: 3_600,
            capacity_per_unit: 4,
            similarity_threshold: 0.80,
            similarity_lookback: 50,
            min_free_text_chars: 5,
        }
    }
}

/// Population normalizer gates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub lookback_days: i64,
    /// Verified responses a clinic needs to enter the cohort.
    pub min_verified_responses: u64,
    /// Below this many qualifying clinics the batch degenerates to all-50s.
    pub min_cohort_clinics: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            min_verified_responses: 10,
            min_cohort_clinics: 2,
        }
    }
}

/// Stability scorer gates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub lookback_days: i64,
    /// Distinct local days with data needed for a real score; below this the
    /// clinic reports the neutral 50.
    pub min_distinct_days: usize,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            min_distinct_days: 7,
        }
    }
}

/// Seasonal index tier gates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeasonalConfig {
    /// Distinct calendar months of own data needed for the self tier; the
    /// same bar applies to each peer in the fallback tiers.
    pub min_self_months: usize,
    /// Qualifying peers needed before a peer median is trusted.
    pub min_peer_clinics: usize,
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self {
            min_self_months: 12,
            min_peer_clinics: 5,
        }
    }
}

impl EngineConfig {
    /// Load from an explicit TOML file. Missing keys fall back to defaults,
    /// so a deployment only overrides what it needs.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        let mut cfg: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("parsing engine config from {}", path.display()))?;
        cfg.sanitize();
        tracing::debug!(path = %path.display(), "engine config loaded");
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $PX_ENGINE_CONFIG_PATH
    /// 2) config/engine.toml
    /// 3) defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("PX_ENGINE_CONFIG_PATH points to non-existent path"));
            }
        }
        let default_p = PathBuf::from(DEFAULT_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(Self::default())
    }

    /// Parameter hygiene for hand-edited files; keeps every knob in a range
    /// the checks can work with.
    fn sanitize(&mut self) {
        let v = &mut self.verify;
        v.similarity_threshold = v.similarity_threshold.clamp(0.0, 1.0);
        v.similarity_lookback = v.similarity_lookback.max(1);
        v.ms_per_question = v.ms_per_question.max(1);
        v.continuity_window_ms = v.continuity_window_ms.max(1);
        v.capacity_window_secs = v.capacity_window_secs.max(1);
        self.population.lookback_days = self.population.lookback_days.max(1);
        self.stability.lookback_days = self.stability.lookback_days.max(1);
        self.seasonal.min_self_months = self.seasonal.min_self_months.clamp(1, 12);
        self.seasonal.min_peer_clinics = self.seasonal.min_peer_clinics.max(1);
    }
}
