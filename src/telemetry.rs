// src/telemetry.rs
//! Metric registration and privacy-safe logging helpers.
//!
//! The crate only speaks the `metrics` facade; the host service installs
//! whatever exporter it runs (Prometheus or otherwise) and calls
//! [`ensure_metrics_described`] at boot so series carry descriptions.

use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

/// Register metric descriptions exactly once per process.
pub fn ensure_metrics_described() {
    static DESCRIBED: OnceCell<()> = OnceCell::new();
    DESCRIBED.get_or_init(|| {
        describe_counter!(
            "survey_submissions_total",
            "Submissions run through the processor."
        );
        describe_counter!(
            "survey_verified_total",
            "Submissions that passed every trap check."
        );
        describe_counter!(
            "survey_trap_failures_total",
            "Trap-check failures, labeled by trap."
        );
        describe_counter!(
            "px_batch_runs_total",
            "Population normalizer batch executions."
        );
        describe_gauge!(
            "px_batch_last_run_ts",
            "Unix timestamp of the last completed normalizer run."
        );
        describe_gauge!(
            "px_batch_cohort_size",
            "Clinics that qualified in the last normalizer run."
        );
    });
}

/// Short stable id for a piece of free text. Patient comments routinely
/// contain names; log this instead of the text itself.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let out = hasher.finalize();
    let hex = out
        .iter()
        .take(4)
        .map(|b| format!("{:02x}", b))
        .collect::<String>();
    format!("c{}", hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_stable_and_short() {
        let a = anon_hash("Very friendly staff, thanks!");
        let b = anon_hash("Very friendly staff, thanks!");
        let c = anon_hash("very friendly staff, thanks!");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 9);
        assert!(a.starts_with('c'));
    }

    #[test]
    fn describe_twice_is_a_noop() {
        ensure_metrics_described();
        ensure_metrics_described();
    }
}
