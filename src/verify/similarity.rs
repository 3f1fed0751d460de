// src/verify/similarity.rs
//! Similarity trap: near-duplicate free text inside a clinic's recent
//! comment window.
//!
//! One person writing many "reviews" reuses phrasing; distinct patients
//! rarely produce near-identical comments. The metric is Jaccard overlap
//! of character-bigram sets over whitespace-stripped text, computed on
//! Unicode scalar values so non-Latin scripts compare correctly.

use std::collections::HashSet;

use anyhow::Result;

use crate::config::VerifyConfig;
use crate::store::SurveyStore;
use crate::verify::SubmissionContext;

/// Compare the submission's free text against the clinic's most recent
/// comments. Any single comparison at or above `similarity_threshold`
/// fails the check. Missing or very short text passes: "ok" and "thanks"
/// collide constantly without meaning anything.
pub async fn check(
    store: &dyn SurveyStore,
    ctx: &SubmissionContext<'_>,
    cfg: &VerifyConfig,
) -> Result<bool> {
    let Some(text) = ctx.free_text else {
        return Ok(true);
    };
    let trimmed = text.trim();
    if trimmed.chars().count() < cfg.min_free_text_chars {
        return Ok(true);
    }

    let recent = store
        .recent_free_texts(ctx.clinic_id, ctx.responded_at, cfg.similarity_lookback)
        .await?;
    for prior in &recent {
        if bigram_jaccard(trimmed, prior) >= cfg.similarity_threshold {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Jaccard similarity of the two texts' character-bigram sets, in 0.0..=1.0.
/// An empty bigram set on either side yields 0.0, so blank-vs-blank never
/// reads as a duplicate.
pub fn bigram_jaccard(a: &str, b: &str) -> f64 {
    let a_bigrams = bigrams(a);
    let b_bigrams = bigrams(b);
    if a_bigrams.is_empty() || b_bigrams.is_empty() {
        return 0.0;
    }
    let intersection = a_bigrams.intersection(&b_bigrams).count();
    let union = a_bigrams.len() + b_bigrams.len() - intersection;
    intersection as f64 / union as f64
}

fn bigrams(s: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceType;
    use crate::store::memory::{MemoryStore, ResponseRow};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn identical_text_scores_one() {
        assert_eq!(bigram_jaccard("lovely visit", "lovely visit"), 1.0);
    }

    #[test]
    fn whitespace_differences_do_not_matter() {
        assert_eq!(bigram_jaccard("lovely  visit", "lovelyvisit"), 1.0);
    }

    #[test]
    fn known_overlap_value() {
        // {ab,bc,cd} vs {ab,bc,ce}: 2 shared of 4 total
        assert!((bigram_jaccard("abcd", "abce") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn disjoint_texts_score_zero() {
        assert_eq!(bigram_jaccard("abab", "cdcd"), 0.0);
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert_eq!(bigram_jaccard("", ""), 0.0);
        assert_eq!(bigram_jaccard("a", "a"), 0.0);
        assert_eq!(bigram_jaccard("   ", "great clinic"), 0.0);
    }

    #[test]
    fn non_latin_scripts_compare_by_code_point() {
        assert_eq!(bigram_jaccard("とても良い", "とても良い"), 1.0);
        assert!(bigram_jaccard("とても良い", "悪い対応") < 0.01);
    }

    // --- trap behavior against the store ---

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap()
    }

    fn seed_comment(store: &MemoryStore, clinic_id: Uuid, mins_before: i64, text: &str) {
        store.insert_response(ResponseRow {
            clinic_id,
            staff_id: None,
            device_type: DeviceType::PatientUrl,
            raw_score: 4.0,
            weighted_score: Some(4.0),
            is_verified: true,
            free_text: Some(text.to_string()),
            responded_at: anchor() - Duration::minutes(mins_before),
        });
    }

    fn ctx(clinic_id: Uuid, text: &'static str) -> SubmissionContext<'static> {
        SubmissionContext {
            clinic_id,
            staff_id: None,
            device_type: None,
            question_count: 5,
            response_duration_ms: None,
            free_text: Some(text),
            responded_at: anchor(),
        }
    }

    #[tokio::test]
    async fn near_duplicate_comment_fails() {
        let store = MemoryStore::new();
        let clinic = Uuid::from_u128(1);
        seed_comment(&store, clinic, 30, "Great service, very happy!");

        let cfg = VerifyConfig::default();
        let passed = check(&store, &ctx(clinic, "Great service, very happy!!"), &cfg)
            .await
            .unwrap();
        assert!(!passed);
    }

    #[tokio::test]
    async fn unrelated_comment_passes() {
        let store = MemoryStore::new();
        let clinic = Uuid::from_u128(1);
        seed_comment(&store, clinic, 30, "Great service, very happy!");

        let cfg = VerifyConfig::default();
        let passed = check(
            &store,
            &ctx(clinic, "Waiting room was crowded, but the dentist listened."),
            &cfg,
        )
        .await
        .unwrap();
        assert!(passed);
    }

    #[tokio::test]
    async fn short_text_skips_the_trap() {
        let store = MemoryStore::new();
        let clinic = Uuid::from_u128(1);
        seed_comment(&store, clinic, 30, "ok!");

        let cfg = VerifyConfig::default();
        assert!(check(&store, &ctx(clinic, "ok!"), &cfg).await.unwrap());
        assert!(check(&store, &ctx(clinic, "  ok!  "), &cfg).await.unwrap());
    }

    #[tokio::test]
    async fn missing_text_passes() {
        let store = MemoryStore::new();
        let clinic = Uuid::from_u128(1);
        seed_comment(&store, clinic, 30, "Great service, very happy!");

        let cfg = VerifyConfig::default();
        let mut c = ctx(clinic, "placeholder");
        c.free_text = None;
        assert!(check(&store, &c, &cfg).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_outside_lookback_is_not_seen() {
        let store = MemoryStore::new();
        let clinic = Uuid::from_u128(1);
        // oldest comment is the duplicate; two fresher distinct ones push it
        // past a lookback of 2
        seed_comment(&store, clinic, 50, "Great service, very happy!");
        seed_comment(&store, clinic, 20, "Short wait and a clean office.");
        seed_comment(&store, clinic, 10, "Doctor explained every step of the root canal.");

        let cfg = VerifyConfig {
            similarity_lookback: 2,
            ..Default::default()
        };
        let passed = check(&store, &ctx(clinic, "Great service, very happy!"), &cfg)
            .await
            .unwrap();
        assert!(passed);
    }

    #[tokio::test]
    async fn other_clinic_comments_are_invisible() {
        let store = MemoryStore::new();
        seed_comment(&store, Uuid::from_u128(2), 30, "Great service, very happy!");

        let cfg = VerifyConfig::default();
        let passed = check(
            &store,
            &ctx(Uuid::from_u128(1), "Great service, very happy!"),
            &cfg,
        )
        .await
        .unwrap();
        assert!(passed);
    }
}
