//! Demo that drives the whole engine against an in-memory store: scripted
//! submissions through the processor, then the PX batch, stability and
//! seasonal indices, printed as JSON.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use px_trust_engine::model::{ClinicProfile, PatientAttributes, SubmissionInput};
use px_trust_engine::store::memory::MemoryStore;
use px_trust_engine::store::MonthlyMetrics;
use px_trust_engine::{population, seasonal, stability, EngineConfig, SubmissionProcessor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let config = Arc::new(EngineConfig::load_default()?);
    let store = Arc::new(MemoryStore::new());
    let now = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();

    // two clinics: a steady performer and a small one with thin volume
    let steady = Uuid::new_v4();
    let small = Uuid::new_v4();
    store.upsert_clinic(
        steady,
        ClinicProfile {
            unit_count: Some(4),
            utc_offset_minutes: 9 * 60,
            specialty: Some("orthodontics".to_string()),
        },
    );
    store.upsert_clinic(
        small,
        ClinicProfile {
            unit_count: Some(1),
            utc_offset_minutes: 9 * 60,
            specialty: None,
        },
    );
    let kiosk = Uuid::new_v4();
    store.authorize_device(kiosk);

    let processor = SubmissionProcessor::new(store.clone(), config.clone());

    // a month of organic traffic for the steady clinic, two per day
    for day in 0..30 {
        for (hour, score, duration) in [(9, 4.5, 42_000u64), (15, 4.0, 35_000u64)] {
            let input = SubmissionInput {
                clinic_id: steady,
                staff_id: None,
                template_id: Uuid::nil(),
                raw_score: score,
                question_count: 5,
                response_duration_ms: Some(duration),
                free_text: None,
                patient: Some(PatientAttributes {
                    purpose: Some("checkup".to_string()),
                    complaint: None,
                }),
                device_id: Some(kiosk),
                from_kiosk: true,
                responded_at: now - Duration::days(day) - Duration::hours(24 - hour),
            };
            let processed = processor.process(&input).await?;
            store.record(&input, &processed);
        }
    }

    // the small clinic only has a handful of link responses
    let comments = [
        "Friendly team and a quick appointment.",
        "The dentist explained the x-rays patiently.",
        "Short wait, clean rooms.",
        "Billing was transparent for once.",
    ];
    for (day, comment) in comments.iter().enumerate() {
        let day = day as i64;
        let input = SubmissionInput {
            clinic_id: small,
            staff_id: None,
            template_id: Uuid::nil(),
            raw_score: 5.0,
            question_count: 5,
            response_duration_ms: Some(28_000),
            free_text: Some(comment.to_string()),
            patient: None,
            device_id: None,
            from_kiosk: false,
            responded_at: now - Duration::days(day) - Duration::hours(6),
        };
        let processed = processor.process(&input).await?;
        store.record(&input, &processed);
    }

    // one obviously rushed submission, shown with its trap verdicts
    let rushed = SubmissionInput {
        clinic_id: steady,
        staff_id: None,
        template_id: Uuid::nil(),
        raw_score: 5.0,
        question_count: 5,
        response_duration_ms: Some(1_200),
        free_text: None,
        patient: None,
        device_id: Some(kiosk),
        from_kiosk: true,
        responded_at: now,
    };
    let verdict = processor.process(&rushed).await?;
    println!("rushed submission: {}", serde_json::to_string_pretty(&verdict)?);
    store.record(&rushed, &verdict);

    // three years of seasonal history for the steady clinic
    for year in 2023..2026 {
        for month in 1..=12u32 {
            let dip = if month == 12 { 0.6 } else { 1.0 };
            store.insert_monthly(MonthlyMetrics {
                clinic_id: steady,
                year,
                month,
                total_revenue: Some(40_000.0 * dip),
                total_patient_count: Some(320.0 * dip),
            });
        }
    }

    let px = population::run(store.as_ref(), now, &config.population).await?;
    println!("px batch: {}", serde_json::to_string_pretty(&px)?);

    let steadiness =
        stability::stability_score(store.as_ref(), steady, now, &config.stability).await?;
    println!("stability({steady}): {steadiness}");

    let indices = seasonal::seasonal_indices(store.as_ref(), steady, &config.seasonal).await?;
    println!("seasonal: {}", serde_json::to_string_pretty(&indices)?);

    println!("px-demo done");
    Ok(())
}
