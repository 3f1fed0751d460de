// tests/seasonal_tiers.rs
// The seasonal fallback ladder end to end: self history, specialty peers,
// platform median, neutral; plus the peer gates in between.

use uuid::Uuid;

use px_trust_engine::config::SeasonalConfig;
use px_trust_engine::model::ClinicProfile;
use px_trust_engine::seasonal::{self, SeasonalLevel};
use px_trust_engine::store::memory::MemoryStore;
use px_trust_engine::store::MonthlyMetrics;

// --- test helpers ---

fn target() -> Uuid {
    Uuid::from_u128(1)
}

fn register(store: &MemoryStore, clinic: Uuid, specialty: Option<&str>) {
    store.upsert_clinic(
        clinic,
        ClinicProfile {
            unit_count: None,
            utc_offset_minutes: 0,
            specialty: specialty.map(str::to_string),
        },
    );
}

/// One flat year with a December revenue dip to `dec_factor` of normal.
fn seed_year(store: &MemoryStore, clinic: Uuid, year: i32, dec_factor: f64) {
    for month in 1..=12u32 {
        let factor = if month == 12 { dec_factor } else { 1.0 };
        store.insert_monthly(MonthlyMetrics {
            clinic_id: clinic,
            year,
            month,
            total_revenue: Some(10_000.0 * factor),
            total_patient_count: Some(100.0 * factor),
        });
    }
}

fn seed_partial(store: &MemoryStore, clinic: Uuid, months: u32) {
    for month in 1..=months {
        store.insert_monthly(MonthlyMetrics {
            clinic_id: clinic,
            year: 2026,
            month,
            total_revenue: Some(10_000.0),
            total_patient_count: Some(100.0),
        });
    }
}

// --- the ladder ---

#[tokio::test]
async fn full_own_history_uses_the_self_tier() {
    let store = MemoryStore::new();
    register(&store, target(), Some("orthodontics"));
    seed_year(&store, target(), 2025, 0.5);

    let out = seasonal::seasonal_indices(&store, target(), &SeasonalConfig::default())
        .await
        .unwrap();
    assert_eq!(out.level, SeasonalLevel::SelfData);
    assert_eq!(out.clinic_count, 1);
    assert_eq!(out.label, "self data");

    // December at half volume: overall mean is 11.5/12 of normal
    let overall = 11.5 / 12.0;
    assert!((out.revenue.for_month(12) - 0.5 / overall).abs() < 1e-9);
    assert!((out.revenue.for_month(6) - 1.0 / overall).abs() < 1e-9);
    assert!((out.patient_count.for_month(12) - 0.5 / overall).abs() < 1e-9);
}

#[tokio::test]
async fn eleven_months_are_not_enough_for_self() {
    let store = MemoryStore::new();
    register(&store, target(), None);
    seed_partial(&store, target(), 11);

    let out = seasonal::seasonal_indices(&store, target(), &SeasonalConfig::default())
        .await
        .unwrap();
    assert_eq!(out.level, SeasonalLevel::None);
}

#[tokio::test]
async fn specialty_peers_fill_in_for_a_young_clinic() {
    let store = MemoryStore::new();
    register(&store, target(), Some("orthodontics"));
    seed_partial(&store, target(), 3);

    for i in 0..5u128 {
        let peer = Uuid::from_u128(100 + i);
        register(&store, peer, Some("orthodontics"));
        seed_year(&store, peer, 2025, 0.6);
    }
    // a pediatric clinic with history must not join the ortho pool
    let outsider = Uuid::from_u128(200);
    register(&store, outsider, Some("pediatric"));
    seed_year(&store, outsider, 2025, 0.1);

    let out = seasonal::seasonal_indices(&store, target(), &SeasonalConfig::default())
        .await
        .unwrap();
    assert_eq!(out.level, SeasonalLevel::Specialty);
    assert_eq!(out.clinic_count, 5);
    assert_eq!(out.label, "orthodontics peer median (5 clinics)");

    let overall = (11.0 + 0.6) / 12.0;
    assert!((out.revenue.for_month(12) - 0.6 / overall).abs() < 1e-9);
}

#[tokio::test]
async fn four_specialty_peers_fall_through_to_platform() {
    let store = MemoryStore::new();
    register(&store, target(), Some("orthodontics"));

    // only four qualifying ortho peers
    for i in 0..4u128 {
        let peer = Uuid::from_u128(100 + i);
        register(&store, peer, Some("orthodontics"));
        seed_year(&store, peer, 2025, 0.6);
    }
    // the platform as a whole has enough
    for i in 0..3u128 {
        let peer = Uuid::from_u128(200 + i);
        register(&store, peer, Some("pediatric"));
        seed_year(&store, peer, 2025, 0.8);
    }

    let out = seasonal::seasonal_indices(&store, target(), &SeasonalConfig::default())
        .await
        .unwrap();
    assert_eq!(out.level, SeasonalLevel::Platform);
    assert_eq!(out.clinic_count, 7);
    assert_eq!(out.label, "platform median (7 clinics)");

    // median December dip across 4x0.6 and 3x0.8 peers
    let dip_06 = 0.6 / ((11.0 + 0.6) / 12.0);
    assert!((out.revenue.for_month(12) - dip_06).abs() < 1e-9);
}

#[tokio::test]
async fn clinic_without_specialty_skips_straight_to_platform() {
    let store = MemoryStore::new();
    register(&store, target(), None);
    for i in 0..5u128 {
        let peer = Uuid::from_u128(100 + i);
        register(&store, peer, Some("general"));
        seed_year(&store, peer, 2025, 0.7);
    }

    let out = seasonal::seasonal_indices(&store, target(), &SeasonalConfig::default())
        .await
        .unwrap();
    assert_eq!(out.level, SeasonalLevel::Platform);
    assert_eq!(out.clinic_count, 5);
}

#[tokio::test]
async fn target_never_counts_as_its_own_peer() {
    let store = MemoryStore::new();
    register(&store, target(), Some("orthodontics"));
    // target has 11 months: below the self gate, but it would be a
    // qualifying peer if it were allowed to count
    seed_partial(&store, target(), 11);

    for i in 0..4u128 {
        let peer = Uuid::from_u128(100 + i);
        register(&store, peer, Some("orthodontics"));
        seed_year(&store, peer, 2025, 0.6);
    }

    let out = seasonal::seasonal_indices(&store, target(), &SeasonalConfig::default())
        .await
        .unwrap();
    // 4 peers in specialty, 4 on the platform: both gates miss
    assert_eq!(out.level, SeasonalLevel::None);
}

#[tokio::test]
async fn nothing_anywhere_means_explicit_neutral() {
    let store = MemoryStore::new();
    register(&store, target(), None);

    let out = seasonal::seasonal_indices(&store, target(), &SeasonalConfig::default())
        .await
        .unwrap();
    assert_eq!(out.level, SeasonalLevel::None);
    assert_eq!(out.clinic_count, 0);
    assert_eq!(out.label, "no seasonal data");
    for month in 1..=12 {
        assert_eq!(out.revenue.for_month(month), 1.0);
        assert_eq!(out.patient_count.for_month(month), 1.0);
    }
}
