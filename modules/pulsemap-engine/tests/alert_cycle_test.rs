//! Alert engine cycle tests against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use pulsemap_common::{Emotion, Report};
use pulsemap_engine::{AlertEngine, AlertPolicy, AlertScheduler};
use pulsemap_store::{MemoryRecordStore, RecordStore};

fn report(cell: &str, emotion: Emotion, sentiment: f64, risk: i32) -> Report {
    Report {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        cell: Some(cell.to_string()),
        emotion,
        sentiment_score: sentiment,
        risk_level: risk,
        topics: vec!["public_safety".to_string()],
        toxicity_score: 0.2,
    }
}

/// cell "c3a1xy": `negative` negative reports, the rest positive,
/// `high_risk` of the total at risk level 3, sentiment spread evenly.
async fn seed_cell(
    store: &MemoryRecordStore,
    cell: &str,
    total: usize,
    negative: usize,
    high_risk: usize,
    sentiment_each: f64,
) {
    for i in 0..total {
        let emotion = if i < negative {
            Emotion::Negative
        } else {
            Emotion::Positive
        };
        let risk = if i < high_risk { 3 } else { 0 };
        store
            .insert_report(&report(cell, emotion, sentiment_each, risk))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn rule_a_fires_for_mostly_negative_cell() {
    let store = Arc::new(MemoryRecordStore::new());
    // 20 reports, 13 negative, no high-risk, avg sentiment -0.10
    seed_cell(&store, "c3a1xy", 20, 13, 0, -0.10).await;

    let engine = AlertEngine::new(store.clone(), AlertPolicy::default());
    let stats = engine.run_cycle().await.unwrap();

    assert_eq!(stats.reports, 20);
    assert_eq!(stats.alerts, 1);

    let alerts = store.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].rule_id, "A");
    assert_eq!(alerts[0].level, 1);
    assert_eq!(alerts[0].cell, "c3a1xy");
    assert_eq!(alerts[0].payload["n"], 20);
    assert!((alerts[0].payload["neg_ratio"].as_f64().unwrap() - 0.65).abs() < 1e-9);
    assert!(!alerts[0].delivered);
}

#[tokio::test]
async fn anonymity_floor_blocks_small_cells_entirely() {
    let store = Arc::new(MemoryRecordStore::new());
    // 10 reports, all negative — every rule condition is irrelevant below the floor
    seed_cell(&store, "c3a1xy", 10, 10, 10, -0.9).await;

    let engine = AlertEngine::new(store.clone(), AlertPolicy::default());
    let stats = engine.run_cycle().await.unwrap();

    assert_eq!(stats.floored_cells, 1);
    assert_eq!(stats.alerts, 0);
    assert!(store.alerts().is_empty());
}

#[tokio::test]
async fn multiple_rules_fire_independently_for_one_cell() {
    let store = Arc::new(MemoryRecordStore::new());
    // 35 reports, avg sentiment -0.40, 6 high-risk, 10 negative (under 60%)
    seed_cell(&store, "c3a1xy", 35, 10, 6, -0.40).await;

    let engine = AlertEngine::new(store.clone(), AlertPolicy::default());
    let stats = engine.run_cycle().await.unwrap();

    assert_eq!(stats.alerts, 2);
    let mut rule_ids: Vec<String> = store.alerts().iter().map(|a| a.rule_id.clone()).collect();
    rule_ids.sort();
    assert_eq!(rule_ids, vec!["B", "C"]);
}

#[tokio::test]
async fn unchanged_data_refires_every_cycle() {
    let store = Arc::new(MemoryRecordStore::new());
    seed_cell(&store, "c3a1xy", 20, 13, 0, -0.10).await;

    let engine = AlertEngine::new(store.clone(), AlertPolicy::default());
    engine.run_cycle().await.unwrap();
    engine.run_cycle().await.unwrap();

    // No deduplication across ticks: the persisting condition emits again.
    let alerts = store.alerts();
    assert_eq!(alerts.len(), 2);
    assert!(alerts.iter().all(|a| a.rule_id == "A"));
    assert_ne!(alerts[0].id, alerts[1].id);
}

#[tokio::test]
async fn suppress_repeats_holds_back_while_an_alert_is_undelivered() {
    let store = Arc::new(MemoryRecordStore::new());
    seed_cell(&store, "c3a1xy", 20, 13, 0, -0.10).await;

    let policy = AlertPolicy {
        suppress_repeats: true,
        ..AlertPolicy::default()
    };
    let engine = AlertEngine::new(store.clone(), policy);

    engine.run_cycle().await.unwrap();
    engine.run_cycle().await.unwrap();
    assert_eq!(store.alerts().len(), 1);

    // Once delivered, the persisting condition may fire again.
    let id = store.alerts()[0].id;
    store.mark_alert_delivered(id).await.unwrap();
    engine.run_cycle().await.unwrap();
    assert_eq!(store.alerts().len(), 2);
}

#[tokio::test]
async fn alerts_use_fixed_precision_regardless_of_report_cells() {
    let store = Arc::new(MemoryRecordStore::new());
    // Reports carry longer identifiers; the engine buckets at precision 6.
    seed_cell(&store, "c3a1xy9q", 20, 14, 0, -0.10).await;

    let engine = AlertEngine::new(store.clone(), AlertPolicy::default());
    engine.run_cycle().await.unwrap();

    let alerts = store.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].cell, "c3a1xy");
}

#[tokio::test]
async fn old_reports_fall_outside_the_window() {
    let store = Arc::new(MemoryRecordStore::new());
    let mut stale = report("c3a1xy", Emotion::Negative, -0.9, 3);
    stale.created_at = Utc::now() - chrono::Duration::hours(3);
    for _ in 0..20 {
        store.insert_report(&stale).await.unwrap();
    }

    let engine = AlertEngine::new(store.clone(), AlertPolicy::default());
    let stats = engine.run_cycle().await.unwrap();

    assert_eq!(stats.reports, 0);
    assert!(store.alerts().is_empty());
}

#[tokio::test]
async fn failed_cycle_commits_nothing() {
    let store = Arc::new(MemoryRecordStore::new());
    seed_cell(&store, "c3a1xy", 20, 13, 0, -0.10).await;
    store.fail_reads(true);

    let engine = AlertEngine::new(store.clone(), AlertPolicy::default());
    assert!(engine.run_cycle().await.is_err());
    assert!(store.alerts().is_empty());
}

#[tokio::test]
async fn scheduler_runs_cycles_and_stops_cleanly() {
    let store = Arc::new(MemoryRecordStore::new());
    seed_cell(&store, "c3a1xy", 20, 13, 0, -0.10).await;

    let engine = AlertEngine::new(store.clone(), AlertPolicy::default());
    let handle = AlertScheduler::new(engine, Duration::from_millis(10)).start();

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.stop().await;

    // First cycle runs immediately, later ticks re-fire.
    let after_stop = store.alerts().len();
    assert!(after_stop >= 1);

    // No cycles after stop.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.alerts().len(), after_stop);
}

#[tokio::test]
async fn scheduler_survives_store_failures() {
    let store = Arc::new(MemoryRecordStore::new());
    seed_cell(&store, "c3a1xy", 20, 13, 0, -0.10).await;
    store.fail_reads(true);

    let engine = AlertEngine::new(store.clone(), AlertPolicy::default());
    let handle = AlertScheduler::new(engine, Duration::from_millis(10)).start();

    tokio::time::sleep(Duration::from_millis(50)).await;
    store.fail_reads(false);
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.stop().await;

    // Failed cycles were skipped; recovery happened on a later tick.
    assert!(!store.alerts().is_empty());
}
