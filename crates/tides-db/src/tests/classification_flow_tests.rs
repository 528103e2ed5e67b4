//! End-to-end tests for the registry → ledger → resolver flow.
//!
//! These require a live PostgreSQL instance with the migrations applied and
//! are run with `cargo test -- --ignored` (see `test_fixtures`).

use crate::test_fixtures::{unique_name, upsert_request, TestDatabase};
use crate::{
    resolve_automated, resolve_human_consensus, ClassificationLedger, Error, Pipeline,
    RecordAutomatedRequest, RecordHumanRequest, TargetRegistry, TaxonomyStore, UpsertOutcome,
};

fn human_request(target_id: uuid::Uuid, label: &str) -> RecordHumanRequest {
    RecordHumanRequest {
        target_id,
        user: Some("tester".to_string()),
        obs_id: None,
        person_id: None,
        label: label.to_string(),
        subclass: None,
        other_text: None,
        redshift: None,
        comment: None,
    }
}

fn automated_request(
    target_id: uuid::Uuid,
    pipeline: Pipeline,
    label: &str,
    probability: Option<f64>,
) -> RecordAutomatedRequest {
    RecordAutomatedRequest {
        target_id,
        pipeline,
        label: Some(label.to_string()),
        probability,
        version: Some("1.0".to_string()),
        notes: None,
    }
}

// =============================================================================
// Registry
// =============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_upsert_is_idempotent() {
    let _ = dotenvy::dotenv();
    let test_db = TestDatabase::new().await;
    let name = unique_name("idem");

    let first = test_db.db.targets.upsert(upsert_request(&name)).await.unwrap();
    assert!(first.was_created());

    let second = test_db.db.targets.upsert(upsert_request(&name)).await.unwrap();
    assert!(!second.was_created());
    assert_eq!(
        first.target().unwrap().id,
        second.target().unwrap().id,
        "repeat upsert must hit the same row"
    );

    test_db.cleanup(&name).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_upsert_skips_unobserved() {
    let test_db = TestDatabase::new().await;
    let name = unique_name("unobs");

    let mut req = upsert_request(&name);
    req.observed = false;
    let outcome = test_db.db.targets.upsert(req).await.unwrap();
    assert!(matches!(outcome, UpsertOutcome::SkippedUnobserved { .. }));

    // Nothing was written.
    assert!(test_db.db.targets.fetch_by_name(&name).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_upsert_partial_update_preserves_unsupplied_fields() {
    let test_db = TestDatabase::new().await;
    let name = unique_name("partial");

    let mut req = upsert_request(&name);
    req.z_best = Some(0.123);
    test_db.db.targets.upsert(req).await.unwrap();

    // Second feed row without redshift: coordinates update, z_best survives.
    let mut req = upsert_request(&name);
    req.ra = 151.0;
    let outcome = test_db.db.targets.upsert(req).await.unwrap();
    let target = outcome.target().unwrap();
    assert_eq!(target.ra, 151.0);
    assert_eq!(target.z_best, Some(0.123));

    test_db.cleanup(&name).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_upsert_rejects_bad_coordinates() {
    let test_db = TestDatabase::new().await;
    let name = unique_name("badcoord");

    let mut req = upsert_request(&name);
    req.dec = 95.0;
    let err = test_db.db.targets.upsert(req).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

// =============================================================================
// Ledger
// =============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_record_human_appends_and_aggregates() {
    let test_db = TestDatabase::new().await;
    let name = unique_name("ledger");
    let target = test_db.seed_target(&name).await;

    for label in ["SN", "SN", "TDE"] {
        test_db
            .db
            .ledger
            .record_human(human_request(target.id, label))
            .await
            .unwrap();
    }

    let entries = test_db.db.ledger.human_entries(target.id).await.unwrap();
    assert_eq!(entries.len(), 3, "every submission is a new row");

    let consensus = resolve_human_consensus(&entries).unwrap();
    assert_eq!(consensus.label, "SN");
    assert_eq!(consensus.support, 2);
    assert_eq!(consensus.total, 3);

    // The derived cache follows the consensus.
    let target = test_db.db.targets.fetch(target.id).await.unwrap();
    assert_eq!(target.classification.as_deref(), Some("SN"));

    test_db.cleanup(&name).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_record_human_rejects_unknown_label() {
    let test_db = TestDatabase::new().await;
    let name = unique_name("badlabel");
    let target = test_db.seed_target(&name).await;

    let err = test_db
        .db
        .ledger
        .record_human(human_request(target.id, "Quasar?"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    assert!(test_db.db.ledger.human_entries(target.id).await.unwrap().is_empty());
    test_db.cleanup(&name).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_unknown_subclass_is_soft_fail() {
    let test_db = TestDatabase::new().await;
    let name = unique_name("softsub");
    let target = test_db.seed_target(&name).await;

    // "SN Iax" is not in the seeded taxonomy; the submission must still land.
    let mut req = human_request(target.id, "SN");
    req.subclass = Some("SN Iax".to_string());
    test_db.db.ledger.record_human(req).await.unwrap();

    let entries = test_db.db.ledger.human_entries(target.id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].subclass.as_deref(), Some("SN Iax"));

    let miss = test_db
        .db
        .taxonomy
        .resolve_subclass("SN", "SN Iax")
        .await
        .unwrap();
    assert!(miss.is_none());

    test_db.cleanup(&name).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_record_automated_rejects_bad_probability() {
    let test_db = TestDatabase::new().await;
    let name = unique_name("badprob");
    let target = test_db.seed_target(&name).await;

    let mut req = automated_request(target.id, Pipeline::Snid, "SN Ia", Some(1.4));
    let err = test_db.db.ledger.record_automated(req.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    req.probability = Some(0.4);
    test_db.db.ledger.record_automated(req).await.unwrap();

    test_db.cleanup(&name).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_record_against_missing_target() {
    let test_db = TestDatabase::new().await;

    let err = test_db
        .db
        .ledger
        .record_automated(automated_request(
            uuid::Uuid::new_v4(),
            Pipeline::Dash,
            "SN II",
            Some(0.5),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TargetNotFound(_)));
}

// =============================================================================
// Resolution end to end
// =============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_global_pipeline_precedence_end_to_end() {
    let test_db = TestDatabase::new().await;
    let name = unique_name("global");
    let target = test_db.seed_target(&name).await;

    test_db
        .db
        .ledger
        .record_automated(automated_request(
            target.id,
            Pipeline::Superfit,
            "SN Ia",
            Some(0.9),
        ))
        .await
        .unwrap();
    test_db
        .db
        .ledger
        .record_automated(automated_request(
            target.id,
            Pipeline::Global,
            "SN II",
            Some(0.4),
        ))
        .await
        .unwrap();

    let entries = test_db.db.ledger.automated_entries(target.id).await.unwrap();
    let result = resolve_automated(&entries).unwrap();
    assert_eq!(result.pipeline, Pipeline::Global);
    assert_eq!(result.label, "SN II");

    // No human submissions: the cache falls back to the automated winner.
    let target = test_db.db.targets.fetch(target.id).await.unwrap();
    assert_eq!(target.classification.as_deref(), Some("SN II"));

    test_db.cleanup(&name).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_empty_target_resolves_to_none() {
    let test_db = TestDatabase::new().await;
    let name = unique_name("empty");
    let target = test_db.seed_target(&name).await;

    let human = test_db.db.ledger.human_entries(target.id).await.unwrap();
    let automated = test_db.db.ledger.automated_entries(target.id).await.unwrap();
    assert!(resolve_human_consensus(&human).is_none());
    assert!(resolve_automated(&automated).is_none());

    test_db.cleanup(&name).await;
}

// =============================================================================
// Taxonomy
// =============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_taxonomy_lookups() {
    let test_db = TestDatabase::new().await;

    assert!(test_db.db.taxonomy.class_exists("SN").await.unwrap());
    assert!(!test_db.db.taxonomy.class_exists("FRB").await.unwrap());

    let subs = test_db.db.taxonomy.subclasses("SN").await.unwrap();
    assert!(subs.iter().any(|s| s.name == "SN Ia"));

    let hit = test_db
        .db
        .taxonomy
        .resolve_subclass("SN", "SN Ia")
        .await
        .unwrap();
    assert!(hit.is_some());

    // Scoped to the main class: same text under another class misses.
    let miss = test_db
        .db
        .taxonomy
        .resolve_subclass("TDE", "SN Ia")
        .await
        .unwrap();
    assert!(miss.is_none());
}
