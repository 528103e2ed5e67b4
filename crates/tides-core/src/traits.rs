//! Core traits for the registry, ledger, and taxonomy boundaries.
//!
//! These traits define the interfaces the storage layer must satisfy,
//! keeping the resolver and its callers independent of any concrete
//! database backend.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AutomatedClassificationEntry, HumanClassificationEntry, RecordAutomatedRequest,
    RecordHumanRequest, Target, UpsertOutcome, UpsertTargetRequest,
};
use crate::taxonomy::TaxonomySubclass;

// =============================================================================
// TARGET REGISTRY
// =============================================================================

/// Idempotent creation/update of targets from the survey catalogue feed.
#[async_trait]
pub trait TargetRegistry: Send + Sync {
    /// Register or update a target, keyed by its unique external name.
    ///
    /// Only the supplied fields are overwritten on update; the
    /// classification ledger is never touched. Unobserved feed rows are
    /// reported as a skip outcome, not an error.
    async fn upsert(&self, req: UpsertTargetRequest) -> Result<UpsertOutcome>;

    /// Fetch a target by primary key.
    async fn fetch(&self, id: Uuid) -> Result<Target>;

    /// Fetch a target by its unique external name.
    async fn fetch_by_name(&self, name: &str) -> Result<Option<Target>>;

    /// List the most recently created targets, newest first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<Target>>;

    /// Recompute the target's derived scalar classification cache from its
    /// ledger. The cache is display-only; the ledger stays authoritative.
    async fn refresh_cached_classification(&self, target_id: Uuid) -> Result<()>;
}

// =============================================================================
// CLASSIFICATION LEDGER
// =============================================================================

/// Append-only store of classification assertions.
///
/// Rows are never updated or deleted; every submission, human or automated,
/// is a new historical data point.
#[async_trait]
pub trait ClassificationLedger: Send + Sync {
    /// Append a human classification. Validates the label against the
    /// controlled vocabulary; timestamps server-side; always appends.
    async fn record_human(&self, req: RecordHumanRequest) -> Result<Uuid>;

    /// Append an automated pipeline classification. The probability must be
    /// absent or within [0, 1].
    async fn record_automated(&self, req: RecordAutomatedRequest) -> Result<Uuid>;

    /// Full human classification history for a target, newest first.
    async fn human_entries(&self, target_id: Uuid) -> Result<Vec<HumanClassificationEntry>>;

    /// Full automated classification history for a target, newest first.
    async fn automated_entries(
        &self,
        target_id: Uuid,
    ) -> Result<Vec<AutomatedClassificationEntry>>;
}

// =============================================================================
// TAXONOMY
// =============================================================================

/// Persisted class→subclass taxonomy lookups.
#[async_trait]
pub trait TaxonomyStore: Send + Sync {
    /// Whether `name` is a top-level class in the vocabulary.
    async fn class_exists(&self, name: &str) -> Result<bool>;

    /// All sub-classes of a top-level class. An unknown class yields an
    /// empty list, mirroring the soft-miss contract of `resolve_subclass`.
    async fn subclasses(&self, main_class: &str) -> Result<Vec<TaxonomySubclass>>;

    /// Resolve a free-text sub-class by exact match scoped to `main_class`.
    /// A miss returns `Ok(None)`; it never aborts the calling submission.
    async fn resolve_subclass(
        &self,
        main_class: &str,
        subclass: &str,
    ) -> Result<Option<TaxonomySubclass>>;
}
