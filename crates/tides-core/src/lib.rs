//! # tides-core
//!
//! Core types, traits, and classification resolution logic for the TiDES
//! transient classification portal.
//!
//! This crate holds the data model for targets and their append-only
//! classification ledger, the controlled vocabulary/taxonomy, and the pure
//! [`resolver`] that derives a target's displayed human-consensus and
//! automated classifications from its full history.

pub mod error;
pub mod logging;
pub mod models;
pub mod resolver;
pub mod taxonomy;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{
    AutomatedClassificationEntry, HumanClassificationEntry, Pipeline, RecordAutomatedRequest,
    RecordHumanRequest, Target, UpsertOutcome, UpsertTargetRequest,
};
pub use resolver::{
    best_per_pipeline, latest_human_entry, resolve_automated, resolve_classification,
    resolve_human_consensus, AutomatedClassification, HumanConsensus, TargetClassification,
};
pub use taxonomy::{ClassTaxonomy, TaxonomyClass, TaxonomySubclass, OTHER_LABEL};
pub use traits::{ClassificationLedger, TargetRegistry, TaxonomyStore};
