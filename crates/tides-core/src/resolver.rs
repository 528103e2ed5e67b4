//! Classification resolution over the append-only ledger.
//!
//! Resolution is a pure function of the ledger rows passed in: no hidden
//! caching, no database access, so the algorithms are unit-testable with
//! in-memory entry sequences. Callers fetch a target's full history and get
//! back explicit result values; an empty history resolves to `None`, never
//! an error.
//!
//! Two independent views are computed:
//! - **human consensus** — majority vote over all historical submissions,
//!   with a deterministic recency tie-break;
//! - **automated** — the global ensemble pipeline when present, otherwise
//!   the best-ranked entry across the named pipelines, with optional-aware
//!   probability ordering (a missing probability is never treated as a
//!   numeric sentinel).

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{AutomatedClassificationEntry, HumanClassificationEntry, Pipeline};

/// Majority-vote human classification for a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanConsensus {
    /// The winning label.
    pub label: String,
    /// How many submissions carried the winning label.
    pub support: usize,
    /// Total submissions considered, including label-less ones.
    pub total: usize,
}

/// Winning automated classification for a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomatedClassification {
    pub label: String,
    /// May be `None`: a pipeline entry without a computed probability can
    /// still win when no ranked competitor exists.
    pub probability: Option<f64>,
    /// Which pipeline supplied the winning entry.
    pub pipeline: Pipeline,
}

/// Combined classification state for display layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetClassification {
    pub consensus: Option<HumanConsensus>,
    /// The single most recent human submission, independent of the aggregate.
    pub latest_human: Option<HumanClassificationEntry>,
    pub automated: Option<AutomatedClassification>,
}

/// Derive the human-consensus classification from all historical submissions.
///
/// Labels are counted across the full history; entries without a label do not
/// vote but still count toward `total`. The consensus is the label with the
/// strictly highest count. On a tie, the label of the most recent submission
/// among the tied labels wins — a deliberate, documented policy so that
/// resolution never depends on hash-map iteration order.
pub fn resolve_human_consensus(
    entries: &[HumanClassificationEntry],
) -> Option<HumanConsensus> {
    let total = entries.len();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        if let Some(label) = entry.label.as_deref() {
            *counts.entry(label).or_insert(0) += 1;
        }
    }
    let top = *counts.values().max()?;

    // Most recent submission whose label sits at the top count. With a unique
    // majority this is simply an entry carrying the majority label; on a tie
    // it implements the recency tie-break.
    let winner = entries
        .iter()
        .filter(|e| {
            e.label
                .as_deref()
                .is_some_and(|l| counts.get(l) == Some(&top))
        })
        .max_by_key(|e| e.created_at_utc)?;
    let label = winner.label.clone()?;

    debug!(
        component = "resolver",
        op = "human_consensus",
        label = %label,
        support = top,
        total_submissions = total,
        "Resolved human consensus"
    );

    Some(HumanConsensus {
        label,
        support: top,
        total,
    })
}

/// The single most recent human submission, for the lightweight
/// "latest human label" display distinct from the aggregate.
pub fn latest_human_entry(
    entries: &[HumanClassificationEntry],
) -> Option<&HumanClassificationEntry> {
    entries.iter().max_by_key(|e| e.created_at_utc)
}

/// Rank two automated entries.
///
/// A present probability always outranks an absent one; two present
/// probabilities compare numerically; equal ranks fall back to recency.
/// Absent pipelines never enter this comparison at all — only rows that
/// exist are ranked, so a genuine low probability cannot lose to a
/// nonexistent entry via some `-1.0` sentinel.
fn rank(a: &AutomatedClassificationEntry, b: &AutomatedClassificationEntry) -> Ordering {
    let by_probability = match (a.probability, b.probability) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    };
    by_probability.then(a.created_at_utc.cmp(&b.created_at_utc))
}

/// Derive the automated classification from all pipeline entries.
///
/// Precedence: any entry from the global ensemble pipeline wins
/// unconditionally (the best-ranked global row when several runs exist).
/// Otherwise the best-ranked row per named pipeline competes on probability.
/// Rows without a label cannot be displayed and are skipped. No entries at
/// all resolves to `None`.
pub fn resolve_automated(
    entries: &[AutomatedClassificationEntry],
) -> Option<AutomatedClassification> {
    let labeled = || entries.iter().filter(|e| e.label.is_some());

    let winner = labeled()
        .filter(|e| e.pipeline.is_global())
        .max_by(|a, b| rank(a, b))
        .or_else(|| {
            // Taking the overall maximum is equivalent to best-per-pipeline
            // followed by a cross-pipeline maximum under the same ordering.
            labeled()
                .filter(|e| !e.pipeline.is_global())
                .max_by(|a, b| rank(a, b))
        })?;
    let label = winner.label.clone()?;

    debug!(
        component = "resolver",
        op = "automated",
        label = %label,
        pipeline = %winner.pipeline,
        probability = ?winner.probability,
        "Resolved automated classification"
    );

    Some(AutomatedClassification {
        label,
        probability: winner.probability,
        pipeline: winner.pipeline,
    })
}

/// The best-ranked entry for each pipeline that produced any, global first.
///
/// Used by display layers that show every pipeline's current answer next to
/// the winning one.
pub fn best_per_pipeline(
    entries: &[AutomatedClassificationEntry],
) -> Vec<AutomatedClassificationEntry> {
    Pipeline::ALL
        .iter()
        .filter_map(|p| {
            entries
                .iter()
                .filter(|e| e.pipeline == *p && e.label.is_some())
                .max_by(|a, b| rank(a, b))
                .cloned()
        })
        .collect()
}

/// Compute both classification views plus the latest human entry in one call.
pub fn resolve_classification(
    human: &[HumanClassificationEntry],
    automated: &[AutomatedClassificationEntry],
) -> TargetClassification {
    TargetClassification {
        consensus: resolve_human_consensus(human),
        latest_human: latest_human_entry(human).cloned(),
        automated: resolve_automated(automated),
    }
}
