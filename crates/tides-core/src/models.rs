//! Core data models for the TiDES classification portal.
//!
//! These types represent the reconciled single-generation data model: a
//! `Target` row per transient, plus an append-only classification ledger of
//! human and automated entries referencing it. The legacy scalar
//! `classification` field on `Target` survives only as a derived display
//! cache; the ledger is the sole source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// PIPELINE IDENTIFIERS
// =============================================================================

/// Named automated classification pipelines.
///
/// `Global` is the ensemble/meta classifier: when it has produced an entry
/// for a target, its output takes precedence over every per-algorithm
/// pipeline regardless of probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    Global,
    Superfit,
    Snid,
    Dash,
    Ed,
}

impl Pipeline {
    /// All pipelines, global first.
    pub const ALL: [Pipeline; 5] = [
        Pipeline::Global,
        Pipeline::Superfit,
        Pipeline::Snid,
        Pipeline::Dash,
        Pipeline::Ed,
    ];

    /// Stable identifier used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pipeline::Global => "global",
            Pipeline::Superfit => "superfit",
            Pipeline::Snid => "snid",
            Pipeline::Dash => "dash",
            Pipeline::Ed => "ed",
        }
    }

    /// Human-readable name for display layers.
    pub fn display_name(&self) -> &'static str {
        match self {
            Pipeline::Global => "Global",
            Pipeline::Superfit => "SuperFit",
            Pipeline::Snid => "SNID",
            Pipeline::Dash => "DASH",
            Pipeline::Ed => "ED",
        }
    }

    /// Whether this is the authoritative ensemble pipeline.
    pub fn is_global(&self) -> bool {
        matches!(self, Pipeline::Global)
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pipeline {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "global" => Ok(Pipeline::Global),
            "superfit" => Ok(Pipeline::Superfit),
            "snid" => Ok(Pipeline::Snid),
            "dash" => Ok(Pipeline::Dash),
            "ed" => Ok(Pipeline::Ed),
            other => Err(Error::Validation(format!("unknown pipeline: {other}"))),
        }
    }
}

// =============================================================================
// TARGET
// =============================================================================

/// One astronomical transient under classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: Uuid,
    /// Unique external catalogue name.
    pub name: String,
    /// Right ascension in degrees, [0, 360).
    pub ra: f64,
    /// Declination in degrees, [-90, 90].
    pub dec: f64,
    /// Detection epoch reported by the survey feed.
    pub detected_at: Option<DateTime<Utc>>,
    /// Most recent observation epoch.
    pub last_date: Option<DateTime<Utc>>,
    pub created_at_utc: DateTime<Utc>,
    /// Legacy scalar classification, maintained as a derived cache of the
    /// ledger. Display-only; never consulted by the resolver.
    pub classification: Option<String>,
    /// Best-known redshift and its provenance.
    pub z_best: Option<f64>,
    pub z_sn: Option<f64>,
    pub z_gal: Option<f64>,
    pub z_source: Option<String>,
    pub confidence: Option<f64>,
}

// =============================================================================
// LEDGER ENTRIES
// =============================================================================

/// A single human classification submission.
///
/// Append-only: rows are never updated or deleted, and repeat submissions by
/// the same user each produce a new row. `label` is nullable to accommodate
/// legacy rows; new submissions always carry one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanClassificationEntry {
    pub id: Uuid,
    pub target_id: Uuid,
    /// Submitting user, if authenticated. Anonymous/system submissions allowed.
    pub user: Option<String>,
    /// Remote survey bookkeeping references.
    pub obs_id: Option<i32>,
    pub person_id: Option<i32>,
    pub label: Option<String>,
    pub subclass: Option<String>,
    /// Free text accompanying an "Other" label.
    pub other_text: Option<String>,
    pub redshift: Option<f64>,
    pub comment: Option<String>,
    /// Server-assigned, immutable once written.
    pub created_at_utc: DateTime<Utc>,
}

/// A single automated pipeline classification run.
///
/// Append-only per run; the resolver never assumes one row per pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomatedClassificationEntry {
    pub id: Uuid,
    pub target_id: Uuid,
    pub pipeline: Pipeline,
    pub label: Option<String>,
    /// Confidence in [0, 1]. `None` means the pipeline did not compute one.
    pub probability: Option<f64>,
    pub version: Option<String>,
    pub notes: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// REGISTRY REQUESTS
// =============================================================================

/// Request for idempotent target registration from a catalogue feed row.
#[derive(Debug, Clone)]
pub struct UpsertTargetRequest {
    /// Unique external name; the upsert key.
    pub name: String,
    pub ra: f64,
    pub dec: f64,
    /// Whether the survey has actually observed this object. Unobserved rows
    /// are skipped, not registered.
    pub observed: bool,
    pub detected_at: Option<DateTime<Utc>>,
    pub last_date: Option<DateTime<Utc>>,
    pub z_best: Option<f64>,
    pub z_sn: Option<f64>,
    pub z_gal: Option<f64>,
    pub z_source: Option<String>,
    pub confidence: Option<f64>,
}

impl UpsertTargetRequest {
    /// Validate geometric fields.
    ///
    /// RA must be within [0, 360) and Dec within [-90, 90], both finite.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("target name must not be empty".into()));
        }
        if !self.ra.is_finite() || !(0.0..360.0).contains(&self.ra) {
            return Err(Error::Validation(format!(
                "ra {} out of range [0, 360)",
                self.ra
            )));
        }
        if !self.dec.is_finite() || !(-90.0..=90.0).contains(&self.dec) {
            return Err(Error::Validation(format!(
                "dec {} out of range [-90, 90]",
                self.dec
            )));
        }
        Ok(())
    }
}

/// Outcome of a registry upsert.
///
/// `SkippedUnobserved` is a soft result, not an error: the feed row exists
/// but the survey has not observed the object, so nothing is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UpsertOutcome {
    Created(Target),
    Updated(Target),
    SkippedUnobserved { name: String },
}

impl UpsertOutcome {
    /// Whether this call inserted a new row.
    pub fn was_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created(_))
    }

    /// The registered target, if one was written.
    pub fn target(&self) -> Option<&Target> {
        match self {
            UpsertOutcome::Created(t) | UpsertOutcome::Updated(t) => Some(t),
            UpsertOutcome::SkippedUnobserved { .. } => None,
        }
    }
}

// =============================================================================
// LEDGER REQUESTS
// =============================================================================

/// Request for appending a human classification.
#[derive(Debug, Clone)]
pub struct RecordHumanRequest {
    pub target_id: Uuid,
    pub user: Option<String>,
    pub obs_id: Option<i32>,
    pub person_id: Option<i32>,
    /// Label from the controlled vocabulary, or `Other`.
    pub label: String,
    pub subclass: Option<String>,
    /// Required free text when `label` is `Other` and no subclass is given.
    pub other_text: Option<String>,
    pub redshift: Option<f64>,
    pub comment: Option<String>,
}

/// Request for appending an automated pipeline classification.
#[derive(Debug, Clone)]
pub struct RecordAutomatedRequest {
    pub target_id: Uuid,
    pub pipeline: Pipeline,
    pub label: Option<String>,
    pub probability: Option<f64>,
    pub version: Option<String>,
    pub notes: Option<String>,
}

impl RecordAutomatedRequest {
    /// Validate the probability: `None` or a finite value in [0, 1].
    pub fn validate(&self) -> Result<()> {
        if let Some(p) = self.probability {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(Error::Validation(format!(
                    "probability {p} out of range [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert_request(ra: f64, dec: f64) -> UpsertTargetRequest {
        UpsertTargetRequest {
            name: "LSST25abc".to_string(),
            ra,
            dec,
            observed: true,
            detected_at: None,
            last_date: None,
            z_best: None,
            z_sn: None,
            z_gal: None,
            z_source: None,
            confidence: None,
        }
    }

    #[test]
    fn test_pipeline_round_trip() {
        for p in Pipeline::ALL {
            assert_eq!(Pipeline::from_str(p.as_str()).unwrap(), p);
        }
    }

    #[test]
    fn test_pipeline_unknown_rejected() {
        assert!(Pipeline::from_str("psnid").is_err());
    }

    #[test]
    fn test_only_global_is_global() {
        assert!(Pipeline::Global.is_global());
        assert!(!Pipeline::Superfit.is_global());
        assert!(!Pipeline::Snid.is_global());
    }

    #[test]
    fn test_upsert_valid_coordinates() {
        assert!(upsert_request(150.1, -12.5).validate().is_ok());
        assert!(upsert_request(0.0, -90.0).validate().is_ok());
        assert!(upsert_request(359.999, 90.0).validate().is_ok());
    }

    #[test]
    fn test_upsert_ra_out_of_range() {
        assert!(upsert_request(360.0, 0.0).validate().is_err());
        assert!(upsert_request(-0.1, 0.0).validate().is_err());
        assert!(upsert_request(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn test_upsert_dec_out_of_range() {
        assert!(upsert_request(10.0, 90.5).validate().is_err());
        assert!(upsert_request(10.0, -91.0).validate().is_err());
        assert!(upsert_request(10.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_upsert_empty_name_rejected() {
        let mut req = upsert_request(10.0, 10.0);
        req.name = "  ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_automated_probability_bounds() {
        let mut req = RecordAutomatedRequest {
            target_id: Uuid::new_v4(),
            pipeline: Pipeline::Snid,
            label: Some("SN".to_string()),
            probability: Some(0.5),
            version: Some("1.2".to_string()),
            notes: None,
        };
        assert!(req.validate().is_ok());

        req.probability = None;
        assert!(req.validate().is_ok());

        req.probability = Some(1.0);
        assert!(req.validate().is_ok());

        req.probability = Some(1.01);
        assert!(req.validate().is_err());

        req.probability = Some(-0.2);
        assert!(req.validate().is_err());

        req.probability = Some(f64::NAN);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_upsert_outcome_accessors() {
        let skipped = UpsertOutcome::SkippedUnobserved {
            name: "LSST25abc".to_string(),
        };
        assert!(!skipped.was_created());
        assert!(skipped.target().is_none());
    }
}
