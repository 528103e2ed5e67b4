//! Structured logging field name constants.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across the
//! registry, ledger, and resolver.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue (taxonomy miss, skipped feed row) |
//! | INFO  | Lifecycle events, completed appends and upserts |
//! | DEBUG | Resolution decisions, intermediate values |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event. Values: "db", "core".
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "registry", "ledger", "resolver", "taxonomy", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "upsert", "record_human", "record_automated", "human_consensus"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Target UUID being operated on.
pub const TARGET_ID: &str = "target_id";

/// External catalogue name of the target.
pub const TARGET_NAME: &str = "target_name";

/// Ledger entry UUID produced by an append.
pub const ENTRY_ID: &str = "entry_id";

/// Pipeline identifier for automated entries.
pub const PIPELINE: &str = "pipeline";

/// Classification label involved in the operation.
pub const LABEL: &str = "label";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Support count behind a consensus label.
pub const SUPPORT: &str = "support";

/// Total submissions considered by a resolution.
pub const TOTAL_SUBMISSIONS: &str = "total_submissions";

/// Probability attached to an automated entry.
pub const PROBABILITY: &str = "probability";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
