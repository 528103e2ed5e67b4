//! # tides-db
//!
//! PostgreSQL storage layer for the TiDES classification portal.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for the target registry, the append-only
//!   classification ledger, and the class taxonomy
//! - Derived-cache maintenance: every ledger append atomically refreshes the
//!   target's legacy scalar classification column from the ledger
//!
//! ## Example
//!
//! ```rust,ignore
//! use tides_db::{Database, ClassificationLedger, RecordHumanRequest, TargetRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/tides").await?;
//!
//!     let target = db.targets.fetch_by_name("LSST25abc").await?.unwrap();
//!     let entry_id = db.ledger.record_human(RecordHumanRequest {
//!         target_id: target.id,
//!         user: Some("pwise".to_string()),
//!         obs_id: None,
//!         person_id: None,
//!         label: "SN".to_string(),
//!         subclass: Some("SN Ia".to_string()),
//!         other_text: None,
//!         redshift: Some(0.072),
//!         comment: None,
//!     }).await?;
//!
//!     println!("Recorded submission: {}", entry_id);
//!     Ok(())
//! }
//! ```

pub mod ledger;
pub mod pool;
pub mod targets;
pub mod taxonomy;

#[cfg(test)]
mod tests;

// Test fixtures shared by the integration tests in src/tests/.
#[cfg(test)]
pub mod test_fixtures;

// Re-export core types
pub use tides_core::*;

// Re-export repository implementations
pub use ledger::PgClassificationLedger;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use targets::PgTargetRepository;
pub use taxonomy::PgTaxonomyRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Target registry for idempotent catalogue ingestion and reads.
    pub targets: PgTargetRepository,
    /// Append-only classification ledger.
    pub ledger: PgClassificationLedger,
    /// Class→subclass taxonomy lookups.
    pub taxonomy: PgTaxonomyRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            targets: PgTargetRepository::new(pool.clone()),
            ledger: PgClassificationLedger::new(pool.clone()),
            taxonomy: PgTaxonomyRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Create a new Database instance from the `DATABASE_URL` environment
    /// variable.
    pub async fn connect_from_env() -> Result<Self> {
        Self::connect(&database_url_from_env()?).await
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

/// Read the database URL from the `DATABASE_URL` environment variable.
pub fn database_url_from_env() -> Result<String> {
    std::env::var("DATABASE_URL").map_err(|_| Error::Config("DATABASE_URL is not set".into()))
}
