//! Target registry repository.
//!
//! Targets are registered from the survey catalogue feed by unique external
//! name. Registration is an idempotent upsert: repeated calls with the same
//! input leave one row, and updates overwrite only the supplied fields. The
//! classification ledger hanging off a target is never touched from here.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{info, warn};
use uuid::Uuid;

use tides_core::{Error, Result, Target, TargetRegistry, UpsertOutcome, UpsertTargetRequest};

use crate::ledger::refresh_classification_cache;

/// PostgreSQL implementation of the target registry.
pub struct PgTargetRepository {
    pool: Pool<Postgres>,
}

impl PgTargetRepository {
    /// Create a new target repository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const TARGET_COLUMNS: &str = "id, name, ra, dec, detected_at, last_date, created_at_utc, \
     classification, z_best, z_sn, z_gal, z_source, confidence";

fn map_target_row(row: &PgRow) -> Target {
    Target {
        id: row.get("id"),
        name: row.get("name"),
        ra: row.get("ra"),
        dec: row.get("dec"),
        detected_at: row.get("detected_at"),
        last_date: row.get("last_date"),
        created_at_utc: row.get("created_at_utc"),
        classification: row.get("classification"),
        z_best: row.get("z_best"),
        z_sn: row.get("z_sn"),
        z_gal: row.get("z_gal"),
        z_source: row.get("z_source"),
        confidence: row.get("confidence"),
    }
}

#[async_trait]
impl TargetRegistry for PgTargetRepository {
    async fn upsert(&self, req: UpsertTargetRequest) -> Result<UpsertOutcome> {
        req.validate()?;

        if !req.observed {
            warn!(
                subsystem = "db",
                component = "registry",
                op = "upsert",
                target_name = %req.name,
                "Target not observed by the survey, skipping registration"
            );
            return Ok(UpsertOutcome::SkippedUnobserved { name: req.name });
        }

        // Optional fields keep their stored value when the feed row does not
        // supply them; coordinates are always present and always overwritten.
        // `xmax = 0` distinguishes a fresh insert from a conflict update.
        let row = sqlx::query(
            r#"
            INSERT INTO tides_cand
                (name, ra, dec, detected_at, last_date, z_best, z_sn, z_gal,
                 z_source, confidence)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (name) DO UPDATE SET
                ra = EXCLUDED.ra,
                dec = EXCLUDED.dec,
                detected_at = COALESCE(EXCLUDED.detected_at, tides_cand.detected_at),
                last_date = COALESCE(EXCLUDED.last_date, tides_cand.last_date),
                z_best = COALESCE(EXCLUDED.z_best, tides_cand.z_best),
                z_sn = COALESCE(EXCLUDED.z_sn, tides_cand.z_sn),
                z_gal = COALESCE(EXCLUDED.z_gal, tides_cand.z_gal),
                z_source = COALESCE(EXCLUDED.z_source, tides_cand.z_source),
                confidence = COALESCE(EXCLUDED.confidence, tides_cand.confidence)
            RETURNING id, name, ra, dec, detected_at, last_date, created_at_utc,
                      classification, z_best, z_sn, z_gal, z_source, confidence,
                      (xmax = 0) AS was_created
            "#,
        )
        .bind(&req.name)
        .bind(req.ra)
        .bind(req.dec)
        .bind(req.detected_at)
        .bind(req.last_date)
        .bind(req.z_best)
        .bind(req.z_sn)
        .bind(req.z_gal)
        .bind(&req.z_source)
        .bind(req.confidence)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let was_created: bool = row.get("was_created");
        let target = map_target_row(&row);

        info!(
            subsystem = "db",
            component = "registry",
            op = "upsert",
            target_id = %target.id,
            target_name = %target.name,
            was_created,
            "Registered target"
        );

        Ok(if was_created {
            UpsertOutcome::Created(target)
        } else {
            UpsertOutcome::Updated(target)
        })
    }

    async fn fetch(&self, id: Uuid) -> Result<Target> {
        let row = sqlx::query(&format!(
            "SELECT {TARGET_COLUMNS} FROM tides_cand WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(map_target_row)
            .ok_or(Error::TargetNotFound(id))
    }

    async fn fetch_by_name(&self, name: &str) -> Result<Option<Target>> {
        let row = sqlx::query(&format!(
            "SELECT {TARGET_COLUMNS} FROM tides_cand WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_target_row))
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Target>> {
        let rows = sqlx::query(&format!(
            "SELECT {TARGET_COLUMNS} FROM tides_cand ORDER BY created_at_utc DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_target_row).collect())
    }

    async fn refresh_cached_classification(&self, target_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        refresh_classification_cache(&mut conn, target_id).await
    }
}
