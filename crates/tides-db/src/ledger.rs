//! Classification ledger repository.
//!
//! The ledger is append-only: `record_human` and `record_automated` insert
//! new rows and never update or delete existing ones. Each append runs in a
//! single transaction together with a refresh of the target's derived scalar
//! classification cache, so the cache can never drift from the ledger.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Pool, Postgres, Row};
use tracing::{info, warn};
use uuid::Uuid;

use tides_core::{
    resolve_classification, AutomatedClassificationEntry, ClassificationLedger, Error,
    HumanClassificationEntry, Pipeline, RecordAutomatedRequest, RecordHumanRequest, Result,
    OTHER_LABEL,
};

/// Foreign key violation SQLSTATE, used to surface a missing target
/// as `TargetNotFound` instead of a generic database error.
const FK_VIOLATION: &str = "23503";

/// PostgreSQL implementation of the classification ledger.
pub struct PgClassificationLedger {
    pool: Pool<Postgres>,
}

impl PgClassificationLedger {
    /// Create a new ledger repository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_human_row(row: &PgRow) -> HumanClassificationEntry {
    HumanClassificationEntry {
        id: row.get("id"),
        target_id: row.get("target_id"),
        user: row.get("submitted_by"),
        obs_id: row.get("obs_id"),
        person_id: row.get("person_id"),
        label: row.get("label"),
        subclass: row.get("subclass"),
        other_text: row.get("other_text"),
        redshift: row.get("redshift"),
        comment: row.get("comment"),
        created_at_utc: row.get("created_at_utc"),
    }
}

fn map_automated_row(row: &PgRow) -> Result<AutomatedClassificationEntry> {
    let pipeline: String = row.get("pipeline");
    // A CHECK constraint guards this column; a mismatch is stored corruption.
    let pipeline = Pipeline::from_str(&pipeline)
        .map_err(|_| Error::Internal(format!("stored pipeline '{pipeline}' is not recognized")))?;
    Ok(AutomatedClassificationEntry {
        id: row.get("id"),
        target_id: row.get("target_id"),
        pipeline,
        label: row.get("label"),
        probability: row.get("probability"),
        version: row.get("version"),
        notes: row.get("notes"),
        created_at_utc: row.get("created_at_utc"),
    })
}

pub(crate) async fn fetch_human_entries(
    conn: &mut PgConnection,
    target_id: Uuid,
) -> Result<Vec<HumanClassificationEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT id, target_id, submitted_by, obs_id, person_id, label, subclass,
               other_text, redshift, comment, created_at_utc
        FROM human_classification
        WHERE target_id = $1
        ORDER BY created_at_utc DESC
        "#,
    )
    .bind(target_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(Error::Database)?;

    Ok(rows.iter().map(map_human_row).collect())
}

pub(crate) async fn fetch_automated_entries(
    conn: &mut PgConnection,
    target_id: Uuid,
) -> Result<Vec<AutomatedClassificationEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT id, target_id, pipeline, label, probability, version, notes, created_at_utc
        FROM pipeline_classification
        WHERE target_id = $1
        ORDER BY created_at_utc DESC
        "#,
    )
    .bind(target_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(Error::Database)?;

    rows.iter().map(map_automated_row).collect()
}

/// Recompute the target's derived scalar classification from its ledger.
///
/// Human consensus is preferred for display; the automated winner fills in
/// when no human has classified the target yet. The cached value is never
/// read back by the resolver.
pub(crate) async fn refresh_classification_cache(
    conn: &mut PgConnection,
    target_id: Uuid,
) -> Result<()> {
    let human = fetch_human_entries(&mut *conn, target_id).await?;
    let automated = fetch_automated_entries(&mut *conn, target_id).await?;
    let resolved = resolve_classification(&human, &automated);

    let cached = resolved
        .consensus
        .map(|c| c.label)
        .or(resolved.automated.map(|a| a.label));

    sqlx::query("UPDATE tides_cand SET classification = $2 WHERE id = $1")
        .bind(target_id)
        .bind(cached)
        .execute(&mut *conn)
        .await
        .map_err(Error::Database)?;
    Ok(())
}

fn map_insert_err(e: sqlx::Error, target_id: Uuid) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FK_VIOLATION) => {
            Error::TargetNotFound(target_id)
        }
        _ => Error::Database(e),
    }
}

#[async_trait]
impl ClassificationLedger for PgClassificationLedger {
    async fn record_human(&self, req: RecordHumanRequest) -> Result<Uuid> {
        let class_known: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tides_class WHERE name = $1)")
                .bind(&req.label)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        if !class_known {
            return Err(Error::Validation(format!(
                "label '{}' is not in the classification vocabulary",
                req.label
            )));
        }
        if req.label == OTHER_LABEL
            && req.subclass.is_none()
            && req.other_text.as_deref().map_or(true, |t| t.trim().is_empty())
        {
            return Err(Error::Validation(
                "label 'Other' requires a subclass or free text".into(),
            ));
        }

        // Sub-class lookup is a soft gate: the taxonomy may not yet cover a
        // new sub-type, and the submission must still be recorded.
        if let Some(sub) = req.subclass.as_deref() {
            let sub_known: bool = sqlx::query_scalar(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM tides_class_subclass s
                    JOIN tides_class c ON c.id = s.main_class_id
                    WHERE c.name = $1 AND s.sub_class = $2
                )
                "#,
            )
            .bind(&req.label)
            .bind(sub)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
            if !sub_known {
                warn!(
                    subsystem = "db",
                    component = "ledger",
                    op = "record_human",
                    target_id = %req.target_id,
                    label = %req.label,
                    subclass = %sub,
                    "Sub-class not in taxonomy, recording as submitted"
                );
            }
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let row = sqlx::query(
            r#"
            INSERT INTO human_classification
                (target_id, submitted_by, obs_id, person_id, label, subclass,
                 other_text, redshift, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(req.target_id)
        .bind(&req.user)
        .bind(req.obs_id)
        .bind(req.person_id)
        .bind(&req.label)
        .bind(&req.subclass)
        .bind(&req.other_text)
        .bind(req.redshift)
        .bind(&req.comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_err(e, req.target_id))?;
        let id: Uuid = row.get("id");

        refresh_classification_cache(&mut tx, req.target_id).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "ledger",
            op = "record_human",
            target_id = %req.target_id,
            entry_id = %id,
            label = %req.label,
            "Recorded human classification"
        );
        Ok(id)
    }

    async fn record_automated(&self, req: RecordAutomatedRequest) -> Result<Uuid> {
        req.validate()?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let row = sqlx::query(
            r#"
            INSERT INTO pipeline_classification
                (target_id, pipeline, label, probability, version, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(req.target_id)
        .bind(req.pipeline.as_str())
        .bind(&req.label)
        .bind(req.probability)
        .bind(&req.version)
        .bind(&req.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_err(e, req.target_id))?;
        let id: Uuid = row.get("id");

        refresh_classification_cache(&mut tx, req.target_id).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "ledger",
            op = "record_automated",
            target_id = %req.target_id,
            entry_id = %id,
            pipeline = %req.pipeline,
            probability = ?req.probability,
            "Recorded automated classification"
        );
        Ok(id)
    }

    async fn human_entries(&self, target_id: Uuid) -> Result<Vec<HumanClassificationEntry>> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        fetch_human_entries(&mut conn, target_id).await
    }

    async fn automated_entries(
        &self,
        target_id: Uuid,
    ) -> Result<Vec<AutomatedClassificationEntry>> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        fetch_automated_entries(&mut conn, target_id).await
    }
}
