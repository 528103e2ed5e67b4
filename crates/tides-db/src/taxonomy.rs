//! Persisted class→subclass taxonomy repository.
//!
//! The top-level vocabulary and its sub-classes are seeded by migration and
//! extended over time as pipelines emit new sub-types. Lookups are exact
//! string matches scoped to the main class; a miss is a normal soft result.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use tides_core::{Error, Result, TaxonomyStore, TaxonomySubclass};

/// PostgreSQL implementation of the taxonomy store.
pub struct PgTaxonomyRepository {
    pool: Pool<Postgres>,
}

impl PgTaxonomyRepository {
    /// Create a new taxonomy repository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All top-level class names, in seeded display order.
    pub async fn class_names(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM tides_class ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(|r| r.get("name")).collect())
    }

    /// Add a sub-class under an existing main class.
    ///
    /// Used when the taxonomy catches up with a sub-type that pipelines have
    /// already been emitting.
    pub async fn add_subclass(&self, main_class: &str, sub_class: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO tides_class_subclass (main_class_id, sub_class)
            SELECT c.id, $2 FROM tides_class c WHERE c.name = $1
            ON CONFLICT (main_class_id, sub_class) DO UPDATE SET sub_class = EXCLUDED.sub_class
            RETURNING id
            "#,
        )
        .bind(main_class)
        .bind(sub_class)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| r.get("id"))
            .ok_or_else(|| Error::NotFound(format!("class '{main_class}'")))
    }
}

#[async_trait]
impl TaxonomyStore for PgTaxonomyRepository {
    async fn class_exists(&self, name: &str) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tides_class WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn subclasses(&self, main_class: &str) -> Result<Vec<TaxonomySubclass>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, c.name AS main_class, s.sub_class
            FROM tides_class_subclass s
            JOIN tides_class c ON c.id = s.main_class_id
            WHERE c.name = $1
            ORDER BY s.sub_class
            "#,
        )
        .bind(main_class)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|r| TaxonomySubclass {
                id: r.get("id"),
                main_class: r.get("main_class"),
                name: r.get("sub_class"),
            })
            .collect())
    }

    async fn resolve_subclass(
        &self,
        main_class: &str,
        subclass: &str,
    ) -> Result<Option<TaxonomySubclass>> {
        let row = sqlx::query(
            r#"
            SELECT s.id, c.name AS main_class, s.sub_class
            FROM tides_class_subclass s
            JOIN tides_class c ON c.id = s.main_class_id
            WHERE c.name = $1 AND s.sub_class = $2
            "#,
        )
        .bind(main_class)
        .bind(subclass)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| TaxonomySubclass {
            id: r.get("id"),
            main_class: r.get("main_class"),
            name: r.get("sub_class"),
        }))
    }
}
