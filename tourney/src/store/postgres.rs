//! PostgreSQL-backed document store.
//!
//! Documents live in a single `documents` table keyed by
//! `(collection, id)`. Each collection has a row in `document_collections`
//! carrying the version of its last write; commits lock those rows in
//! sorted order, which serializes writers per collection and lets a
//! collection read act as a precondition.
#![allow(clippy::needless_raw_string_hashes)]

use super::{
    CollectionSnapshot, Commit, DatabaseConfig, DocKey, Document, DocumentStore, Precondition,
    StoreError, StoreResult, Version, Write,
};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Row, Transaction};
use std::time::Duration;

const SCHEMA: [&str; 3] = [
    "CREATE SEQUENCE IF NOT EXISTS document_versions",
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        version BIGINT NOT NULL,
        body JSONB NOT NULL,
        PRIMARY KEY (collection, id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS document_collections (
        collection TEXT PRIMARY KEY,
        version BIGINT NOT NULL
    )
    "#,
];

/// Serialization failures and deadlocks are contention, not faults
fn classify(err: sqlx::Error, context: &str) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if matches!(db_err.code().as_deref(), Some("40001") | Some("40P01")) {
            return StoreError::Conflict(context.to_string());
        }
    }
    StoreError::Database(err)
}

/// PostgreSQL [`DocumentStore`]
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create the document tables if they do not exist yet
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Check if the database connection is healthy
    pub async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn lock_collection(
        tx: &mut Transaction<'_, Postgres>,
        collection: &str,
    ) -> StoreResult<Version> {
        sqlx::query(
            "INSERT INTO document_collections (collection, version) VALUES ($1, 0)
             ON CONFLICT (collection) DO NOTHING",
        )
        .bind(collection)
        .execute(&mut **tx)
        .await
        .map_err(|e| classify(e, collection))?;

        let version: i64 = sqlx::query_scalar(
            "SELECT version FROM document_collections WHERE collection = $1 FOR UPDATE",
        )
        .bind(collection)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| classify(e, collection))?;

        Ok(version as Version)
    }

    async fn check(
        tx: &mut Transaction<'_, Postgres>,
        precondition: &Precondition,
    ) -> StoreResult<()> {
        match precondition {
            Precondition::Document { key, version } => {
                let current: Option<i64> = sqlx::query_scalar(
                    "SELECT version FROM documents WHERE collection = $1 AND id = $2",
                )
                .bind(&key.collection)
                .bind(&key.id)
                .fetch_optional(&mut **tx)
                .await?;

                if current.map(|v| v as Version) != *version {
                    return Err(StoreError::Conflict(key.to_string()));
                }
            }
            Precondition::Collection {
                collection,
                version,
            } => {
                let current: Option<i64> = sqlx::query_scalar(
                    "SELECT version FROM document_collections WHERE collection = $1",
                )
                .bind(collection)
                .fetch_optional(&mut **tx)
                .await?;

                if current.unwrap_or(0) as Version != *version {
                    return Err(StoreError::Conflict(collection.clone()));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, key: &DocKey) -> StoreResult<Option<Document>> {
        let row = sqlx::query("SELECT version, body FROM documents WHERE collection = $1 AND id = $2")
            .bind(&key.collection)
            .bind(&key.id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Document {
            key: key.clone(),
            version: row.get::<i64, _>("version") as Version,
            body: row.get("body"),
        }))
    }

    async fn list(&self, collection: &str) -> StoreResult<CollectionSnapshot> {
        // The version is read first: a write landing between the two queries
        // then shows up as a conflict at commit instead of a stale snapshot.
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM document_collections WHERE collection = $1")
                .bind(collection)
                .fetch_optional(&self.pool)
                .await?;

        let rows = sqlx::query(
            "SELECT id, version, body FROM documents WHERE collection = $1 ORDER BY id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let documents = rows
            .into_iter()
            .map(|row| Document {
                key: DocKey::new(collection, row.get::<String, _>("id")),
                version: row.get::<i64, _>("version") as Version,
                body: row.get("body"),
            })
            .collect();

        Ok(CollectionSnapshot {
            collection: collection.to_string(),
            version: version.unwrap_or(0) as Version,
            documents,
        })
    }

    async fn commit(&self, commit: Commit) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        for collection in commit.collections() {
            Self::lock_collection(&mut tx, collection).await?;
        }

        for precondition in &commit.preconditions {
            Self::check(&mut tx, precondition).await?;
        }

        if commit.writes.is_empty() {
            tx.commit().await?;
            return Ok(());
        }

        let version: i64 = sqlx::query_scalar("SELECT nextval('document_versions')")
            .fetch_one(&mut *tx)
            .await?;

        let mut written = Vec::new();
        for write in &commit.writes {
            match write {
                Write::Set { key, body } => {
                    sqlx::query(
                        r#"
                        INSERT INTO documents (collection, id, version, body)
                        VALUES ($1, $2, $3, $4)
                        ON CONFLICT (collection, id)
                        DO UPDATE SET version = EXCLUDED.version, body = EXCLUDED.body
                        "#,
                    )
                    .bind(&key.collection)
                    .bind(&key.id)
                    .bind(version)
                    .bind(body)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| classify(e, &key.to_string()))?;
                }
                Write::Delete { key } => {
                    sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                        .bind(&key.collection)
                        .bind(&key.id)
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| classify(e, &key.to_string()))?;
                }
            }
            written.push(write.key().collection.as_str());
        }

        written.sort_unstable();
        written.dedup();
        for collection in written {
            sqlx::query("UPDATE document_collections SET version = $1 WHERE collection = $2")
                .bind(version)
                .bind(collection)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| classify(e, "commit"))?;
        Ok(())
    }
}
