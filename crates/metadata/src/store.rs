//! Metadata store trait and SQLite implementation.

use crate::error::MetadataResult;
use crate::models::{CacheBinding, CrlRow, EnclaveIdentityRow};
use crate::repos::{BindingRepo, CrlRepo, IdentityRepo};
use async_trait::async_trait;
use pccs_core::{ApiVersion, EnclaveIdentityKind, UpdateType};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: CrlRepo + IdentityRepo + BindingRepo + Send + Sync {
    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
///
/// Opening a store does not touch the schema; bringing it up to date is the
/// job of [`crate::migration::MigrationOrchestrator`].
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (and create if missing) a SQLite database.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under axum concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        tracing::debug!(path = %path.display(), "Opened cache database");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BindingRepo for SqliteStore {
    async fn list_bindings(&self) -> MetadataResult<Vec<CacheBinding>> {
        let rows = sqlx::query_as::<_, CacheBinding>(
            "SELECT api_version, server_addr FROM pcs_version ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_binding(&self, binding: &CacheBinding) -> MetadataResult<()> {
        sqlx::query("INSERT INTO pcs_version (api_version, server_addr) VALUES (?, ?)")
            .bind(binding.api_version)
            .bind(&binding.server_addr)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CrlRepo for SqliteStore {
    async fn get_crl(&self, uri: &str) -> MetadataResult<Option<CrlRow>> {
        let row = sqlx::query_as::<_, CrlRow>(
            "SELECT uri, crl, crl_size, created_at, updated_at FROM pck_crl WHERE uri = ?",
        )
        .bind(uri)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_crl(&self, row: &CrlRow) -> MetadataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pck_crl (uri, crl, crl_size, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(uri) DO UPDATE
            SET crl = excluded.crl,
                crl_size = excluded.crl_size,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&row.uri)
        .bind(&row.crl)
        .bind(row.crl_size)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityRepo for SqliteStore {
    async fn get_identity(
        &self,
        kind: EnclaveIdentityKind,
        version: ApiVersion,
        update_type: UpdateType,
    ) -> MetadataResult<Option<EnclaveIdentityRow>> {
        let row = sqlx::query_as::<_, EnclaveIdentityRow>(
            r#"
            SELECT identity_id, api_version, update_type, identity, issuer_chain,
                   created_at, updated_at
            FROM enclave_identities
            WHERE identity_id = ? AND api_version = ? AND update_type = ?
            "#,
        )
        .bind(kind.id())
        .bind(i64::from(version.number()))
        .bind(update_type.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_identity(&self, row: &EnclaveIdentityRow) -> MetadataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO enclave_identities
                (identity_id, api_version, update_type, identity, issuer_chain, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(identity_id, api_version, update_type) DO UPDATE
            SET identity = excluded.identity,
                issuer_chain = excluded.issuer_chain,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(row.identity_id)
        .bind(row.api_version)
        .bind(&row.update_type)
        .bind(&row.identity)
        .bind(&row.issuer_chain)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
