//! Startup migration pass and cache compatibility check.

use super::{
    Migration, MigrationEvent, MigrationPhase, MigrationReport, registry::MIGRATIONS, run_step,
};
use crate::error::{Incompatibility, MetadataError, MetadataResult};
use crate::models::CacheBinding;
use crate::repos::BindingRepo;
use crate::store::SqliteStore;
use sqlx::SqliteConnection;
use std::collections::HashSet;

/// Where the orchestrator is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Nothing checked yet.
    Uninitialized,
    /// Applying outstanding units.
    Migrating,
    /// Every known unit is applied and the cache is bound to the configured host.
    Ready,
    /// The existing cache cannot be served from. Needs operator action.
    Blocked,
    /// A unit failed. Restarting resumes after the last applied unit.
    Failed,
}

/// Brings a cache database to "all known migrations applied".
///
/// A run:
/// 1. probes for the schema marker (`pck_crl`);
/// 2. on an existing cache, checks the recorded [`CacheBinding`] against the
///    configured one and stops in [`OrchestratorState::Blocked`] on mismatch;
/// 3. applies every unit missing from the `schema_migrations` ledger in name
///    order, each in its own transaction together with its ledger row;
/// 4. on a fresh cache, records the binding in the same transaction as the
///    unit that creates `pcs_version`.
pub struct MigrationOrchestrator<'a> {
    store: &'a SqliteStore,
    binding: CacheBinding,
    migrations: Vec<&'a Migration>,
    state: OrchestratorState,
    events: Vec<MigrationEvent>,
}

impl<'a> MigrationOrchestrator<'a> {
    /// Orchestrator over the compiled-in migration table.
    pub fn new(store: &'a SqliteStore, binding: CacheBinding) -> Self {
        Self::with_migrations(store, binding, MIGRATIONS)
    }

    /// Orchestrator over a custom migration table. Units are applied in name order
    /// regardless of their order in `migrations`.
    pub fn with_migrations(
        store: &'a SqliteStore,
        binding: CacheBinding,
        migrations: &'a [Migration],
    ) -> Self {
        let mut migrations: Vec<&Migration> = migrations.iter().collect();
        migrations.sort_by_key(|m| m.name);
        Self {
            store,
            binding,
            migrations,
            state: OrchestratorState::Uninitialized,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Lifecycle records of the last run, including a failed one.
    pub fn events(&self) -> &[MigrationEvent] {
        &self.events
    }

    /// Check compatibility and apply outstanding migrations.
    pub async fn run(&mut self) -> MetadataResult<MigrationReport> {
        self.state = OrchestratorState::Uninitialized;
        self.events.clear();

        if let Err(e) = self.check_unique_names() {
            self.state = OrchestratorState::Failed;
            return Err(e);
        }

        let fresh = !self.schema_present().await?;
        if fresh {
            tracing::info!(
                server_addr = %self.binding.server_addr,
                "Cache schema not found, initializing"
            );
        } else if let Err(e) = self.check_compatibility().await {
            self.state = OrchestratorState::Blocked;
            tracing::error!(error = %e, "Cache database is incompatible");
            return Err(e);
        }

        self.state = OrchestratorState::Migrating;
        let (applied, already_applied) = match self.apply_pending(fresh).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = OrchestratorState::Failed;
                return Err(e);
            }
        };

        self.state = OrchestratorState::Ready;
        tracing::info!(
            applied = applied.len(),
            skipped = already_applied.len(),
            "Cache schema is up to date"
        );

        Ok(MigrationReport {
            fresh,
            applied,
            already_applied,
            events: self.events.clone(),
        })
    }

    /// Names recorded in the ledger, in application order. Empty when the
    /// ledger table does not exist yet.
    pub async fn applied_names(&self) -> MetadataResult<Vec<String>> {
        let mut conn = self.store.pool().acquire().await?;
        if !table_exists(&mut *conn, "schema_migrations").await? {
            return Ok(Vec::new());
        }
        let names: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM schema_migrations ORDER BY rowid")
                .fetch_all(&mut *conn)
                .await?;
        Ok(names.into_iter().map(|(name,)| name).collect())
    }

    fn check_unique_names(&self) -> MetadataResult<()> {
        let mut seen = HashSet::new();
        for migration in &self.migrations {
            if !seen.insert(migration.name) {
                return Err(MetadataError::Internal(format!(
                    "duplicate migration name: {}",
                    migration.name
                )));
            }
        }
        Ok(())
    }

    /// Whether the marker table answers a query.
    async fn schema_present(&self) -> MetadataResult<bool> {
        match sqlx::query("SELECT 1 FROM pck_crl LIMIT 1")
            .fetch_optional(self.store.pool())
            .await
        {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(e)) => {
                tracing::debug!(error = %e, "Schema probe failed");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_ledger(&self) -> MetadataResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL
            )
            "#,
        )
        .execute(self.store.pool())
        .await?;
        Ok(())
    }

    /// Validate the recorded binding of an existing cache. Exactly one record
    /// naming the configured host is accepted.
    async fn check_compatibility(&self) -> MetadataResult<()> {
        // A cache from a release that predates the version table has no records.
        let records = match self.store.list_bindings().await {
            Ok(records) => records,
            Err(MetadataError::Database(sqlx::Error::Database(_))) => Vec::new(),
            Err(e) => return Err(e),
        };
        match records.as_slice() {
            [record] if record.server_addr == self.binding.server_addr => Ok(()),
            [record] => Err(MetadataError::CacheIncompatible(
                Incompatibility::ServerAddressMismatch {
                    recorded: record.server_addr.clone(),
                    configured: self.binding.server_addr.clone(),
                },
            )),
            _ => Err(MetadataError::CacheIncompatible(
                Incompatibility::AmbiguousVersionRecord {
                    found: records.len(),
                },
            )),
        }
    }

    /// Apply every unit not yet in the ledger. Stops at the first failure.
    ///
    /// On a fresh cache the binding is still owed; it is written in the
    /// transaction of the first unit after which `pcs_version` exists.
    async fn apply_pending(
        &mut self,
        fresh: bool,
    ) -> MetadataResult<(Vec<&'static str>, Vec<&'static str>)> {
        self.ensure_ledger().await?;
        let done: HashSet<String> = self.applied_names().await?.into_iter().collect();
        let mut applied = Vec::new();
        let mut already_applied = Vec::new();
        let mut binding_owed = fresh;

        for migration in self.migrations.clone() {
            if done.contains(migration.name) {
                already_applied.push(migration.name);
                continue;
            }

            self.record(migration.name, MigrationPhase::Started, None);
            match self.apply_one(migration, binding_owed).await {
                Ok(bound) => {
                    self.record(migration.name, MigrationPhase::Finished, None);
                    applied.push(migration.name);
                    if bound {
                        binding_owed = false;
                        tracing::info!(
                            unit = migration.name,
                            api_version = self.binding.api_version,
                            server_addr = %self.binding.server_addr,
                            "Recorded cache binding"
                        );
                    }
                }
                Err(e) => {
                    self.record(migration.name, MigrationPhase::Failed, Some(e.to_string()));
                    return Err(MetadataError::Migration {
                        unit: migration.name.to_string(),
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok((applied, already_applied))
    }

    /// Run a unit's up step and its ledger insert in one transaction. With
    /// `bind` set, also writes the binding once `pcs_version` exists and is
    /// empty. Returns whether the binding was written.
    async fn apply_one(&self, migration: &Migration, bind: bool) -> MetadataResult<bool> {
        let mut tx = self.store.pool().begin().await?;
        run_step(&mut *tx, &migration.up).await?;
        sqlx::query("INSERT INTO schema_migrations (name, applied_at) VALUES (?, ?)")
            .bind(migration.name)
            .bind(time::OffsetDateTime::now_utc())
            .execute(&mut *tx)
            .await?;

        let mut bound = false;
        if bind && table_exists(&mut *tx, "pcs_version").await? {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pcs_version")
                .fetch_one(&mut *tx)
                .await?;
            if count == 0 {
                sqlx::query("INSERT INTO pcs_version (api_version, server_addr) VALUES (?, ?)")
                    .bind(self.binding.api_version)
                    .bind(&self.binding.server_addr)
                    .execute(&mut *tx)
                    .await?;
            }
            bound = true;
        }

        tx.commit().await?;
        Ok(bound)
    }

    fn record(&mut self, unit: &'static str, phase: MigrationPhase, error: Option<String>) {
        match (&phase, &error) {
            (MigrationPhase::Started, _) => tracing::info!(unit, "Starting migration"),
            (MigrationPhase::Finished, _) => tracing::info!(unit, "Finished migration"),
            (MigrationPhase::Failed, error) => {
                tracing::error!(unit, error = error.as_deref().unwrap_or(""), "Migration failed")
            }
        }
        self.events.push(MigrationEvent { unit, phase, error });
    }
}

async fn table_exists(conn: &mut SqliteConnection, name: &str) -> MetadataResult<bool> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count > 0)
}
