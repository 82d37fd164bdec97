//! Cache schema migrations.
//!
//! Migrations are a statically registered, name-ordered table of
//! [`Migration`] descriptors (see [`registry::MIGRATIONS`]). Each descriptor
//! carries its own up and down step; a step is either a SQL script compiled
//! into the binary or a Rust function run against the connection.
//!
//! [`MigrationOrchestrator`] decides which descriptors still need applying and
//! records each one in the `schema_migrations` ledger.

mod orchestrator;
pub mod registry;

pub use orchestrator::{MigrationOrchestrator, OrchestratorState};
pub use registry::MIGRATIONS;

use crate::error::MetadataResult;
use futures::future::BoxFuture;
use sqlx::SqliteConnection;
use std::fmt;

/// A migration step implemented in Rust.
pub type CodeStep = for<'c> fn(&'c mut SqliteConnection) -> BoxFuture<'c, MetadataResult<()>>;

/// One direction (up or down) of a migration.
#[derive(Clone, Copy)]
pub enum MigrationStep {
    /// A `;`-separated SQL script, executed statement by statement.
    Sql(&'static str),
    /// A Rust function.
    Code(CodeStep),
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(script) => f
                .debug_struct("Sql")
                .field("statements", &script_statements(script).len())
                .finish(),
            Self::Code(_) => f.write_str("Code"),
        }
    }
}

/// How a migration is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationKind {
    SqlScript,
    CodeModule,
}

/// A registered migration unit.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Unique name; also the sort key.
    pub name: &'static str,
    pub up: MigrationStep,
    pub down: MigrationStep,
}

impl Migration {
    /// A migration backed by an up script and its matching down script.
    pub const fn script(name: &'static str, up: &'static str, down: &'static str) -> Self {
        Self {
            name,
            up: MigrationStep::Sql(up),
            down: MigrationStep::Sql(down),
        }
    }

    /// A migration implemented in Rust.
    pub const fn code(name: &'static str, up: CodeStep, down: CodeStep) -> Self {
        Self {
            name,
            up: MigrationStep::Code(up),
            down: MigrationStep::Code(down),
        }
    }

    pub fn kind(&self) -> MigrationKind {
        match self.up {
            MigrationStep::Sql(_) => MigrationKind::SqlScript,
            MigrationStep::Code(_) => MigrationKind::CodeModule,
        }
    }
}

/// Split a SQL script into individual statements.
///
/// Empty and comment-only chunks are skipped.
pub fn script_statements(script: &str) -> Vec<&str> {
    script
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// Run one migration step on `conn`.
///
/// Script statements run strictly in order, each awaited before the next.
pub async fn run_step(conn: &mut SqliteConnection, step: &MigrationStep) -> MetadataResult<()> {
    match step {
        MigrationStep::Sql(script) => {
            for statement in script_statements(script) {
                sqlx::query(statement).execute(&mut *conn).await?;
                tracing::trace!(statement, "Executed migration statement");
            }
            Ok(())
        }
        MigrationStep::Code(step) => step(conn).await,
    }
}

/// Lifecycle phase of a migration unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    Started,
    Finished,
    Failed,
}

/// A structured lifecycle record produced while migrating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationEvent {
    pub unit: &'static str,
    pub phase: MigrationPhase,
    /// Failure message, set only for [`MigrationPhase::Failed`].
    pub error: Option<String>,
}

/// Outcome of a successful orchestrator run.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// The schema was absent and has been created from scratch.
    pub fresh: bool,
    /// Units applied during this run, in order.
    pub applied: Vec<&'static str>,
    /// Units skipped because the ledger already lists them.
    pub already_applied: Vec<&'static str>,
    pub events: Vec<MigrationEvent>,
}
