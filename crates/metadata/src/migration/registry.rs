//! Compiled-in migration table.

use super::Migration;
use crate::error::MetadataResult;
use futures::future::BoxFuture;
use sqlx::SqliteConnection;

/// Every known migration, in application order.
pub static MIGRATIONS: &[Migration] = &[
    Migration::script(
        "0001_initial_schema",
        include_str!("../../migrations/0001_initial_schema.up.sql"),
        include_str!("../../migrations/0001_initial_schema.down.sql"),
    ),
    Migration::script(
        "0002_enclave_identities",
        include_str!("../../migrations/0002_enclave_identities.up.sql"),
        include_str!("../../migrations/0002_enclave_identities.down.sql"),
    ),
    Migration::code("0003_pck_crl_size", pck_crl_size_up, pck_crl_size_down),
];

/// Add `crl_size` to `pck_crl` and backfill it from the stored CRLs.
fn pck_crl_size_up(conn: &mut SqliteConnection) -> BoxFuture<'_, MetadataResult<()>> {
    Box::pin(async move {
        let columns: Vec<(i32, String, String, i32, Option<String>, i32)> =
            sqlx::query_as("PRAGMA table_info(pck_crl)")
                .fetch_all(&mut *conn)
                .await?;

        let has_crl_size = columns
            .iter()
            .any(|(_, name, _, _, _, _)| name == "crl_size");

        if !has_crl_size {
            sqlx::query("ALTER TABLE pck_crl ADD COLUMN crl_size INTEGER NOT NULL DEFAULT 0")
                .execute(&mut *conn)
                .await?;
        }

        sqlx::query("UPDATE pck_crl SET crl_size = length(crl)")
            .execute(&mut *conn)
            .await?;
        Ok(())
    })
}

fn pck_crl_size_down(conn: &mut SqliteConnection) -> BoxFuture<'_, MetadataResult<()>> {
    Box::pin(async move {
        sqlx::query("ALTER TABLE pck_crl DROP COLUMN crl_size")
            .execute(&mut *conn)
            .await?;
        Ok(())
    })
}
