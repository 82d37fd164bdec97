//! Common test utilities.

use pccs_core::ApiVersion;
use pccs_metadata::{CacheBinding, MetadataResult, SqliteStore};
use sqlx::{Pool, Sqlite};
use tempfile::TempDir;

pub const INTEL_HOST: &str = "api.trustedservices.intel.com";

/// A cache database in a temporary directory, removed on drop.
pub struct TestMetadata {
    pub store: SqliteStore,
    _temp_dir: TempDir,
}

impl TestMetadata {
    pub async fn new() -> MetadataResult<Self> {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store = SqliteStore::new(temp_dir.path().join("pckcache.db")).await?;
        Ok(Self {
            store,
            _temp_dir: temp_dir,
        })
    }

    #[allow(dead_code)]
    pub fn pool(&self) -> &Pool<Sqlite> {
        self.store.pool()
    }
}

#[allow(dead_code)]
pub fn binding(host: &str) -> CacheBinding {
    CacheBinding::new(ApiVersion::V4, host)
}

/// Whether a table with this name exists.
#[allow(dead_code)]
pub async fn table_exists(pool: &Pool<Sqlite>, name: &str) -> bool {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap();
    count == 1
}
