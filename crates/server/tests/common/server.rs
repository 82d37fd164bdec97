//! Server test utilities.

use super::fixtures::MockCollateral;
use pccs_core::config::{AppConfig, MetadataConfig};
use pccs_metadata::{CacheBinding, MetadataStore, MigrationOrchestrator, SqliteStore};
use pccs_server::{AppState, create_router};
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub collateral: Arc<MockCollateral>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server backed by a migrated temporary database.
    pub async fn new() -> Self {
        Self::with_collateral(MockCollateral::default()).await
    }

    pub async fn with_collateral(collateral: MockCollateral) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let config = test_config(&temp_dir);

        let store = SqliteStore::new(&config.metadata.path)
            .await
            .expect("Failed to create metadata store");
        let binding = CacheBinding::new(
            config.upstream.api_version().unwrap(),
            config.upstream.host().unwrap(),
        );
        MigrationOrchestrator::new(&store, binding)
            .run()
            .await
            .expect("Failed to migrate metadata store");
        let metadata: Arc<dyn MetadataStore> = Arc::new(store);

        let collateral = Arc::new(collateral);
        let state = AppState::new(config, metadata, collateral.clone(), collateral.clone());
        let router = create_router(state.clone());

        Self {
            router,
            state,
            collateral,
            _temp_dir: temp_dir,
        }
    }
}

/// Test configuration with the cache database inside `temp_dir`.
#[allow(dead_code)]
pub fn test_config(temp_dir: &TempDir) -> AppConfig {
    AppConfig {
        metadata: MetadataConfig {
            path: temp_dir.path().join("pckcache.db"),
            init_db: true,
        },
        ..AppConfig::for_testing()
    }
}
