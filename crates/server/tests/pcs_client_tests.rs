//! Upstream PCS client and read-through cache tests against a mock PCS.

mod common;

use axum::http::StatusCode;
use common::{get, test_config};
use httpmock::Method::GET;
use httpmock::MockServer;
use pccs_core::config::UpstreamConfig;
use pccs_core::{ApiVersion, EnclaveIdentityKind, UpdateType};
use pccs_metadata::{CacheBinding, MetadataStore, MigrationOrchestrator, SqliteStore};
use pccs_server::services::pcs::API_KEY_HEADER;
use pccs_server::services::{
    CachingCollateralService, CrlService, IdentityService, PcsClient, ServiceError,
};
use pccs_server::{AppState, create_router};
use std::net::TcpListener;
use std::sync::Arc;

const QE_IDENTITY: &str = r#"{"enclaveIdentity":{"id":"QE","version":2}}"#;
const ISSUER_CHAIN: &str = "-----BEGIN%20CERTIFICATE-----%0AMIICizCCAjKgAwIBAgIUfjiC1ftVKUpASY5FhAPpFJG99FUwCgYIKoZIzj0EAwIw";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn upstream(server: &MockServer, version: &str) -> UpstreamConfig {
    UpstreamConfig {
        uri: server.url(format!("/sgx/certification/{version}/")),
        api_key: Some("test-key".to_string()),
        timeout_secs: 5,
    }
}

async fn migrated_store(temp_dir: &tempfile::TempDir) -> Arc<dyn MetadataStore> {
    let store = SqliteStore::new(temp_dir.path().join("pckcache.db"))
        .await
        .unwrap();
    MigrationOrchestrator::new(&store, CacheBinding::new(ApiVersion::V4, "127.0.0.1"))
        .run()
        .await
        .unwrap();
    Arc::new(store)
}

#[tokio::test]
async fn test_fetches_identity_with_key_and_update() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/sgx/certification/v4/qe/identity")
                .query_param("update", "early")
                .header(API_KEY_HEADER.to_ascii_lowercase(), "test-key");
            then.status(200)
                .header("SGX-Enclave-Identity-Issuer-Chain", ISSUER_CHAIN)
                .header("Content-Type", "application/json")
                .body(QE_IDENTITY);
        })
        .await;

    let client = PcsClient::new(&upstream(&server, "v4")).unwrap();
    let document = client
        .get_enclave_identity(EnclaveIdentityKind::Qe, ApiVersion::V4, UpdateType::Early)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(document.identity, QE_IDENTITY);
    assert_eq!(document.issuer_chain, ISSUER_CHAIN);
}

#[tokio::test]
async fn test_missing_issuer_chain_is_an_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/sgx/certification/v3/qve/identity");
            then.status(200).body("{}");
        })
        .await;

    let client = PcsClient::new(&upstream(&server, "v3")).unwrap();
    let err = client
        .get_enclave_identity(EnclaveIdentityKind::Qve, ApiVersion::V3, UpdateType::Standard)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::MissingHeader(_)));
}

#[tokio::test]
async fn test_upstream_status_codes() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tdx/certification/v4/qe/identity");
            then.status(404);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/sgx/certification/v4/pckcrl");
            then.status(503).body("maintenance");
        })
        .await;

    let client = PcsClient::new(&upstream(&server, "v4")).unwrap();

    let err = client
        .get_enclave_identity(EnclaveIdentityKind::TdQe, ApiVersion::V4, UpdateType::Standard)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = client
        .get_crl(&server.url("/sgx/certification/v4/pckcrl?ca=platform"))
        .await
        .unwrap_err();
    match err {
        ServiceError::UpstreamStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected upstream status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_redirects_are_not_followed() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let elsewhere = MockServer::start_async().await;
    let target = elsewhere
        .mock_async(|when, then| {
            when.method(GET).path("/stolen");
            then.status(200).body("not a crl");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/sgx/certification/v4/qe/identity");
            then.status(302).header("Location", elsewhere.url("/stolen"));
        })
        .await;

    let client = PcsClient::new(&upstream(&server, "v4")).unwrap();
    let err = client
        .get_enclave_identity(EnclaveIdentityKind::Qe, ApiVersion::V4, UpdateType::Standard)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::UpstreamStatus { status: 302, .. }));
    target.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_crl_is_cached_after_first_fetch() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let crl = vec![0x30u8, 0x82, 0x01, 0x22];
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/sgx/certification/v4/pckcrl")
                .query_param("ca", "processor");
            then.status(200).body(crl.clone());
        })
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let store = migrated_store(&temp_dir).await;
    let client = PcsClient::new(&upstream(&server, "v4")).unwrap();
    let service = CachingCollateralService::new(store.clone(), client);

    let uri = server.url("/sgx/certification/v4/pckcrl?ca=processor");
    assert_eq!(service.get_crl(&uri).await.unwrap(), crl);
    assert_eq!(service.get_crl(&uri).await.unwrap(), crl);

    mock.assert_hits_async(1).await;
    let row = store.get_crl(&uri).await.unwrap().expect("CRL not cached");
    assert_eq!(row.crl_size, 4);
}

#[tokio::test]
async fn test_identity_end_to_end_through_router() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/sgx/certification/v4/qe/identity")
                .query_param("update", "standard");
            then.status(200)
                .header("SGX-Enclave-Identity-Issuer-Chain", ISSUER_CHAIN)
                .body(QE_IDENTITY);
        })
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&temp_dir);
    config.upstream = upstream(&server, "v4");
    let store = migrated_store(&temp_dir).await;
    let client = PcsClient::new(&config.upstream).unwrap();
    let collateral = Arc::new(CachingCollateralService::new(store.clone(), client));
    let router = create_router(AppState::new(
        config,
        store,
        collateral.clone(),
        collateral,
    ));

    for _ in 0..2 {
        let response = get(&router, "/sgx/certification/v4/qe/identity").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.header("SGX-Enclave-Identity-Issuer-Chain"),
            Some(ISSUER_CHAIN)
        );
        assert_eq!(response.body, QE_IDENTITY.as_bytes());
    }

    // The second request is served from the cache.
    mock.assert_hits_async(1).await;
}
