//! Test fixtures: an in-memory collateral source and request helpers.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use pccs_core::{ApiVersion, EnclaveIdentityKind, IdentityDocument, UpdateType};
use pccs_server::services::{CrlService, IdentityService, ServiceError, ServiceResult};
use std::sync::Mutex;
use tower::ServiceExt;

pub const ROOT_CA_URI: &str = "https://certificates.trustedservices.intel.com/IntelSGXRootCA.der";
pub const PCK_CRL_URI: &str =
    "https://api.trustedservices.intel.com/sgx/certification/v4/pckcrl?ca=processor&encoding=der";
pub const TEST_CRL: &[u8] = &[0x30, 0x82, 0x01, 0x0a, 0x30, 0x81];
pub const TEST_ISSUER_CHAIN: &str = "-----BEGIN%20CERTIFICATE-----%0AMIIC";

/// How the mock collateral source answers.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, Default)]
pub enum MockBehavior {
    #[default]
    Succeed,
    UpstreamDown,
    NotFound,
}

/// Collateral source that records every call.
#[allow(dead_code)]
#[derive(Default)]
pub struct MockCollateral {
    pub behavior: MockBehavior,
    pub crl_calls: Mutex<Vec<String>>,
    pub identity_calls: Mutex<Vec<(EnclaveIdentityKind, ApiVersion, UpdateType)>>,
}

#[allow(dead_code)]
impl MockCollateral {
    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            ..Default::default()
        }
    }

    pub fn crl_calls(&self) -> Vec<String> {
        self.crl_calls.lock().unwrap().clone()
    }

    pub fn identity_calls(&self) -> Vec<(EnclaveIdentityKind, ApiVersion, UpdateType)> {
        self.identity_calls.lock().unwrap().clone()
    }

    fn outcome(&self, what: &str) -> ServiceResult<()> {
        match self.behavior {
            MockBehavior::Succeed => Ok(()),
            MockBehavior::UpstreamDown => Err(ServiceError::Upstream("connection refused".into())),
            MockBehavior::NotFound => Err(ServiceError::NotFound(what.to_string())),
        }
    }
}

#[async_trait]
impl CrlService for MockCollateral {
    async fn get_crl(&self, uri: &str) -> ServiceResult<Vec<u8>> {
        self.crl_calls.lock().unwrap().push(uri.to_string());
        self.outcome(uri)?;
        Ok(TEST_CRL.to_vec())
    }
}

#[async_trait]
impl IdentityService for MockCollateral {
    async fn get_enclave_identity(
        &self,
        kind: EnclaveIdentityKind,
        version: ApiVersion,
        update_type: UpdateType,
    ) -> ServiceResult<IdentityDocument> {
        self.identity_calls
            .lock()
            .unwrap()
            .push((kind, version, update_type));
        self.outcome(kind.as_str())?;
        Ok(IdentityDocument {
            identity: format!(
                "{{\"enclaveIdentity\":{{\"id\":\"{kind}\",\"version\":{}}}}}",
                version.number()
            ),
            issuer_chain: TEST_ISSUER_CHAIN.to_string(),
        })
    }
}

/// Response captured from a oneshot request.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Send a GET request through the router.
#[allow(dead_code)]
pub async fn get(router: &axum::Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Percent-encode a value for use in a query string.
#[allow(dead_code)]
pub fn encode(value: &str) -> String {
    percent_encoding::utf8_percent_encode(value, percent_encoding::NON_ALPHANUMERIC).to_string()
}
