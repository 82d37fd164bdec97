//! HTTP client for the Provisioning Certification Service.

use super::{CrlService, IdentityService, ServiceError, ServiceResult};
use async_trait::async_trait;
use pccs_core::config::UpstreamConfig;
use pccs_core::version::SGX_ENCLAVE_IDENTITY_ISSUER_CHAIN;
use pccs_core::{ApiVersion, EnclaveIdentityKind, IdentityDocument, UpdateType};
use reqwest::StatusCode;
use url::Url;

/// Header carrying the PCS subscription key.
pub const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

#[derive(Clone)]
pub struct PcsClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl PcsClient {
    pub fn new(config: &UpstreamConfig) -> ServiceResult<Self> {
        let base_url = config
            .url()
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        // Redirects are not followed: a redirect target has not passed the
        // allowlist and would receive the subscription key.
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// URL of an enclave identity on the configured PCS.
    ///
    /// `update` is a v4 parameter and is not sent to v3.
    pub fn identity_url(
        &self,
        kind: EnclaveIdentityKind,
        version: ApiVersion,
        update_type: UpdateType,
    ) -> ServiceResult<Url> {
        let mut url = self
            .base_url
            .join(&kind.pcs_path(version))
            .map_err(|e| ServiceError::Config(format!("failed to build identity URL: {e}")))?;
        if version == ApiVersion::V4 {
            url.query_pairs_mut()
                .append_pair("update", update_type.as_query_value());
        }
        Ok(url)
    }

    async fn send(&self, url: Url) -> ServiceResult<reqwest::Response> {
        let mut request = self.http.get(url.clone());
        // The subscription key is only ever sent to the configured PCS.
        if let Some(key) = &self.api_key
            && url.host_str() == self.base_url.host_str()
        {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(url = %url, status = status.as_u16(), body = %body, "PCS request failed");
            return Err(ServiceError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CrlService for PcsClient {
    async fn get_crl(&self, uri: &str) -> ServiceResult<Vec<u8>> {
        let url = Url::parse(uri).map_err(|e| ServiceError::Upstream(format!("bad CRL uri: {e}")))?;
        let response = self.send(url).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl IdentityService for PcsClient {
    async fn get_enclave_identity(
        &self,
        kind: EnclaveIdentityKind,
        version: ApiVersion,
        update_type: UpdateType,
    ) -> ServiceResult<IdentityDocument> {
        let url = self.identity_url(kind, version, update_type)?;
        let response = self.send(url).await?;

        let issuer_chain = response
            .headers()
            .get(SGX_ENCLAVE_IDENTITY_ISSUER_CHAIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(ServiceError::MissingHeader(SGX_ENCLAVE_IDENTITY_ISSUER_CHAIN))?;
        let identity = response.text().await?;

        tracing::debug!(kind = %kind, version = %version, update = %update_type, "Fetched enclave identity");
        Ok(IdentityDocument {
            identity,
            issuer_chain,
        })
    }
}
