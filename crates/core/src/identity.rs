//! Enclave identity kinds.

use crate::version::ApiVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enclave whose identity document the gateway serves.
///
/// Selected by the endpoint that was invoked, never parsed from request content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnclaveIdentityKind {
    /// Quoting Enclave.
    Qe,
    /// Quote Verification Enclave.
    Qve,
    /// Trust Domain Quoting Enclave.
    TdQe,
}

impl EnclaveIdentityKind {
    pub const ALL: [EnclaveIdentityKind; 3] = [Self::Qe, Self::Qve, Self::TdQe];

    /// Stable numeric id used as the cache key.
    pub fn id(self) -> i64 {
        match self {
            Self::Qe => 1,
            Self::Qve => 2,
            Self::TdQe => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qe => "QE",
            Self::Qve => "QVE",
            Self::TdQe => "TD_QE",
        }
    }

    /// Path of this identity on the PCS.
    ///
    /// The TD quoting enclave is only published under the v4 TDX tree.
    pub fn pcs_path(self, version: ApiVersion) -> String {
        match self {
            Self::Qe => format!("/sgx/certification/{version}/qe/identity"),
            Self::Qve => format!("/sgx/certification/{version}/qve/identity"),
            Self::TdQe => "/tdx/certification/v4/qe/identity".to_string(),
        }
    }
}

impl fmt::Display for EnclaveIdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An enclave identity as served to clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityDocument {
    /// Raw identity JSON, passed through untouched.
    pub identity: String,
    /// Issuer chain as received from the PCS (URL-encoded PEM).
    pub issuer_chain: String,
}
