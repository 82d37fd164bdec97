//! PCS API version resolution.

use crate::error::{Error, Result};
use std::fmt;

/// Issuer chain header for enclave identity responses.
pub const SGX_ENCLAVE_IDENTITY_ISSUER_CHAIN: &str = "SGX-Enclave-Identity-Issuer-Chain";
/// Issuer chain header for TCB info responses on API v3.
pub const SGX_TCB_INFO_ISSUER_CHAIN: &str = "SGX-TCB-Info-Issuer-Chain";
/// Issuer chain header for TCB info responses on API v4.
pub const TCB_INFO_ISSUER_CHAIN: &str = "TCB-Info-Issuer-Chain";

/// A supported PCS API version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApiVersion {
    V3,
    V4,
}

/// Collateral whose issuer chain travels in a response header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssuerChain {
    EnclaveIdentity,
    TcbInfo,
}

impl ApiVersion {
    /// All supported versions, ascending.
    pub const SUPPORTED: [ApiVersion; 2] = [ApiVersion::V3, ApiVersion::V4];

    /// The numeric version.
    pub fn number(self) -> u32 {
        match self {
            Self::V3 => 3,
            Self::V4 => 4,
        }
    }

    /// Map a numeric version onto the supported set.
    pub fn from_number(number: u64) -> Result<Self> {
        match number {
            3 => Ok(Self::V3),
            4 => Ok(Self::V4),
            other => Err(Error::UnsupportedApiVersion(format!("v{other}"))),
        }
    }

    /// Resolve the API version from a request path.
    ///
    /// Uses the first `/v<digits>/` segment. Anything after `?` or `#` is
    /// ignored. Fails when no such segment exists, when the digits carry a
    /// leading zero or overflow, or when the version is not supported.
    pub fn from_path(path: &str) -> Result<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let digits = path
            .match_indices("/v")
            .find_map(|(idx, _)| {
                let rest = &path[idx + 2..];
                let end = rest.find(|c: char| !c.is_ascii_digit())?;
                (end > 0 && rest[end..].starts_with('/')).then(|| &rest[..end])
            })
            .ok_or_else(|| Error::UnsupportedApiVersion(format!("no version segment in {path}")))?;

        if digits.starts_with('0') && digits.len() > 1 {
            return Err(Error::UnsupportedApiVersion(format!("v{digits}")));
        }
        let number: u64 = digits
            .parse()
            .map_err(|_| Error::UnsupportedApiVersion(format!("v{digits}")))?;
        Self::from_number(number)
    }

    /// Response header carrying the issuer chain for `collateral`.
    ///
    /// TCB info headers were renamed in v4; enclave identity kept its name.
    pub fn issuer_chain_header(self, collateral: IssuerChain) -> &'static str {
        match (collateral, self) {
            (IssuerChain::EnclaveIdentity, _) => SGX_ENCLAVE_IDENTITY_ISSUER_CHAIN,
            (IssuerChain::TcbInfo, Self::V3) => SGX_TCB_INFO_ISSUER_CHAIN,
            (IssuerChain::TcbInfo, Self::V4) => TCB_INFO_ISSUER_CHAIN,
        }
    }
}

impl TryFrom<u32> for ApiVersion {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Self::from_number(value.into())
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}
