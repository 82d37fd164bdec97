//! Core domain types and request validation for the SGX collateral gateway.
//!
//! This crate holds the pure, I/O-free parts of the gateway:
//! - The upstream URL allow-list
//! - PCS API version resolution and issuer chain header names
//! - Update type (freshness preference) resolution
//! - Enclave identity kinds
//! - Configuration types

pub mod allowlist;
pub mod config;
pub mod error;
pub mod identity;
pub mod update_type;
pub mod version;

pub use allowlist::{UriClass, UrlAllowlist, UrlCategory};
pub use error::{Error, Result};
pub use identity::{EnclaveIdentityKind, IdentityDocument};
pub use update_type::UpdateType;
pub use version::{ApiVersion, IssuerChain};

/// Maximum accepted length of the `uri` request parameter.
pub const MAX_URI_LENGTH: usize = 2048;
