//! HTTP gateway serving cached SGX certification collateral.
//!
//! This crate provides:
//! - CRL and enclave identity endpoints
//! - Enclave identity dispatch with per-version issuer chain headers
//! - The upstream PCS client and the read-through collateral cache
//! - The startup gate that must pass before any request is served

pub mod bootstrap;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;

pub use bootstrap::{StartupError, StartupGate, StartupReport};
pub use dispatch::{IdentityDispatcher, IdentityResponse};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
