//! HTTP request handlers.

pub mod crl;
pub mod health;
pub mod identity;

pub use crl::*;
pub use health::*;
pub use identity::*;
