//! Repository traits for metadata operations.

pub mod binding;
pub mod crl;
pub mod identity;

pub use binding::BindingRepo;
pub use crl::CrlRepo;
pub use identity::IdentityRepo;
