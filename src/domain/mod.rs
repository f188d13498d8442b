//! Domain layer - Pure business abstractions
//!
//! Repository contracts, list query types, the ownership policy and domain
//! error types. No Axum here; implementations live in the infrastructure layer.

pub mod errors;
pub mod policy;
pub mod query;
pub mod repositories;

pub use errors::{DomainError, FieldErrors};
pub use query::*;
pub use repositories::*;
