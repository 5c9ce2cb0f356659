//! Domain layer for the rbac module.

pub mod builtin;
pub mod cache;
pub mod error;
pub mod local_client;
pub mod scoping;
pub mod service;
pub mod translator;

pub use builtin::StaticRoleRegistry;
pub use cache::{CacheKey, CacheStats, SubjectCache};
pub use error::DomainError;
pub use local_client::AuthzGwLocalClient;
pub use scoping::PreparedAuthorizer;
pub use service::AuthzEngine;
pub use translator::Translator;
