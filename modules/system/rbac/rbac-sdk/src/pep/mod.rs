//! PEP (Policy Enforcement Point) helpers.
//!
//! - [`compiler::compile_to_access_scope`]: compiles a [`Predicate`](crate::Predicate) into an `AccessScope`

pub mod compiler;

pub use compiler::compile_to_access_scope;
