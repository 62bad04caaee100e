//! trellis-types: pure data types for the trellis validation substrate.
//!
//! This crate provides:
//!
//! - **Value**: the parameter value tree, as parsed from a request body
//! - **ParamsScope**: an immutable node in the declared parameter-shape tree
//!
//! Neither type carries per-request mutable state. `ParamsScope` trees are
//! built once and shared across every request that hits the endpoint; all
//! request-scoped bookkeeping lives in `trellis-core`.

pub mod scope;
pub mod value;

pub use scope::{ParamsScope, ScopeKind};
pub use value::Value;
