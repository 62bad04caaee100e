//! trellis-core: the validation substrate of trellis.
//!
//! This crate provides:
//!
//! - **ScopeTracker**: per-request, task-local side-table recording which
//!   array index led to the resource currently being validated
//! - **AttributesIterator**: recursive traversal of a scope's resolved
//!   params that feeds each concrete resource to a validator
//!
//! Validation rules themselves (presence, type checks, custom rules) live
//! in the surrounding framework; this crate defines the traversal and
//! bookkeeping contract they run on top of.

pub mod error;
pub mod validations;

pub use error::ValidationFailure;
pub use validations::{
    AttributesIterator, MultipleAttributesIterator, ScopeTracker, SingleAttributeIterator,
};
