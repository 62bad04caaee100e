//! Per-request validation bookkeeping.
//!
//! Two pieces compose here:
//!
//! - **ScopeTracker**: where each request's index paths and qualifying
//!   params live. Installed task-locally for the span of one validation
//!   pass, never on the shared scope tree.
//! - **AttributesIterator**: walks a scope's resolved params, recording
//!   index paths into the active tracker as it descends through nested
//!   arrays, then hands each concrete resource to the validator's step.
//!
//! # Example
//!
//! ```ignore
//! use trellis_core::{ScopeTracker, SingleAttributeIterator};
//!
//! ScopeTracker::track(|| {
//!     let iterator = SingleAttributeIterator::new(scope, ["sku"], &bundle);
//!     iterator.try_for_each(|_resource, attr, value| {
//!         presence_rule.check(attr, value)
//!     })
//! })?;
//! ```

mod attributes_iterator;
mod scope_tracker;

pub use attributes_iterator::{
    AttributesIterator, MultipleAttributesIterator, SingleAttributeIterator,
};
pub use scope_tracker::ScopeTracker;
