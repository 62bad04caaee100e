//! Recursive traversal of a scope's resolved params.
//!
//! An endpoint's validator needs to see every concrete resource a scope
//! describes: for `requires :orders, type: Array` that is each element of
//! `orders`; for a nested array scope it is each element of each inner
//! array. While descending, the iterator records into the active
//! [`ScopeTracker`] which index led to the resource currently in hand, so
//! that a failing rule can name it precisely (`orders[2].lines[0].sku`).
//!
//! Two concrete flavors wrap the shared traversal: [`SingleAttributeIterator`]
//! yields one `(resource, attr, value)` triple per requested attribute, and
//! [`MultipleAttributesIterator`] yields each resource once together with
//! the full attribute list, for rules like `mutually_exclusive`.

use std::sync::Arc;

use trellis_types::{ParamsScope, Value};

use super::scope_tracker::ScopeTracker;

/// Walks the resources of one scope, depth-first and in sequence order.
pub struct AttributesIterator {
    scope: Arc<ParamsScope>,
    attrs: Vec<String>,
    /// The scope's resolved params before normalization. A scalar here
    /// means the single traversal element is a wrapped value, not a real
    /// array member, and must not get an index.
    original_params: Value,
    /// Normalized traversal sequence: the resolved array's items, or the
    /// resolved value wrapped as a one-element sequence.
    params: Vec<Value>,
}

impl AttributesIterator {
    /// Resolve `bundle` through `scope` and prepare the traversal.
    pub fn new<I, S>(scope: Arc<ParamsScope>, attrs: I, bundle: &Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let original_params = scope.resolve(bundle);
        let params = match original_params.clone() {
            Value::Array(items) => items,
            // a scope whose params are absent entirely has nothing to walk
            Value::Null => Vec::new(),
            other => vec![other],
        };
        Self {
            scope,
            attrs: attrs.into_iter().map(Into::into).collect(),
            original_params,
            params,
        }
    }

    /// The scope this iterator walks.
    pub fn scope(&self) -> &Arc<ParamsScope> {
        &self.scope
    }

    /// The attribute names extracted from each resource.
    pub fn attrs(&self) -> &[String] {
        &self.attrs
    }

    /// Visit every concrete resource, storing its index path into the
    /// active tracker immediately before invoking `step`.
    ///
    /// A step failure aborts the traversal and propagates unchanged.
    /// Without an active tracker the walk still visits everything; it only
    /// skips the index bookkeeping.
    pub fn try_for_each_resource<E, F>(&self, mut step: F) -> Result<(), E>
    where
        F: FnMut(&Value) -> Result<(), E>,
    {
        self.do_each(&self.params, &[], &mut step)
    }

    fn do_each<E, F>(&self, params: &[Value], parent_indices: &[usize], step: &mut F) -> Result<(), E>
    where
        F: FnMut(&Value) -> Result<(), E>,
    {
        for (index, resource_params) in params.iter().enumerate() {
            // An array of arrays means the target element sits one nesting
            // level deeper; remember which index we entered through and
            // recurse. Leaf indices come from the recursive call.
            if let Value::Array(nested) = resource_params {
                let mut indices = Vec::with_capacity(parent_indices.len() + 1);
                indices.push(index);
                indices.extend_from_slice(parent_indices);
                self.do_each(nested, &indices, step)?;
                continue;
            }

            if self.scope.is_array() {
                // A scalar wrapped into the one-element traversal sequence
                // is not array content; nothing to validate at this scope.
                if !self.original_params.is_array() {
                    continue;
                }
                self.store_indices(&self.scope, index, parent_indices);
            } else if self.original_params.is_array() {
                // Lateral scope whose params still resolved to an array:
                // attribute the index to the nearest array-kind ancestor so
                // downstream names carry the right bracketed index. With no
                // such ancestor, names simply stay bracket-less.
                if let Some(target) = self.scope.nearest_array_ancestor() {
                    self.store_indices(&target, index, parent_indices);
                }
            }

            step(resource_params)?;
        }
        Ok(())
    }

    /// Store `index` against `target` and each collected parent index
    /// against the matching ancestor, one level up per entry.
    fn store_indices(&self, target: &Arc<ParamsScope>, index: usize, parent_indices: &[usize]) {
        let stored = ScopeTracker::with_current(|tracker| {
            let mut ancestor = target.parent().cloned();
            for &parent_index in parent_indices {
                let Some(scope) = ancestor else {
                    break;
                };
                tracker.store_index(&scope, parent_index);
                ancestor = scope.parent().cloned();
            }
            tracker.store_index(target, index);
        });
        if stored.is_none() {
            // Validator invoked outside a tracking pass (e.g. a unit test
            // driving it directly). Names degrade to bracket-less; the walk
            // itself continues.
            tracing::trace!("no active scope tracker, skipping index bookkeeping");
        }
    }
}

/// Yields each requested attribute of each resource separately.
///
/// Attributes whose parsed value is the [`Value::EmptyOptional`] sentinel
/// are skipped here rather than during parsing: dropping them earlier
/// would break index alignment for their array siblings.
pub struct SingleAttributeIterator {
    inner: AttributesIterator,
}

impl SingleAttributeIterator {
    /// Resolve `bundle` through `scope` and prepare the traversal.
    pub fn new<I, S>(scope: Arc<ParamsScope>, attrs: I, bundle: &Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: AttributesIterator::new(scope, attrs, bundle),
        }
    }

    /// The underlying traversal.
    pub fn inner(&self) -> &AttributesIterator {
        &self.inner
    }

    /// Invoke `step` with `(resource, attr_name, value)` for every
    /// requested attribute of every resource. Absent attributes are
    /// yielded as [`Value::Null`].
    pub fn try_for_each<E, F>(&self, mut step: F) -> Result<(), E>
    where
        F: FnMut(&Value, &str, &Value) -> Result<(), E>,
    {
        self.inner.try_for_each_resource(|resource| {
            for attr in &self.inner.attrs {
                let value = resource.get(attr).unwrap_or(&Value::Null);
                if *value == Value::EmptyOptional {
                    continue;
                }
                step(resource, attr, value)?;
            }
            Ok(())
        })
    }
}

/// Yields each resource once, together with the requested attribute list.
pub struct MultipleAttributesIterator {
    inner: AttributesIterator,
}

impl MultipleAttributesIterator {
    /// Resolve `bundle` through `scope` and prepare the traversal.
    pub fn new<I, S>(scope: Arc<ParamsScope>, attrs: I, bundle: &Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: AttributesIterator::new(scope, attrs, bundle),
        }
    }

    /// The underlying traversal.
    pub fn inner(&self) -> &AttributesIterator {
        &self.inner
    }

    /// Invoke `step` with `(resource, attrs)` once per resource.
    pub fn try_for_each<E, F>(&self, mut step: F) -> Result<(), E>
    where
        F: FnMut(&Value, &[String]) -> Result<(), E>,
    {
        self.inner
            .try_for_each_resource(|resource| step(resource, &self.inner.attrs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationFailure;
    use serde_json::json;

    fn visit_all(iterator: &AttributesIterator) -> Vec<Value> {
        let mut seen = Vec::new();
        let result: Result<(), ValidationFailure> = iterator.try_for_each_resource(|resource| {
            seen.push(resource.clone());
            Ok(())
        });
        assert!(result.is_ok());
        seen
    }

    #[test]
    fn empty_array_yields_nothing() {
        let root = ParamsScope::root();
        let items = ParamsScope::array(&root, "items");
        let bundle = Value::from(json!({"items": []}));
        let iterator = AttributesIterator::new(items, ["name"], &bundle);
        assert!(visit_all(&iterator).is_empty());
    }

    #[test]
    fn non_array_scope_wraps_its_single_resource() {
        let root = ParamsScope::root();
        let customer = ParamsScope::hash(&root, "customer");
        let bundle = Value::from(json!({"customer": {"name": "Ada"}}));
        let iterator = AttributesIterator::new(customer, ["name"], &bundle);
        let seen = visit_all(&iterator);
        assert_eq!(seen, vec![Value::from(json!({"name": "Ada"}))]);
    }

    #[test]
    fn absent_params_yield_nothing() {
        let root = ParamsScope::root();
        let customer = ParamsScope::hash(&root, "customer");
        let bundle = Value::from(json!({}));
        let iterator = AttributesIterator::new(customer, ["name"], &bundle);
        assert!(visit_all(&iterator).is_empty());
    }

    #[test]
    fn array_scope_with_scalar_params_yields_nothing() {
        // `items` was declared Array but the request sent a scalar; the
        // wrapped element is not array content and is skipped outright.
        let root = ParamsScope::root();
        let items = ParamsScope::array(&root, "items");
        let bundle = Value::from(json!({"items": "oops"}));
        let iterator = AttributesIterator::new(items, ["name"], &bundle);
        assert!(visit_all(&iterator).is_empty());
    }

    #[test]
    fn step_error_aborts_and_propagates() {
        let root = ParamsScope::root();
        let items = ParamsScope::array(&root, "items");
        let bundle = Value::from(json!({"items": [{"n": 1}, {"n": 2}, {"n": 3}]}));
        let iterator = AttributesIterator::new(items, ["n"], &bundle);

        let mut visited = 0;
        let result = iterator.try_for_each_resource(|_| {
            visited += 1;
            if visited == 2 {
                Err(ValidationFailure::new("items[1].n", "is invalid"))
            } else {
                Ok(())
            }
        });
        assert_eq!(
            result,
            Err(ValidationFailure::new("items[1].n", "is invalid"))
        );
        assert_eq!(visited, 2);
    }

    #[test]
    fn traversal_without_tracker_still_visits_leaves() {
        assert!(!ScopeTracker::is_active());
        let root = ParamsScope::root();
        let items = ParamsScope::array(&root, "items");
        let bundle = Value::from(json!({"items": [{"n": 1}, {"n": 2}]}));
        let iterator = AttributesIterator::new(items, ["n"], &bundle);
        assert_eq!(visit_all(&iterator).len(), 2);
        assert!(!ScopeTracker::is_active());
    }

    #[test]
    fn single_attribute_iterator_skips_empty_optionals() {
        let root = ParamsScope::root();
        let items = ParamsScope::array(&root, "items");
        let bundle = Value::Object(vec![(
            "items".into(),
            Value::Array(vec![Value::Object(vec![
                ("name".into(), Value::String("a".into())),
                ("note".into(), Value::EmptyOptional),
            ])]),
        )]);

        let iterator = SingleAttributeIterator::new(items, ["name", "note"], &bundle);
        let mut yielded = Vec::new();
        let result: Result<(), ValidationFailure> = iterator.try_for_each(|_, attr, value| {
            yielded.push((attr.to_string(), value.clone()));
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(yielded, vec![("name".into(), Value::String("a".into()))]);
    }

    #[test]
    fn single_attribute_iterator_yields_null_for_absent_attrs() {
        let root = ParamsScope::root();
        let customer = ParamsScope::hash(&root, "customer");
        let bundle = Value::from(json!({"customer": {"name": "Ada"}}));

        let iterator = SingleAttributeIterator::new(customer, ["name", "age"], &bundle);
        let mut yielded = Vec::new();
        let result: Result<(), ValidationFailure> = iterator.try_for_each(|_, attr, value| {
            yielded.push((attr.to_string(), value.clone()));
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(
            yielded,
            vec![
                ("name".into(), Value::String("Ada".into())),
                ("age".into(), Value::Null),
            ]
        );
    }

    #[test]
    fn multiple_attributes_iterator_yields_once_per_resource() {
        let root = ParamsScope::root();
        let items = ParamsScope::array(&root, "items");
        let bundle = Value::from(json!({"items": [{"a": 1}, {"a": 2}]}));

        let iterator = MultipleAttributesIterator::new(items, ["a", "b"], &bundle);
        let mut calls = 0;
        let result: Result<(), ValidationFailure> = iterator.try_for_each(|_, attrs| {
            assert_eq!(attrs, ["a".to_string(), "b".to_string()]);
            calls += 1;
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(calls, 2);
    }
}
