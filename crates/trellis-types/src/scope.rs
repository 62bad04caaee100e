//! Declared parameter scopes.
//!
//! A [`ParamsScope`] describes the expected shape of one subtree of the
//! request parameters: "`items` is an array of objects", "`address` is a
//! nested object", and so on. Scopes form a tree built once per endpoint
//! and shared, read-only, across every request that hits it — which is why
//! nothing request-specific may ever be stored on a scope. Per-request
//! bookkeeping keyed by scope *identity* lives in trellis-core.

use std::sync::{Arc, OnceLock, Weak};

use crate::value::Value;

/// What shape of value a scope expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// A single object (or scalar group).
    Hash,
    /// An array of resources, each validated independently.
    Array,
}

/// An immutable node in the declared parameter-shape tree.
///
/// Scopes are compared by identity only: two independently built scopes
/// with the same element name and kind are distinct keys everywhere they
/// are used. `ParamsScope` deliberately does not implement `PartialEq`.
#[derive(Debug)]
pub struct ParamsScope {
    /// Name of the element this scope selects from its parent's params.
    /// None for the root and for lateral scopes, which pass their parent's
    /// params through unchanged.
    element: Option<String>,
    kind: ScopeKind,
    parent: Option<Arc<ParamsScope>>,
    /// Memoized nearest array-kind ancestor, including self. Weak so that a
    /// scope memoizing itself does not keep itself alive forever.
    array_ancestor: OnceLock<Option<Weak<ParamsScope>>>,
}

impl ParamsScope {
    /// The root scope: the request body itself.
    pub fn root() -> Arc<Self> {
        Arc::new(Self {
            element: None,
            kind: ScopeKind::Hash,
            parent: None,
            array_ancestor: OnceLock::new(),
        })
    }

    /// A nested object scope: `requires :address, type: Hash`.
    pub fn hash(parent: &Arc<Self>, element: impl Into<String>) -> Arc<Self> {
        Self::child(parent, Some(element.into()), ScopeKind::Hash)
    }

    /// A nested array scope: `requires :items, type: Array`.
    pub fn array(parent: &Arc<Self>, element: impl Into<String>) -> Arc<Self> {
        Self::child(parent, Some(element.into()), ScopeKind::Array)
    }

    /// A lateral scope: a conditional grouping (`given`-style) that selects
    /// no element of its own and sees exactly its parent's params.
    pub fn lateral(parent: &Arc<Self>) -> Arc<Self> {
        Self::child(parent, None, ScopeKind::Hash)
    }

    fn child(parent: &Arc<Self>, element: Option<String>, kind: ScopeKind) -> Arc<Self> {
        Arc::new(Self {
            element,
            kind,
            parent: Some(Arc::clone(parent)),
            array_ancestor: OnceLock::new(),
        })
    }

    /// What shape of value this scope expects.
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// True for array-kind scopes.
    pub fn is_array(&self) -> bool {
        self.kind == ScopeKind::Array
    }

    /// The enclosing scope, None at the root.
    pub fn parent(&self) -> Option<&Arc<ParamsScope>> {
        self.parent.as_ref()
    }

    /// The nearest array-kind scope walking up from this one, including
    /// this one. Lateral scopes use this to delegate index attribution.
    ///
    /// Resolved once and memoized; the tree is immutable so the answer
    /// never changes.
    pub fn nearest_array_ancestor(self: &Arc<Self>) -> Option<Arc<ParamsScope>> {
        self.array_ancestor
            .get_or_init(|| {
                let mut current = Some(Arc::clone(self));
                while let Some(scope) = current {
                    if scope.kind == ScopeKind::Array {
                        return Some(Arc::downgrade(&scope));
                    }
                    current = scope.parent.clone();
                }
                None
            })
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Resolve a raw request bundle down to this scope's slice of params.
    ///
    /// Walks root-to-self. Selecting an element out of an array maps over
    /// the array's items, so nested array scopes naturally resolve to
    /// arrays of arrays — one nesting level per array ancestor.
    pub fn resolve(&self, bundle: &Value) -> Value {
        let base = match &self.parent {
            Some(parent) => parent.resolve(bundle),
            None => bundle.clone(),
        };
        match &self.element {
            Some(element) => Self::extract(&base, element),
            None => base,
        }
    }

    fn extract(value: &Value, element: &str) -> Value {
        match value {
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| Self::extract(item, element)).collect())
            }
            other => other.get(element).cloned().unwrap_or(Value::Null),
        }
    }
}
