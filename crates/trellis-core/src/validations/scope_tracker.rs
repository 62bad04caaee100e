//! Per-request scope tracking.
//!
//! Holds the mutable state a validation pass accumulates — the array index
//! that led to each scope, and any qualifying params selected for it — so
//! that none of it ever lands on a `ParamsScope`. Scope trees are declared
//! once and shared across concurrent requests; a field on the scope would
//! leak one request's indices into another's.
//!
//! The active tracker is bound through `tokio::task_local!` rather than a
//! thread-local: under a task-multiplexing runtime many requests share one
//! worker thread, and the binding has to follow the logical task.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use trellis_types::{ParamsScope, Value};

tokio::task_local! {
    static CURRENT_TRACKER: ScopeTracker;
}

/// The shared "nothing stored" result of [`ScopeTracker::qualifying_params`].
static EMPTY_PARAMS: LazyLock<Arc<[Value]>> = LazyLock::new(|| Vec::new().into());

/// Identity key: two scopes are the same entry only if they are the same
/// allocation. Structural equality never matches.
struct ScopeKey(Arc<ParamsScope>);

impl PartialEq for ScopeKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ScopeKey {}

impl Hash for ScopeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

/// Per-request side-table for index paths and qualifying params, keyed by
/// scope identity.
///
/// One tracker belongs to exactly one logical task; `RefCell` suffices
/// because nothing else can reach it.
#[derive(Default)]
pub struct ScopeTracker {
    indices: RefCell<HashMap<ScopeKey, usize>>,
    qualifying: RefCell<HashMap<ScopeKey, Arc<[Value]>>>,
}

impl ScopeTracker {
    fn new() -> Self {
        Self::default()
    }

    /// Run `body` with a fresh tracker installed as the current one.
    ///
    /// Whatever binding was active before — an outer tracker, or nothing —
    /// is restored on every exit path, including a panic in `body`. Nested
    /// calls stack: the inner tracker is current only inside the inner call.
    pub fn track<R>(body: impl FnOnce() -> R) -> R {
        CURRENT_TRACKER.sync_scope(Self::new(), body)
    }

    /// Like [`track`](Self::track) for async validation passes.
    ///
    /// The binding follows the future across polls and threads; dropping
    /// the future (cancellation) restores the previous binding.
    pub async fn track_future<F: Future>(fut: F) -> F::Output {
        CURRENT_TRACKER.scope(Self::new(), fut).await
    }

    /// True while a [`track`](Self::track) call is on this task's stack.
    pub fn is_active() -> bool {
        CURRENT_TRACKER.try_with(|_| ()).is_ok()
    }

    /// Run `f` against the current tracker, or return None when no tracking
    /// is active. Each task sees only its own binding.
    pub fn with_current<R>(f: impl FnOnce(&ScopeTracker) -> R) -> Option<R> {
        CURRENT_TRACKER.try_with(f).ok()
    }

    /// Record the index at which `scope`'s current resource was found,
    /// overwriting any earlier index for that scope.
    pub fn store_index(&self, scope: &Arc<ParamsScope>, index: usize) {
        self.indices
            .borrow_mut()
            .insert(ScopeKey(Arc::clone(scope)), index);
    }

    /// The most recently stored index for `scope`, if any.
    pub fn index_for(&self, scope: &Arc<ParamsScope>) -> Option<usize> {
        self.indices
            .borrow()
            .get(&ScopeKey(Arc::clone(scope)))
            .copied()
    }

    /// Record the params selected as qualifying for `scope`.
    pub fn store_qualifying_params(&self, scope: &Arc<ParamsScope>, params: Vec<Value>) {
        self.qualifying
            .borrow_mut()
            .insert(ScopeKey(Arc::clone(scope)), params.into());
    }

    /// The qualifying params stored for `scope`.
    ///
    /// Returns the shared empty sequence both when nothing was stored and
    /// when an empty selection was stored explicitly: callers treat either
    /// as "no selection, fall back to the parent's params".
    pub fn qualifying_params(&self, scope: &Arc<ParamsScope>) -> Arc<[Value]> {
        self.qualifying
            .borrow()
            .get(&ScopeKey(Arc::clone(scope)))
            .filter(|params| !params.is_empty())
            .cloned()
            .unwrap_or_else(|| Arc::clone(&EMPTY_PARAMS))
    }
}
