//! Integration tests for the tracker lifecycle under a real runtime.
//!
//! The unit tests in `scope_tracker.rs` cover the table semantics; these
//! verify the task-local binding discipline: per-task isolation, restore
//! on cancellation, and restore around awaits.

use std::sync::Arc;
use std::time::Duration;

use trellis_core::ScopeTracker;
use trellis_types::ParamsScope;

#[tokio::test]
async fn track_future_installs_and_uninstalls() {
    assert!(!ScopeTracker::is_active());
    ScopeTracker::track_future(async {
        assert!(ScopeTracker::is_active());
        tokio::task::yield_now().await;
        // binding survives the await
        assert!(ScopeTracker::is_active());
    })
    .await;
    assert!(!ScopeTracker::is_active());
}

#[tokio::test]
async fn cancelled_tracking_restores_the_binding() {
    let timed_out = tokio::time::timeout(
        Duration::from_millis(10),
        ScopeTracker::track_future(std::future::pending::<()>()),
    )
    .await;
    assert!(timed_out.is_err());
    assert!(!ScopeTracker::is_active());
}

#[tokio::test]
async fn nested_track_future_restores_the_outer_tracker() {
    let scope = ParamsScope::root();
    ScopeTracker::track_future(async {
        ScopeTracker::with_current(|outer| outer.store_index(&scope, 4));

        ScopeTracker::track_future(async {
            let seen = ScopeTracker::with_current(|inner| inner.index_for(&scope));
            assert_eq!(seen, Some(None), "inner tracker must be fresh");
        })
        .await;

        let seen = ScopeTracker::with_current(|outer| outer.index_for(&scope));
        assert_eq!(seen, Some(Some(4)), "outer tracker must be current again");
    })
    .await;
    assert!(!ScopeTracker::is_active());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_tasks_get_independent_trackers() {
    // Two requests validating against the same shared scope tree must
    // never see each other's indices, even interleaved mid-pass.
    let scope = ParamsScope::root();
    let barrier = Arc::new(tokio::sync::Barrier::new(2));

    let mut handles = Vec::new();
    for task_index in 0..2usize {
        let scope = Arc::clone(&scope);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(ScopeTracker::track_future(async move {
            ScopeTracker::with_current(|tracker| tracker.store_index(&scope, task_index));
            barrier.wait().await;
            let seen = ScopeTracker::with_current(|tracker| tracker.index_for(&scope));
            assert_eq!(seen, Some(Some(task_index)));
        })));
    }
    for handle in handles {
        handle.await.expect("task should not panic");
    }
}

#[tokio::test]
async fn panicking_task_does_not_leak_its_binding() {
    let handle = tokio::spawn(ScopeTracker::track_future(async {
        panic!("validation pass blew up");
    }));
    assert!(handle.await.is_err());
    // this task's binding is unaffected by the other task's lifetime
    assert!(!ScopeTracker::is_active());
}
