// src/crawl/completion.rs

//! Termination detection.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Tracks URLs that have been admitted but not yet fully processed.
///
/// The pending count is incremented before a URL is offered to the frontier
/// and decremented once its fetch has resolved and every link extracted from
/// it has been offered to admission. Workers still expanding a page hold the
/// count above zero, so the count reaching zero means no further enqueue can
/// ever happen. The worker whose decrement takes the count to zero wins the
/// one-shot completion flag and must close the frontier.
pub struct CompletionTracker {
    pending: AtomicUsize,
    signalled: AtomicBool,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self {
            pending: AtomicUsize::new(0),
            signalled: AtomicBool::new(false),
        }
    }

    /// Record an admitted URL. Called after the dedup mark succeeds and
    /// before the frontier enqueue is attempted.
    pub fn on_enqueued(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    /// Undo `on_enqueued` for a URL whose enqueue was dropped at a closed
    /// frontier or unwound by cancellation. Never signals completion: this
    /// path only runs once the frontier is already closed or the crawl is
    /// shutting down.
    pub fn on_abandoned(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    /// Record a fully processed URL. Returns `true` iff this call took the
    /// count to zero first and now owns closing the frontier.
    pub fn on_processed(&self) -> bool {
        let remaining = self.pending.fetch_sub(1, Ordering::SeqCst) - 1;
        remaining == 0 && !self.signalled.swap(true, Ordering::SeqCst)
    }

    /// Currently admitted-but-unfinished URL count.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Whether completion has been signalled.
    pub fn is_complete(&self) -> bool {
        self.signalled.load(Ordering::SeqCst)
    }
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn pending_tracks_enqueues_and_completions() {
        let tracker = CompletionTracker::new();
        for _ in 0..3 {
            tracker.on_enqueued();
        }
        assert_eq!(tracker.pending(), 3);

        assert!(!tracker.on_processed());
        assert!(!tracker.on_processed());
        assert_eq!(tracker.pending(), 1);
        assert!(!tracker.is_complete());

        assert!(tracker.on_processed());
        assert_eq!(tracker.pending(), 0);
        assert!(tracker.is_complete());
    }

    #[test]
    fn abandoned_enqueues_do_not_signal_completion() {
        let tracker = CompletionTracker::new();
        tracker.on_enqueued();
        tracker.on_enqueued();

        tracker.on_abandoned();
        assert_eq!(tracker.pending(), 1);
        assert!(!tracker.is_complete());

        assert!(tracker.on_processed());
    }

    #[test]
    fn completion_fires_at_most_once() {
        let tracker = CompletionTracker::new();
        tracker.on_enqueued();
        assert!(tracker.on_processed());

        // a late enqueue/process pair after the signal must not re-fire
        tracker.on_enqueued();
        assert!(!tracker.on_processed());
    }

    #[test]
    fn concurrent_decrements_elect_a_single_closer() {
        let tracker = Arc::new(CompletionTracker::new());
        let threads = 8usize;
        let per_thread = 64usize;
        for _ in 0..threads * per_thread {
            tracker.on_enqueued();
        }

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    (0..per_thread).filter(|_| tracker.on_processed()).count()
                })
            })
            .collect();

        let winners: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(winners, 1);
        assert_eq!(tracker.pending(), 0);
        assert!(tracker.is_complete());
    }
}
