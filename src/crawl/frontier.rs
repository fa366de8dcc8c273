// src/crawl/frontier.rs

//! Bounded frontier queue.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;
use url::Url;

/// Bounded multi-producer multi-consumer queue of canonical URLs awaiting a
/// visit.
///
/// Producers wait while the queue is full; consumers wait while it is empty
/// but open. `close` is idempotent and wakes every parked task. A closed
/// frontier drops further enqueues but keeps serving buffered URLs until
/// drained.
///
/// Wakeups are baton-passed: a task that observes a terminal state, or leaves
/// the queue in a state another waiter can act on, re-notifies the next
/// waiter. `Notify` stores at most one permit, so the chain is what keeps a
/// wakeup from being lost between a waiter's state check and its `await`.
pub struct Frontier {
    capacity: usize,
    state: Mutex<State>,
    item_ready: Notify,
    space_ready: Notify,
}

struct State {
    queue: VecDeque<Url>,
    closed: bool,
}

impl Frontier {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State {
                queue: VecDeque::new(),
                closed: false,
            }),
            item_ready: Notify::new(),
            space_ready: Notify::new(),
        }
    }

    /// Enqueue a URL, waiting while the queue is full.
    ///
    /// Returns `true` if the URL was queued, `false` if the frontier was
    /// closed (the URL is dropped).
    pub async fn enqueue(&self, url: Url) -> bool {
        loop {
            let wait = self.space_ready.notified();
            {
                let mut state = self.state.lock().unwrap();
                if state.closed {
                    self.space_ready.notify_one();
                    return false;
                }
                if state.queue.len() < self.capacity {
                    state.queue.push_back(url);
                    if state.queue.len() < self.capacity {
                        self.space_ready.notify_one();
                    }
                    self.item_ready.notify_one();
                    return true;
                }
            }
            wait.await;
        }
    }

    /// Dequeue the next URL, waiting while the queue is empty but open.
    ///
    /// Returns `None` once the frontier is both closed and drained.
    pub async fn dequeue(&self) -> Option<Url> {
        loop {
            let wait = self.item_ready.notified();
            {
                let mut state = self.state.lock().unwrap();
                if let Some(url) = state.queue.pop_front() {
                    if !state.queue.is_empty() {
                        self.item_ready.notify_one();
                    }
                    self.space_ready.notify_one();
                    return Some(url);
                }
                if state.closed {
                    self.item_ready.notify_one();
                    return None;
                }
            }
            wait.await;
        }
    }

    /// Close the frontier. Idempotent; wakes every parked producer and
    /// consumer.
    pub fn close(&self) {
        {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.item_ready.notify_waiters();
        self.space_ready.notify_waiters();
        // tasks between their state check and `await` miss notify_waiters;
        // the stored permits reach them and the baton does the rest
        self.item_ready.notify_one();
        self.space_ready.notify_one();
    }

    /// Number of URLs currently buffered.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}
