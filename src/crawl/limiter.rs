// src/crawl/limiter.rs

//! Token-bucket rate limiter shared by all workers.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why an acquisition did not produce a permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// The bounded wait queue was already full.
    QueueFull,
    /// Cancellation fired while waiting for a token.
    Cancelled,
}

/// Token bucket limiting total outbound fetch attempts across all workers.
///
/// Tokens accrue continuously at the refill rate up to the bucket capacity
/// and are consumed one per fetch; they are time-based and never returned.
/// Waiters are served in arrival order and bounded by the wait-queue
/// capacity.
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    queue_limit: usize,
    waiting: AtomicUsize,
    /// Fair mutex: the waiter at the head of the line holds it while it
    /// sleeps for the next token, so grants are first-in-first-out.
    turn: tokio::sync::Mutex<()>,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a bucket holding `capacity` tokens, refilled at `per_sec`
    /// tokens per second, with at most `queue_limit` queued waiters.
    pub fn new(capacity: u32, per_sec: u32, queue_limit: usize) -> Self {
        Self {
            capacity: f64::from(capacity),
            refill_per_sec: f64::from(per_sec),
            queue_limit,
            waiting: AtomicUsize::new(0),
            turn: tokio::sync::Mutex::new(()),
            state: Mutex::new(BucketState {
                tokens: f64::from(capacity),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take one token, waiting for the next refill if none is available.
    ///
    /// Fails with `QueueFull` if the wait queue would overflow and with
    /// `Cancelled` if the cancellation signal fires mid-wait.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), AcquireError> {
        if self.waiting.fetch_add(1, Ordering::SeqCst) >= self.queue_limit {
            self.waiting.fetch_sub(1, Ordering::SeqCst);
            return Err(AcquireError::QueueFull);
        }
        let _slot = QueueSlot(&self.waiting);

        let _turn = tokio::select! {
            _ = cancel.cancelled() => return Err(AcquireError::Cancelled),
            turn = self.turn.lock() => turn,
        };

        loop {
            let wait = match self.try_take() {
                None => return Ok(()),
                Some(wait) => wait,
            };
            tokio::select! {
                _ = cancel.cancelled() => return Err(AcquireError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Refill from elapsed time, then either take a token or report how long
    /// until one is available.
    fn try_take(&self) -> Option<Duration> {
        let mut state = self.state.lock().unwrap();
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            return None;
        }
        let deficit = 1.0 - state.tokens;
        Some(Duration::from_secs_f64(deficit / self.refill_per_sec))
    }

    /// Waiters currently queued, including the head of the line.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

/// Releases the wait-queue slot when an acquisition finishes or unwinds.
struct QueueSlot<'a>(&'a AtomicUsize);

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_up_to_capacity_is_immediate() {
        let bucket = TokenBucket::new(6, 6, 10);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        for _ in 0..6 {
            bucket.acquire(&cancel).await.unwrap();
        }
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn next_acquire_waits_for_refill() {
        let bucket = TokenBucket::new(6, 6, 10);
        let cancel = CancellationToken::new();
        for _ in 0..6 {
            bucket.acquire(&cancel).await.unwrap();
        }

        let start = Instant::now();
        bucket.acquire(&cancel).await.unwrap();
        // one token accrues every 1/6 s
        assert!(start.elapsed() >= Duration::from_millis(166));
    }

    #[tokio::test(start_paused = true)]
    async fn tokens_do_not_accumulate_past_capacity() {
        let bucket = TokenBucket::new(2, 2, 10);
        let cancel = CancellationToken::new();

        tokio::time::sleep(Duration::from_secs(60)).await;

        let start = Instant::now();
        bucket.acquire(&cancel).await.unwrap();
        bucket.acquire(&cancel).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(1));

        let third = Instant::now();
        bucket.acquire(&cancel).await.unwrap();
        assert!(third.elapsed() >= Duration::from_millis(499));
    }

    #[tokio::test(start_paused = true)]
    async fn overflowing_the_wait_queue_fails() {
        let bucket = Arc::new(TokenBucket::new(1, 1, 1));
        let cancel = CancellationToken::new();
        bucket.acquire(&cancel).await.unwrap();

        let head = {
            let bucket = Arc::clone(&bucket);
            let cancel = cancel.clone();
            tokio::spawn(async move { bucket.acquire(&cancel).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(bucket.waiting(), 1);

        assert_eq!(bucket.acquire(&cancel).await, Err(AcquireError::QueueFull));

        cancel.cancel();
        assert_eq!(head.await.unwrap(), Err(AcquireError::Cancelled));
        assert_eq!(bucket.waiting(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_unblocks_a_parked_waiter() {
        let bucket = Arc::new(TokenBucket::new(1, 1, 4));
        let cancel = CancellationToken::new();
        bucket.acquire(&cancel).await.unwrap();

        let waiter = {
            let bucket = Arc::clone(&bucket);
            let cancel = cancel.clone();
            tokio::spawn(async move { bucket.acquire(&cancel).await })
        };
        tokio::task::yield_now().await;

        cancel.cancel();
        assert_eq!(waiter.await.unwrap(), Err(AcquireError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_are_served_in_arrival_order() {
        let bucket = Arc::new(TokenBucket::new(1, 1, 4));
        let cancel = CancellationToken::new();
        bucket.acquire(&cancel).await.unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut waiters = Vec::new();
        for id in 0..3 {
            let bucket = Arc::clone(&bucket);
            let cancel = cancel.clone();
            let order = Arc::clone(&order);
            waiters.push(tokio::spawn(async move {
                bucket.acquire(&cancel).await.unwrap();
                order.lock().unwrap().push(id);
            }));
            // park this waiter before spawning the next
            tokio::task::yield_now().await;
        }

        for waiter in waiters {
            waiter.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }
}
