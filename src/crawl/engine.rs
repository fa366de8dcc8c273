// src/crawl/engine.rs

//! The crawl engine: a fixed worker pool over the shared frontier.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::CrawlConfig;
use crate::crawl::completion::CompletionTracker;
use crate::crawl::frontier::Frontier;
use crate::crawl::limiter::{AcquireError, TokenBucket};
use crate::crawl::seen::SeenSet;
use crate::error::{AppError, Result};
use crate::services::{PageFetcher, extract_links};
use crate::utils::url::{canonicalize, is_in_domain};

/// Summary of a finished crawl run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub seed: String,
    pub target_host: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages_processed: usize,
    pub fetch_failures: usize,
    pub urls_seen: usize,
    pub cancelled: bool,
}

/// Counters updated by workers while the crawl runs.
#[derive(Default)]
struct CrawlCounters {
    pages_processed: AtomicUsize,
    fetch_failures: AtomicUsize,
}

/// Crawls every reachable page within the seed URL's host.
///
/// Workers both consume and produce work: each dequeued page may feed new
/// URLs back into the frontier. There is no external signal that the crawl is
/// done; the `CompletionTracker` detects the instant every admitted URL has
/// been fully processed and the winning worker closes the frontier.
pub struct CrawlEngine {
    config: CrawlConfig,
    fetcher: Arc<dyn PageFetcher>,
    seed: Url,
    target_host: String,
    frontier: Frontier,
    seen: SeenSet,
    completion: CompletionTracker,
    limiter: TokenBucket,
    counters: CrawlCounters,
}

impl CrawlEngine {
    /// Build an engine for the given seed. The target host is fixed from the
    /// seed for the lifetime of the crawl.
    pub fn new(config: CrawlConfig, fetcher: Arc<dyn PageFetcher>, seed: &Url) -> Result<Self> {
        config.validate()?;
        let seed = canonicalize(seed);
        let target_host = seed
            .host_str()
            .ok_or_else(|| AppError::config(format!("seed URL has no host: {seed}")))?
            .to_ascii_lowercase();

        Ok(Self {
            frontier: Frontier::new(config.frontier_capacity),
            limiter: TokenBucket::new(config.rate_burst, config.rate_per_sec, config.workers),
            seen: SeenSet::new(),
            completion: CompletionTracker::new(),
            counters: CrawlCounters::default(),
            config,
            fetcher,
            seed,
            target_host,
        })
    }

    /// Run the crawl to completion or cancellation and return the report.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> CrawlReport {
        let started_at = Utc::now();
        log::info!(
            "crawl start: seed={} host={} workers={}",
            self.seed,
            self.target_host,
            self.config.workers
        );

        // Admit the seed. If it is rejected, no work will ever appear and the
        // frontier must close before the workers look at it.
        let _ = self.admit(self.seed.clone(), &cancel).await;
        if self.completion.pending() == 0 {
            self.frontier.close();
        }

        let workers: Vec<_> = (0..self.config.workers)
            .map(|id| {
                let engine = Arc::clone(&self);
                let cancel = cancel.clone();
                tokio::spawn(async move { engine.worker(id, cancel).await })
            })
            .collect();

        for worker in join_all(workers).await {
            if let Err(error) = worker {
                log::error!("worker task failed: {error}");
            }
        }

        let report = CrawlReport {
            seed: self.seed.to_string(),
            target_host: self.target_host.clone(),
            started_at,
            finished_at: Utc::now(),
            pages_processed: self.counters.pages_processed.load(Ordering::Relaxed),
            fetch_failures: self.counters.fetch_failures.load(Ordering::Relaxed),
            urls_seen: self.seen.len(),
            cancelled: cancel.is_cancelled(),
        };
        log::info!(
            "crawl finished: {} pages processed, {} fetch failures, {} distinct URLs",
            report.pages_processed,
            report.fetch_failures,
            report.urls_seen
        );
        report
    }

    /// One worker: dequeue, rate-limit, fetch, extract, admit, report.
    async fn worker(self: Arc<Self>, id: usize, cancel: CancellationToken) {
        log::debug!("worker {id} started");
        loop {
            let url = tokio::select! {
                _ = cancel.cancelled() => break,
                dequeued = self.frontier.dequeue() => match dequeued {
                    Some(url) => url,
                    None => break,
                },
            };

            if let Err(AppError::Cancelled) = self.process(url, &cancel).await {
                break;
            }
        }
        if cancel.is_cancelled() {
            log::debug!("worker {id} cancelled");
        } else {
            log::debug!("worker {id} finished");
        }
    }

    /// Process one dequeued URL. The pending-count decrement always happens,
    /// even when the fetch or a downstream enqueue is cancelled mid-flight.
    async fn process(&self, url: Url, cancel: &CancellationToken) -> Result<()> {
        let outcome = self.fetch_and_expand(&url, cancel).await;

        if let Err(error) = &outcome {
            self.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
            log::error!("Error fetching {url}: {error}");
        }
        log::info!("URL processed: {url}");
        self.counters.pages_processed.fetch_add(1, Ordering::Relaxed);

        if self.completion.on_processed() {
            log::debug!("no pending URLs remain, closing frontier");
            self.frontier.close();
        }

        match outcome {
            Err(AppError::Cancelled) => Err(AppError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Acquire a rate-limit permit, fetch the page, and offer every extracted
    /// link to admission. A fetch failure yields zero links and is the
    /// caller's to log; it never aborts the crawl.
    async fn fetch_and_expand(&self, url: &Url, cancel: &CancellationToken) -> Result<()> {
        match self.limiter.acquire(cancel).await {
            Ok(()) => {}
            Err(AcquireError::QueueFull) => return Err(AppError::RateLimitQueueFull),
            Err(AcquireError::Cancelled) => return Err(AppError::Cancelled),
        }

        let body = self.fetcher.fetch(url, cancel).await?;
        for link in extract_links(url, &body) {
            self.admit(link, cancel).await?;
        }
        Ok(())
    }

    /// The admission pipeline: domain check, dedup mark, pending increment,
    /// frontier enqueue. Rejections are silent; only a cancelled enqueue is
    /// an error.
    async fn admit(&self, url: Url, cancel: &CancellationToken) -> Result<()> {
        if self.completion.is_complete() {
            return Ok(());
        }
        if !is_in_domain(&url, &self.target_host) {
            return Ok(());
        }
        if !self.seen.try_mark(&url) {
            return Ok(());
        }

        self.completion.on_enqueued();
        tokio::select! {
            _ = cancel.cancelled() => {
                self.completion.on_abandoned();
                log::error!("failed to enqueue {url}: crawl is shutting down");
                Err(AppError::Cancelled)
            }
            enqueued = self.frontier.enqueue(url.clone()) => {
                if !enqueued {
                    // frontier already closed: drop silently, but give back
                    // the pending increment
                    self.completion.on_abandoned();
                }
                Ok(())
            }
        }
    }
}
