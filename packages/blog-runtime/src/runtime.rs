//! Runtime loop with tick phases and timing enforcement.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use blog_core::config::BlogConfig;
use blog_core::persistence::PersistenceManager;
use blog_core::{BlogError, Database};
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::api_handlers::ApiHandlers;
use crate::api_request::ApiRequest;
use crate::Result;

/// Counters exposed for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Ticks executed
    pub ticks: u64,
    /// Requests applied
    pub processed: u64,
    /// Requests rejected because the queue was full
    pub rejected: u64,
    /// Snapshots written
    pub flushes: u64,
    /// Snapshot writes that failed
    pub failed_flushes: u64,
}

/// Main runtime loop
pub struct Runtime {
    /// Database instance
    database: Arc<Database>,
    /// Configuration
    config: BlogConfig,
    /// Tick duration
    tick_duration: Duration,
    /// API request receiver
    api_rx: mpsc::Receiver<ApiRequest>,
    /// Pending requests in arrival order
    queue: VecDeque<ApiRequest>,
    /// Maximum queue length (tickrate * 100)
    queue_capacity: usize,
    /// Snapshot writer, if persistence is enabled
    persistence: Option<PersistenceManager>,
    /// API handlers
    api_handlers: ApiHandlers,
    /// Store modified since the last snapshot
    dirty: bool,
    /// Ticks since the last snapshot attempt
    ticks_since_flush: u32,
    /// Every sender has been dropped
    disconnected: bool,
    stats: RuntimeStats,
}

impl Runtime {
    /// Create a new runtime
    pub fn new(
        database: Arc<Database>,
        config: BlogConfig,
        api_rx: mpsc::Receiver<ApiRequest>,
        persistence: Option<PersistenceManager>,
    ) -> Self {
        let tick_duration = Duration::from_secs_f64(1.0 / config.tickrate.max(1) as f64);
        let queue_capacity = config.queue_capacity();
        let api_handlers = ApiHandlers::new(database.clone());

        Self {
            database,
            config,
            tick_duration,
            api_rx,
            queue: VecDeque::new(),
            queue_capacity,
            persistence,
            api_handlers,
            dirty: false,
            ticks_since_flush: 0,
            disconnected: false,
            stats: RuntimeStats::default(),
        }
    }

    /// Number of requests waiting for the next API phase.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// Whether the store has changes not yet written to disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True once every sender is gone and the queue is drained.
    pub fn is_finished(&self) -> bool {
        self.disconnected && self.queue.is_empty()
    }

    /// Execute a single tick of the runtime
    pub fn tick(&mut self) -> Result<()> {
        let tick_start = Instant::now();

        // Phase 1: API requests
        self.process_api_phase(tick_start);

        // Phase 2: Persistence
        self.process_persistence_phase(false);

        self.stats.ticks += 1;
        self.sleep_remaining(tick_start);
        Ok(())
    }

    /// Run the runtime loop until every sender is dropped, then write a
    /// final snapshot.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!(
            "Runtime started at {} Hz (queue capacity {})",
            self.config.tickrate,
            self.queue_capacity
        );
        while !self.is_finished() {
            self.tick()?;
        }
        self.process_persistence_phase(true);
        tracing::info!("Runtime stopped: {:?}", self.stats);
        Ok(())
    }

    /// Moves the runtime onto its own thread and runs it.
    pub fn spawn(mut self) -> std::io::Result<JoinHandle<Result<()>>> {
        thread::Builder::new()
            .name("blog-runtime".to_string())
            .spawn(move || self.run())
    }

    /// Process API phase (30% of tick)
    pub fn process_api_phase(&mut self, tick_start: Instant) {
        let api_time_budget = self.tick_duration.mul_f32(0.3);
        self.drain_api_channel();
        self.process_queued_requests(tick_start, api_time_budget);
    }

    /// Drain API channel into the queue, rejecting requests past capacity.
    fn drain_api_channel(&mut self) {
        loop {
            match self.api_rx.try_recv() {
                Ok(req) => {
                    if self.queue.len() >= self.queue_capacity {
                        self.stats.rejected += 1;
                        tracing::warn!(
                            "Request queue full ({} pending), rejecting request",
                            self.queue.len()
                        );
                        req.reject(BlogError::Overloaded {
                            capacity: self.queue_capacity,
                        });
                    } else {
                        self.queue.push_back(req);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        tracing::debug!("All API senders dropped");
                    }
                    self.disconnected = true;
                    break;
                }
            }
        }
    }

    /// Process queued API requests up to limit and time budget. At least
    /// one request is applied per tick.
    fn process_queued_requests(&mut self, tick_start: Instant, time_budget: Duration) {
        let max_requests = self.config.max_api_requests_per_tick;
        let mut processed = 0;

        while processed < max_requests {
            if processed > 0 && tick_start.elapsed() > time_budget {
                break;
            }
            let Some(req) = self.queue.pop_front() else {
                break;
            };
            if self.api_handlers.handle_api_request(req) {
                self.dirty = true;
            }
            processed += 1;
        }

        self.stats.processed += u64::from(processed);
    }

    /// Process persistence phase. Writes a snapshot when the store is dirty
    /// and the flush interval has elapsed, or immediately when `force` is set.
    pub fn process_persistence_phase(&mut self, force: bool) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        self.ticks_since_flush = self.ticks_since_flush.saturating_add(1);
        if !self.dirty {
            return;
        }
        if !force && self.ticks_since_flush < self.config.persistence_interval_ticks {
            return;
        }

        self.ticks_since_flush = 0;
        match persistence.save_snapshot(&self.database) {
            Ok(()) => {
                self.dirty = false;
                self.stats.flushes += 1;
                tracing::debug!("Snapshot written");
            }
            Err(e) => {
                // Stays dirty; retried after the next interval.
                self.stats.failed_flushes += 1;
                tracing::error!("Failed to write snapshot: {}", e);
            }
        }
    }

    /// Sleep remaining tick time
    fn sleep_remaining(&self, tick_start: Instant) {
        if self.is_finished() {
            return;
        }
        if let Some(remaining) = self.tick_duration.checked_sub(tick_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }
}
