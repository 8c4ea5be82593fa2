//! Service configuration.

use std::path::PathBuf;

use crate::error::BlogError;

/// Lowest accepted runtime tick rate in Hz.
pub const MIN_TICKRATE: u32 = 15;
/// Highest accepted runtime tick rate in Hz.
pub const MAX_TICKRATE: u32 = 240;

/// Blog service configuration.
#[derive(Debug, Clone)]
pub struct BlogConfig {
    /// Tick rate in Hz (15-240)
    pub tickrate: u32,
    /// Maximum API requests applied per tick
    pub max_api_requests_per_tick: u32,
    /// Snapshot interval in ticks (only while the store is dirty)
    pub persistence_interval_ticks: u32,
    /// Data directory for snapshots (None = memory only)
    pub data_dir: Option<PathBuf>,
    /// Request body read timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Runtime response timeout in milliseconds
    pub response_timeout_ms: u64,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            tickrate: 60,
            max_api_requests_per_tick: 600,
            persistence_interval_ticks: 60,
            data_dir: None,
            request_timeout_ms: 5000,
            response_timeout_ms: 10000,
            persistence_max_retries: 3,
            persistence_retry_delay_ms: 100,
        }
    }
}

impl BlogConfig {
    /// Checks that every value is within its accepted range.
    pub fn validate(&self) -> Result<(), BlogError> {
        if !(MIN_TICKRATE..=MAX_TICKRATE).contains(&self.tickrate) {
            return Err(BlogError::InvalidConfig(format!(
                "tickrate must be between {} and {} Hz, got {}",
                MIN_TICKRATE, MAX_TICKRATE, self.tickrate
            )));
        }
        if self.max_api_requests_per_tick == 0 {
            return Err(BlogError::InvalidConfig(
                "max_api_requests_per_tick must be at least 1".to_string(),
            ));
        }
        if self.persistence_interval_ticks == 0 {
            return Err(BlogError::InvalidConfig(
                "persistence_interval_ticks must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 || self.response_timeout_ms == 0 {
            return Err(BlogError::InvalidConfig(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Maximum number of requests the runtime keeps queued.
    pub fn queue_capacity(&self) -> usize {
        self.tickrate as usize * 100
    }

    /// Whether snapshots are written to disk.
    pub fn persistence_enabled(&self) -> bool {
        self.data_dir.is_some()
    }
}
