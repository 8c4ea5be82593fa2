//! I/O utilities for persistence operations.

use std::io::ErrorKind;
use std::time::Duration;

use crate::error::BlogError;

/// Classifies I/O errors into specific BlogError variants.
pub fn classify_io_error(error: std::io::Error, context: &str) -> BlogError {
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => {
            BlogError::DiskFull(format!("{}: {}", context, error))
        }
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            BlogError::TransientIoError(format!("{}: {}", context, error))
        }
        _ => BlogError::IoError(format!("{}: {}", context, error)),
    }
}

/// Runs `operation`, retrying up to `max_retries` times while it fails with
/// a transient I/O error. Any other error is returned immediately.
pub fn retry_io_operation<F, T>(
    mut operation: F,
    max_retries: u32,
    retry_delay_ms: u64,
    context: &str,
) -> Result<T, BlogError>
where
    F: FnMut() -> Result<T, BlogError>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(BlogError::TransientIoError(msg)) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Transient I/O error in {} (attempt {}/{}): {}",
                    context,
                    attempt,
                    max_retries,
                    msg
                );
                if retry_delay_ms > 0 {
                    std::thread::sleep(Duration::from_millis(retry_delay_ms));
                }
            }
            Err(err) => return Err(err),
        }
    }
}
