//! Tick-based runtime applying API requests to the blog store.
//!
//! The HTTP layer never touches the store directly: every request is sent
//! over a channel, applied in arrival order by the runtime thread, and
//! answered through a oneshot channel.

use blog_core::BlogError;
use tokio::sync::oneshot;

mod api_handlers;
mod api_request;
mod runtime;

pub use api_handlers::ApiHandlers;
pub use api_request::{ApiRequest, CategoryOperation, PostOperation};
pub use runtime::{Runtime, RuntimeStats};

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, BlogError>;

/// Response sender for API requests
pub type ResponseSender = oneshot::Sender<Result<serde_json::Value>>;
