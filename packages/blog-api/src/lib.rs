//! REST API server for the blog service.
//!
//! Provides HTTP endpoints for posts, categories, and the post/category
//! relation, and routes every operation to the runtime thread.

pub mod handlers;
pub mod router;
pub mod server;
