//! HTTP endpoint implementations for posts, categories, and health checks.

use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::router::{AppState, RouterError};
use blog_runtime::ApiRequest;

mod category_handlers;
mod post_handlers;
pub mod request_utils;
pub mod response;

pub use category_handlers::{
    create_category, delete_category, get_category, list_categories, list_category_posts,
    update_category,
};
pub use post_handlers::{
    add_post_category, create_post, delete_post, get_post, list_posts, remove_post_category,
    update_post,
};

/// Reports that the runtime is answering, with row counts.
///
/// # Endpoint
/// `GET /health`
///
/// # Response
/// ```json
/// { "status": "ok", "posts": 3, "categories": 3 }
/// ```
pub async fn health(state: AppState) -> Result<Response<Bytes>, RouterError> {
    let status =
        request_utils::dispatch(&state, |response| ApiRequest::Health { response }).await?;
    request_utils::build_response(StatusCode::OK, &status)
}
