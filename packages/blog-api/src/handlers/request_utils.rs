//! Request utilities for HTTP endpoints.

use std::fmt::Display;

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time;

use crate::router::{AppState, RouterError};
use blog_core::table::PostQuery;
use blog_core::BlogError;
use blog_runtime::{ApiRequest, ResponseSender};

/// Type alias for matchit parameters with explicit lifetimes
pub type MatchitParams<'a, 'b> = matchit::Params<'a, 'b>;

/// Helper function to read request body with timeout
pub async fn read_request_body_with_timeout<B>(
    req: Request<B>,
    timeout_ms: u64,
) -> Result<Bytes, RouterError>
where
    B: Body,
    B::Error: Display,
{
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = time::timeout(timeout_duration, req.into_body().collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::BadRequest(format!("Failed to read request body: {}", e)))?;
    Ok(body.to_bytes())
}

/// Reads and deserializes a JSON body. An empty body is read as `{}`.
pub async fn read_json_body<T, B>(req: Request<B>, state: &AppState) -> Result<T, RouterError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Display,
{
    let bytes = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    parse_json_body(&bytes)
}

/// Deserializes a JSON document. Type mismatches are validation errors,
/// malformed JSON is a bad request.
pub fn parse_json_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RouterError> {
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        bytes
    };
    serde_json::from_slice(bytes).map_err(|e| match e.classify() {
        serde_json::error::Category::Data => RouterError::Validation(e.to_string()),
        _ => RouterError::BadRequest(format!("Malformed JSON body: {}", e)),
    })
}

/// Sends a request to the runtime and waits for its answer.
///
/// `build` receives the response sender to embed in the request.
pub async fn dispatch<F>(state: &AppState, build: F) -> Result<Value, RouterError>
where
    F: FnOnce(ResponseSender) -> ApiRequest,
{
    let (tx, rx) = oneshot::channel();
    let timeout_duration = time::Duration::from_millis(state.config.response_timeout_ms);

    time::timeout(timeout_duration, state.api_tx.send(build(tx)))
        .await
        .map_err(|_| RouterError::ResponseTimeout)?
        .map_err(|_| RouterError::Unavailable("Runtime is not running".to_string()))?;

    let result = wait_for_response_with_timeout(rx, state.config.response_timeout_ms).await?;
    result.map_err(map_blog_error_to_router_error)
}

/// Helper function to wait for response with timeout
pub async fn wait_for_response_with_timeout<T>(
    rx: oneshot::Receiver<T>,
    timeout_ms: u64,
) -> Result<T, RouterError> {
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    time::timeout(timeout_duration, rx)
        .await
        .map_err(|_| RouterError::ResponseTimeout)?
        .map_err(|_| RouterError::Unavailable("Runtime dropped the request".to_string()))
}

/// Map BlogError to appropriate RouterError
pub fn map_blog_error_to_router_error(e: BlogError) -> RouterError {
    match e {
        BlogError::NotFound { resource, .. } => RouterError::NotFound(resource),
        BlogError::Validation(msg) | BlogError::InvalidFixture(msg) => {
            RouterError::Validation(msg)
        }
        BlogError::Overloaded { .. } => RouterError::Unavailable(e.to_string()),
        _ => RouterError::InternalError(format!("Runtime error: {}", e)),
    }
}

/// Parses a numeric path parameter.
pub fn parse_id(params: &MatchitParams<'_, '_>, name: &str) -> Result<u64, RouterError> {
    let raw = params
        .get(name)
        .ok_or_else(|| RouterError::InternalError(format!("Missing path parameter '{}'", name)))?;
    raw.parse().map_err(|_| {
        RouterError::BadRequest(format!(
            "Invalid {} '{}': expected a non-negative integer",
            name, raw
        ))
    })
}

/// Parse post listing filters from the URL query string.
///
/// Unknown keys are ignored.
pub fn parse_post_query(query_str: Option<&str>) -> Result<PostQuery, RouterError> {
    let mut query = PostQuery::default();

    let Some(query_str) = query_str else {
        return Ok(query);
    };
    for pair in query_str.split('&').filter(|pair| !pair.is_empty()) {
        let Some((key, encoded_value)) = pair.split_once('=') else {
            continue;
        };
        let value = percent_decode_str(encoded_value).decode_utf8_lossy();

        match key {
            "limit" => query.limit = Some(parse_query_value(key, &value)?),
            "offset" => query.offset = Some(parse_query_value(key, &value)?),
            "category" => query.category_id = Some(parse_query_value(key, &value)?),
            "author" => query.author_id = Some(parse_query_value(key, &value)?),
            "pinned" => {
                query.pinned = Some(match value.as_ref() {
                    "true" | "1" => true,
                    "false" | "0" => false,
                    _ => {
                        return Err(RouterError::BadRequest(format!(
                            "Invalid pinned value '{}'",
                            value
                        )))
                    }
                })
            }
            _ => {}
        }
    }

    Ok(query)
}

fn parse_query_value<T>(key: &str, value: &str) -> Result<T, RouterError>
where
    T: std::str::FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e| {
        RouterError::BadRequest(format!("Invalid {} value '{}': {}", key, value, e))
    })
}

/// Helper to build a JSON HTTP response
pub fn build_response<T: Serialize>(
    status: StatusCode,
    body: &T,
) -> Result<Response<Bytes>, RouterError> {
    let json = serde_json::to_vec(body)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Bytes::from(json))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Helper to build empty HTTP response (for 204 No Content)
pub fn build_empty_response(status: StatusCode) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .body(Bytes::new())
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_core::ResourceKind;
    use blog_core::table::NewPost;

    #[test]
    fn test_parse_post_query() {
        let query =
            parse_post_query(Some("pinned=true&category=2&limit=10&offset=5&author=%37"))
                .unwrap();
        assert_eq!(
            query,
            PostQuery {
                limit: Some(10),
                offset: Some(5),
                pinned: Some(true),
                category_id: Some(2),
                author_id: Some(7),
            }
        );

        assert_eq!(parse_post_query(None).unwrap(), PostQuery::default());
        assert_eq!(
            parse_post_query(Some("sort=title&flag")).unwrap(),
            PostQuery::default()
        );
    }

    #[test]
    fn test_parse_post_query_rejects_bad_values() {
        assert!(matches!(
            parse_post_query(Some("limit=ten")),
            Err(RouterError::BadRequest(_))
        ));
        assert!(matches!(
            parse_post_query(Some("pinned=maybe")),
            Err(RouterError::BadRequest(_))
        ));
        assert!(matches!(
            parse_post_query(Some("offset=-1")),
            Err(RouterError::BadRequest(_))
        ));
    }

    #[test]
    fn test_map_blog_error_to_router_error() {
        assert!(matches!(
            map_blog_error_to_router_error(BlogError::category_not_found(3)),
            RouterError::NotFound(ResourceKind::Category)
        ));
        assert!(matches!(
            map_blog_error_to_router_error(BlogError::Validation("title".into())),
            RouterError::Validation(_)
        ));
        assert!(matches!(
            map_blog_error_to_router_error(BlogError::Overloaded { capacity: 10 }),
            RouterError::Unavailable(_)
        ));
        assert!(matches!(
            map_blog_error_to_router_error(BlogError::LockPoisoned),
            RouterError::InternalError(_)
        ));
    }

    #[test]
    fn test_parse_json_body() {
        let post: NewPost = parse_json_body(b"").unwrap();
        assert!(post.title.is_empty());

        assert!(matches!(
            parse_json_body::<NewPost>(b"{\"title\": "),
            Err(RouterError::BadRequest(_))
        ));
        assert!(matches!(
            parse_json_body::<NewPost>(b"{\"title\": 5}"),
            Err(RouterError::Validation(_))
        ));
    }
}
