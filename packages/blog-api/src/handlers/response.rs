//! Response types and helpers for HTTP endpoints.

use hyper::body::Bytes;
use serde::Serialize;

use crate::router::RouterError;

/// Error body sent with every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error name, e.g. `ResourceNotFoundError`
    pub name: String,
    /// Human-readable message
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(err: &RouterError) -> Self {
        Self {
            name: err.name().to_string(),
            message: err.to_string(),
        }
    }

    /// Serializes the body, falling back to a fixed JSON document.
    pub fn to_bytes(&self) -> Bytes {
        match serde_json::to_vec(self) {
            Ok(json) => Bytes::from(json),
            Err(_) => Bytes::from_static(
                br#"{"name":"InternalServerError","message":"Failed to serialize error"}"#,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_core::ResourceKind;

    #[test]
    fn error_body_has_name_and_message() {
        let body = ErrorResponse::from_error(&RouterError::NotFound(ResourceKind::Post));
        let json: serde_json::Value = serde_json::from_slice(&body.to_bytes()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "ResourceNotFoundError",
                "message": "Could not find resource of type post",
            })
        );
    }
}
