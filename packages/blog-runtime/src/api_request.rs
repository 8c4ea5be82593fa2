//! API request types and implementations

use blog_core::table::{CategoryPatch, NewCategory, NewPost, PostPatch, PostQuery};
use blog_core::BlogError;

use crate::ResponseSender;

/// API request from REST server
#[derive(Debug)]
pub enum ApiRequest {
    /// Operation on the post resource
    Post {
        operation: PostOperation,
        response: ResponseSender,
    },
    /// Operation on the category resource
    Category {
        operation: CategoryOperation,
        response: ResponseSender,
    },
    /// Row counts for health checks
    Health { response: ResponseSender },
}

/// Post operations
#[derive(Debug)]
pub enum PostOperation {
    List { query: PostQuery },
    Read { id: u64 },
    Create { post: NewPost },
    Update { id: u64, patch: PostPatch },
    Delete { id: u64 },
    AddCategory { id: u64, category_id: u64 },
    RemoveCategory { id: u64, category_id: u64 },
}

/// Category operations
#[derive(Debug)]
pub enum CategoryOperation {
    List,
    Read { id: u64 },
    ListPosts { id: u64 },
    Create { category: NewCategory },
    Update { id: u64, patch: CategoryPatch },
    Delete { id: u64 },
}

impl ApiRequest {
    /// Returns true if this request may modify the store.
    pub fn is_write(&self) -> bool {
        match self {
            ApiRequest::Post { operation, .. } => !matches!(
                operation,
                PostOperation::List { .. } | PostOperation::Read { .. }
            ),
            ApiRequest::Category { operation, .. } => !matches!(
                operation,
                CategoryOperation::List
                    | CategoryOperation::Read { .. }
                    | CategoryOperation::ListPosts { .. }
            ),
            ApiRequest::Health { .. } => false,
        }
    }

    /// Answers the request with `error` without applying it.
    pub fn reject(self, error: BlogError) {
        let response = match self {
            ApiRequest::Post { response, .. }
            | ApiRequest::Category { response, .. }
            | ApiRequest::Health { response } => response,
        };
        let _ = response.send(Err(error));
    }
}
