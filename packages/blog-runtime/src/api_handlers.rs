//! API request handlers

use std::sync::Arc;

use blog_core::Database;
use serde::Serialize;
use serde_json::Value;

use crate::api_request::{ApiRequest, CategoryOperation, PostOperation};
use crate::Result;

/// API request handlers
pub struct ApiHandlers {
    /// Database instance
    database: Arc<Database>,
}

impl ApiHandlers {
    /// Create new API handlers
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Applies a request and sends its answer.
    ///
    /// # Returns
    /// `true` if the store was modified.
    pub fn handle_api_request(&self, req: ApiRequest) -> bool {
        let is_write = req.is_write();
        let (result, response) = match req {
            ApiRequest::Post {
                operation,
                response,
            } => (self.handle_post_operation(operation), response),
            ApiRequest::Category {
                operation,
                response,
            } => (self.handle_category_operation(operation), response),
            ApiRequest::Health { response } => (self.handle_health(), response),
        };
        let modified = is_write && result.is_ok();
        if let Err(e) = &result {
            tracing::debug!("Request failed: {}", e);
        }
        // The caller may have timed out and dropped the receiver.
        let _ = response.send(result);
        modified
    }

    fn handle_post_operation(&self, operation: PostOperation) -> Result<Value> {
        match operation {
            PostOperation::List { query } => {
                tracing::debug!("Listing posts: {:?}", query);
                to_json(&self.database.list_posts(&query)?)
            }
            PostOperation::Read { id } => {
                tracing::debug!("Reading post {}", id);
                to_json(&self.database.get_post(id)?)
            }
            PostOperation::Create { post } => {
                let view = self.database.create_post(post)?;
                tracing::info!("Created post {} '{}'", view.post.id, view.post.slug);
                to_json(&view)
            }
            PostOperation::Update { id, patch } => {
                tracing::info!("Updating post {}", id);
                to_json(&self.database.update_post(id, &patch)?)
            }
            PostOperation::Delete { id } => {
                tracing::info!("Deleting post {}", id);
                self.database.delete_post(id)?;
                Ok(Value::Null)
            }
            PostOperation::AddCategory { id, category_id } => {
                let added = self.database.add_category_to_post(id, category_id)?;
                tracing::info!(
                    "Linked category {} to post {} (new link: {})",
                    category_id,
                    id,
                    added
                );
                Ok(Value::Bool(added))
            }
            PostOperation::RemoveCategory { id, category_id } => {
                let removed = self.database.remove_category_from_post(id, category_id)?;
                tracing::info!(
                    "Unlinked category {} from post {} (link existed: {})",
                    category_id,
                    id,
                    removed
                );
                Ok(Value::Bool(removed))
            }
        }
    }

    fn handle_category_operation(&self, operation: CategoryOperation) -> Result<Value> {
        match operation {
            CategoryOperation::List => to_json(&self.database.list_categories()?),
            CategoryOperation::Read { id } => to_json(&self.database.get_category(id)?),
            CategoryOperation::ListPosts { id } => {
                to_json(&self.database.list_posts_in_category(id)?)
            }
            CategoryOperation::Create { category } => {
                let category = self.database.create_category(category)?;
                tracing::info!("Created category {} '{}'", category.id, category.name);
                to_json(&category)
            }
            CategoryOperation::Update { id, patch } => {
                tracing::info!("Updating category {}", id);
                to_json(&self.database.update_category(id, &patch)?)
            }
            CategoryOperation::Delete { id } => {
                tracing::info!("Deleting category {}", id);
                self.database.delete_category(id)?;
                Ok(Value::Null)
            }
        }
    }

    fn handle_health(&self) -> Result<Value> {
        Ok(serde_json::json!({
            "status": "ok",
            "posts": self.database.post_count()?,
            "categories": self.database.category_count()?,
        }))
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_core::table::{NewPost, PostQuery};
    use blog_core::BlogError;
    use tokio::sync::oneshot;

    fn send(handlers: &ApiHandlers, operation: PostOperation) -> (bool, Result<Value>) {
        let (tx, mut rx) = oneshot::channel();
        let modified = handlers.handle_api_request(ApiRequest::Post {
            operation,
            response: tx,
        });
        (modified, rx.try_recv().unwrap())
    }

    #[test]
    fn create_reports_modification() {
        let handlers = ApiHandlers::new(Arc::new(Database::new()));
        let (modified, result) = send(
            &handlers,
            PostOperation::Create {
                post: NewPost::titled("Hi"),
            },
        );
        assert!(modified);
        assert_eq!(result.unwrap()["slug"], "hi");
    }

    #[test]
    fn failed_write_is_not_a_modification() {
        let handlers = ApiHandlers::new(Arc::new(Database::new()));
        let (modified, result) = send(&handlers, PostOperation::Delete { id: 3 });
        assert!(!modified);
        assert_eq!(result, Err(BlogError::post_not_found(3)));
    }

    #[test]
    fn list_returns_json_array() {
        let handlers = ApiHandlers::new(Arc::new(Database::new()));
        let (modified, result) = send(
            &handlers,
            PostOperation::List {
                query: PostQuery::default(),
            },
        );
        assert!(!modified);
        assert_eq!(result.unwrap(), serde_json::json!([]));
    }
}
