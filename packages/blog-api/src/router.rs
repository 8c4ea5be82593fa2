//! Matchit routing configuration.

use std::fmt::Display;
use std::sync::Arc;

use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use matchit::Router as MatchitRouter;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::handlers::{self, response::ErrorResponse};
use blog_core::config::BlogConfig;
use blog_core::ResourceKind;
use blog_runtime::ApiRequest;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration
    pub config: Arc<BlogConfig>,
    /// API request sender to runtime
    pub api_tx: mpsc::Sender<ApiRequest>,
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<RouteHandler>,
    state: AppState,
}

impl Router {
    /// Creates a router with every blog route registered.
    pub fn new(
        config: Arc<BlogConfig>,
        api_tx: mpsc::Sender<ApiRequest>,
    ) -> Result<Self, matchit::InsertError> {
        let mut router = MatchitRouter::new();

        router.insert("/health", RouteHandler::Health)?;

        // Post endpoints
        router.insert("/posts", RouteHandler::Posts)?;
        router.insert("/posts/{id}", RouteHandler::Post)?;
        router.insert(
            "/posts/{id}/categories/{category_id}",
            RouteHandler::PostCategory,
        )?;

        // Category endpoints
        router.insert("/categories", RouteHandler::Categories)?;
        router.insert("/categories/{id}", RouteHandler::Category)?;
        router.insert("/categories/{id}/posts", RouteHandler::CategoryPosts)?;

        Ok(Self {
            inner: router,
            state: AppState { config, api_tx },
        })
    }

    /// Routes a request and renders any error as a JSON error body.
    pub async fn route<B>(&self, req: Request<B>) -> Response<Bytes>
    where
        B: Body,
        B::Error: Display,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let response = match self.dispatch(req, &path).await {
            Ok(response) => response,
            Err(err) => {
                if err.status().is_server_error() {
                    tracing::error!("{} {} failed: {}", method, path, err);
                }
                Response::from(err)
            }
        };
        tracing::debug!("{} {} -> {}", method, path, response.status().as_u16());
        response
    }

    async fn dispatch<B>(&self, req: Request<B>, path: &str) -> Result<Response<Bytes>, RouterError>
    where
        B: Body,
        B::Error: Display,
    {
        match self.inner.at(path) {
            Ok(matched) => {
                matched
                    .value
                    .handle(req, matched.params, self.state.clone())
                    .await
            }
            Err(_) => Err(RouterError::RouteNotFound(path.to_string())),
        }
    }
}

/// Route handler function.
#[derive(Debug, Clone, Copy)]
enum RouteHandler {
    Health,
    Posts,
    Post,
    PostCategory,
    Categories,
    Category,
    CategoryPosts,
}

impl RouteHandler {
    /// Methods accepted on this route, as sent in the `Allow` header.
    fn allowed_methods(self) -> &'static str {
        match self {
            RouteHandler::Health | RouteHandler::CategoryPosts => "GET",
            RouteHandler::Posts | RouteHandler::Categories => "GET, POST",
            RouteHandler::Post | RouteHandler::Category => "GET, PUT, DELETE",
            RouteHandler::PostCategory => "PUT, DELETE",
        }
    }

    /// Handles a request with the given route parameters.
    async fn handle<B>(
        self,
        req: Request<B>,
        params: matchit::Params<'_, '_>,
        state: AppState,
    ) -> Result<Response<Bytes>, RouterError>
    where
        B: Body,
        B::Error: Display,
    {
        let method = req.method().clone();
        match (self, method) {
            (RouteHandler::Health, Method::GET) => handlers::health(state).await,

            (RouteHandler::Posts, Method::GET) => handlers::list_posts(req, state).await,
            (RouteHandler::Posts, Method::POST) => handlers::create_post(req, state).await,
            (RouteHandler::Post, Method::GET) => handlers::get_post(params, state).await,
            (RouteHandler::Post, Method::PUT) => handlers::update_post(req, params, state).await,
            (RouteHandler::Post, Method::DELETE) => handlers::delete_post(params, state).await,
            (RouteHandler::PostCategory, Method::PUT) => {
                handlers::add_post_category(params, state).await
            }
            (RouteHandler::PostCategory, Method::DELETE) => {
                handlers::remove_post_category(params, state).await
            }

            (RouteHandler::Categories, Method::GET) => handlers::list_categories(state).await,
            (RouteHandler::Categories, Method::POST) => {
                handlers::create_category(req, state).await
            }
            (RouteHandler::Category, Method::GET) => handlers::get_category(params, state).await,
            (RouteHandler::Category, Method::PUT) => {
                handlers::update_category(req, params, state).await
            }
            (RouteHandler::Category, Method::DELETE) => {
                handlers::delete_category(params, state).await
            }
            (RouteHandler::CategoryPosts, Method::GET) => {
                handlers::list_category_posts(params, state).await
            }

            (handler, method) => Err(RouterError::MethodNotAllowed {
                method,
                allow: handler.allowed_methods(),
            }),
        }
    }
}

/// Router error type.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Path id does not name an existing resource
    #[error("Could not find resource of type {0}")]
    NotFound(ResourceKind),

    /// Request body failed validation
    #[error("{0}")]
    Validation(String),

    /// Malformed path, query string, or body
    #[error("{0}")]
    BadRequest(String),

    #[error("Method {method} is not allowed on this route")]
    MethodNotAllowed { method: Method, allow: &'static str },

    #[error("No route found for {0}")]
    RouteNotFound(String),

    /// Request body not received in time
    #[error("Request body was not received in time")]
    Timeout,

    /// Runtime did not answer in time
    #[error("Runtime did not respond in time")]
    ResponseTimeout,

    /// Runtime is stopped or overloaded
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    InternalError(String),
}

impl RouterError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RouterError::NotFound(_) | RouterError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            RouterError::Validation(_) | RouterError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RouterError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RouterError::Timeout => StatusCode::REQUEST_TIMEOUT,
            RouterError::ResponseTimeout => StatusCode::GATEWAY_TIMEOUT,
            RouterError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RouterError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error name sent in the `name` field of the error body.
    pub fn name(&self) -> &'static str {
        match self {
            RouterError::NotFound(_) => "ResourceNotFoundError",
            RouterError::Validation(_) => "ValidationError",
            RouterError::BadRequest(_) => "BadRequestError",
            RouterError::MethodNotAllowed { .. } => "MethodNotAllowedError",
            RouterError::RouteNotFound(_) => "RouteNotFoundError",
            RouterError::Timeout | RouterError::ResponseTimeout => "TimeoutError",
            RouterError::Unavailable(_) => "ServiceUnavailableError",
            RouterError::InternalError(_) => "InternalServerError",
        }
    }
}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        let body = ErrorResponse::from_error(&err).to_bytes();

        let mut builder = Response::builder()
            .status(status)
            .header("Content-Type", "application/json");
        if let RouterError::MethodNotAllowed { allow, .. } = &err {
            builder = builder.header("Allow", *allow);
        }
        builder.body(body).unwrap_or_else(|_| {
            let mut fallback = Response::new(Bytes::from_static(b"Internal Server Error"));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }
}
