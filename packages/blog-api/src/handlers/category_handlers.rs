//! Category endpoint handlers.

use std::fmt::Display;

use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};

use crate::router::{AppState, RouterError};
use blog_core::table::{CategoryPatch, NewCategory};
use blog_runtime::{ApiRequest, CategoryOperation, ResponseSender};

use super::request_utils::{
    build_empty_response, build_response, dispatch, parse_id, read_json_body, MatchitParams,
};

fn category_request(
    operation: CategoryOperation,
) -> impl FnOnce(ResponseSender) -> ApiRequest {
    move |response| ApiRequest::Category {
        operation,
        response,
    }
}

/// Lists all categories ordered by id.
///
/// # Endpoint
/// `GET /categories`
pub async fn list_categories(state: AppState) -> Result<Response<Bytes>, RouterError> {
    let categories = dispatch(&state, category_request(CategoryOperation::List)).await?;
    build_response(StatusCode::OK, &categories)
}

/// Reads a single category.
///
/// # Endpoint
/// `GET /categories/{id}`
///
/// # Errors
/// - **404 Not Found**: `ResourceNotFoundError` naming `category`
pub async fn get_category(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id(&params, "id")?;
    let category = dispatch(&state, category_request(CategoryOperation::Read { id })).await?;
    build_response(StatusCode::OK, &category)
}

/// Lists the posts linked to a category.
///
/// # Endpoint
/// `GET /categories/{id}/posts`
pub async fn list_category_posts(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id(&params, "id")?;
    let posts = dispatch(
        &state,
        category_request(CategoryOperation::ListPosts { id }),
    )
    .await?;
    build_response(StatusCode::OK, &posts)
}

/// Creates a category.
///
/// # Endpoint
/// `POST /categories` with body `{"name": "Rust"}`
///
/// # Response
/// - **201 Created**: The created category
pub async fn create_category<B>(
    req: Request<B>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body,
    B::Error: Display,
{
    let category: NewCategory = read_json_body(req, &state).await?;
    let created = dispatch(
        &state,
        category_request(CategoryOperation::Create { category }),
    )
    .await?;
    build_response(StatusCode::CREATED, &created)
}

/// Renames a category.
///
/// # Endpoint
/// `PUT /categories/{id}`
pub async fn update_category<B>(
    req: Request<B>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body,
    B::Error: Display,
{
    let id = parse_id(&params, "id")?;
    let patch: CategoryPatch = read_json_body(req, &state).await?;
    dispatch(
        &state,
        category_request(CategoryOperation::Update { id, patch }),
    )
    .await?;
    build_empty_response(StatusCode::NO_CONTENT)
}

/// Deletes a category and unlinks it from every post.
///
/// # Endpoint
/// `DELETE /categories/{id}`
pub async fn delete_category(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id(&params, "id")?;
    dispatch(&state, category_request(CategoryOperation::Delete { id })).await?;
    build_empty_response(StatusCode::NO_CONTENT)
}
