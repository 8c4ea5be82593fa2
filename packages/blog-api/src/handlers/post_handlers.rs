//! Post endpoint handlers.

use std::fmt::Display;

use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};

use crate::router::{AppState, RouterError};
use blog_core::table::{NewPost, PostPatch};
use blog_runtime::{ApiRequest, PostOperation, ResponseSender};

use super::request_utils::{
    build_empty_response, build_response, dispatch, parse_id, parse_post_query, read_json_body,
    MatchitParams,
};

fn post_request(operation: PostOperation) -> impl FnOnce(ResponseSender) -> ApiRequest {
    move |response| ApiRequest::Post {
        operation,
        response,
    }
}

/// Lists posts.
///
/// # Endpoint
/// `GET /posts?pinned=true&category=2&author=1&limit=10&offset=0`
///
/// # Response
/// - **200 OK**: Array of posts ordered by id, each with its categories
///
/// # Errors
/// - **400 Bad Request**: Malformed query parameter
pub async fn list_posts<B>(
    req: Request<B>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let query = parse_post_query(req.uri().query())?;
    let posts = dispatch(&state, post_request(PostOperation::List { query })).await?;
    build_response(StatusCode::OK, &posts)
}

/// Reads a single post.
///
/// # Endpoint
/// `GET /posts/{id}`
///
/// # Errors
/// - **400 Bad Request**: Non-numeric id
/// - **404 Not Found**: `ResourceNotFoundError` naming `post`
pub async fn get_post(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id(&params, "id")?;
    let post = dispatch(&state, post_request(PostOperation::Read { id })).await?;
    build_response(StatusCode::OK, &post)
}

/// Creates a post.
///
/// # Endpoint
/// `POST /posts`
///
/// # Request Body
/// ```json
/// {
///   "title": "Hello",
///   "lead": "Short intro",
///   "content": "Body text",
///   "coverPhoto": "https://example.com/cover.jpg",
///   "authorId": 1,
///   "pinned": false
/// }
/// ```
///
/// # Response
/// - **201 Created**: The created post, including its derived `slug`
///
/// # Errors
/// - **400 Bad Request**: `ValidationError` for a missing title or bad cover photo URL
///
/// # Example
/// ```bash
/// curl -X POST http://localhost:8080/posts \
///   -H "Content-Type: application/json" \
///   -d '{"title": "Hello"}'
/// ```
pub async fn create_post<B>(
    req: Request<B>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body,
    B::Error: Display,
{
    let post: NewPost = read_json_body(req, &state).await?;
    let created = dispatch(&state, post_request(PostOperation::Create { post })).await?;
    build_response(StatusCode::CREATED, &created)
}

/// Updates a post. Only the keys present in the body are changed; unknown
/// keys are ignored.
///
/// # Endpoint
/// `PUT /posts/{id}`
///
/// # Response
/// - **204 No Content**
///
/// # Errors
/// - **400 Bad Request**: `ValidationError` for an empty title
/// - **404 Not Found**: `ResourceNotFoundError` naming `post`
pub async fn update_post<B>(
    req: Request<B>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body,
    B::Error: Display,
{
    let id = parse_id(&params, "id")?;
    let patch: PostPatch = read_json_body(req, &state).await?;
    dispatch(&state, post_request(PostOperation::Update { id, patch })).await?;
    build_empty_response(StatusCode::NO_CONTENT)
}

/// Deletes a post and its category links.
///
/// # Endpoint
/// `DELETE /posts/{id}`
///
/// # Response
/// - **204 No Content**
///
/// # Errors
/// - **404 Not Found**: `ResourceNotFoundError` naming `post`
pub async fn delete_post(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id(&params, "id")?;
    dispatch(&state, post_request(PostOperation::Delete { id })).await?;
    build_empty_response(StatusCode::NO_CONTENT)
}

/// Links a category to a post. Linking twice is a no-op.
///
/// # Endpoint
/// `PUT /posts/{id}/categories/{category_id}`
///
/// # Response
/// - **204 No Content**
///
/// # Errors
/// - **404 Not Found**: `ResourceNotFoundError` naming `post` or `category`,
///   whichever id is unknown (the post is checked first)
pub async fn add_post_category(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id(&params, "id")?;
    let category_id = parse_id(&params, "category_id")?;
    dispatch(
        &state,
        post_request(PostOperation::AddCategory { id, category_id }),
    )
    .await?;
    build_empty_response(StatusCode::NO_CONTENT)
}

/// Unlinks a category from a post. Removing a link that does not exist
/// succeeds.
///
/// # Endpoint
/// `DELETE /posts/{id}/categories/{category_id}`
///
/// # Response
/// - **204 No Content**
///
/// # Errors
/// - **404 Not Found**: `ResourceNotFoundError` naming `post` or `category`
pub async fn remove_post_category(
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id(&params, "id")?;
    let category_id = parse_id(&params, "category_id")?;
    dispatch(
        &state,
        post_request(PostOperation::RemoveCategory { id, category_id }),
    )
    .await?;
    build_empty_response(StatusCode::NO_CONTENT)
}
