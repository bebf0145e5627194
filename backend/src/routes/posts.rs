//! Post, like and comment routes. All of them require a token.

use super::parse_id;
use crate::auth::{require_auth, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::services::PostService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use devconnector_shared::{
    CommentResponse, LikeResponse, MessageResponse, PostResponse, ResourceError, TextRequest,
};
use uuid::Uuid;

/// Create post routes
pub fn post_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_post).get(list_posts))
        .route("/:id", get(get_post).delete(delete_post))
        .route("/like/:id", put(like_post))
        .route("/unlike/:id", put(unlike_post))
        .route("/comment/:id", post(add_comment))
        .route("/comment/:id/:comment_id", delete(delete_comment))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

fn post_id(raw: &str) -> Result<Uuid, ApiError> {
    parse_id(raw).ok_or_else(|| ApiError::NotFound(ResourceError::PostNotFound.to_string()))
}

/// POST /api/posts
async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<TextRequest>,
) -> ApiResult<Json<PostResponse>> {
    let post = PostService::create(state.db(), auth, &req.text).await?;
    Ok(Json(post))
}

/// GET /api/posts
async fn list_posts(State(state): State<AppState>) -> ApiResult<Json<Vec<PostResponse>>> {
    let posts = PostService::list(state.db()).await?;
    Ok(Json(posts))
}

/// GET /api/posts/:id
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PostResponse>> {
    let post = PostService::get(state.db(), post_id(&id)?).await?;
    Ok(Json(post))
}

/// DELETE /api/posts/:id
async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    PostService::delete(state.db(), auth, post_id(&id)?).await?;
    Ok(Json(MessageResponse::new("Post removed")))
}

/// PUT /api/posts/like/:id
async fn like_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<LikeResponse>>> {
    let likes = PostService::like(state.db(), auth, post_id(&id)?).await?;
    Ok(Json(likes))
}

/// PUT /api/posts/unlike/:id
async fn unlike_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<LikeResponse>>> {
    let likes = PostService::unlike(state.db(), auth, post_id(&id)?).await?;
    Ok(Json(likes))
}

/// POST /api/posts/comment/:id
async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<TextRequest>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let comments = PostService::comment(state.db(), auth, post_id(&id)?, &req.text).await?;
    Ok(Json(comments))
}

/// DELETE /api/posts/comment/:id/:comment_id
async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let comment_id = parse_id(&comment_id)
        .ok_or_else(|| ApiError::NotFound(ResourceError::CommentNotFound.to_string()))?;

    let comments = PostService::delete_comment(state.db(), auth, post_id(&id)?, comment_id).await?;
    Ok(Json(comments))
}
