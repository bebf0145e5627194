//! Developer profile routes
//!
//! Listing, lookup by user and the GitHub proxy are public. Everything that
//! writes acts on the caller's own profile only.

use super::parse_id;
use crate::auth::{require_auth, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::services::ProfileService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    middleware,
    routing::{delete, get, put},
    Json, Router,
};
use devconnector_shared::{
    EducationRequest, ExperienceRequest, GithubRepo, MessageResponse, ProfileRequest,
    ProfileResponse, ResourceError,
};

/// Create profile routes
pub fn profile_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(get_my_profile))
        .route("/", axum::routing::post(upsert_profile).delete(delete_account))
        .route("/experience", put(add_experience))
        .route("/experience/:exp_id", delete(delete_experience))
        .route("/education", put(add_education))
        .route("/education/:edu_id", delete(delete_education))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/", get(list_profiles))
        .route("/user/:user_id", get(get_profile_by_user))
        .route("/github/:username", get(github_repos))
        .merge(protected)
}

/// GET /api/profile/me
async fn get_my_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = ProfileService::get_mine(state.db(), auth.user_id).await?;
    Ok(Json(profile))
}

/// POST /api/profile - create or update the caller's profile
async fn upsert_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = ProfileService::upsert(state.db(), auth.user_id, req).await?;
    Ok(Json(profile))
}

/// GET /api/profile
async fn list_profiles(State(state): State<AppState>) -> ApiResult<Json<Vec<ProfileResponse>>> {
    let profiles = ProfileService::list(state.db()).await?;
    Ok(Json(profiles))
}

/// GET /api/profile/user/:user_id
async fn get_profile_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    let user_id = parse_id(&user_id)
        .ok_or_else(|| ApiError::BadRequest(ResourceError::ProfileNotFound.to_string()))?;

    let profile = ProfileService::get_by_user(state.db(), user_id).await?;
    Ok(Json(profile))
}

/// DELETE /api/profile - remove the caller's profile, posts and account
async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<MessageResponse>> {
    ProfileService::delete_account(state.db(), auth.user_id).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}

/// PUT /api/profile/experience
async fn add_experience(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ExperienceRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = ProfileService::add_experience(state.db(), auth.user_id, req).await?;
    Ok(Json(profile))
}

/// DELETE /api/profile/experience/:exp_id
async fn delete_experience(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(exp_id): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = match parse_id(&exp_id) {
        Some(id) => ProfileService::delete_experience(state.db(), auth.user_id, id).await?,
        None => ProfileService::get_mine(state.db(), auth.user_id).await?,
    };
    Ok(Json(profile))
}

/// PUT /api/profile/education
async fn add_education(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<EducationRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = ProfileService::add_education(state.db(), auth.user_id, req).await?;
    Ok(Json(profile))
}

/// DELETE /api/profile/education/:edu_id
async fn delete_education(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(edu_id): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = match parse_id(&edu_id) {
        Some(id) => ProfileService::delete_education(state.db(), auth.user_id, id).await?,
        None => ProfileService::get_mine(state.db(), auth.user_id).await?,
    };
    Ok(Json(profile))
}

/// GET /api/profile/github/:username
async fn github_repos(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<GithubRepo>>> {
    let repos = ProfileService::github_repos(state.github(), &username).await?;
    Ok(Json(repos))
}
