//! Authentication routes
//!
//! `GET /api/auth` sits behind the access guard; login is public.

use crate::auth::{require_auth, AuthUser};
use crate::error::ApiResult;
use crate::extract::ValidatedJson;
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use devconnector_shared::{LoginRequest, TokenResponse, UserResponse};

/// Create auth routes
pub fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", get(current_user))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new().route("/", post(login)).merge(protected)
}

/// Get the authenticated user
///
/// GET /api/auth
async fn current_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<UserResponse>> {
    let profile = UserService::current_user(state.db(), user.user_id).await?;
    Ok(Json(profile))
}

/// Login with email and password
///
/// POST /api/auth
async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token = UserService::login(state.db(), state.issuer(), &req.email, &req.password).await?;
    Ok(Json(TokenResponse { token }))
}
