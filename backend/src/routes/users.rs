//! Account registration

use crate::error::ApiResult;
use crate::extract::ValidatedJson;
use crate::services::UserService;
use crate::state::AppState;
use axum::{extract::State, routing::post, Json, Router};
use devconnector_shared::{RegisterRequest, TokenResponse};

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/", post(register))
}

/// Register a new user
///
/// POST /api/users
async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token =
        UserService::register(state.db(), state.issuer(), &req.name, &req.email, &req.password)
            .await?;
    Ok(Json(TokenResponse { token }))
}
