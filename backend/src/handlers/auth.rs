//! Authentication handlers

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use shared::User;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthTokens, LoginInput};
use crate::services::{AuthService, UserService};
use crate::AppState;

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginInput>, AppError>,
) -> Result<Json<AuthTokens>, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.login(body).await?;
    Ok(Json(tokens))
}

/// Profile of the authenticated user
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<User>, AppError> {
    let user = UserService::new(state.db)
        .get_user(current_user.0.user_id)
        .await?;
    Ok(Json(user))
}
