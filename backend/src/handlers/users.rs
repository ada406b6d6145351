//! User management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use shared::User;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::user::{CreateUserInput, UpdateUserInput};
use crate::services::UserService;
use crate::AppState;

/// List users
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let service = UserService::new(state.db);
    Ok(Json(service.list_users().await?))
}

/// Create a user
pub async fn create_user(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<CreateUserInput>, AppError>,
) -> AppResult<(StatusCode, Json<User>)> {
    let service = UserService::new(state.db);
    let user = service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update a user
pub async fn update_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(input), _): WithRejection<Json<UpdateUserInput>, AppError>,
) -> AppResult<Json<User>> {
    let service = UserService::new(state.db);
    let user = service
        .update_user(current_user.0.user_id, user_id, input)
        .await?;
    Ok(Json(user))
}

/// Deactivate a user
pub async fn deactivate_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<User>> {
    let service = UserService::new(state.db);
    let user = service
        .deactivate_user(current_user.0.user_id, user_id)
        .await?;
    Ok(Json(user))
}
