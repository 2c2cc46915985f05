// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    auth::Auth,
    error::ApiError,
    models::UserResponse,
    state::AppState,
    storage::{StorageError, UserRepository},
};

/// Profile of the authenticated user.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User no longer exists")
    )
)]
pub async fn get_current_user(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    match UserRepository::new(&state.db).get(&user.user_id) {
        Ok(stored) => Ok(Json(stored.into())),
        Err(StorageError::NotFound(_)) => Err(ApiError::not_found("User not found")),
        Err(other) => Err(other.into()),
    }
}
