// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and login.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{hash_password, verify_dummy_password, verify_password, AuthError},
    error::{ApiError, JsonBody},
    models::{LoginRequest, LoginResponse, RegisterRequest, UserResponse},
    state::AppState,
    storage::{normalize_email, StoredUser, UserRepository},
};

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Name, email or password missing"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let name = request.name.trim();
    let email = normalize_email(&request.email);
    if name.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request(
            "Name, email, and password are required",
        ));
    }

    let user = StoredUser {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email,
        password_hash: hash_password(&request.password)?,
        monzo_id: request.monzo_id,
        created_at: Utc::now(),
    };
    UserRepository::new(&state.db).create(&user)?;

    info!(user_id = %user.id, "Registered user");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Unknown email and wrong password fail identically.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let Some(user) = UserRepository::new(&state.db).find_by_email(&email)? else {
        verify_dummy_password(&request.password);
        return Err(AuthError::InvalidCredentials.into());
    };

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens.issue(&user.id)?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        user: user.into(),
        token,
    }))
}
