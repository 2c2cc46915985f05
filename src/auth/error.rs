// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// Covers both login failures and bearer-token verification failures.
/// Every variant except the server-side ones maps to `401 Unauthorized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Authorization header is not `Bearer <token>`
    InvalidAuthHeader,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token was signed with an algorithm outside the HMAC family
    InvalidAlgorithm,
    /// Token has expired
    TokenExpired,
    /// `user_id` claim is missing or not a string
    InvalidPayload,
    /// Unknown email or wrong password; deliberately indistinguishable
    InvalidCredentials,
    /// The signing secret is not configured
    MissingSecret,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
}

impl AuthError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::InvalidAlgorithm
            | AuthError::TokenExpired
            | AuthError::InvalidPayload
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::MissingSecret | AuthError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header missing"),
            AuthError::InvalidAuthHeader => write!(f, "Invalid Authorization header format"),
            AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::InvalidAlgorithm => write!(f, "Invalid token"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::InvalidPayload => write!(f, "Invalid token payload"),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::MissingSecret => write!(f, "Server misconfigured: JWT secret missing"),
            AuthError::InternalError(_) => write!(f, "Internal authentication error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::InternalError(ref detail) = self {
            tracing::error!(error = %detail, "Authentication failed internally");
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
