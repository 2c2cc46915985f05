// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;

use crate::{auth::Auth, models::HealthResponse};

/// Liveness probe. Always 200 while the process is serving.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is running", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Same as `/health`, but behind the bearer check. Lets clients test that
/// their token is still accepted.
#[utoipa::path(
    get,
    path = "/health/auth",
    tag = "Health",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Token accepted", body = HealthResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn health_auth(Auth(_user): Auth) -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_healthy() {
        let Json(response) = health().await;
        assert_eq!(response.status, "healthy");
    }
}
