// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::Request,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::CorsOrigins,
    models::{
        CreateReceiptRequest, HealthResponse, LoginRequest, LoginResponse, ModifierInput,
        ParseReceiptRequest, ReceiptItemInput, RegisterRequest, UserResponse,
    },
    providers::{StructuredItem, StructuredModifier, StructuredReceipt},
    state::AppState,
    storage::{Modifier, Receipt, ReceiptItem},
};

pub mod auth;
pub mod health;
pub mod receipts;
pub mod users;

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route(
            "/receipts",
            get(receipts::list_receipts).post(receipts::create_receipt),
        )
        .route("/receipts/parse", post(receipts::parse_receipt))
        .route("/receipts/{receipt_id}", get(receipts::get_receipt))
        .route("/users/me", get(users::get_current_user))
        .route("/health", get(health::health))
        .route("/health/auth", get(health::health_auth))
        .with_state(state);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
}

/// CORS policy for the configured origins. Browsers may send the
/// `Authorization` and `Content-Type` headers.
pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::from(Any),
        CorsOrigins::List(list) => AllowOrigin::list(list.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| tracing::warn!(origin = %origin, "Ignoring invalid CORS origin"))
                .ok()
        })),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        receipts::create_receipt,
        receipts::parse_receipt,
        receipts::list_receipts,
        receipts::get_receipt,
        users::get_current_user,
        health::health,
        health::health_auth
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UserResponse,
            CreateReceiptRequest,
            ReceiptItemInput,
            ModifierInput,
            ParseReceiptRequest,
            Receipt,
            ReceiptItem,
            Modifier,
            StructuredReceipt,
            StructuredItem,
            StructuredModifier,
            HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Receipts", description = "Receipt storage and photo parsing"),
        (name = "Users", description = "Current user profile"),
        (name = "Health", description = "Liveness checks")
    )
)]
struct ApiDoc;
