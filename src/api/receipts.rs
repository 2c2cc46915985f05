// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::Auth,
    error::{ApiError, JsonBody},
    models::{CreateReceiptRequest, ParseReceiptRequest},
    providers::{vision::prepare_image, StructuredReceipt},
    state::AppState,
    storage::{Receipt, ReceiptRepository, StorageError},
};

#[utoipa::path(
    post,
    path = "/receipts",
    request_body = CreateReceiptRequest,
    tag = "Receipts",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Receipt stored", body = Receipt),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn create_receipt(
    Auth(user): Auth,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateReceiptRequest>,
) -> Result<(StatusCode, Json<Receipt>), ApiError> {
    let receipt = Receipt {
        id: Uuid::new_v4().to_string(),
        user_id: user.user_id,
        name: request.name,
        reason: request.reason,
        monzo_id: request.monzo_id,
        items: request.items.into_iter().map(Into::into).collect(),
        modifiers: request.modifiers.into_iter().map(Into::into).collect(),
        created_at: Utc::now(),
    };
    ReceiptRepository::new(&state.db).create(&receipt)?;

    info!(
        receipt_id = %receipt.id,
        user_id = %receipt.user_id,
        items = receipt.items.len(),
        "Stored receipt"
    );
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// OCR a receipt photo and structure the text. Nothing is stored.
#[utoipa::path(
    post,
    path = "/receipts/parse",
    request_body = ParseReceiptRequest,
    tag = "Receipts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Structured receipt", body = StructuredReceipt),
        (status = 400, description = "Invalid image or text extraction failed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Structuring failed")
    )
)]
pub async fn parse_receipt(
    Auth(user): Auth,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ParseReceiptRequest>,
) -> Result<Json<StructuredReceipt>, ApiError> {
    let image = prepare_image(&request.receipt)?;
    let text = state.text_extractor.extract_text(&image).await?;
    let structured = state.structurer.structure(&text).await?;

    info!(
        user_id = %user.user_id,
        items = structured.item_count(),
        "Parsed receipt"
    );
    Ok(Json(structured))
}

#[utoipa::path(
    get,
    path = "/receipts",
    tag = "Receipts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Receipts owned by the caller", body = [Receipt]),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_receipts(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Receipt>>, ApiError> {
    let receipts = ReceiptRepository::new(&state.db).list_by_owner(&user.user_id)?;
    Ok(Json(receipts))
}

/// Fetch any receipt by id. This route is public: possession of the id is
/// enough to read the receipt.
#[utoipa::path(
    get,
    path = "/receipts/{receipt_id}",
    params(
        ("receipt_id" = String, Path, description = "Identifier of the receipt")
    ),
    tag = "Receipts",
    responses(
        (status = 200, description = "Receipt", body = Receipt),
        (status = 404, description = "Receipt not found")
    )
)]
pub async fn get_receipt(
    Path(receipt_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Receipt>, ApiError> {
    match ReceiptRepository::new(&state.db).get(&receipt_id) {
        Ok(receipt) => Ok(Json(receipt)),
        Err(StorageError::NotFound(_)) => Err(ApiError::not_found("Receipt not found")),
        Err(other) => Err(other.into()),
    }
}
