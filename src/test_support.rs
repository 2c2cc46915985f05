// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use tempfile::TempDir;

use crate::{
    auth::TokenIssuer,
    providers::{
        OpenAiError, ReceiptStructurer, StructuredReceipt, TextExtractor, VisionError,
    },
    state::AppState,
    storage::Database,
};

pub(crate) const TEST_SECRET: &str = "test-secret";

/// Text extractor returning a canned result.
pub(crate) struct FakeExtractor(pub Option<String>);

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract_text(&self, _image_base64: &str) -> Result<String, VisionError> {
        self.0.clone().ok_or(VisionError::NoText)
    }
}

/// Structurer returning a canned receipt.
pub(crate) struct FakeStructurer(pub Option<StructuredReceipt>);

#[async_trait]
impl ReceiptStructurer for FakeStructurer {
    async fn structure(&self, _raw_text: &str) -> Result<StructuredReceipt, OpenAiError> {
        self.0.clone().ok_or(OpenAiError::EmptyReply)
    }
}

pub(crate) fn sample_structured_receipt() -> StructuredReceipt {
    StructuredReceipt {
        name: Some(json!("Tesco")),
        items: Some(json!([{ "item": "Milk", "price": 1.5, "qty": 1 }])),
        modifiers: Some(json!([])),
        ..Default::default()
    }
}

/// State backed by a temporary database and working fakes.
pub(crate) fn test_state() -> (AppState, TempDir) {
    test_state_with(
        FakeExtractor(Some("MILK 1.50".to_string())),
        FakeStructurer(Some(sample_structured_receipt())),
    )
}

pub(crate) fn test_state_with(
    extractor: impl TextExtractor + 'static,
    structurer: impl ReceiptStructurer + 'static,
) -> (AppState, TempDir) {
    let dir = TempDir::new().unwrap();
    let db = Database::open(&dir.path().join("test.redb")).unwrap();
    let state = AppState::new(
        db,
        TokenIssuer::new(Some(TEST_SECRET.to_string())),
        Arc::new(extractor),
        Arc::new(structurer),
    );
    (state, dir)
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub(crate) async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
