// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upstream providers for receipt parsing.
//!
//! Parsing a receipt photo is two hops: OCR (Google Cloud Vision) turns the
//! image into raw text, then a chat-completion model (OpenAI) turns the text
//! into a [`StructuredReceipt`]. Each hop sits behind a trait so handlers
//! only see `Arc<dyn ...>` from [`AppState`](crate::state::AppState) and
//! tests can swap in fakes.

pub mod openai;
pub mod vision;

use async_trait::async_trait;

pub use openai::{OpenAiClient, OpenAiError, StructuredItem, StructuredModifier, StructuredReceipt};
pub use vision::{GoogleVisionClient, VisionError};

/// Image-to-text extraction.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the full text of a base64 image (optionally a data URL).
    async fn extract_text(&self, image_base64: &str) -> Result<String, VisionError>;
}

/// Raw receipt text to structured receipt.
#[async_trait]
pub trait ReceiptStructurer: Send + Sync {
    async fn structure(&self, raw_text: &str) -> Result<StructuredReceipt, OpenAiError>;
}
