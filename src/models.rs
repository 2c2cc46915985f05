// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies used by the REST API. Persisted records
//! ([`Receipt`], [`StoredUser`]) live in [`crate::storage`]; this module
//! holds the wire shapes around them.
//!
//! ## Model Categories
//!
//! - **Accounts**: registration, login and the public user profile
//! - **Receipts**: receipt creation input and parse requests
//! - **Health**: liveness responses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{Modifier, ReceiptItem, StoredUser};

// =============================================================================
// Account Models
// =============================================================================

/// Request to register a new account.
///
/// Missing fields deserialize as empty and are rejected by validation, so
/// clients get one consistent message for any absent credential.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// External payment account (Monzo) id
    #[serde(default)]
    pub monzo_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub monzo_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StoredUser> for UserResponse {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            monzo_id: user.monzo_id,
            created_at: user.created_at,
        }
    }
}

/// Successful login: the user and a bearer token for subsequent requests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
}

// =============================================================================
// Receipt Models
// =============================================================================

/// Request to store a receipt for the authenticated user.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateReceiptRequest {
    /// Display name, usually the store name
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub monzo_id: Option<String>,
    #[serde(default)]
    pub items: Vec<ReceiptItemInput>,
    #[serde(default)]
    pub modifiers: Vec<ModifierInput>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReceiptItemInput {
    pub item: String,
    #[serde(default)]
    pub price: Option<f64>,
    /// Defaults to 1 when omitted
    #[serde(default = "default_qty")]
    pub qty: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ModifierInput {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
    /// Defaults to `true` when omitted
    #[serde(default = "default_include")]
    pub include: bool,
}

fn default_qty() -> i64 {
    1
}

fn default_include() -> bool {
    true
}

impl From<ReceiptItemInput> for ReceiptItem {
    fn from(input: ReceiptItemInput) -> Self {
        ReceiptItem::new(input.item, input.price, input.qty)
    }
}

impl From<ModifierInput> for Modifier {
    fn from(input: ModifierInput) -> Self {
        Modifier::new(input.kind, input.value, input.percentage, input.include)
    }
}

/// Receipt photo to OCR and structure.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ParseReceiptRequest {
    /// Base64 image, optionally as a `data:image/...;base64,` URL
    pub receipt: String,
}

// =============================================================================
// Health Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}
