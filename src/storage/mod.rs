// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage on an embedded redb database. One file holds users,
//! the email uniqueness index, receipts and the per-owner receipt index.
//!
//! ## Layout
//!
//! ```text
//! users            user_id -> StoredUser (JSON)
//! user_emails      normalized email -> user_id
//! receipts         receipt_id -> Receipt (JSON, items/modifiers embedded)
//! owner_receipts   owner|created_ms|receipt_id -> receipt_id
//! ```
//!
//! Every multi-table change (registering a user, creating a receipt,
//! deleting a user with its receipts) happens inside one write transaction.

pub mod database;
pub mod repository;

pub use database::{Database, StorageError, StorageResult};
pub use repository::{
    normalize_email, Modifier, Receipt, ReceiptItem, ReceiptRepository, StoredUser,
    UserRepository,
};
