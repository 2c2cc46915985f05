// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the database.
//!
//! Each repository borrows the shared [`Database`](super::Database) and
//! exposes the operations for one entity type.

pub mod receipts;
pub mod users;

pub use receipts::{Modifier, Receipt, ReceiptItem, ReceiptRepository};
pub use users::{normalize_email, StoredUser, UserRepository};
