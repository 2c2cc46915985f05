// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser
//! - `user_emails`: normalized email → user_id (uniqueness index)
//! - `receipts`: receipt_id → serialized Receipt (items and modifiers embedded)
//! - `owner_receipts`: composite key (owner|created_ms|receipt_id) → receipt_id

use std::path::Path;

use redb::TableDefinition;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user_id → serialized StoredUser (JSON bytes).
pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique index: normalized email → user_id.
pub(crate) const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Primary table: receipt_id → serialized Receipt (JSON bytes).
pub(crate) const RECEIPTS: TableDefinition<&str, &[u8]> = TableDefinition::new("receipts");

/// Index: `owner|created_ms|receipt_id` → receipt_id.
pub(crate) const OWNER_RECEIPTS: TableDefinition<&str, &str> =
    TableDefinition::new("owner_receipts");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("email already registered")]
    EmailTaken,
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build the owner index key for a receipt.
///
/// Format: `owner_user_id | zero-padded creation millis | receipt_id`, so a
/// forward scan over one owner's prefix yields oldest-first.
pub(crate) fn owner_index_key(owner_user_id: &str, created_ms: i64, receipt_id: &str) -> String {
    format!("{owner_user_id}|{:020}|{receipt_id}", created_ms.max(0))
}

/// Range bounds covering every index key of one owner.
///
/// `}` is the byte after `|`, so `owner|` .. `owner}` spans exactly the prefix.
pub(crate) fn owner_index_range(owner_user_id: &str) -> (String, String) {
    (format!("{owner_user_id}|"), format!("{owner_user_id}}}"))
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the embedded ACID database.
///
/// Cheap to share behind an `Arc`; redb serializes writers internally and
/// allows concurrent readers.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
            let _ = write_txn.open_table(RECEIPTS)?;
            let _ = write_txn.open_table(OWNER_RECEIPTS)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Database opened");

        Ok(Self { db })
    }

    pub(crate) fn redb(&self) -> &redb::Database {
        &self.db
    }
}
