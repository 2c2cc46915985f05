// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Users are stored as JSON under their id, with a second table mapping the
//! normalized email to the id. Both are written in the same transaction, so
//! the email index can never point at a missing user.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::super::database::{
    owner_index_range, Database, OWNER_RECEIPTS, RECEIPTS, USERS, USER_EMAILS,
};
use super::super::{StorageError, StorageResult};

/// User record as persisted. Carries the password hash, so it is never
/// serialized into an API response directly.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    pub name: String,
    /// Normalized email (see [`normalize_email`])
    pub email: String,
    /// PHC-formatted password hash
    pub password_hash: String,
    /// External payment account (Monzo) id
    pub monzo_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredUser")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("monzo_id", &self.monzo_id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Canonical form of an email used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().nfkc().collect::<String>().to_lowercase()
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new user.
    ///
    /// # Errors
    /// `StorageError::EmailTaken` if another user already has this email.
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        let json = serde_json::to_vec(user)?;
        let email = normalize_email(&user.email);

        let write_txn = self.db.redb().begin_write()?;
        {
            let mut emails = write_txn.open_table(USER_EMAILS)?;
            if emails.get(email.as_str())?.is_some() {
                return Err(StorageError::EmailTaken);
            }
            emails.insert(email.as_str(), user.id.as_str())?;

            let mut users = write_txn.open_table(USERS)?;
            users.insert(user.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a user by id.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        let read_txn = self.db.redb().begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(user_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StorageError::NotFound(format!("User {user_id}"))),
        }
    }

    /// Look up a user by email (normalized before lookup).
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        let email = normalize_email(email);
        let read_txn = self.db.redb().begin_read()?;
        let emails = read_txn.open_table(USER_EMAILS)?;

        let user_id = match emails.get(email.as_str())? {
            Some(id) => id.value().to_string(),
            None => return Ok(None),
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Delete a user together with their email index entry and all of
    /// their receipts.
    pub fn delete(&self, user_id: &str) -> StorageResult<()> {
        let write_txn = self.db.redb().begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let user: StoredUser = {
                let existing = users
                    .get(user_id)?
                    .ok_or_else(|| StorageError::NotFound(format!("User {user_id}")))?;
                serde_json::from_slice(existing.value())?
            };
            users.remove(user_id)?;

            let mut emails = write_txn.open_table(USER_EMAILS)?;
            emails.remove(normalize_email(&user.email).as_str())?;

            let mut index = write_txn.open_table(OWNER_RECEIPTS)?;
            let (start, end) = owner_index_range(user_id);
            let owned: Vec<(String, String)> = index
                .range(start.as_str()..end.as_str())?
                .map(|entry| {
                    entry.map(|(key, receipt_id)| {
                        (key.value().to_string(), receipt_id.value().to_string())
                    })
                })
                .collect::<Result<_, _>>()?;

            let mut receipts = write_txn.open_table(RECEIPTS)?;
            for (key, receipt_id) in &owned {
                index.remove(key.as_str())?;
                receipts.remove(receipt_id.as_str())?;
            }

            tracing::info!(
                user_id = %user_id,
                receipts = owned.len(),
                "Deleted user and owned receipts"
            );
        }
        write_txn.commit()?;
        Ok(())
    }
}
