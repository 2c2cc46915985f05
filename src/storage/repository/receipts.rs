// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Receipt repository.
//!
//! A receipt is stored as one JSON document with its items and modifiers
//! embedded, plus an owner index entry. Both are written in a single redb
//! write transaction: a receipt is either fully persisted or not at all.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::super::database::{
    owner_index_key, owner_index_range, Database, OWNER_RECEIPTS, RECEIPTS,
};
use super::super::{StorageError, StorageResult};

/// A single purchased line on a receipt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReceiptItem {
    /// Unique item identifier (UUID)
    pub id: String,
    /// Item name, possibly assembled from several OCR lines
    pub item: String,
    /// Price per unit; null when extraction could not determine it
    pub price: Option<f64>,
    /// Quantity
    pub qty: i64,
}

impl ReceiptItem {
    pub fn new(item: String, price: Option<f64>, qty: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            item,
            price,
            qty,
        }
    }
}

/// A tax, discount or service charge attached to a receipt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Modifier {
    /// Unique modifier identifier (UUID)
    pub id: String,
    /// Free-text label, e.g. "Tax", "Discount", "Service Charge"
    #[serde(rename = "type")]
    pub kind: String,
    /// Absolute amount
    pub value: Option<f64>,
    /// Set only when the modifier is a fraction of the order total
    pub percentage: Option<f64>,
    /// Whether clients should count this modifier toward the total
    pub include: bool,
}

impl Modifier {
    pub fn new(kind: String, value: Option<f64>, percentage: Option<f64>, include: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            value,
            percentage,
            include,
        }
    }
}

/// A stored receipt with its items and modifiers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Receipt {
    /// Unique receipt identifier (UUID)
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Display name (usually the store name)
    pub name: String,
    /// Free-text reason for the expense
    pub reason: String,
    /// External payment account (Monzo) id
    pub monzo_id: Option<String>,
    pub items: Vec<ReceiptItem>,
    pub modifiers: Vec<Modifier>,
    pub created_at: DateTime<Utc>,
}

/// Repository for receipt operations.
pub struct ReceiptRepository<'a> {
    db: &'a Database,
}

impl<'a> ReceiptRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Persist a receipt and its owner index entry atomically.
    pub fn create(&self, receipt: &Receipt) -> StorageResult<()> {
        let json = serde_json::to_vec(receipt)?;
        let index_key = owner_index_key(
            &receipt.user_id,
            receipt.created_at.timestamp_millis(),
            &receipt.id,
        );

        let write_txn = self.db.redb().begin_write()?;
        {
            let mut receipts = write_txn.open_table(RECEIPTS)?;
            receipts.insert(receipt.id.as_str(), json.as_slice())?;

            let mut index = write_txn.open_table(OWNER_RECEIPTS)?;
            index.insert(index_key.as_str(), receipt.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a receipt by id, regardless of owner.
    pub fn get(&self, receipt_id: &str) -> StorageResult<Receipt> {
        let read_txn = self.db.redb().begin_read()?;
        let receipts = read_txn.open_table(RECEIPTS)?;
        match receipts.get(receipt_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StorageError::NotFound(format!("Receipt {receipt_id}"))),
        }
    }

    /// List all receipts owned by a user, in index order.
    pub fn list_by_owner(&self, owner_user_id: &str) -> StorageResult<Vec<Receipt>> {
        let read_txn = self.db.redb().begin_read()?;
        let index = read_txn.open_table(OWNER_RECEIPTS)?;
        let receipts = read_txn.open_table(RECEIPTS)?;

        let (start, end) = owner_index_range(owner_user_id);
        let mut result = Vec::new();
        for entry in index.range(start.as_str()..end.as_str())? {
            let (_, receipt_id) = entry?;
            match receipts.get(receipt_id.value())? {
                Some(value) => result.push(serde_json::from_slice(value.value())?),
                None => tracing::warn!(
                    receipt_id = %receipt_id.value(),
                    "Owner index points at a missing receipt"
                ),
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn test_receipt(owner: &str) -> Receipt {
        Receipt {
            id: Uuid::new_v4().to_string(),
            user_id: owner.to_string(),
            name: "Tesco".to_string(),
            reason: "Groceries".to_string(),
            monzo_id: None,
            items: vec![ReceiptItem::new("Milk".to_string(), Some(1.5), 2)],
            modifiers: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_get_receipt() {
        let (db, _dir) = temp_db();
        let repo = ReceiptRepository::new(&db);

        let receipt = test_receipt("user-a");
        repo.create(&receipt).unwrap();

        let loaded = repo.get(&receipt.id).unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].item, "Milk");
        assert_eq!(loaded.items[0].price, Some(1.5));
        assert_eq!(loaded.items[0].qty, 2);
        assert!(loaded.modifiers.is_empty());
        assert_eq!(loaded, receipt);
    }

    #[test]
    fn get_missing_receipt_is_not_found() {
        let (db, _dir) = temp_db();
        let repo = ReceiptRepository::new(&db);
        assert!(matches!(repo.get("missing"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn list_by_owner_filters_other_users() {
        let (db, _dir) = temp_db();
        let repo = ReceiptRepository::new(&db);

        let a1 = test_receipt("user-a");
        let a2 = test_receipt("user-a");
        let b1 = test_receipt("user-b");
        for r in [&a1, &a2, &b1] {
            repo.create(r).unwrap();
        }

        let listed = repo.list_by_owner("user-a").unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|r| r.user_id == "user-a"));
        assert!(!listed.iter().any(|r| r.id == b1.id));
    }

    #[test]
    fn list_by_owner_does_not_match_id_prefixes() {
        let (db, _dir) = temp_db();
        let repo = ReceiptRepository::new(&db);

        repo.create(&test_receipt("user-1")).unwrap();
        repo.create(&test_receipt("user-10")).unwrap();

        assert_eq!(repo.list_by_owner("user-1").unwrap().len(), 1);
        assert_eq!(repo.list_by_owner("user-10").unwrap().len(), 1);
    }

    #[test]
    fn list_by_owner_is_oldest_first() {
        let (db, _dir) = temp_db();
        let repo = ReceiptRepository::new(&db);

        let mut newer = test_receipt("user-a");
        let mut older = test_receipt("user-a");
        older.created_at = newer.created_at - Duration::seconds(60);
        newer.name = "newer".to_string();
        older.name = "older".to_string();
        repo.create(&newer).unwrap();
        repo.create(&older).unwrap();

        let names: Vec<_> = repo
            .list_by_owner("user-a")
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["older", "newer"]);
    }

    #[test]
    fn negative_values_are_stored_as_is() {
        let (db, _dir) = temp_db();
        let repo = ReceiptRepository::new(&db);

        let mut receipt = test_receipt("user-a");
        receipt.items = vec![ReceiptItem::new("Refund".to_string(), Some(-3.0), -1)];
        receipt.modifiers = vec![Modifier::new("Discount".to_string(), Some(-2.0), None, true)];
        repo.create(&receipt).unwrap();

        let loaded = repo.get(&receipt.id).unwrap();
        assert_eq!(loaded.items[0].price, Some(-3.0));
        assert_eq!(loaded.items[0].qty, -1);
        assert_eq!(loaded.modifiers[0].value, Some(-2.0));
    }

    #[test]
    fn modifier_serializes_kind_as_type() {
        let modifier = Modifier::new("Tax".to_string(), Some(1.2), Some(20.0), false);
        let json = serde_json::to_value(&modifier).unwrap();
        assert_eq!(json["type"], "Tax");
        assert_eq!(json["percentage"], 20.0);
        assert_eq!(json["include"], false);
    }

    #[test]
    fn deleting_owner_cascades_to_receipts() {
        use super::super::users::{StoredUser, UserRepository};

        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);
        users
            .create(&StoredUser {
                id: "user-a".to_string(),
                name: "Alice".to_string(),
                email: "a@x.com".to_string(),
                password_hash: "hash".to_string(),
                monzo_id: None,
                created_at: Utc::now(),
            })
            .unwrap();

        let repo = ReceiptRepository::new(&db);
        let mine = test_receipt("user-a");
        let theirs = test_receipt("user-b");
        repo.create(&mine).unwrap();
        repo.create(&theirs).unwrap();

        users.delete("user-a").unwrap();

        assert!(matches!(repo.get(&mine.id), Err(StorageError::NotFound(_))));
        assert!(repo.list_by_owner("user-a").unwrap().is_empty());
        assert!(repo.get(&theirs.id).is_ok());
    }
}
