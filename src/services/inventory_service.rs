//! Domain service for the key ledger.
//!
//! Bulk import with per-line rejection, exactly-once claim, and the bulk
//! delete variants. All counts exposed from here are derived from row
//! state at query time.

use thiserror::Error;

use crate::db::KeyRecord;
use crate::parser::RejectedLine;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Product {0} not found")]
    UnknownProduct(i32),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for InventoryError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for InventoryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Outcome of a bulk import: how many rows landed, and every line that did
/// not, verbatim, with its reason. Partial success is the default policy.
#[derive(Debug)]
pub struct BulkInsertOutcome {
    pub inserted_count: u64,
    pub rejected_lines: Vec<RejectedLine>,
}

/// Domain service trait for the key ledger.
#[async_trait::async_trait]
pub trait InventoryService: Send + Sync {
    /// Lists keys, optionally restricted to one product.
    async fn list_keys(&self, product_id: Option<i32>) -> Result<Vec<KeyRecord>, InventoryError>;

    /// Parses and imports `<duration> <value>` lines for a product.
    /// Malformed and duplicate lines are rejected individually; they never
    /// abort the batch.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::UnknownProduct`] before inserting anything
    /// if the product does not exist.
    async fn bulk_insert(
        &self,
        product_id: i32,
        raw_lines: &str,
    ) -> Result<BulkInsertOutcome, InventoryError>;

    /// Atomically claims one available key. `None` when the product has no
    /// available key (or does not exist) — exhaustion is a normal outcome,
    /// not an error. At most one caller ever receives a given key.
    async fn claim(
        &self,
        product_id: i32,
        duration: Option<&str>,
    ) -> Result<Option<KeyRecord>, InventoryError>;

    /// Deletes keys by id; unknown ids are skipped. Returns rows removed.
    async fn bulk_delete(&self, key_ids: &[i32]) -> Result<u64, InventoryError>;

    /// Deletes every key of a product. Returns rows removed.
    async fn delete_all_for_product(&self, product_id: i32) -> Result<u64, InventoryError>;

    /// Deletes exactly the keys claimed at the instant of execution.
    async fn delete_claimed_for_product(&self, product_id: i32) -> Result<u64, InventoryError>;
}
