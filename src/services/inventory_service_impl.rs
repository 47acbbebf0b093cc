//! `SeaORM` implementation of the `InventoryService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{KeyRecord, Store};
use crate::parser::parse_bulk_lines;
use crate::services::inventory_service::{BulkInsertOutcome, InventoryError, InventoryService};

pub struct SeaOrmInventoryService {
    store: Store,
}

impl SeaOrmInventoryService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl InventoryService for SeaOrmInventoryService {
    async fn list_keys(&self, product_id: Option<i32>) -> Result<Vec<KeyRecord>, InventoryError> {
        Ok(self.store.list_keys(product_id).await?)
    }

    async fn bulk_insert(
        &self,
        product_id: i32,
        raw_lines: &str,
    ) -> Result<BulkInsertOutcome, InventoryError> {
        // Referential integrity is enforced here, before any row lands
        if !self.store.product_exists(product_id).await? {
            return Err(InventoryError::UnknownProduct(product_id));
        }

        let existing = self.store.existing_key_values(product_id).await?;
        let batch = parse_bulk_lines(raw_lines, &existing);

        let entries: Vec<(String, String)> = batch
            .accepted
            .iter()
            .map(|line| (line.duration.clone(), line.key_value.clone()))
            .collect();

        let inserted_count = self.store.insert_key_batch(product_id, &entries).await?;

        info!(
            "Bulk import for product {}: {} inserted, {} rejected",
            product_id,
            inserted_count,
            batch.rejected.len()
        );

        Ok(BulkInsertOutcome {
            inserted_count,
            rejected_lines: batch.rejected,
        })
    }

    async fn claim(
        &self,
        product_id: i32,
        duration: Option<&str>,
    ) -> Result<Option<KeyRecord>, InventoryError> {
        Ok(self.store.claim_key(product_id, duration).await?)
    }

    async fn bulk_delete(&self, key_ids: &[i32]) -> Result<u64, InventoryError> {
        Ok(self.store.delete_keys_by_ids(key_ids).await?)
    }

    async fn delete_all_for_product(&self, product_id: i32) -> Result<u64, InventoryError> {
        Ok(self.store.delete_all_keys(product_id).await?)
    }

    async fn delete_claimed_for_product(&self, product_id: i32) -> Result<u64, InventoryError> {
        Ok(self.store.delete_claimed_keys(product_id).await?)
    }
}
