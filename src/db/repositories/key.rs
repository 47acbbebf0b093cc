use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::entities::product_keys;

#[derive(Debug, Clone)]
pub struct KeyRecord {
    pub id: i32,
    pub product_id: i32,
    pub key_value: String,
    pub duration: String,
    pub is_claimed: bool,
    pub created_at: String,
}

impl From<product_keys::Model> for KeyRecord {
    fn from(model: product_keys::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            key_value: model.key_value,
            duration: model.duration,
            is_claimed: model.is_claimed,
            created_at: model.created_at,
        }
    }
}

/// Per-product stock, derived from the ledger at query time. There is no
/// stored counter anywhere that could drift from the row state.
#[derive(Debug, Clone, Copy)]
pub struct KeyStock {
    pub available: u64,
    pub used: u64,
}

pub struct KeyRepository {
    conn: DatabaseConnection,
}

impl KeyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, product_id: Option<i32>) -> Result<Vec<KeyRecord>> {
        let mut query = product_keys::Entity::find();
        if let Some(pid) = product_id {
            query = query.filter(product_keys::Column::ProductId.eq(pid));
        }

        let rows = query
            .order_by_desc(product_keys::Column::CreatedAt)
            .order_by_desc(product_keys::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list keys")?;

        Ok(rows.into_iter().map(KeyRecord::from).collect())
    }

    /// Key values already present for a product, for duplicate rejection
    /// during bulk import.
    pub async fn existing_values(&self, product_id: i32) -> Result<HashSet<String>> {
        let values: Vec<String> = product_keys::Entity::find()
            .select_only()
            .column(product_keys::Column::KeyValue)
            .filter(product_keys::Column::ProductId.eq(product_id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to load existing key values")?;

        Ok(values.into_iter().collect())
    }

    /// Insert pre-validated (duration, value) pairs for one product. The
    /// caller has already rejected duplicates against the batch and the
    /// stored ledger; the unique (product_id, key_value) index backstops
    /// whatever slips through a concurrent import.
    pub async fn insert_batch(
        &self,
        product_id: i32,
        entries: &[(String, String)],
    ) -> Result<u64> {
        if entries.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now().to_rfc3339();

        let models = entries.iter().map(|(duration, value)| product_keys::ActiveModel {
            product_id: Set(product_id),
            key_value: Set(value.clone()),
            duration: Set(duration.clone()),
            is_claimed: Set(false),
            created_at: Set(now.clone()),
            ..Default::default()
        });

        product_keys::Entity::insert_many(models)
            .exec(&self.conn)
            .await
            .context("Failed to insert key batch")?;

        info!("Inserted {} keys for product {}", entries.len(), product_id);
        Ok(entries.len() as u64)
    }

    /// Atomically claim one available key for a product.
    ///
    /// A "read then mark" pair would let two callers hand out the same key,
    /// so the mark is a single conditional UPDATE keyed on the unclaimed
    /// state; `rows_affected` arbitrates the winner. A loser retries with
    /// the next candidate until the product is exhausted.
    pub async fn claim(
        &self,
        product_id: i32,
        duration: Option<&str>,
    ) -> Result<Option<KeyRecord>> {
        loop {
            let mut query = product_keys::Entity::find()
                .filter(product_keys::Column::ProductId.eq(product_id))
                .filter(product_keys::Column::IsClaimed.eq(false));

            if let Some(d) = duration {
                query = query.filter(product_keys::Column::Duration.eq(d));
            }

            let Some(candidate) = query
                .order_by_asc(product_keys::Column::Id)
                .one(&self.conn)
                .await
                .context("Failed to select claim candidate")?
            else {
                return Ok(None);
            };

            let result = product_keys::Entity::update_many()
                .col_expr(
                    product_keys::Column::IsClaimed,
                    sea_orm::sea_query::Expr::value(true),
                )
                .filter(product_keys::Column::Id.eq(candidate.id))
                .filter(product_keys::Column::IsClaimed.eq(false))
                .exec(&self.conn)
                .await
                .context("Failed to mark key claimed")?;

            if result.rows_affected == 1 {
                let mut claimed = KeyRecord::from(candidate);
                claimed.is_claimed = true;
                return Ok(Some(claimed));
            }

            // Another caller (or a concurrent delete) won this row.
            debug!(
                "Claim contention on key {} for product {}, retrying",
                candidate.id, product_id
            );
        }
    }

    /// Delete by explicit id set. Unknown ids are skipped; deletion is
    /// idempotent by nature.
    pub async fn delete_by_ids(&self, key_ids: &[i32]) -> Result<u64> {
        if key_ids.is_empty() {
            return Ok(0);
        }

        let result = product_keys::Entity::delete_many()
            .filter(product_keys::Column::Id.is_in(key_ids.iter().copied()))
            .exec(&self.conn)
            .await
            .context("Failed to bulk-delete keys")?;

        Ok(result.rows_affected)
    }

    pub async fn delete_all_for_product(&self, product_id: i32) -> Result<u64> {
        let result = product_keys::Entity::delete_many()
            .filter(product_keys::Column::ProductId.eq(product_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete keys for product")?;

        info!(
            "Deleted all keys for product {}: {} keys",
            product_id, result.rows_affected
        );
        Ok(result.rows_affected)
    }

    /// Single conditional DELETE: removes exactly the rows whose claimed
    /// flag is set at execution time. A key being claimed concurrently is
    /// either marked before the delete sees it (and is removed) or after
    /// (and survives); there is no interleaving that loses a row, because
    /// both sides are one conditional statement on the same flag.
    pub async fn delete_claimed_for_product(&self, product_id: i32) -> Result<u64> {
        let result = product_keys::Entity::delete_many()
            .filter(product_keys::Column::ProductId.eq(product_id))
            .filter(product_keys::Column::IsClaimed.eq(true))
            .exec(&self.conn)
            .await
            .context("Failed to delete claimed keys")?;

        info!(
            "Deleted claimed keys for product {}: {} keys",
            product_id, result.rows_affected
        );
        Ok(result.rows_affected)
    }

    /// Derived counts, never a stored counter.
    pub async fn stock(&self, product_id: i32) -> Result<KeyStock> {
        let available = product_keys::Entity::find()
            .filter(product_keys::Column::ProductId.eq(product_id))
            .filter(product_keys::Column::IsClaimed.eq(false))
            .count(&self.conn)
            .await
            .context("Failed to count available keys")?;

        let used = product_keys::Entity::find()
            .filter(product_keys::Column::ProductId.eq(product_id))
            .filter(product_keys::Column::IsClaimed.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count used keys")?;

        Ok(KeyStock { available, used })
    }
}
