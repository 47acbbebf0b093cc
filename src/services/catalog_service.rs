//! Domain service for the product catalog.

use thiserror::Error;

use crate::db::ProductRecord;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product name must not be empty")]
    InvalidName,

    #[error("Product {0} not found")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A product together with its derived key stock. The counts are computed
/// from the ledger per request; they are never stored.
#[derive(Debug, Clone)]
pub struct ProductWithStock {
    pub product: ProductRecord,
    pub available_keys: u64,
    pub used_keys: u64,
}

/// Domain service trait for the catalog.
#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Creates a product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidName`] for an empty or
    /// whitespace-only name.
    async fn create_product(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<ProductRecord, CatalogError>;

    /// Lists all products with their derived stock counts.
    async fn list_products(&self) -> Result<Vec<ProductWithStock>, CatalogError>;

    /// Sets the activation flag. Idempotent: setting the current state is a
    /// no-op success.
    async fn toggle_active(&self, id: i32, desired: bool) -> Result<ProductRecord, CatalogError>;

    /// Deletes the product and every key that references it, atomically.
    async fn delete_product(&self, id: i32) -> Result<(), CatalogError>;
}
