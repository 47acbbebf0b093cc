//! `SeaORM` implementation of the `CatalogService` trait.

use async_trait::async_trait;

use crate::db::{ProductRecord, Store};
use crate::services::catalog_service::{CatalogError, CatalogService, ProductWithStock};

pub struct SeaOrmCatalogService {
    store: Store,
}

impl SeaOrmCatalogService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CatalogService for SeaOrmCatalogService {
    async fn create_product(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<ProductRecord, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidName);
        }

        let description = description.map(str::trim).filter(|d| !d.is_empty());

        let product = self.store.create_product(name, description).await?;
        Ok(product)
    }

    async fn list_products(&self) -> Result<Vec<ProductWithStock>, CatalogError> {
        let products = self.store.list_products().await?;

        let mut out = Vec::with_capacity(products.len());
        for product in products {
            let stock = self.store.key_stock(product.id).await?;
            out.push(ProductWithStock {
                product,
                available_keys: stock.available,
                used_keys: stock.used,
            });
        }

        Ok(out)
    }

    async fn toggle_active(&self, id: i32, desired: bool) -> Result<ProductRecord, CatalogError> {
        self.store
            .set_product_active(id, desired)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    async fn delete_product(&self, id: i32) -> Result<(), CatalogError> {
        if self.store.delete_product(id).await? {
            Ok(())
        } else {
            Err(CatalogError::NotFound(id))
        }
    }
}
