use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

use crate::entities::{product_keys, products};

#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<products::Model> for ProductRecord {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, name: &str, description: Option<&str>) -> Result<ProductRecord> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = products::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description.map(str::to_string)),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert product")?;

        info!("Product created: {} (id {})", model.name, model.id);
        Ok(ProductRecord::from(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<ProductRecord>> {
        let product = products::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query product")?;

        Ok(product.map(ProductRecord::from))
    }

    pub async fn exists(&self, id: i32) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    pub async fn list_all(&self) -> Result<Vec<ProductRecord>> {
        let rows = products::Entity::find()
            .order_by_desc(products::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list products")?;

        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }

    /// Idempotent activation toggle; setting the current state is a
    /// success. Returns the product as stored afterwards, None if unknown.
    pub async fn set_active(&self, id: i32, desired: bool) -> Result<Option<ProductRecord>> {
        let result = products::Entity::update_many()
            .col_expr(
                products::Column::IsActive,
                sea_orm::sea_query::Expr::value(desired),
            )
            .col_expr(
                products::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(products::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to toggle product")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get(id).await
    }

    /// Delete a product and all of its keys in one transaction, so no key
    /// ever references a missing product, even transiently.
    pub async fn delete_cascade(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let removed_keys = product_keys::Entity::delete_many()
            .filter(product_keys::Column::ProductId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete product keys")?;

        let removed = products::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete product")?;

        txn.commit().await.context("Failed to commit product delete")?;

        if removed.rows_affected > 0 {
            info!(
                "Product {} deleted with {} keys",
                id, removed_keys.rows_affected
            );
        }

        Ok(removed.rows_affected > 0)
    }
}
