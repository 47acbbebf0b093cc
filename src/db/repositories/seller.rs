use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

use crate::entities::trusted_sellers;

#[derive(Debug, Clone)]
pub struct Seller {
    pub id: i32,
    pub username: String,
    pub name: Option<String>,
    pub country: Option<String>,
    pub platforms: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<trusted_sellers::Model> for Seller {
    fn from(model: trusted_sellers::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            name: model.name,
            country: model.country,
            platforms: model.platforms,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

pub struct SellerRepository {
    conn: DatabaseConnection,
}

impl SellerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_all(&self) -> Result<Vec<Seller>> {
        let rows = trusted_sellers::Entity::find()
            .order_by_desc(trusted_sellers::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list sellers")?;

        Ok(rows.into_iter().map(Seller::from).collect())
    }

    pub async fn add(
        &self,
        username: &str,
        name: Option<&str>,
        country: Option<&str>,
        platforms: Option<&str>,
    ) -> Result<Seller> {
        let active = trusted_sellers::ActiveModel {
            username: Set(username.to_string()),
            name: Set(name.map(str::to_string)),
            country: Set(country.map(str::to_string)),
            platforms: Set(platforms.map(str::to_string)),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert seller")?;

        info!("Seller added: {}", model.username);
        Ok(Seller::from(model))
    }

    pub async fn set_active(&self, id: i32, is_active: bool) -> Result<Option<Seller>> {
        let result = trusted_sellers::Entity::update_many()
            .col_expr(
                trusted_sellers::Column::IsActive,
                sea_orm::sea_query::Expr::value(is_active),
            )
            .filter(trusted_sellers::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to toggle seller")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        let row = trusted_sellers::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to reload seller")?;

        Ok(row.map(Seller::from))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = trusted_sellers::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete seller")?;

        Ok(result.rows_affected > 0)
    }
}
