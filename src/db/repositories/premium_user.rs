use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

use crate::entities::premium_users;

#[derive(Debug, Clone)]
pub struct PremiumUser {
    pub id: i32,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub created_at: String,
}

impl From<premium_users::Model> for PremiumUser {
    fn from(model: premium_users::Model) -> Self {
        Self {
            id: model.id,
            telegram_id: model.telegram_id,
            username: model.username,
            first_name: model.first_name,
            created_at: model.created_at,
        }
    }
}

pub struct PremiumUserRepository {
    conn: DatabaseConnection,
}

impl PremiumUserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_all(&self) -> Result<Vec<PremiumUser>> {
        let rows = premium_users::Entity::find()
            .order_by_desc(premium_users::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list premium users")?;

        Ok(rows.into_iter().map(PremiumUser::from).collect())
    }

    pub async fn get_by_telegram_id(&self, telegram_id: i64) -> Result<Option<PremiumUser>> {
        let row = premium_users::Entity::find()
            .filter(premium_users::Column::TelegramId.eq(telegram_id))
            .one(&self.conn)
            .await
            .context("Failed to query premium user")?;

        Ok(row.map(PremiumUser::from))
    }

    pub async fn add(
        &self,
        telegram_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> Result<PremiumUser> {
        let active = premium_users::ActiveModel {
            telegram_id: Set(telegram_id),
            username: Set(username.map(str::to_string)),
            first_name: Set(first_name.map(str::to_string)),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert premium user")?;

        info!("Premium user added: {}", model.telegram_id);
        Ok(PremiumUser::from(model))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = premium_users::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete premium user")?;

        Ok(result.rows_affected > 0)
    }

    /// Idempotent removal by id set; unknown ids are skipped.
    pub async fn remove_many(&self, ids: &[i32]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = premium_users::Entity::delete_many()
            .filter(premium_users::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.conn)
            .await
            .context("Failed to bulk-delete premium users")?;

        Ok(result.rows_affected)
    }
}
