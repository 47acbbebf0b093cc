use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

use crate::entities::bot_admins;

#[derive(Debug, Clone)]
pub struct BotAdmin {
    pub id: i32,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub is_root: bool,
    pub created_at: String,
}

impl From<bot_admins::Model> for BotAdmin {
    fn from(model: bot_admins::Model) -> Self {
        Self {
            id: model.id,
            telegram_id: model.telegram_id,
            username: model.username,
            is_root: model.is_root,
            created_at: model.created_at,
        }
    }
}

pub struct BotAdminRepository {
    conn: DatabaseConnection,
}

impl BotAdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_all(&self) -> Result<Vec<BotAdmin>> {
        let rows = bot_admins::Entity::find()
            .order_by_desc(bot_admins::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list bot admins")?;

        Ok(rows.into_iter().map(BotAdmin::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<BotAdmin>> {
        let row = bot_admins::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query bot admin")?;

        Ok(row.map(BotAdmin::from))
    }

    pub async fn get_by_telegram_id(&self, telegram_id: i64) -> Result<Option<BotAdmin>> {
        let row = bot_admins::Entity::find()
            .filter(bot_admins::Column::TelegramId.eq(telegram_id))
            .one(&self.conn)
            .await
            .context("Failed to query bot admin by telegram id")?;

        Ok(row.map(BotAdmin::from))
    }

    pub async fn add(
        &self,
        telegram_id: i64,
        username: Option<&str>,
        is_root: bool,
    ) -> Result<BotAdmin> {
        let active = bot_admins::ActiveModel {
            telegram_id: Set(telegram_id),
            username: Set(username.map(str::to_string)),
            is_root: Set(is_root),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert bot admin")?;

        info!("Bot admin added: {}", model.telegram_id);
        Ok(BotAdmin::from(model))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = bot_admins::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete bot admin")?;

        Ok(result.rows_affected > 0)
    }

    /// Provision the distinguished root admin row if it is missing.
    pub async fn ensure_root(&self, telegram_id: i64) -> Result<()> {
        if self.get_by_telegram_id(telegram_id).await?.is_none() {
            self.add(telegram_id, None, true).await?;
            info!("Root bot admin initialized: {telegram_id}");
        }
        Ok(())
    }
}
