use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::bot_admin::BotAdmin;
pub use repositories::key::{KeyRecord, KeyStock};
pub use repositories::operator::{Operator, OperatorRole};
pub use repositories::premium_user::PremiumUser;
pub use repositories::product::ProductRecord;
pub use repositories::seller::Seller;
pub use repositories::session::SessionRecord;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // An in-memory SQLite database lives inside one connection; a wider
        // pool would hand each request its own empty database.
        let (max_connections, min_connections) = if db_url.contains(":memory:") {
            (1, 1)
        } else {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn operator_repo(&self) -> repositories::operator::OperatorRepository {
        repositories::operator::OperatorRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn product_repo(&self) -> repositories::product::ProductRepository {
        repositories::product::ProductRepository::new(self.conn.clone())
    }

    fn key_repo(&self) -> repositories::key::KeyRepository {
        repositories::key::KeyRepository::new(self.conn.clone())
    }

    fn bot_admin_repo(&self) -> repositories::bot_admin::BotAdminRepository {
        repositories::bot_admin::BotAdminRepository::new(self.conn.clone())
    }

    fn premium_user_repo(&self) -> repositories::premium_user::PremiumUserRepository {
        repositories::premium_user::PremiumUserRepository::new(self.conn.clone())
    }

    fn seller_repo(&self) -> repositories::seller::SellerRepository {
        repositories::seller::SellerRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Operators (credential store)
    // ========================================================================

    pub async fn get_operator(&self, id: i32) -> Result<Option<Operator>> {
        self.operator_repo().get_by_id(id).await
    }

    pub async fn get_operator_by_username(&self, username: &str) -> Result<Option<Operator>> {
        self.operator_repo().get_by_username(username).await
    }

    pub async fn list_operators(&self) -> Result<Vec<Operator>> {
        self.operator_repo().list_all().await
    }

    pub async fn create_operator(
        &self,
        username: &str,
        password: &str,
        role: OperatorRole,
        security: &SecurityConfig,
    ) -> Result<Operator> {
        self.operator_repo()
            .create(username, password, role, security)
            .await
    }

    pub async fn delete_operator(&self, id: i32) -> Result<bool> {
        let deleted = self.operator_repo().delete(id).await?;
        if deleted {
            // Removing an operator invalidates every session they hold.
            self.session_repo().revoke_for_operator(id).await?;
        }
        Ok(deleted)
    }

    pub async fn verify_operator_password(&self, username: &str, password: &str) -> Result<bool> {
        self.operator_repo().verify_password(username, password).await
    }

    pub async fn update_operator_password(
        &self,
        username: &str,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.operator_repo()
            .update_password(username, new_password, security)
            .await
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    pub async fn issue_session(&self, operator_id: i32, ttl_minutes: u32) -> Result<SessionRecord> {
        self.session_repo().issue(operator_id, ttl_minutes).await
    }

    pub async fn find_session(&self, token: &str) -> Result<Option<SessionRecord>> {
        self.session_repo().find_by_token(token).await
    }

    pub async fn revoke_session(&self, token: &str) -> Result<()> {
        self.session_repo().revoke(token).await
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        self.session_repo().purge_expired().await
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    pub async fn create_product(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<ProductRecord> {
        self.product_repo().create(name, description).await
    }

    pub async fn get_product(&self, id: i32) -> Result<Option<ProductRecord>> {
        self.product_repo().get(id).await
    }

    pub async fn product_exists(&self, id: i32) -> Result<bool> {
        self.product_repo().exists(id).await
    }

    pub async fn list_products(&self) -> Result<Vec<ProductRecord>> {
        self.product_repo().list_all().await
    }

    pub async fn set_product_active(&self, id: i32, desired: bool) -> Result<Option<ProductRecord>> {
        self.product_repo().set_active(id, desired).await
    }

    pub async fn delete_product(&self, id: i32) -> Result<bool> {
        self.product_repo().delete_cascade(id).await
    }

    // ========================================================================
    // Key ledger
    // ========================================================================

    pub async fn list_keys(&self, product_id: Option<i32>) -> Result<Vec<KeyRecord>> {
        self.key_repo().list(product_id).await
    }

    pub async fn existing_key_values(&self, product_id: i32) -> Result<HashSet<String>> {
        self.key_repo().existing_values(product_id).await
    }

    pub async fn insert_key_batch(
        &self,
        product_id: i32,
        entries: &[(String, String)],
    ) -> Result<u64> {
        self.key_repo().insert_batch(product_id, entries).await
    }

    pub async fn claim_key(
        &self,
        product_id: i32,
        duration: Option<&str>,
    ) -> Result<Option<KeyRecord>> {
        self.key_repo().claim(product_id, duration).await
    }

    pub async fn delete_keys_by_ids(&self, key_ids: &[i32]) -> Result<u64> {
        self.key_repo().delete_by_ids(key_ids).await
    }

    pub async fn delete_all_keys(&self, product_id: i32) -> Result<u64> {
        self.key_repo().delete_all_for_product(product_id).await
    }

    pub async fn delete_claimed_keys(&self, product_id: i32) -> Result<u64> {
        self.key_repo().delete_claimed_for_product(product_id).await
    }

    pub async fn key_stock(&self, product_id: i32) -> Result<KeyStock> {
        self.key_repo().stock(product_id).await
    }

    // ========================================================================
    // Directory tables
    // ========================================================================

    pub async fn list_bot_admins(&self) -> Result<Vec<BotAdmin>> {
        self.bot_admin_repo().list_all().await
    }

    pub async fn get_bot_admin(&self, id: i32) -> Result<Option<BotAdmin>> {
        self.bot_admin_repo().get(id).await
    }

    pub async fn get_bot_admin_by_telegram_id(&self, telegram_id: i64) -> Result<Option<BotAdmin>> {
        self.bot_admin_repo().get_by_telegram_id(telegram_id).await
    }

    pub async fn add_bot_admin(
        &self,
        telegram_id: i64,
        username: Option<&str>,
    ) -> Result<BotAdmin> {
        self.bot_admin_repo().add(telegram_id, username, false).await
    }

    pub async fn remove_bot_admin(&self, id: i32) -> Result<bool> {
        self.bot_admin_repo().remove(id).await
    }

    pub async fn ensure_root_bot_admin(&self, telegram_id: i64) -> Result<()> {
        self.bot_admin_repo().ensure_root(telegram_id).await
    }

    pub async fn list_premium_users(&self) -> Result<Vec<PremiumUser>> {
        self.premium_user_repo().list_all().await
    }

    pub async fn get_premium_user_by_telegram_id(
        &self,
        telegram_id: i64,
    ) -> Result<Option<PremiumUser>> {
        self.premium_user_repo().get_by_telegram_id(telegram_id).await
    }

    pub async fn add_premium_user(
        &self,
        telegram_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> Result<PremiumUser> {
        self.premium_user_repo()
            .add(telegram_id, username, first_name)
            .await
    }

    pub async fn remove_premium_user(&self, id: i32) -> Result<bool> {
        self.premium_user_repo().remove(id).await
    }

    pub async fn remove_premium_users(&self, ids: &[i32]) -> Result<u64> {
        self.premium_user_repo().remove_many(ids).await
    }

    pub async fn list_sellers(&self) -> Result<Vec<Seller>> {
        self.seller_repo().list_all().await
    }

    pub async fn add_seller(
        &self,
        username: &str,
        name: Option<&str>,
        country: Option<&str>,
        platforms: Option<&str>,
    ) -> Result<Seller> {
        self.seller_repo().add(username, name, country, platforms).await
    }

    pub async fn set_seller_active(&self, id: i32, is_active: bool) -> Result<Option<Seller>> {
        self.seller_repo().set_active(id, is_active).await
    }

    pub async fn remove_seller(&self, id: i32) -> Result<bool> {
        self.seller_repo().remove(id).await
    }
}
