use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::operators;

/// Panel operator role. Exactly one operator holds `Root` at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorRole {
    Root,
    Admin,
}

impl OperatorRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub const fn is_root(self) -> bool {
        matches!(self, Self::Root)
    }
}

impl fmt::Display for OperatorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "root" => Ok(Self::Root),
            "admin" => Ok(Self::Admin),
            other => Err(anyhow::anyhow!("Unknown operator role: {other}")),
        }
    }
}

/// Operator data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct Operator {
    pub id: i32,
    pub username: String,
    pub role: OperatorRole,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<operators::Model> for Operator {
    type Error = anyhow::Error;

    fn try_from(model: operators::Model) -> Result<Self> {
        Ok(Self {
            id: model.id,
            username: model.username,
            role: model.role.parse()?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

pub struct OperatorRepository {
    conn: DatabaseConnection,
}

impl OperatorRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Operator>> {
        let operator = operators::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query operator by id")?;

        operator.map(Operator::try_from).transpose()
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Operator>> {
        let operator = operators::Entity::find()
            .filter(operators::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query operator by username")?;

        operator.map(Operator::try_from).transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<Operator>> {
        let rows = operators::Entity::find()
            .order_by_asc(operators::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list operators")?;

        rows.into_iter().map(Operator::try_from).collect()
    }

    /// Create an operator. Creating a second root is refused so the
    /// sole-root invariant holds even for non-HTTP callers.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: OperatorRole,
        config: &SecurityConfig,
    ) -> Result<Operator> {
        if role.is_root() {
            let existing_root = operators::Entity::find()
                .filter(operators::Column::Role.eq(OperatorRole::Root.as_str()))
                .one(&self.conn)
                .await?;
            if existing_root.is_some() {
                anyhow::bail!("A root operator already exists");
            }
        }

        if self.get_by_username(username).await?.is_some() {
            anyhow::bail!("Operator '{username}' already exists");
        }

        let password = password.to_string();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = operators::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            role: Set(role.as_str().to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        Operator::try_from(model)
    }

    /// Delete an operator by id. The root operator is immutable; callers
    /// are expected to check the role first and surface `Forbidden`, this
    /// is the storage-level backstop.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let Some(existing) = operators::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(false);
        };

        if existing.role == OperatorRole::Root.as_str() {
            anyhow::bail!("The root operator cannot be deleted");
        }

        let result = operators::Entity::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Verify password for an operator.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let operator = operators::Entity::find()
            .filter(operators::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query operator for password verification")?;

        let Some(operator) = operator else {
            // Burn a comparable amount of work for unknown usernames so the
            // response time does not reveal which usernames exist.
            let password = password.to_string();
            let _ = task::spawn_blocking(move || {
                let salt = SaltString::generate(&mut OsRng);
                let _ = Argon2::default().hash_password(password.as_bytes(), &salt);
            })
            .await;
            return Ok(false);
        };

        let password_hash = operator.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Update password for an operator (hashes the new password)
    pub async fn update_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let operator = operators::Entity::find()
            .filter(operators::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query operator for password update")?
            .ok_or_else(|| anyhow::anyhow!("Operator not found: {username}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: operators::ActiveModel = operator.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
