use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::sessions;

/// A bearer session row. Owned exclusively by this repository; nothing
/// else writes session state.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: i32,
    pub token: String,
    pub operator_id: i32,
    pub issued_at: String,
    pub expires_at: String,
}

impl From<sessions::Model> for SessionRecord {
    fn from(model: sessions::Model) -> Self {
        Self {
            id: model.id,
            token: model.token,
            operator_id: model.operator_id,
            issued_at: model.issued_at,
            expires_at: model.expires_at,
        }
    }
}

impl SessionRecord {
    /// Whether the session is past its validity window at `now`.
    /// Unparseable timestamps count as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        DateTime::parse_from_rfc3339(&self.expires_at)
            .map_or(true, |expires| expires.with_timezone(&Utc) <= now)
    }
}

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Issue a new session with a fixed TTL. Validation never extends it.
    pub async fn issue(&self, operator_id: i32, ttl_minutes: u32) -> Result<SessionRecord> {
        let now = Utc::now();
        let expires = now + Duration::minutes(i64::from(ttl_minutes));

        let active = sessions::ActiveModel {
            token: Set(generate_token()),
            operator_id: Set(operator_id),
            issued_at: Set(now.to_rfc3339()),
            expires_at: Set(expires.to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert session")?;

        Ok(SessionRecord::from(model))
    }

    /// Read-only token lookup; expiry is checked by the caller so this
    /// query stays side-effect free.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<SessionRecord>> {
        let session = sessions::Entity::find()
            .filter(sessions::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query session by token")?;

        Ok(session.map(SessionRecord::from))
    }

    /// Idempotent: revoking an unknown or already-revoked token is a no-op.
    pub async fn revoke(&self, token: &str) -> Result<()> {
        sessions::Entity::delete_many()
            .filter(sessions::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to revoke session")?;

        Ok(())
    }

    /// Drop every session for one operator (used when an operator is removed).
    pub async fn revoke_for_operator(&self, operator_id: i32) -> Result<u64> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::OperatorId.eq(operator_id))
            .exec(&self.conn)
            .await
            .context("Failed to revoke operator sessions")?;

        Ok(result.rows_affected)
    }

    /// Hygiene sweep. Validation enforces expiry regardless, this just keeps
    /// the table from growing unbounded. RFC3339 UTC strings from the same
    /// generator compare lexicographically in timestamp order.
    pub async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now().to_rfc3339();

        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lte(now))
            .exec(&self.conn)
            .await
            .context("Failed to purge expired sessions")?;

        Ok(result.rows_affected)
    }
}

/// Generate a random session token (64 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
