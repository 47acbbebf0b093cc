//! Domain service for operator sessions.
//!
//! Owns login, bearer-token validation, and revocation. Session rows are
//! written only here; validation is read-only and never extends expiry.

use thiserror::Error;

use crate::db::{Operator, SessionRecord};

/// Errors specific to session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account temporarily locked")]
    AccountLocked,

    #[error("Session expired")]
    ExpiredSession,

    #[error("Unknown session")]
    UnknownSession,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A freshly issued session together with its operator.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: SessionRecord,
    pub operator: Operator,
}

/// Domain service trait for sessions.
#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// Verifies credentials and issues a fresh fixed-TTL session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on a bad username or
    /// password, [`AuthError::AccountLocked`] while the lockout window for
    /// the username is active.
    async fn login(&self, username: &str, password: &str) -> Result<IssuedSession, AuthError>;

    /// Resolves a bearer token to its operator. Read-only: expiry is
    /// checked but never renewed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownSession`] for unrecognized tokens and
    /// [`AuthError::ExpiredSession`] past the validity window.
    async fn validate(&self, token: &str) -> Result<Operator, AuthError>;

    /// Revokes a token. Idempotent; revoking an already-invalid token is a
    /// no-op, not an error.
    async fn revoke(&self, token: &str) -> Result<(), AuthError>;
}
