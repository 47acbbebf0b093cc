//! `SeaORM` implementation of the `SessionService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::config::{AuthThrottleConfig, SessionConfig};
use crate::db::{Operator, Store};
use crate::services::session_service::{AuthError, IssuedSession, SessionService};
use crate::services::throttle::LoginThrottle;

pub struct SeaOrmSessionService {
    store: Store,
    session_config: SessionConfig,
    throttle: LoginThrottle,
}

impl SeaOrmSessionService {
    #[must_use]
    pub fn new(
        store: Store,
        session_config: SessionConfig,
        throttle_config: AuthThrottleConfig,
    ) -> Self {
        Self {
            store,
            session_config,
            throttle: LoginThrottle::new(throttle_config),
        }
    }
}

#[async_trait]
impl SessionService for SeaOrmSessionService {
    async fn login(&self, username: &str, password: &str) -> Result<IssuedSession, AuthError> {
        if self.throttle.is_locked(username) {
            warn!("Login rejected, account locked: {username}");
            return Err(AuthError::AccountLocked);
        }

        let is_valid = self
            .store
            .verify_operator_password(username, password)
            .await?;

        if !is_valid {
            self.throttle.record_failure(username);
            return Err(AuthError::InvalidCredentials);
        }

        self.throttle.record_success(username);

        let operator = self
            .store
            .get_operator_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let session = self
            .store
            .issue_session(operator.id, self.session_config.ttl_minutes)
            .await?;

        info!("Session issued for operator {}", operator.username);

        Ok(IssuedSession { session, operator })
    }

    async fn validate(&self, token: &str) -> Result<Operator, AuthError> {
        let session = self
            .store
            .find_session(token)
            .await?
            .ok_or(AuthError::UnknownSession)?;

        if session.is_expired_at(Utc::now()) {
            return Err(AuthError::ExpiredSession);
        }

        self.store
            .get_operator(session.operator_id)
            .await?
            .ok_or(AuthError::UnknownSession)
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.store.revoke_session(token).await?;
        Ok(())
    }
}
