//! In-memory failed-login tracking.
//!
//! Counts failures per username inside a rolling window and locks the
//! account out once the limit is hit. Advisory hygiene only: state lives in
//! the process and resets on restart.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::AuthThrottleConfig;

#[derive(Debug, Default)]
struct AttemptState {
    failures: Vec<DateTime<Utc>>,
    locked_until: Option<DateTime<Utc>>,
}

pub struct LoginThrottle {
    config: AuthThrottleConfig,
    attempts: Mutex<HashMap<String, AttemptState>>,
}

impl LoginThrottle {
    #[must_use]
    pub fn new(config: AuthThrottleConfig) -> Self {
        Self {
            config,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the username is currently locked out.
    pub fn is_locked(&self, username: &str) -> bool {
        let mut attempts = self.attempts.lock().expect("throttle lock poisoned");

        let Some(state) = attempts.get_mut(username) else {
            return false;
        };

        match state.locked_until {
            Some(until) if Utc::now() < until => true,
            Some(_) => {
                state.locked_until = None;
                state.failures.clear();
                false
            }
            None => false,
        }
    }

    /// Record a failed attempt; starts the lockout once the window fills.
    pub fn record_failure(&self, username: &str) {
        let now = Utc::now();
        let window = Duration::seconds(self.config.window_seconds as i64);

        let mut attempts = self.attempts.lock().expect("throttle lock poisoned");
        let state = attempts.entry(username.to_string()).or_default();

        state.failures.retain(|t| now - *t < window);
        state.failures.push(now);

        if state.failures.len() as u32 >= self.config.max_attempts {
            state.locked_until =
                Some(now + Duration::seconds(self.config.lockout_seconds as i64));
        }
    }

    /// A successful login clears the username's failure history.
    pub fn record_success(&self, username: &str) {
        let mut attempts = self.attempts.lock().expect("throttle lock poisoned");
        attempts.remove(username);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle(max_attempts: u32) -> LoginThrottle {
        LoginThrottle::new(AuthThrottleConfig {
            max_attempts,
            window_seconds: 300,
            lockout_seconds: 120,
        })
    }

    #[test]
    fn test_locks_after_max_attempts() {
        let t = throttle(3);
        assert!(!t.is_locked("alice"));

        t.record_failure("alice");
        t.record_failure("alice");
        assert!(!t.is_locked("alice"));

        t.record_failure("alice");
        assert!(t.is_locked("alice"));

        // Other usernames are unaffected
        assert!(!t.is_locked("bob"));
    }

    #[test]
    fn test_success_clears_history() {
        let t = throttle(3);
        t.record_failure("alice");
        t.record_failure("alice");
        t.record_success("alice");

        t.record_failure("alice");
        t.record_failure("alice");
        assert!(!t.is_locked("alice"));
    }
}
