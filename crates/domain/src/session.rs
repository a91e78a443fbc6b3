//! Session — the server-side record behind an opaque bearer token.
//!
//! Only a digest of the token secret is kept; the secret itself is handed to
//! the client once, at login or registration.

use serde::{Deserialize, Serialize};

use crate::id::{SessionId, UserId};
use crate::time::Timestamp;

/// A login session owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    /// Lowercase hex SHA-256 digest of the token secret.
    pub secret_hash: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl Session {
    /// Whether the session is no longer valid at `at`.
    #[must_use]
    pub fn is_expired(&self, at: Timestamp) -> bool {
        self.expires_at <= at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_at: Timestamp) -> Session {
        Session {
            id: SessionId::new(),
            user_id: UserId::new(),
            secret_hash: String::new(),
            created_at: crate::time::now(),
            expires_at,
        }
    }

    #[test]
    fn should_not_be_expired_before_deadline() {
        let now = crate::time::now();
        assert!(!session(now + Duration::hours(1)).is_expired(now));
    }

    #[test]
    fn should_be_expired_at_deadline() {
        let now = crate::time::now();
        assert!(session(now).is_expired(now));
    }
}
