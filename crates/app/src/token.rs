//! Opaque bearer tokens backed by server-side sessions.
//!
//! A token reads `<session-id>.<secret>`. The secret is 256 random bits,
//! base64url-encoded without padding. Only its SHA-256 digest is stored, and
//! the digest is compared in constant time.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use bandstand_domain::error::AuthError;
use bandstand_domain::id::{SessionId, UserId};
use bandstand_domain::session::Session;
use bandstand_domain::time::Timestamp;

const SECRET_LEN: usize = 32;

/// A parsed or freshly generated bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    session_id: SessionId,
    secret: String,
}

impl SessionToken {
    /// Generate a token for a new session.
    #[must_use]
    pub fn generate() -> Self {
        use rand::RngCore;

        let mut bytes = [0u8; SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            session_id: SessionId::new(),
            secret: URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    /// Parse the wire form of a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedToken`] when the token does not have the
    /// `<uuid>.<secret>` shape or the secret is not 32 base64url bytes.
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let (id, secret) = raw.trim().split_once('.').ok_or(AuthError::MalformedToken)?;
        let session_id = id.parse().map_err(|_| AuthError::MalformedToken)?;
        let decoded = URL_SAFE_NO_PAD
            .decode(secret)
            .map_err(|_| AuthError::MalformedToken)?;
        if decoded.len() != SECRET_LEN {
            return Err(AuthError::MalformedToken);
        }
        Ok(Self {
            session_id,
            secret: secret.to_string(),
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Lowercase hex SHA-256 of the secret.
    #[must_use]
    pub fn secret_hash(&self) -> String {
        Sha256::digest(self.secret.as_bytes())
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }

    /// Constant-time comparison of the secret against a stored digest.
    #[must_use]
    pub fn matches(&self, stored_hash: &str) -> bool {
        constant_time_eq::constant_time_eq(self.secret_hash().as_bytes(), stored_hash.as_bytes())
    }

    /// The session record this token unlocks.
    #[must_use]
    pub fn session(&self, user_id: UserId, created_at: Timestamp, expires_at: Timestamp) -> Session {
        Session {
            id: self.session_id,
            user_id,
            secret_hash: self.secret_hash(),
            created_at,
            expires_at,
        }
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.session_id, self.secret)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}
