//! Auth service — registration, login and bearer-token sessions.

use chrono::Duration;
use serde::Serialize;

use bandstand_domain::error::{AuthError, BandstandError, ValidationError};
use bandstand_domain::time::{Timestamp, now};
use bandstand_domain::user::{Registration, User};

use crate::credentials::{hash_password, verify_password};
use crate::ports::{SessionRepository, UserRepository};
use crate::token::SessionToken;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// The configured session lifetime pushes the expiry past the representable
/// date range.
#[derive(Debug, thiserror::Error)]
#[error("session lifetime of {0} overflows the expiry timestamp")]
pub struct SessionTtlOverflow(Duration);

/// A user together with a freshly issued bearer token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: User,
    pub token: String,
    pub expires_at: Timestamp,
}

/// Application service for accounts and sessions.
pub struct AuthService<U, S> {
    users: U,
    sessions: S,
    session_ttl: Duration,
}

impl<U: UserRepository, S: SessionRepository> AuthService<U, S> {
    /// Create a new service. Sessions expire `session_ttl` after login.
    pub fn new(users: U, sessions: S, session_ttl: Duration) -> Self {
        Self {
            users,
            sessions,
            session_ttl,
        }
    }

    /// Create an account and log it in.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] when the form is invalid or the
    /// email or username is already in use, or a storage error.
    pub async fn register(&self, registration: Registration) -> Result<AuthSession, BandstandError> {
        registration.validate()?;
        let user = registration.to_user();

        if self.users.find_by_email(&user.email).await?.is_some() {
            return Err(ValidationError::EmailTaken.into());
        }
        if self.users.find_by_username(&user.username).await?.is_some() {
            return Err(ValidationError::UsernameTaken.into());
        }

        let password_hash = hash_password(&registration.password)?;
        let user = self.users.create(user, password_hash).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        self.open_session(user).await
    }

    /// Check credentials and open a session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email and for
    /// a wrong password alike, or a storage error.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, BandstandError> {
        let email = email.trim().to_lowercase();
        let Some((user, password_hash)) = self.users.find_credentials_by_email(&email).await? else {
            tracing::debug!("login with unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };
        if !verify_password(password, &password_hash) {
            tracing::debug!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        self.open_session(user).await
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Unauthenticated`] with the matching
    /// [`AuthError`] when the token is malformed, unknown, expired, or its
    /// user no longer exists; or a storage error.
    pub async fn authenticate(&self, raw_token: &str) -> Result<User, BandstandError> {
        let token = SessionToken::parse(raw_token)?;
        let Some(session) = self.sessions.get_by_id(token.session_id()).await? else {
            return Err(AuthError::InvalidToken.into());
        };
        if !token.matches(&session.secret_hash) {
            return Err(AuthError::InvalidToken.into());
        }
        if session.is_expired(now()) {
            return Err(AuthError::ExpiredToken.into());
        }
        self.users
            .get_by_id(session.user_id)
            .await?
            .ok_or_else(|| AuthError::UnknownUser.into())
    }

    /// End the session behind a bearer token.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::authenticate`].
    pub async fn logout(&self, raw_token: &str) -> Result<(), BandstandError> {
        let user = self.authenticate(raw_token).await?;
        let token = SessionToken::parse(raw_token)?;
        self.sessions.delete(token.session_id()).await?;
        tracing::info!(user_id = %user.id, "user logged out");
        Ok(())
    }

    async fn open_session(&self, user: User) -> Result<AuthSession, BandstandError> {
        let token = SessionToken::generate();
        let created_at = now();
        let expires_at = created_at
            .checked_add_signed(self.session_ttl)
            .ok_or_else(|| {
                BandstandError::Internal(Box::new(SessionTtlOverflow(self.session_ttl)))
            })?;
        let session = self
            .sessions
            .create(token.session(user.id, created_at, expires_at))
            .await?;
        tracing::debug!(user_id = %user.id, session_id = %session.id, "session opened");
        Ok(AuthSession {
            user,
            token: token.to_string(),
            expires_at: session.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::InMemory;

    fn make_service() -> (AuthService<InMemory, InMemory>, InMemory) {
        let store = InMemory::default();
        let service = AuthService::new(
            store.clone(),
            store.clone(),
            Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        );
        (service, store)
    }

    fn registration(username: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: format!("{username}@Example.com"),
            password: "open sesame".to_string(),
            full_name: Some("Test User".to_string()),
        }
    }

    #[tokio::test]
    async fn should_register_and_authenticate_with_issued_token() {
        let (svc, _) = make_service();
        let session = svc.register(registration("drums")).await.unwrap();

        let user = svc.authenticate(&session.token).await.unwrap();
        assert_eq!(user.id, session.user.id);
        assert_eq!(user.email, "drums@example.com");
    }

    #[tokio::test]
    async fn should_reject_registration_when_email_taken() {
        let (svc, _) = make_service();
        svc.register(registration("bass")).await.unwrap();

        let mut again = registration("bass2");
        again.email = "BASS@example.com".to_string();
        let result = svc.register(again).await;
        assert!(matches!(
            result,
            Err(BandstandError::Validation(ValidationError::EmailTaken))
        ));
    }

    #[tokio::test]
    async fn should_reject_registration_when_username_taken() {
        let (svc, _) = make_service();
        svc.register(registration("keys")).await.unwrap();

        let mut again = registration("keys");
        again.email = "other@example.com".to_string();
        let result = svc.register(again).await;
        assert!(matches!(
            result,
            Err(BandstandError::Validation(ValidationError::UsernameTaken))
        ));
    }

    #[tokio::test]
    async fn should_login_with_registered_password() {
        let (svc, store) = make_service();
        svc.register(registration("vocals")).await.unwrap();

        let session = svc.login(" Vocals@example.com ", "open sesame").await.unwrap();
        assert_eq!(session.user.username, "vocals");
        assert_eq!(store.session_count(), 2);
    }

    #[tokio::test]
    async fn should_give_same_error_for_unknown_email_and_wrong_password() {
        let (svc, _) = make_service();
        svc.register(registration("guitar")).await.unwrap();

        let unknown = svc.login("nobody@example.com", "open sesame").await;
        let wrong = svc.login("guitar@example.com", "not it at all").await;
        assert!(matches!(
            unknown,
            Err(BandstandError::Unauthenticated(AuthError::InvalidCredentials))
        ));
        assert!(matches!(
            wrong,
            Err(BandstandError::Unauthenticated(AuthError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn should_reject_malformed_token() {
        let (svc, _) = make_service();
        let result = svc.authenticate("garbage").await;
        assert!(matches!(
            result,
            Err(BandstandError::Unauthenticated(AuthError::MalformedToken))
        ));
    }

    #[tokio::test]
    async fn should_reject_well_formed_token_without_session() {
        let (svc, _) = make_service();
        let token = SessionToken::generate().to_string();
        let result = svc.authenticate(&token).await;
        assert!(matches!(
            result,
            Err(BandstandError::Unauthenticated(AuthError::InvalidToken))
        ));
    }

    #[tokio::test]
    async fn should_reject_token_with_forged_secret() {
        let (svc, _) = make_service();
        let session = svc.register(registration("horns")).await.unwrap();
        let session_id = session.token.split_once('.').unwrap().0;
        let forged_secret = SessionToken::generate().to_string();
        let forged = format!("{session_id}.{}", forged_secret.split_once('.').unwrap().1);

        let result = svc.authenticate(&forged).await;
        assert!(matches!(
            result,
            Err(BandstandError::Unauthenticated(AuthError::InvalidToken))
        ));
    }

    #[tokio::test]
    async fn should_reject_expired_token() {
        let (svc, store) = make_service();
        let session = svc.register(registration("strings")).await.unwrap();
        store.expire_sessions();

        let result = svc.authenticate(&session.token).await;
        assert!(matches!(
            result,
            Err(BandstandError::Unauthenticated(AuthError::ExpiredToken))
        ));
    }

    #[tokio::test]
    async fn should_reject_token_of_deleted_user() {
        let (svc, store) = make_service();
        let session = svc.register(registration("ghost")).await.unwrap();
        store.delete_user(session.user.id);

        let result = svc.authenticate(&session.token).await;
        assert!(matches!(
            result,
            Err(BandstandError::Unauthenticated(AuthError::UnknownUser))
        ));
    }

    #[tokio::test]
    async fn should_invalidate_token_on_logout() {
        let (svc, store) = make_service();
        let session = svc.register(registration("roadie")).await.unwrap();

        svc.logout(&session.token).await.unwrap();

        assert_eq!(store.session_count(), 0);
        let result = svc.authenticate(&session.token).await;
        assert!(matches!(
            result,
            Err(BandstandError::Unauthenticated(AuthError::InvalidToken))
        ));
    }

    #[tokio::test]
    async fn should_fail_registration_without_panicking_when_ttl_overflows() {
        let store = InMemory::default();
        let svc = AuthService::new(
            store.clone(),
            store.clone(),
            Duration::hours(2_000_000_000_000),
        );

        let result = svc.register(registration("tuba")).await;

        assert!(matches!(result, Err(BandstandError::Internal(_))));
        assert_eq!(store.session_count(), 0);
    }
}
