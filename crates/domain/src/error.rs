//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`BandstandError`] via `#[from]`. Adapter errors are boxed into
//! [`BandstandError::Storage`] so the domain never names an IO crate.

use crate::id::{BandId, SongId};

/// Top-level error returned by services and repositories.
#[derive(Debug, thiserror::Error)]
pub enum BandstandError {
    /// Input failed a domain invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The requested record does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The caller could not be identified.
    #[error(transparent)]
    Unauthenticated(#[from] AuthError),

    /// The caller is identified but lacks the required band role.
    #[error(transparent)]
    Forbidden(#[from] ForbiddenError),

    /// A persistence adapter failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Any other infrastructure failure (hashing, encoding, …).
    #[error("internal error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Invariant violations on input data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("invalid request body: {0}")]
    MalformedBody(String),

    #[error("{field} is not a valid identifier")]
    InvalidId { field: &'static str },

    #[error("unknown {kind} value `{value}`")]
    UnknownValue { kind: &'static str, value: String },

    #[error("start time must be before end time")]
    InvalidTimeRange,

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("user with this email already exists")]
    EmailTaken,

    #[error("username is already taken")]
    UsernameTaken,

    #[error("song {song_id} does not belong to band {band_id}")]
    SongNotInBand { song_id: SongId, band_id: BandId },

    #[error("user is already a member of this band")]
    AlreadyMember,
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Bearer-token and credential failures.
///
/// The variants only differ in the message shown to the client; all of them
/// reject the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authentication required")]
    MissingToken,

    #[error("malformed token")]
    MalformedToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    ExpiredToken,

    #[error("user not found")]
    UnknownUser,

    #[error("invalid email or password")]
    InvalidCredentials,
}

/// The caller has no membership in the band, or the wrong role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("you do not have permission to perform this action")]
pub struct ForbiddenError {
    pub band_id: BandId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_top_level_error() {
        let err: BandstandError = ValidationError::InvalidTimeRange.into();
        assert!(matches!(
            err,
            BandstandError::Validation(ValidationError::InvalidTimeRange)
        ));
    }

    #[test]
    fn should_describe_not_found_error_by_entity_name() {
        let err = NotFoundError {
            entity: "Rehearsal",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Rehearsal not found");
    }

    #[test]
    fn should_distinguish_malformed_and_expired_token_messages() {
        assert_ne!(
            AuthError::MalformedToken.to_string(),
            AuthError::ExpiredToken.to_string()
        );
    }

    #[test]
    fn should_forward_message_of_wrapped_errors() {
        let err: BandstandError = ValidationError::MissingField("title").into();
        assert_eq!(err.to_string(), "title is required");
    }
}
