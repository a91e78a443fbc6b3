//! User — an account that can join bands and RSVP to rehearsals.

use serde::{Deserialize, Serialize};

use crate::define_label_enum;
use crate::error::{BandstandError, ValidationError};
use crate::id::{InstrumentId, UserId};
use crate::time::{Timestamp, now};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

define_label_enum!(
    /// Application-wide role, independent from band roles.
    UserRole("user role") {
        Admin => "admin",
        Member => "member",
    }
);

/// A registered account. The password hash is never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for account registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl Registration {
    /// Check the registration form.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] when a required field is empty,
    /// the email has no `@`, or the password is shorter than
    /// [`MIN_PASSWORD_LEN`].
    pub fn validate(&self) -> Result<(), BandstandError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::EmptyField("username").into());
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::EmptyField("email").into());
        }
        if !self.email.contains('@') {
            return Err(ValidationError::InvalidEmail.into());
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            }
            .into());
        }
        Ok(())
    }

    /// Build the [`User`] this registration creates.
    #[must_use]
    pub fn to_user(&self) -> User {
        let ts = now();
        User {
            id: UserId::new(),
            username: self.username.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            full_name: self.full_name.clone().filter(|name| !name.trim().is_empty()),
            role: UserRole::Member,
            created_at: ts,
            updated_at: ts,
        }
    }
}

/// Partial profile update. `None` leaves a field untouched; `full_name:
/// Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<Option<String>>,
}

impl UserChanges {
    /// Whether the change set asks for nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.full_name.is_none()
    }

    /// Validate the supplied fields.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] when a new username or email is
    /// blank, or the email has no `@`.
    pub fn validate(&self) -> Result<(), BandstandError> {
        if self.username.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(ValidationError::EmptyField("username").into());
        }
        if let Some(email) = self.email.as_deref() {
            if email.trim().is_empty() {
                return Err(ValidationError::EmptyField("email").into());
            }
            if !email.contains('@') {
                return Err(ValidationError::InvalidEmail.into());
            }
        }
        Ok(())
    }

    /// The same changes with text trimmed, the email lowercased and a blank
    /// full name turned into a clear.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.map(|u| u.trim().to_string()),
            email: self.email.map(|e| e.trim().to_lowercase()),
            full_name: self
                .full_name
                .map(|name| name.filter(|n| !n.trim().is_empty())),
        }
    }

    /// `current` with these changes applied, stamped at `at`.
    #[must_use]
    pub fn apply_to(&self, current: &User, at: Timestamp) -> User {
        let mut next = current.clone();
        if let Some(username) = &self.username {
            next.username.clone_from(username);
        }
        if let Some(email) = &self.email {
            next.email.clone_from(email);
        }
        if let Some(full_name) = &self.full_name {
            next.full_name.clone_from(full_name);
        }
        next.updated_at = at;
        next
    }
}

/// An entry of the instrument catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub id: InstrumentId,
    pub name: String,
}

/// An instrument a user plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInstrument {
    pub id: InstrumentId,
    pub name: String,
    pub proficiency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            username: "keys".to_string(),
            email: "Keys@Example.com".to_string(),
            password: "correct horse".to_string(),
            full_name: None,
        }
    }

    #[test]
    fn should_accept_valid_registration() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn should_reject_registration_when_password_too_short() {
        let mut reg = registration();
        reg.password = "short".to_string();
        assert!(matches!(
            reg.validate(),
            Err(BandstandError::Validation(
                ValidationError::PasswordTooShort { .. }
            ))
        ));
    }

    #[test]
    fn should_reject_registration_when_email_has_no_at_sign() {
        let mut reg = registration();
        reg.email = "keys.example.com".to_string();
        assert!(matches!(
            reg.validate(),
            Err(BandstandError::Validation(ValidationError::InvalidEmail))
        ));
    }

    #[test]
    fn should_reject_registration_when_username_blank() {
        let mut reg = registration();
        reg.username = "  ".to_string();
        assert!(matches!(
            reg.validate(),
            Err(BandstandError::Validation(ValidationError::EmptyField(
                "username"
            )))
        ));
    }

    #[test]
    fn should_normalise_email_and_default_to_member_role() {
        let user = registration().to_user();
        assert_eq!(user.email, "keys@example.com");
        assert_eq!(user.role, UserRole::Member);
    }

    #[test]
    fn should_serialize_user_with_camel_case_keys() {
        let user = registration().to_user();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("fullName").is_some());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn should_report_empty_user_changes() {
        assert!(UserChanges::default().is_empty());
        let clear_name = UserChanges {
            full_name: Some(None),
            ..UserChanges::default()
        };
        assert!(!clear_name.is_empty());
    }

    #[test]
    fn should_reject_user_changes_with_invalid_email() {
        let changes = UserChanges {
            email: Some("nobody".to_string()),
            ..UserChanges::default()
        };
        assert!(matches!(
            changes.validate(),
            Err(BandstandError::Validation(ValidationError::InvalidEmail))
        ));
    }

    #[test]
    fn should_normalise_changes_and_apply_only_given_fields() {
        let user = registration().to_user();
        let changes = UserChanges {
            email: Some(" New@Example.com ".to_string()),
            full_name: Some(Some("   ".to_string())),
            ..UserChanges::default()
        }
        .normalized();
        let at = now();

        let next = changes.apply_to(&user, at);

        assert_eq!(next.username, "keys");
        assert_eq!(next.email, "new@example.com");
        assert_eq!(next.full_name, None);
        assert_eq!(next.updated_at, at);
    }
}
