//! User service — profile edits and the instruments a user plays.

use serde::Serialize;

use bandstand_domain::error::{BandstandError, NotFoundError, ValidationError};
use bandstand_domain::id::{InstrumentId, UserId};
use bandstand_domain::setlist::distinct;
use bandstand_domain::time::now;
use bandstand_domain::user::{Instrument, User, UserChanges, UserInstrument};

use crate::ports::UserRepository;

/// A user together with the instruments they play.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub instruments: Vec<UserInstrument>,
}

/// Application service for the acting user's own profile.
pub struct UserService<U> {
    users: U,
}

impl<U: UserRepository> UserService<U> {
    /// Create a new service backed by the given repository.
    pub fn new(users: U) -> Self {
        Self { users }
    }

    /// The acting user's profile.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when the user no longer exists,
    /// or a storage error.
    pub async fn get_profile(&self, acting: UserId) -> Result<UserProfile, BandstandError> {
        let user = self.find_user(acting).await?;
        let instruments = self.users.instruments_of(acting).await?;
        Ok(UserProfile { user, instruments })
    }

    /// Apply a partial profile update.
    ///
    /// An update naming no field returns the current record and writes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] when a field is invalid or the
    /// new username or email belongs to someone else,
    /// [`BandstandError::NotFound`] when the user no longer exists, or a
    /// storage error.
    pub async fn update_profile(
        &self,
        acting: UserId,
        changes: UserChanges,
    ) -> Result<User, BandstandError> {
        changes.validate()?;
        let changes = changes.normalized();
        if changes.is_empty() {
            return self.find_user(acting).await;
        }

        if let Some(username) = changes.username.as_deref()
            && let Some(owner) = self.users.find_by_username(username).await?
            && owner.id != acting
        {
            return Err(ValidationError::UsernameTaken.into());
        }
        if let Some(email) = changes.email.as_deref()
            && let Some(owner) = self.users.find_by_email(email).await?
            && owner.id != acting
        {
            return Err(ValidationError::EmailTaken.into());
        }

        let user = self
            .users
            .update(acting, &changes, now())
            .await?
            .ok_or_else(|| not_found(acting))?;
        tracing::info!(user_id = %user.id, "profile updated");
        Ok(user)
    }

    /// The instrument catalogue.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_instruments(&self) -> Result<Vec<Instrument>, BandstandError> {
        self.users.list_instruments().await
    }

    /// Replace the instruments the acting user plays.
    ///
    /// Repeated ids are collapsed. Returns the new list.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] when an id is not in the
    /// catalogue, [`BandstandError::NotFound`] when the user no longer
    /// exists, or a storage error. On error the previous list is kept.
    pub async fn replace_instruments(
        &self,
        acting: UserId,
        instrument_ids: &[InstrumentId],
    ) -> Result<Vec<UserInstrument>, BandstandError> {
        self.find_user(acting).await?;
        let instrument_ids = distinct(instrument_ids);
        self.users
            .replace_instruments(acting, &instrument_ids)
            .await?;
        tracing::info!(user_id = %acting, count = instrument_ids.len(), "instruments replaced");
        self.users.instruments_of(acting).await
    }

    async fn find_user(&self, id: UserId) -> Result<User, BandstandError> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: UserId) -> BandstandError {
    NotFoundError {
        entity: "User",
        id: id.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::InMemory;

    fn make_service() -> (UserService<InMemory>, InMemory) {
        let store = InMemory::default();
        (UserService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn should_return_current_record_without_writing_when_update_empty() {
        let (svc, store) = make_service();
        let user = store.seed_user("quiet");

        let result = svc
            .update_profile(user.id, UserChanges::default())
            .await
            .unwrap();

        assert_eq!(result, user);
        assert_eq!(result.updated_at, user.updated_at);
    }

    #[tokio::test]
    async fn should_update_only_named_fields() {
        let (svc, store) = make_service();
        let user = store.seed_user("sax");

        let result = svc
            .update_profile(
                user.id,
                UserChanges {
                    full_name: Some(Some("Sonny".to_string())),
                    email: Some("SONNY@example.com".to_string()),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(result.username, "sax");
        assert_eq!(result.email, "sonny@example.com");
        assert_eq!(result.full_name.as_deref(), Some("Sonny"));
        assert!(result.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn should_reject_username_taken_by_someone_else() {
        let (svc, store) = make_service();
        let user = store.seed_user("first");
        store.seed_user("second");

        let result = svc
            .update_profile(
                user.id,
                UserChanges {
                    username: Some("second".to_string()),
                    ..UserChanges::default()
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(BandstandError::Validation(ValidationError::UsernameTaken))
        ));
    }

    #[tokio::test]
    async fn should_allow_resubmitting_own_email() {
        let (svc, store) = make_service();
        let user = store.seed_user("same");

        let result = svc
            .update_profile(
                user.id,
                UserChanges {
                    email: Some(user.email.clone()),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(result.email, user.email);
    }

    #[tokio::test]
    async fn should_return_not_found_when_updating_missing_user() {
        let (svc, _) = make_service();
        let result = svc
            .update_profile(
                UserId::new(),
                UserChanges {
                    username: Some("ghost".to_string()),
                    ..UserChanges::default()
                },
            )
            .await;
        assert!(matches!(result, Err(BandstandError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_replace_instruments_and_collapse_repeats() {
        let (svc, store) = make_service();
        let user = store.seed_user("multi");
        let bass = store.seed_instrument("Bass");
        let drums = store.seed_instrument("Drums");
        let vocals = store.seed_instrument("Vocals");
        svc.replace_instruments(user.id, &[vocals]).await.unwrap();

        let result = svc
            .replace_instruments(user.id, &[drums, bass, drums])
            .await
            .unwrap();

        let names: Vec<&str> = result.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Bass", "Drums"]);
        let profile = svc.get_profile(user.id).await.unwrap();
        assert_eq!(profile.instruments, result);
    }

    #[tokio::test]
    async fn should_keep_previous_instruments_when_id_unknown() {
        let (svc, store) = make_service();
        let user = store.seed_user("careful");
        let keys = store.seed_instrument("Keyboard");
        svc.replace_instruments(user.id, &[keys]).await.unwrap();

        let result = svc
            .replace_instruments(user.id, &[keys, InstrumentId::new()])
            .await;

        assert!(matches!(
            result,
            Err(BandstandError::Validation(ValidationError::UnknownValue {
                kind: "instrument",
                ..
            }))
        ));
        assert_eq!(svc.get_profile(user.id).await.unwrap().instruments.len(), 1);
    }

    #[tokio::test]
    async fn should_clear_instruments_with_empty_list() {
        let (svc, store) = make_service();
        let user = store.seed_user("retired");
        let flute = store.seed_instrument("Flute");
        svc.replace_instruments(user.id, &[flute]).await.unwrap();

        let result = svc.replace_instruments(user.id, &[]).await.unwrap();

        assert!(result.is_empty());
    }
}
