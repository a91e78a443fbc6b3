//! Band service — bands and their membership roster.

use bandstand_domain::band::{Band, BandMember, BandRole};
use bandstand_domain::error::{BandstandError, NotFoundError, ValidationError};
use bandstand_domain::id::{BandId, UserId};
use bandstand_domain::notification::Room;

use crate::ports::{BandRepository, Notifier, UserRepository};
use crate::services::access::authorize_band_role;

/// Application service for bands and memberships.
///
/// Roster changes are mirrored into the band's real-time room through the
/// notifier, so live connections follow membership without reconnecting.
pub struct BandService<B, U, N> {
    bands: B,
    users: U,
    notifier: N,
}

impl<B: BandRepository, U: UserRepository, N: Notifier> BandService<B, U, N> {
    /// Create a new service backed by the given repositories.
    pub fn new(bands: B, users: U, notifier: N) -> Self {
        Self {
            bands,
            users,
            notifier,
        }
    }

    /// Create a band; its creator becomes an `admin` member.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    pub async fn create_band(&self, band: Band) -> Result<Band, BandstandError> {
        band.validate()?;
        let band = self.bands.create_with_owner(band).await?;
        tracing::info!(band_id = %band.id, created_by = %band.created_by, "band created");
        Ok(band)
    }

    /// Bands the acting user belongs to.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_bands(&self, acting: UserId) -> Result<Vec<Band>, BandstandError> {
        self.bands.list_for_user(acting).await
    }

    /// Look up a band the acting user belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no band with `id` exists,
    /// [`BandstandError::Forbidden`] for non-members, or a storage error.
    pub async fn get_band(&self, acting: UserId, id: BandId) -> Result<Band, BandstandError> {
        let band = self.find_band(id).await?;
        authorize_band_role(&self.bands, acting, id, BandRole::ANY).await?;
        Ok(band)
    }

    /// Members of a band the acting user belongs to.
    ///
    /// # Errors
    ///
    /// Same as [`BandService::get_band`].
    pub async fn list_members(
        &self,
        acting: UserId,
        band_id: BandId,
    ) -> Result<Vec<BandMember>, BandstandError> {
        self.find_band(band_id).await?;
        authorize_band_role(&self.bands, acting, band_id, BandRole::ANY).await?;
        self.bands.list_members(band_id).await
    }

    /// Add a user to a band. Only band admins may do this.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when the band or the user does
    /// not exist, [`BandstandError::Forbidden`] for non-admins,
    /// [`ValidationError::AlreadyMember`] when the user already belongs to the
    /// band, or a storage error.
    pub async fn add_member(
        &self,
        acting: UserId,
        band_id: BandId,
        user_id: UserId,
        role: BandRole,
    ) -> Result<BandMember, BandstandError> {
        self.find_band(band_id).await?;
        authorize_band_role(&self.bands, acting, band_id, BandRole::ADMINS).await?;

        if self.users.get_by_id(user_id).await?.is_none() {
            return Err(NotFoundError {
                entity: "User",
                id: user_id.to_string(),
            }
            .into());
        }
        if self.bands.get_membership(band_id, user_id).await?.is_some() {
            return Err(ValidationError::AlreadyMember.into());
        }

        let member = self
            .bands
            .add_member(BandMember::new(band_id, user_id, role))
            .await?;
        self.notifier.join(user_id, Room::Band(band_id));
        tracing::info!(%band_id, %user_id, %role, "band member added");
        Ok(member)
    }

    /// Remove a user from a band. Only band admins may do this.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when the band does not exist or
    /// the user is not a member, [`BandstandError::Forbidden`] for
    /// non-admins, or a storage error.
    pub async fn remove_member(
        &self,
        acting: UserId,
        band_id: BandId,
        user_id: UserId,
    ) -> Result<(), BandstandError> {
        self.find_band(band_id).await?;
        authorize_band_role(&self.bands, acting, band_id, BandRole::ADMINS).await?;

        if !self.bands.remove_member(band_id, user_id).await? {
            return Err(NotFoundError {
                entity: "Band member",
                id: user_id.to_string(),
            }
            .into());
        }
        self.notifier.leave(user_id, Room::Band(band_id));
        tracing::info!(%band_id, %user_id, "band member removed");
        Ok(())
    }

    /// Ids of every band the user belongs to.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn band_ids_for_user(&self, user_id: UserId) -> Result<Vec<BandId>, BandstandError> {
        self.bands.band_ids_for_user(user_id).await
    }

    async fn find_band(&self, id: BandId) -> Result<Band, BandstandError> {
        self.bands.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Band",
                id: id.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{InMemory, MembershipChange, RecordingNotifier};

    type Service = BandService<InMemory, InMemory, RecordingNotifier>;

    fn make_service() -> (Service, InMemory) {
        let (svc, store, _) = make_service_with_notifier();
        (svc, store)
    }

    fn make_service_with_notifier() -> (Service, InMemory, RecordingNotifier) {
        let store = InMemory::default();
        let notifier = RecordingNotifier::default();
        let svc = BandService::new(store.clone(), store.clone(), notifier.clone());
        (svc, store, notifier)
    }

    #[tokio::test]
    async fn should_make_creator_admin_when_band_created() {
        let (svc, store) = make_service();
        let founder = store.seed_user("founder").id;
        let band = Band::builder()
            .name("Night Owls")
            .created_by(founder)
            .build()
            .unwrap();

        let band = svc.create_band(band).await.unwrap();

        let members = svc.list_members(founder, band.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].role, BandRole::Admin);
        assert_eq!(svc.list_bands(founder).await.unwrap(), vec![band]);
    }

    #[tokio::test]
    async fn should_return_not_found_when_band_missing() {
        let (svc, store) = make_service();
        let user = store.seed_user("lost").id;
        let result = svc.get_band(user, BandId::new()).await;
        assert!(matches!(result, Err(BandstandError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_forbid_reading_band_of_non_member() {
        let (svc, store) = make_service();
        let admin = store.seed_user("admin").id;
        let outsider = store.seed_user("outsider").id;
        let band_id = store.seed_band(&[(admin, BandRole::Admin)]);

        let result = svc.get_band(outsider, band_id).await;
        assert!(matches!(result, Err(BandstandError::Forbidden(_))));
    }

    #[tokio::test]
    async fn should_add_member_when_admin() {
        let (svc, store) = make_service();
        let admin = store.seed_user("admin").id;
        let newbie = store.seed_user("newbie").id;
        let band_id = store.seed_band(&[(admin, BandRole::Admin)]);

        let member = svc
            .add_member(admin, band_id, newbie, BandRole::Member)
            .await
            .unwrap();

        assert_eq!(member.user_id, newbie);
        assert_eq!(svc.band_ids_for_user(newbie).await.unwrap(), vec![band_id]);
    }

    #[tokio::test]
    async fn should_forbid_leader_adding_members() {
        let (svc, store) = make_service();
        let admin = store.seed_user("admin").id;
        let leader = store.seed_user("leader").id;
        let newbie = store.seed_user("newbie").id;
        let band_id = store.seed_band(&[(admin, BandRole::Admin), (leader, BandRole::Leader)]);

        let result = svc.add_member(leader, band_id, newbie, BandRole::Member).await;
        assert!(matches!(result, Err(BandstandError::Forbidden(_))));
    }

    #[tokio::test]
    async fn should_reject_adding_existing_member() {
        let (svc, store) = make_service();
        let admin = store.seed_user("admin").id;
        let band_id = store.seed_band(&[(admin, BandRole::Admin)]);

        let result = svc.add_member(admin, band_id, admin, BandRole::Leader).await;
        assert!(matches!(
            result,
            Err(BandstandError::Validation(ValidationError::AlreadyMember))
        ));
    }

    #[tokio::test]
    async fn should_return_not_found_when_adding_unknown_user() {
        let (svc, store) = make_service();
        let admin = store.seed_user("admin").id;
        let band_id = store.seed_band(&[(admin, BandRole::Admin)]);

        let result = svc
            .add_member(admin, band_id, UserId::new(), BandRole::Member)
            .await;
        assert!(matches!(result, Err(BandstandError::NotFound(err)) if err.entity == "User"));
    }

    #[tokio::test]
    async fn should_remove_member_and_report_missing_membership() {
        let (svc, store) = make_service();
        let admin = store.seed_user("admin").id;
        let plain = store.seed_user("plain").id;
        let band_id = store.seed_band(&[(admin, BandRole::Admin), (plain, BandRole::Member)]);

        svc.remove_member(admin, band_id, plain).await.unwrap();
        let again = svc.remove_member(admin, band_id, plain).await;

        assert!(matches!(again, Err(BandstandError::NotFound(_))));
        assert_eq!(svc.list_members(admin, band_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_move_live_connections_with_roster_changes() {
        let (svc, store, notifier) = make_service_with_notifier();
        let admin = store.seed_user("admin").id;
        let player = store.seed_user("player").id;
        let band = svc
            .create_band(
                Band::builder()
                    .name("Roster")
                    .created_by(admin)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        svc.add_member(admin, band.id, player, BandRole::Member)
            .await
            .unwrap();
        svc.remove_member(admin, band.id, player).await.unwrap();

        assert_eq!(
            notifier.memberships(),
            vec![
                MembershipChange::Joined(player, Room::Band(band.id)),
                MembershipChange::Left(player, Room::Band(band.id)),
            ]
        );
    }

    #[tokio::test]
    async fn should_leave_rooms_untouched_when_removal_rejected() {
        let (svc, store, notifier) = make_service_with_notifier();
        let admin = store.seed_user("boss").id;
        let stranger = store.seed_user("stranger").id;
        let band = svc
            .create_band(
                Band::builder()
                    .name("Closed")
                    .created_by(admin)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let result = svc.remove_member(admin, band.id, stranger).await;

        assert!(matches!(result, Err(BandstandError::NotFound(_))));
        assert!(notifier.memberships().is_empty());
    }
}
