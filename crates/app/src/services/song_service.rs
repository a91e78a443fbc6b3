//! Song service — a band's repertoire and the files attached to it.

use serde::Serialize;

use bandstand_domain::band::BandRole;
use bandstand_domain::error::{BandstandError, NotFoundError};
use bandstand_domain::id::{BandId, SongId, SongResourceId, UserId};
use bandstand_domain::notification::NotificationKind;
use bandstand_domain::song::{ResourceType, Song, SongChanges, SongResource};

use crate::ports::{BandRepository, Notifier, SongRepository};
use crate::services::access::authorize_band_role;
use crate::services::announce::announce;

/// Payload of `song:deleted`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDeleted {
    pub id: SongId,
    pub band_id: BandId,
}

fn not_found(id: SongId) -> BandstandError {
    NotFoundError {
        entity: "Song",
        id: id.to_string(),
    }
    .into()
}

/// Application service for songs and song resources.
pub struct SongService<S, B, N> {
    songs: S,
    bands: B,
    notifier: N,
}

impl<S, B, N> SongService<S, B, N>
where
    S: SongRepository,
    B: BandRepository,
    N: Notifier,
{
    /// Create a new service backed by the given repositories and notifier.
    pub fn new(songs: S, bands: B, notifier: N) -> Self {
        Self {
            songs,
            bands,
            notifier,
        }
    }

    /// Songs of a band ordered by title.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Forbidden`] for non-members, or a storage
    /// error.
    pub async fn list_for_band(
        &self,
        acting: UserId,
        band_id: BandId,
    ) -> Result<Vec<Song>, BandstandError> {
        authorize_band_role(&self.bands, acting, band_id, BandRole::ANY).await?;
        self.songs.list_for_band(band_id).await
    }

    /// Look up a song of a band the acting user belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no song with `id` exists,
    /// [`BandstandError::Forbidden`] for non-members, or a storage error.
    pub async fn get_song(&self, acting: UserId, id: SongId) -> Result<Song, BandstandError> {
        self.find_authorized(acting, id).await
    }

    /// Add a song to a band's repertoire.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] if invariants fail,
    /// [`BandstandError::Forbidden`] for non-members, or a storage error.
    pub async fn create_song(&self, song: Song) -> Result<Song, BandstandError> {
        song.validate()?;
        authorize_band_role(&self.bands, song.added_by, song.band_id, BandRole::ANY).await?;

        let created = self.songs.create(song).await?;
        tracing::info!(song_id = %created.id, band_id = %created.band_id, "song created");
        announce(
            &self.notifier,
            created.band_id,
            NotificationKind::SongCreated,
            &created,
        )
        .await;
        Ok(created)
    }

    /// Apply a partial update. An empty change set returns the song untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no song with `id` exists,
    /// [`BandstandError::Forbidden`] for non-members,
    /// [`BandstandError::Validation`] when a new title is blank, or a storage
    /// error.
    pub async fn update_song(
        &self,
        acting: UserId,
        id: SongId,
        changes: SongChanges,
    ) -> Result<Song, BandstandError> {
        let current = self.find_authorized(acting, id).await?;
        if changes.is_empty() {
            tracing::debug!(song_id = %id, "empty change set, nothing to update");
            return Ok(current);
        }
        changes.validate()?;

        let updated = self
            .songs
            .update(id, &changes)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(song_id = %id, "song updated");
        announce(
            &self.notifier,
            updated.band_id,
            NotificationKind::SongUpdated,
            &updated,
        )
        .await;
        Ok(updated)
    }

    /// Delete a song; it also leaves every rehearsal plan and setlist.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no song with `id` exists,
    /// [`BandstandError::Forbidden`] for non-members, or a storage error.
    pub async fn delete_song(&self, acting: UserId, id: SongId) -> Result<(), BandstandError> {
        let song = self.find_authorized(acting, id).await?;
        if !self.songs.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(song_id = %id, band_id = %song.band_id, "song deleted");
        announce(
            &self.notifier,
            song.band_id,
            NotificationKind::SongDeleted,
            &SongDeleted {
                id,
                band_id: song.band_id,
            },
        )
        .await;
        Ok(())
    }

    /// Attach a resource to a song.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no song with `song_id`
    /// exists, [`BandstandError::Forbidden`] for non-members,
    /// [`BandstandError::Validation`] when `file_url` is blank, or a storage
    /// error.
    pub async fn add_resource(
        &self,
        acting: UserId,
        song_id: SongId,
        resource_type: ResourceType,
        file_url: String,
        description: Option<String>,
    ) -> Result<SongResource, BandstandError> {
        self.find_authorized(acting, song_id).await?;
        let resource = SongResource::new(song_id, resource_type, file_url, description, acting)?;
        let resource = self.songs.add_resource(resource).await?;
        tracing::info!(%song_id, resource_id = %resource.id, "song resource added");
        Ok(resource)
    }

    /// Detach a resource from a song.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when the song does not exist or
    /// the resource does not belong to it, [`BandstandError::Forbidden`] for
    /// non-members, or a storage error.
    pub async fn delete_resource(
        &self,
        acting: UserId,
        song_id: SongId,
        resource_id: SongResourceId,
    ) -> Result<(), BandstandError> {
        self.find_authorized(acting, song_id).await?;
        if !self.songs.delete_resource(song_id, resource_id).await? {
            return Err(NotFoundError {
                entity: "Song resource",
                id: resource_id.to_string(),
            }
            .into());
        }
        tracing::info!(%song_id, %resource_id, "song resource deleted");
        Ok(())
    }

    async fn find_authorized(&self, acting: UserId, id: SongId) -> Result<Song, BandstandError> {
        let song = self
            .songs
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        authorize_band_role(&self.bands, acting, song.band_id, BandRole::ANY).await?;
        Ok(song)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{InMemory, RecordingNotifier};
    use bandstand_domain::song::SongStatus;

    type Service = SongService<InMemory, InMemory, RecordingNotifier>;

    fn fixture() -> (Service, InMemory, RecordingNotifier, BandId, UserId) {
        let store = InMemory::default();
        let notifier = RecordingNotifier::default();
        let member = store.seed_user("member").id;
        let band_id = store.seed_band(&[(member, BandRole::Member)]);
        let svc = SongService::new(store.clone(), store.clone(), notifier.clone());
        (svc, store, notifier, band_id, member)
    }

    fn song(band_id: BandId, title: &str, added_by: UserId) -> Song {
        Song::builder()
            .band_id(band_id)
            .title(title)
            .added_by(added_by)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_let_plain_member_add_song() {
        let (svc, _, notifier, band_id, member) = fixture();
        let created = svc.create_song(song(band_id, "Take Five", member)).await.unwrap();

        assert_eq!(created.status, SongStatus::New);
        assert_eq!(notifier.sent()[0].event, NotificationKind::SongCreated);
    }

    #[tokio::test]
    async fn should_forbid_outsider_adding_song() {
        let (svc, store, _, band_id, _) = fixture();
        let outsider = store.seed_user("outsider").id;
        let result = svc.create_song(song(band_id, "Intruder", outsider)).await;
        assert!(matches!(result, Err(BandstandError::Forbidden(_))));
    }

    #[tokio::test]
    async fn should_list_songs_ordered_by_title() {
        let (svc, _, _, band_id, member) = fixture();
        svc.create_song(song(band_id, "Mood Indigo", member)).await.unwrap();
        svc.create_song(song(band_id, "Autumn Leaves", member)).await.unwrap();

        let titles: Vec<String> = svc
            .list_for_band(member, band_id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Autumn Leaves", "Mood Indigo"]);
    }

    #[tokio::test]
    async fn should_skip_write_when_update_empty() {
        let (svc, _, notifier, band_id, member) = fixture();
        let created = svc.create_song(song(band_id, "Solar", member)).await.unwrap();

        let same = svc
            .update_song(member, created.id, SongChanges::default())
            .await
            .unwrap();

        assert_eq!(same, created);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn should_update_status_and_announce() {
        let (svc, _, notifier, band_id, member) = fixture();
        let created = svc.create_song(song(band_id, "Nardis", member)).await.unwrap();

        let updated = svc
            .update_song(
                member,
                created.id,
                SongChanges {
                    status: Some(SongStatus::PerformanceReady),
                    ..SongChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, SongStatus::PerformanceReady);
        assert_eq!(notifier.sent()[1].event, NotificationKind::SongUpdated);
    }

    #[tokio::test]
    async fn should_announce_deleted_song_with_band() {
        let (svc, _, notifier, band_id, member) = fixture();
        let created = svc.create_song(song(band_id, "Giant Steps", member)).await.unwrap();

        svc.delete_song(member, created.id).await.unwrap();

        let deleted = &notifier.sent()[1];
        assert_eq!(deleted.event, NotificationKind::SongDeleted);
        assert_eq!(deleted.data["bandId"], serde_json::json!(band_id));
        let result = svc.get_song(member, created.id).await;
        assert!(matches!(result, Err(BandstandError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_attach_and_detach_resource() {
        let (svc, _, _, band_id, member) = fixture();
        let created = svc.create_song(song(band_id, "Footprints", member)).await.unwrap();

        let resource = svc
            .add_resource(
                member,
                created.id,
                ResourceType::ChordChart,
                "https://files.example.com/footprints.pdf".to_string(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(resource.uploaded_by, member);
        assert_eq!(svc.get_song(member, created.id).await.unwrap().resources.len(), 1);

        svc.delete_resource(member, created.id, resource.id).await.unwrap();
        assert!(svc.get_song(member, created.id).await.unwrap().resources.is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_when_resource_belongs_to_other_song() {
        let (svc, _, _, band_id, member) = fixture();
        let first = svc.create_song(song(band_id, "First", member)).await.unwrap();
        let second = svc.create_song(song(band_id, "Second", member)).await.unwrap();
        let resource = svc
            .add_resource(
                member,
                first.id,
                ResourceType::Lyrics,
                "https://files.example.com/first.txt".to_string(),
                Some("verse one".to_string()),
            )
            .await
            .unwrap();

        let result = svc.delete_resource(member, second.id, resource.id).await;
        assert!(matches!(result, Err(BandstandError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_return_not_found_when_adding_resource_to_missing_song() {
        let (svc, _, _, _, member) = fixture();
        let result = svc
            .add_resource(
                member,
                SongId::new(),
                ResourceType::Recording,
                "https://files.example.com/demo.mp3".to_string(),
                None,
            )
            .await;
        assert!(matches!(result, Err(BandstandError::NotFound(_))));
    }
}
