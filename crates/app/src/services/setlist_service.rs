//! Setlist service — ordered song selections for gigs.

use serde::Serialize;

use bandstand_domain::band::BandRole;
use bandstand_domain::error::{BandstandError, NotFoundError};
use bandstand_domain::id::{BandId, SetlistId, SongId, UserId};
use bandstand_domain::notification::NotificationKind;
use bandstand_domain::setlist::Setlist;

use crate::ports::{BandRepository, Notifier, SetlistRepository};
use crate::services::access::authorize_band_role;
use crate::services::announce::announce;

/// Payload of `setlist:deleted`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetlistDeleted {
    pub id: SetlistId,
    pub band_id: BandId,
}

fn not_found(id: SetlistId) -> BandstandError {
    NotFoundError {
        entity: "Setlist",
        id: id.to_string(),
    }
    .into()
}

/// Application service for setlists.
pub struct SetlistService<L, B, N> {
    setlists: L,
    bands: B,
    notifier: N,
}

impl<L, B, N> SetlistService<L, B, N>
where
    L: SetlistRepository,
    B: BandRepository,
    N: Notifier,
{
    /// Create a new service backed by the given repositories and notifier.
    pub fn new(setlists: L, bands: B, notifier: N) -> Self {
        Self {
            setlists,
            bands,
            notifier,
        }
    }

    /// Setlists of a band, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Forbidden`] for non-members, or a storage
    /// error.
    pub async fn list_for_band(
        &self,
        acting: UserId,
        band_id: BandId,
    ) -> Result<Vec<Setlist>, BandstandError> {
        authorize_band_role(&self.bands, acting, band_id, BandRole::ANY).await?;
        self.setlists.list_for_band(band_id).await
    }

    /// Look up a setlist of a band the acting user belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no setlist with `id` exists,
    /// [`BandstandError::Forbidden`] for non-members, or a storage error.
    pub async fn get_setlist(&self, acting: UserId, id: SetlistId) -> Result<Setlist, BandstandError> {
        self.find_authorized(acting, id, BandRole::ANY).await
    }

    /// Create a setlist.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Forbidden`] unless the creator is a band
    /// admin or leader, [`BandstandError::Validation`] when a song belongs to
    /// another band, or a storage error.
    pub async fn create_setlist(&self, setlist: Setlist) -> Result<Setlist, BandstandError> {
        authorize_band_role(
            &self.bands,
            setlist.created_by,
            setlist.band_id,
            BandRole::MANAGERS,
        )
        .await?;

        let created = self.setlists.create(setlist).await?;
        tracing::info!(
            setlist_id = %created.id,
            band_id = %created.band_id,
            songs = created.song_ids.len(),
            "setlist created"
        );
        announce(
            &self.notifier,
            created.band_id,
            NotificationKind::SetlistCreated,
            &created,
        )
        .await;
        Ok(created)
    }

    /// Replace the ordered song list.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no setlist with `id` exists,
    /// [`BandstandError::Forbidden`] unless the caller is a band admin or
    /// leader, [`BandstandError::Validation`] when a song belongs to another
    /// band, or a storage error.
    pub async fn replace_songs(
        &self,
        acting: UserId,
        id: SetlistId,
        song_ids: &[SongId],
    ) -> Result<Setlist, BandstandError> {
        self.find_authorized(acting, id, BandRole::MANAGERS).await?;

        let updated = self
            .setlists
            .replace_songs(id, song_ids)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(setlist_id = %id, songs = updated.song_ids.len(), "setlist songs replaced");
        announce(
            &self.notifier,
            updated.band_id,
            NotificationKind::SetlistUpdated,
            &updated,
        )
        .await;
        Ok(updated)
    }

    /// Delete a setlist.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no setlist with `id` exists,
    /// [`BandstandError::Forbidden`] unless the caller is a band admin or
    /// leader, or a storage error.
    pub async fn delete_setlist(&self, acting: UserId, id: SetlistId) -> Result<(), BandstandError> {
        let setlist = self.find_authorized(acting, id, BandRole::MANAGERS).await?;
        if !self.setlists.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(setlist_id = %id, band_id = %setlist.band_id, "setlist deleted");
        announce(
            &self.notifier,
            setlist.band_id,
            NotificationKind::SetlistDeleted,
            &SetlistDeleted {
                id,
                band_id: setlist.band_id,
            },
        )
        .await;
        Ok(())
    }

    async fn find_authorized(
        &self,
        acting: UserId,
        id: SetlistId,
        allowed: &[BandRole],
    ) -> Result<Setlist, BandstandError> {
        let setlist = self
            .setlists
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        authorize_band_role(&self.bands, acting, setlist.band_id, allowed).await?;
        Ok(setlist)
    }
}
