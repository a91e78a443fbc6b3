//! Rehearsal service — scheduling, RSVPs and attendance.
//!
//! Every operation runs the band role gate against the rehearsal's band
//! before touching the store, and every successful mutation is announced to
//! the band's room.

use serde::Serialize;

use bandstand_domain::band::BandRole;
use bandstand_domain::error::{BandstandError, NotFoundError};
use bandstand_domain::id::{BandId, RehearsalId, UserId};
use bandstand_domain::notification::NotificationKind;
use bandstand_domain::rehearsal::{
    AttendanceRecord, Rehearsal, RehearsalChanges, RsvpStatus, UpcomingRehearsal,
};
use bandstand_domain::time::now;

use crate::ports::{BandRepository, Notifier, RehearsalRepository};
use crate::services::access::authorize_band_role;
use crate::services::announce::announce;

/// Payload of `rehearsal:deleted`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalDeleted {
    pub id: RehearsalId,
    pub band_id: BandId,
}

/// Payload of `rehearsal:rsvp`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpChanged {
    pub rehearsal_id: RehearsalId,
    pub user_id: UserId,
    pub status: RsvpStatus,
    pub band_id: BandId,
}

fn not_found(id: RehearsalId) -> BandstandError {
    NotFoundError {
        entity: "Rehearsal",
        id: id.to_string(),
    }
    .into()
}

/// Application service for the rehearsal lifecycle.
pub struct RehearsalService<R, B, N> {
    rehearsals: R,
    bands: B,
    notifier: N,
}

impl<R, B, N> RehearsalService<R, B, N>
where
    R: RehearsalRepository,
    B: BandRepository,
    N: Notifier,
{
    /// Create a new service backed by the given repositories and notifier.
    pub fn new(rehearsals: R, bands: B, notifier: N) -> Self {
        Self {
            rehearsals,
            bands,
            notifier,
        }
    }

    /// Schedule a rehearsal. Every current band member is invited with
    /// `no_response`.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] if invariants fail or a song
    /// belongs to another band, [`BandstandError::Forbidden`] unless the
    /// creator is a band admin or leader, or a storage error.
    pub async fn create_rehearsal(&self, rehearsal: Rehearsal) -> Result<Rehearsal, BandstandError> {
        rehearsal.validate()?;
        authorize_band_role(
            &self.bands,
            rehearsal.created_by,
            rehearsal.band_id,
            BandRole::MANAGERS,
        )
        .await?;

        let created = self.rehearsals.create(rehearsal).await?;
        tracing::info!(
            rehearsal_id = %created.id,
            band_id = %created.band_id,
            attendees = created.attendees.len(),
            songs = created.songs.len(),
            "rehearsal created"
        );
        announce(
            &self.notifier,
            created.band_id,
            NotificationKind::RehearsalCreated,
            &created,
        )
        .await;
        Ok(created)
    }

    /// Look up a rehearsal of a band the acting user belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no rehearsal with `id`
    /// exists, [`BandstandError::Forbidden`] for non-members, or a storage
    /// error.
    pub async fn get_rehearsal(
        &self,
        acting: UserId,
        id: RehearsalId,
    ) -> Result<Rehearsal, BandstandError> {
        let rehearsal = self
            .rehearsals
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        authorize_band_role(&self.bands, acting, rehearsal.band_id, BandRole::ANY).await?;
        Ok(rehearsal)
    }

    /// All rehearsals of a band, ordered by start.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Forbidden`] for non-members, or a storage
    /// error.
    pub async fn list_for_band(
        &self,
        acting: UserId,
        band_id: BandId,
    ) -> Result<Vec<Rehearsal>, BandstandError> {
        authorize_band_role(&self.bands, acting, band_id, BandRole::ANY).await?;
        self.rehearsals.list_for_band(band_id).await
    }

    /// Scheduled rehearsals starting after now, across all of the user's bands.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_upcoming(
        &self,
        acting: UserId,
    ) -> Result<Vec<UpcomingRehearsal>, BandstandError> {
        self.rehearsals.list_upcoming_for_user(acting, now()).await
    }

    /// Apply a partial update.
    ///
    /// An empty change set returns the current rehearsal untouched: nothing
    /// is written and nothing is announced.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no rehearsal with `id`
    /// exists, [`BandstandError::Forbidden`] unless the caller is a band
    /// admin or leader, [`BandstandError::Validation`] when the merged
    /// rehearsal breaks an invariant, or a storage error.
    pub async fn update_rehearsal(
        &self,
        acting: UserId,
        id: RehearsalId,
        changes: RehearsalChanges,
    ) -> Result<Rehearsal, BandstandError> {
        let current = self
            .rehearsals
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        authorize_band_role(&self.bands, acting, current.band_id, BandRole::MANAGERS).await?;

        if changes.is_empty() {
            tracing::debug!(rehearsal_id = %id, "empty change set, nothing to update");
            return Ok(current);
        }
        changes.validate_against(&current)?;

        let updated = self
            .rehearsals
            .update(id, &changes, now())
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(
            rehearsal_id = %id,
            songs_replaced = changes.song_ids.is_some(),
            "rehearsal updated"
        );
        announce(
            &self.notifier,
            updated.band_id,
            NotificationKind::RehearsalUpdated,
            &updated,
        )
        .await;
        Ok(updated)
    }

    /// Delete a rehearsal with its attendee and song rows.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no rehearsal with `id`
    /// exists, [`BandstandError::Forbidden`] unless the caller is a band
    /// admin or leader, or a storage error.
    pub async fn delete_rehearsal(
        &self,
        acting: UserId,
        id: RehearsalId,
    ) -> Result<(), BandstandError> {
        let band_id = self
            .rehearsals
            .band_of(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        authorize_band_role(&self.bands, acting, band_id, BandRole::MANAGERS).await?;

        if !self.rehearsals.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(rehearsal_id = %id, %band_id, "rehearsal deleted");
        announce(
            &self.notifier,
            band_id,
            NotificationKind::RehearsalDeleted,
            &RehearsalDeleted { id, band_id },
        )
        .await;
        Ok(())
    }

    /// Record the acting user's RSVP.
    ///
    /// Returns whether an attendee row changed. A member who joined the band
    /// after the rehearsal was created has no row, and nothing happens.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no rehearsal with `id`
    /// exists, [`BandstandError::Forbidden`] for non-members, or a storage
    /// error.
    pub async fn set_rsvp(
        &self,
        acting: UserId,
        id: RehearsalId,
        status: RsvpStatus,
    ) -> Result<bool, BandstandError> {
        let band_id = self
            .rehearsals
            .band_of(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        authorize_band_role(&self.bands, acting, band_id, BandRole::ANY).await?;

        let changed = self.rehearsals.set_rsvp(id, acting, status).await?;
        if !changed {
            tracing::debug!(rehearsal_id = %id, user_id = %acting, "no attendee row, RSVP ignored");
            return Ok(false);
        }
        tracing::info!(rehearsal_id = %id, user_id = %acting, %status, "RSVP recorded");
        announce(
            &self.notifier,
            band_id,
            NotificationKind::RehearsalRsvp,
            &RsvpChanged {
                rehearsal_id: id,
                user_id: acting,
                status,
                band_id,
            },
        )
        .await;
        Ok(true)
    }

    /// Record actual attendance for a batch of members.
    ///
    /// Records for users without an attendee row are ignored. Returns the
    /// number of rows updated.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::NotFound`] when no rehearsal with `id`
    /// exists, [`BandstandError::Forbidden`] unless the caller is a band
    /// admin or leader, or a storage error.
    pub async fn record_attendance(
        &self,
        acting: UserId,
        id: RehearsalId,
        records: &[AttendanceRecord],
    ) -> Result<usize, BandstandError> {
        let band_id = self
            .rehearsals
            .band_of(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        authorize_band_role(&self.bands, acting, band_id, BandRole::MANAGERS).await?;

        let updated = self.rehearsals.set_attendance(id, records).await?;
        tracing::info!(
            rehearsal_id = %id,
            submitted = records.len(),
            updated,
            "attendance recorded"
        );
        Ok(updated)
    }
}
