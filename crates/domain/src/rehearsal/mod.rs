//! Rehearsal — a scheduled band session with attendees and a song plan.
//!
//! A rehearsal is always read **hydrated**: its [`Attendee`] rows and
//! [`RehearsalSong`] rows travel with it. A rehearsal without children has
//! empty lists, never placeholder entries.

mod attendee;
mod changes;

pub use attendee::{AttendanceOutcome, AttendanceRecord, Attendee, RsvpStatus};
pub use changes::RehearsalChanges;

use serde::{Deserialize, Serialize};

use crate::define_label_enum;
use crate::error::{BandstandError, ValidationError};
use crate::id::{BandId, RehearsalId, SongId, UserId};
use crate::time::{Timestamp, now};

define_label_enum!(
    /// Lifecycle status. Transitions are not restricted.
    RehearsalStatus("rehearsal status") {
        Scheduled => "scheduled",
        Cancelled => "cancelled",
        Completed => "completed",
    }
);

define_label_enum!(
    /// How urgently a song should be worked on during a rehearsal.
    SongPriority("song priority") {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
);

/// A song planned for a rehearsal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalSong {
    pub song_id: SongId,
    pub priority: SongPriority,
}

impl RehearsalSong {
    /// Songs attached through create/update always start at medium priority.
    #[must_use]
    pub fn medium(song_id: SongId) -> Self {
        Self {
            song_id,
            priority: SongPriority::Medium,
        }
    }

    /// Turn a client-supplied id list into song rows, dropping repeats.
    #[must_use]
    pub fn from_ids(song_ids: &[SongId]) -> Vec<Self> {
        let mut seen = std::collections::HashSet::new();
        song_ids
            .iter()
            .filter(|id| seen.insert(**id))
            .copied()
            .map(Self::medium)
            .collect()
    }
}

/// A rehearsal with its attendee and song lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rehearsal {
    pub id: RehearsalId,
    pub band_id: BandId,
    pub title: String,
    pub location: String,
    #[serde(rename = "startDateTime")]
    pub starts_at: Timestamp,
    #[serde(rename = "endDateTime")]
    pub ends_at: Timestamp,
    pub status: RehearsalStatus,
    pub notes: Option<String>,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub attendees: Vec<Attendee>,
    pub songs: Vec<RehearsalSong>,
}

impl Rehearsal {
    /// Create a builder for constructing a new [`Rehearsal`].
    #[must_use]
    pub fn builder() -> RehearsalBuilder {
        RehearsalBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] when `title` or `location` is
    /// blank, or when the start is not strictly before the end.
    pub fn validate(&self) -> Result<(), BandstandError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title").into());
        }
        if self.location.trim().is_empty() {
            return Err(ValidationError::EmptyField("location").into());
        }
        if self.starts_at >= self.ends_at {
            return Err(ValidationError::InvalidTimeRange.into());
        }
        Ok(())
    }

    /// Look up the attendee row for `user_id`.
    #[must_use]
    pub fn attendee(&self, user_id: UserId) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.user_id == user_id)
    }
}

/// A rehearsal as listed on a member's upcoming schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingRehearsal {
    #[serde(flatten)]
    pub rehearsal: Rehearsal,
    pub band_name: String,
}

/// Step-by-step builder for a new [`Rehearsal`].
///
/// The built rehearsal has no attendees yet (the store seeds them from the
/// band roster) and one medium-priority song row per distinct song id.
#[derive(Debug, Default)]
pub struct RehearsalBuilder {
    id: Option<RehearsalId>,
    band_id: Option<BandId>,
    title: Option<String>,
    location: Option<String>,
    starts_at: Option<Timestamp>,
    ends_at: Option<Timestamp>,
    notes: Option<String>,
    created_by: Option<UserId>,
    song_ids: Vec<SongId>,
}

impl RehearsalBuilder {
    #[must_use]
    pub fn id(mut self, id: RehearsalId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn band_id(mut self, band_id: BandId) -> Self {
        self.band_id = Some(band_id);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn starts_at(mut self, starts_at: Timestamp) -> Self {
        self.starts_at = Some(starts_at);
        self
    }

    #[must_use]
    pub fn ends_at(mut self, ends_at: Timestamp) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn created_by(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }

    #[must_use]
    pub fn song_ids(mut self, song_ids: impl IntoIterator<Item = SongId>) -> Self {
        self.song_ids = song_ids.into_iter().collect();
        self
    }

    /// Consume the builder, validate, and return a [`Rehearsal`].
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] if a required field is missing
    /// or an invariant of [`Rehearsal::validate`] fails.
    pub fn build(self) -> Result<Rehearsal, BandstandError> {
        let ts = now();
        let rehearsal = Rehearsal {
            id: self.id.unwrap_or_default(),
            band_id: self.band_id.ok_or(ValidationError::MissingField("bandId"))?,
            title: self.title.ok_or(ValidationError::MissingField("title"))?,
            location: self
                .location
                .ok_or(ValidationError::MissingField("location"))?,
            starts_at: self
                .starts_at
                .ok_or(ValidationError::MissingField("startDateTime"))?,
            ends_at: self
                .ends_at
                .ok_or(ValidationError::MissingField("endDateTime"))?,
            status: RehearsalStatus::Scheduled,
            notes: self.notes,
            created_by: self
                .created_by
                .ok_or(ValidationError::MissingField("createdBy"))?,
            created_at: ts,
            updated_at: ts,
            attendees: Vec::new(),
            songs: RehearsalSong::from_ids(&self.song_ids),
        };
        rehearsal.validate()?;
        Ok(rehearsal)
    }
}
