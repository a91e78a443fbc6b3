//! Partial update of a rehearsal.

use crate::error::BandstandError;
use crate::id::SongId;
use crate::time::Timestamp;

use super::{Rehearsal, RehearsalSong, RehearsalStatus};

/// The fields a caller wants to change. `None` means "leave untouched".
///
/// `notes` is nullable in storage, so it carries two levels: `Some(None)`
/// clears the notes, `None` leaves them alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RehearsalChanges {
    pub title: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    pub notes: Option<Option<String>>,
    pub status: Option<RehearsalStatus>,
    /// Replaces the whole song list when present.
    pub song_ids: Option<Vec<SongId>>,
}

impl RehearsalChanges {
    /// Whether any rehearsal column is set (song list excluded).
    #[must_use]
    pub fn touches_columns(&self) -> bool {
        self.title.is_some()
            || self.location.is_some()
            || self.starts_at.is_some()
            || self.ends_at.is_some()
            || self.notes.is_some()
            || self.status.is_some()
    }

    /// Whether the change set asks for nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.touches_columns() && self.song_ids.is_none()
    }

    /// Replacement song rows, deduplicated, all at medium priority.
    #[must_use]
    pub fn replacement_songs(&self) -> Option<Vec<RehearsalSong>> {
        self.song_ids.as_deref().map(RehearsalSong::from_ids)
    }

    /// Preview `current` with these changes applied, for validation.
    #[must_use]
    pub fn apply_to(&self, current: &Rehearsal) -> Rehearsal {
        let mut next = current.clone();
        if let Some(title) = &self.title {
            next.title.clone_from(title);
        }
        if let Some(location) = &self.location {
            next.location.clone_from(location);
        }
        if let Some(starts_at) = self.starts_at {
            next.starts_at = starts_at;
        }
        if let Some(ends_at) = self.ends_at {
            next.ends_at = ends_at;
        }
        if let Some(notes) = &self.notes {
            next.notes.clone_from(notes);
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(songs) = self.replacement_songs() {
            next.songs = songs;
        }
        next
    }

    /// Validate the merged result against `current`.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] when the merged rehearsal breaks
    /// an invariant (blank title, end before start, …).
    pub fn validate_against(&self, current: &Rehearsal) -> Result<(), BandstandError> {
        self.apply_to(current).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::id::{BandId, UserId};
    use crate::rehearsal::SongPriority;
    use chrono::Duration;

    fn current() -> Rehearsal {
        let start = crate::time::now() + Duration::days(2);
        Rehearsal::builder()
            .band_id(BandId::new())
            .title("Set review")
            .location("Garage")
            .starts_at(start)
            .ends_at(start + Duration::hours(3))
            .notes("bring tuners")
            .created_by(UserId::new())
            .build()
            .unwrap()
    }

    #[test]
    fn should_report_empty_when_nothing_supplied() {
        let changes = RehearsalChanges::default();
        assert!(changes.is_empty());
        assert!(!changes.touches_columns());
    }

    #[test]
    fn should_not_be_empty_when_only_songs_supplied() {
        let changes = RehearsalChanges {
            song_ids: Some(vec![]),
            ..RehearsalChanges::default()
        };
        assert!(!changes.is_empty());
        assert!(!changes.touches_columns());
    }

    #[test]
    fn should_leave_absent_fields_untouched_when_applied() {
        let current = current();
        let changes = RehearsalChanges {
            title: Some("New title".to_string()),
            ..RehearsalChanges::default()
        };
        let next = changes.apply_to(&current);
        assert_eq!(next.title, "New title");
        assert_eq!(next.location, current.location);
        assert_eq!(next.notes, current.notes);
    }

    #[test]
    fn should_clear_notes_when_explicit_null_supplied() {
        let changes = RehearsalChanges {
            notes: Some(None),
            ..RehearsalChanges::default()
        };
        assert!(changes.apply_to(&current()).notes.is_none());
    }

    #[test]
    fn should_reject_end_moved_before_stored_start() {
        let current = current();
        let changes = RehearsalChanges {
            ends_at: Some(current.starts_at - Duration::minutes(1)),
            ..RehearsalChanges::default()
        };
        assert!(matches!(
            changes.validate_against(&current),
            Err(BandstandError::Validation(ValidationError::InvalidTimeRange))
        ));
    }

    #[test]
    fn should_replace_song_priorities_with_medium() {
        let song = crate::id::SongId::new();
        let mut current = current();
        current.songs = vec![RehearsalSong {
            song_id: song,
            priority: SongPriority::High,
        }];
        let changes = RehearsalChanges {
            song_ids: Some(vec![song]),
            ..RehearsalChanges::default()
        };
        assert_eq!(changes.apply_to(&current).songs, vec![RehearsalSong::medium(song)]);
    }
}
