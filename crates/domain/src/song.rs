//! Song — an entry in a band's repertoire, with attached resources.

use serde::{Deserialize, Serialize};

use crate::define_label_enum;
use crate::error::{BandstandError, ValidationError};
use crate::id::{BandId, SongId, SongResourceId, UserId};
use crate::time::{Timestamp, now};

define_label_enum!(
    /// How far along the band is with a song.
    SongStatus("song status") {
        New => "new",
        InProgress => "in_progress",
        PerformanceReady => "performance_ready",
    }
);

define_label_enum!(
    /// Kind of material attached to a song.
    ResourceType("resource type") {
        ChordChart => "chord_chart",
        Lyrics => "lyrics",
        Recording => "recording",
        Other => "other",
    }
);

/// A song with its hydrated resource list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: SongId,
    pub band_id: BandId,
    pub title: String,
    pub artist: Option<String>,
    pub status: SongStatus,
    pub notes: Option<String>,
    pub added_by: UserId,
    pub added_at: Timestamp,
    pub resources: Vec<SongResource>,
}

impl Song {
    /// Create a builder for constructing a [`Song`].
    #[must_use]
    pub fn builder() -> SongBuilder {
        SongBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] when `title` is blank.
    pub fn validate(&self) -> Result<(), BandstandError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title").into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Song`].
#[derive(Debug, Default)]
pub struct SongBuilder {
    id: Option<SongId>,
    band_id: Option<BandId>,
    title: Option<String>,
    artist: Option<String>,
    status: Option<SongStatus>,
    notes: Option<String>,
    added_by: Option<UserId>,
}

impl SongBuilder {
    #[must_use]
    pub fn id(mut self, id: SongId) -> Self {
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
    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: SongStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn added_by(mut self, user_id: UserId) -> Self {
        self.added_by = Some(user_id);
        self
    }

    /// Consume the builder, validate, and return a [`Song`].
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] if the band, title or author is
    /// missing, or the title is blank.
    pub fn build(self) -> Result<Song, BandstandError> {
        let song = Song {
            id: self.id.unwrap_or_default(),
            band_id: self.band_id.ok_or(ValidationError::MissingField("bandId"))?,
            title: self.title.ok_or(ValidationError::MissingField("title"))?,
            artist: self.artist,
            status: self.status.unwrap_or(SongStatus::New),
            notes: self.notes,
            added_by: self
                .added_by
                .ok_or(ValidationError::MissingField("addedBy"))?,
            added_at: now(),
            resources: Vec::new(),
        };
        song.validate()?;
        Ok(song)
    }
}

/// Partial update of a song. `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongChanges {
    pub title: Option<String>,
    pub artist: Option<Option<String>>,
    pub status: Option<SongStatus>,
    pub notes: Option<Option<String>>,
}

impl SongChanges {
    /// Whether the change set asks for nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.artist.is_none() && self.status.is_none() && self.notes.is_none()
    }

    /// Validate the supplied fields.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] when a new title is blank.
    pub fn validate(&self) -> Result<(), BandstandError> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ValidationError::EmptyField("title").into());
        }
        Ok(())
    }

    /// `current` with these changes applied.
    #[must_use]
    pub fn apply_to(&self, current: &Song) -> Song {
        let mut next = current.clone();
        if let Some(title) = &self.title {
            next.title.clone_from(title);
        }
        if let Some(artist) = &self.artist {
            next.artist.clone_from(artist);
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(notes) = &self.notes {
            next.notes.clone_from(notes);
        }
        next
    }
}

/// A file attached to a song (chart, lyrics, recording, …).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongResource {
    pub id: SongResourceId,
    pub song_id: SongId,
    pub resource_type: ResourceType,
    pub file_url: String,
    pub description: Option<String>,
    pub uploaded_by: UserId,
    pub uploaded_at: Timestamp,
}

impl SongResource {
    /// Build a new resource for `song_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] when `file_url` is blank.
    pub fn new(
        song_id: SongId,
        resource_type: ResourceType,
        file_url: impl Into<String>,
        description: Option<String>,
        uploaded_by: UserId,
    ) -> Result<Self, BandstandError> {
        let file_url = file_url.into();
        if file_url.trim().is_empty() {
            return Err(ValidationError::EmptyField("fileUrl").into());
        }
        Ok(Self {
            id: SongResourceId::new(),
            song_id,
            resource_type,
            file_url,
            description,
            uploaded_by,
            uploaded_at: now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_status_to_new() {
        let song = Song::builder()
            .band_id(BandId::new())
            .title("Blue in Green")
            .added_by(UserId::new())
            .build()
            .unwrap();
        assert_eq!(song.status, SongStatus::New);
        assert!(song.resources.is_empty());
    }

    #[test]
    fn should_reject_blank_title() {
        let result = Song::builder()
            .band_id(BandId::new())
            .title("   ")
            .added_by(UserId::new())
            .build();
        assert!(matches!(
            result,
            Err(BandstandError::Validation(ValidationError::EmptyField("title")))
        ));
    }

    #[test]
    fn should_report_empty_changes() {
        assert!(SongChanges::default().is_empty());
        let changes = SongChanges {
            artist: Some(None),
            ..SongChanges::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn should_clear_artist_and_keep_title_when_applied() {
        let song = Song::builder()
            .band_id(BandId::new())
            .title("So What")
            .artist("Miles Davis")
            .added_by(UserId::new())
            .build()
            .unwrap();
        let changes = SongChanges {
            artist: Some(None),
            status: Some(SongStatus::InProgress),
            ..SongChanges::default()
        };
        let next = changes.apply_to(&song);
        assert_eq!(next.title, "So What");
        assert!(next.artist.is_none());
        assert_eq!(next.status, SongStatus::InProgress);
    }

    #[test]
    fn should_reject_resource_without_url() {
        let result = SongResource::new(
            SongId::new(),
            ResourceType::Lyrics,
            "",
            None,
            UserId::new(),
        );
        assert!(matches!(
            result,
            Err(BandstandError::Validation(ValidationError::EmptyField("fileUrl")))
        ));
    }

    #[test]
    fn should_use_snake_case_labels_for_status() {
        assert_eq!(SongStatus::PerformanceReady.as_str(), "performance_ready");
        assert_eq!(
            "chord_chart".parse::<ResourceType>().unwrap(),
            ResourceType::ChordChart
        );
    }
}
