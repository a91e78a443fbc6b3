//! Setlist — an ordered selection of a band's songs for a gig.

use serde::{Deserialize, Serialize};

use crate::error::{BandstandError, ValidationError};
use crate::id::{BandId, SetlistId, SongId, UserId};
use crate::time::{Date, Timestamp, now};

/// An ordered list of songs. Position is the index in `song_ids`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setlist {
    pub id: SetlistId,
    pub band_id: BandId,
    pub name: String,
    pub description: Option<String>,
    pub event_date: Option<Date>,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub song_ids: Vec<SongId>,
}

impl Setlist {
    /// Start a new setlist for `band_id`.
    ///
    /// Repeated song ids keep their first position only.
    ///
    /// # Errors
    ///
    /// Returns [`BandstandError::Validation`] when `name` is blank.
    pub fn new(
        band_id: BandId,
        name: impl Into<String>,
        created_by: UserId,
        song_ids: &[SongId],
    ) -> Result<Self, BandstandError> {
        let setlist = Self {
            id: SetlistId::new(),
            band_id,
            name: name.into(),
            description: None,
            event_date: None,
            created_by,
            created_at: now(),
            song_ids: distinct(song_ids),
        };
        if setlist.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name").into());
        }
        Ok(setlist)
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn with_event_date(mut self, event_date: Option<Date>) -> Self {
        self.event_date = event_date;
        self
    }
}

/// Drop repeated ids while keeping the order of first appearance.
#[must_use]
pub fn distinct<T: Copy + Eq + std::hash::Hash>(ids: &[T]) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_keep_first_position_of_repeated_song() {
        let (a, b) = (SongId::new(), SongId::new());
        let setlist = Setlist::new(BandId::new(), "Friday gig", UserId::new(), &[a, b, a]).unwrap();
        assert_eq!(setlist.song_ids, vec![a, b]);
    }

    #[test]
    fn should_reject_blank_name() {
        let result = Setlist::new(BandId::new(), "", UserId::new(), &[]);
        assert!(matches!(
            result,
            Err(BandstandError::Validation(ValidationError::EmptyField("name")))
        ));
    }

    #[test]
    fn should_serialize_event_date_as_iso_date() {
        let date = Date::from_ymd_opt(2026, 11, 20).unwrap();
        let setlist = Setlist::new(BandId::new(), "Gig", UserId::new(), &[])
            .unwrap()
            .with_event_date(Some(date));
        let json = serde_json::to_value(&setlist).unwrap();
        assert_eq!(json["eventDate"], "2026-11-20");
    }
}
