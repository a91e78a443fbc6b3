//! Notification — a real-time message fanned out to a room.
//!
//! Every connected client joins `user:<id>` and one `band:<id>` room per
//! membership. A notification carries the event name and a JSON payload and
//! is delivered to everyone in its room.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::define_label_enum;
use crate::error::ValidationError;
use crate::id::{BandId, UserId};

/// A broadcast group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Room {
    Band(BandId),
    User(UserId),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Band(id) => write!(f, "band:{id}"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

impl FromStr for Room {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::UnknownValue {
            kind: "room",
            value: s.to_string(),
        };
        let (prefix, id) = s.split_once(':').ok_or_else(invalid)?;
        match prefix {
            "band" => id.parse().map(Self::Band).map_err(|_| invalid()),
            "user" => id.parse().map(Self::User).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl Serialize for Room {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Room {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

define_label_enum!(
    /// Event names understood by clients.
    NotificationKind("event") {
        RehearsalCreated => "rehearsal:created",
        RehearsalUpdated => "rehearsal:updated",
        RehearsalDeleted => "rehearsal:deleted",
        RehearsalRsvp => "rehearsal:rsvp",
        SongCreated => "song:created",
        SongUpdated => "song:updated",
        SongDeleted => "song:deleted",
        SetlistCreated => "setlist:created",
        SetlistUpdated => "setlist:updated",
        SetlistDeleted => "setlist:deleted",
    }
);

impl NotificationKind {
    /// Events a connected client may push for relay to its band room.
    #[must_use]
    pub fn is_client_rebroadcastable(self) -> bool {
        matches!(
            self,
            Self::RehearsalCreated
                | Self::RehearsalUpdated
                | Self::RehearsalDeleted
                | Self::RehearsalRsvp
                | Self::SongCreated
                | Self::SongUpdated
        )
    }
}

/// One message addressed to one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub room: Room,
    pub event: NotificationKind,
    pub data: serde_json::Value,
}

impl Notification {
    /// Build a notification whose payload is `data` serialized to JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error when `data` cannot be represented as JSON.
    pub fn new(
        room: Room,
        event: NotificationKind,
        data: &impl Serialize,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            room,
            event,
            data: serde_json::to_value(data)?,
        })
    }

    /// Shorthand for a notification to a band room.
    ///
    /// # Errors
    ///
    /// See [`Notification::new`].
    pub fn to_band(
        band_id: BandId,
        event: NotificationKind,
        data: &impl Serialize,
    ) -> Result<Self, serde_json::Error> {
        Self::new(Room::Band(band_id), event, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_format_room_with_prefix() {
        let band_id = BandId::new();
        assert_eq!(Room::Band(band_id).to_string(), format!("band:{band_id}"));
    }

    #[test]
    fn should_parse_room_back_from_its_label() {
        let room = Room::User(UserId::new());
        assert_eq!(room.to_string().parse::<Room>().unwrap(), room);
    }

    #[test]
    fn should_reject_unknown_room_prefix() {
        assert!("team:abc".parse::<Room>().is_err());
        assert!("band:not-a-uuid".parse::<Room>().is_err());
        assert!("band".parse::<Room>().is_err());
    }

    #[test]
    fn should_only_allow_rehearsal_and_song_upserts_from_clients() {
        assert!(NotificationKind::RehearsalRsvp.is_client_rebroadcastable());
        assert!(NotificationKind::SongUpdated.is_client_rebroadcastable());
        assert!(!NotificationKind::SongDeleted.is_client_rebroadcastable());
        assert!(!NotificationKind::SetlistCreated.is_client_rebroadcastable());
    }

    #[test]
    fn should_serialize_notification_as_event_room_data() {
        let band_id = BandId::new();
        let notification = Notification::to_band(
            band_id,
            NotificationKind::RehearsalDeleted,
            &serde_json::json!({ "id": "r1" }),
        )
        .unwrap();
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["event"], "rehearsal:deleted");
        assert_eq!(json["room"], format!("band:{band_id}"));
        assert_eq!(json["data"]["id"], "r1");
    }
}
