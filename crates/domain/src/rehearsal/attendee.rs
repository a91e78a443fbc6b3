//! Attendee — one member's RSVP and recorded attendance for one rehearsal.

use serde::{Deserialize, Serialize};

use crate::define_label_enum;
use crate::id::UserId;

define_label_enum!(
    /// A member's stated intent to attend.
    RsvpStatus("RSVP status") {
        Confirmed => "confirmed",
        Declined => "declined",
        Maybe => "maybe",
        NoResponse => "no_response",
    }
);

impl Default for RsvpStatus {
    fn default() -> Self {
        Self::NoResponse
    }
}

define_label_enum!(
    /// What actually happened, recorded after the fact.
    AttendanceOutcome("attendance") {
        Present => "present",
        Absent => "absent",
        Late => "late",
    }
);

/// Per-rehearsal, per-user attendance row.
///
/// RSVP and actual attendance are independent: a member who declined can
/// still be recorded as present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub user_id: UserId,
    pub status: RsvpStatus,
    pub actual_attendance: Option<AttendanceOutcome>,
}

impl Attendee {
    /// A freshly seeded row: no response, nothing recorded.
    #[must_use]
    pub fn seeded(user_id: UserId) -> Self {
        Self {
            user_id,
            status: RsvpStatus::NoResponse,
            actual_attendance: None,
        }
    }
}

/// One entry of an attendance batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub user_id: UserId,
    pub attendance: AttendanceOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_seed_attendee_without_response() {
        let attendee = Attendee::seeded(UserId::new());
        assert_eq!(attendee.status, RsvpStatus::NoResponse);
        assert!(attendee.actual_attendance.is_none());
    }

    #[test]
    fn should_use_snake_case_label_for_no_response() {
        let json = serde_json::to_string(&RsvpStatus::NoResponse).unwrap();
        assert_eq!(json, "\"no_response\"");
    }

    #[test]
    fn should_parse_attendance_record_from_client_json() {
        let user_id = UserId::new();
        let record: AttendanceRecord = serde_json::from_value(serde_json::json!({
            "userId": user_id,
            "attendance": "late",
        }))
        .unwrap();
        assert_eq!(record.user_id, user_id);
        assert_eq!(record.attendance, AttendanceOutcome::Late);
    }
}
