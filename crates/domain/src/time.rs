//! Time and timestamp helpers.

use chrono::{DateTime, NaiveDate, Utc};

/// UTC timestamp used for rehearsal windows, audit columns and session expiry.
pub type Timestamp = DateTime<Utc>;

/// Calendar date without a time of day (setlist event dates).
pub type Date = NaiveDate;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
