//! Column codecs shared by the repositories.
//!
//! Identifiers, labels and dates are stored as text and parsed back with
//! [`FromStr`]. Hydrated child lists arrive as JSON arrays built by
//! `json_group_array`.

use std::str::FromStr;

use chrono::SecondsFormat;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use bandstand_domain::time::Timestamp;

/// Render a timestamp so that lexical order matches chronological order.
pub(crate) fn timestamp(value: Timestamp) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn column_error(name: &str, err: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: name.to_string(),
        source: Box::new(err),
    }
}

/// Read a text column and parse it.
pub(crate) fn parsed<T>(row: &SqliteRow, name: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(name)?;
    raw.parse().map_err(|err| column_error(name, err))
}

/// Read a nullable text column and parse it when present.
pub(crate) fn parsed_opt<T>(row: &SqliteRow, name: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.try_get(name)?;
    raw.map(|value| value.parse())
        .transpose()
        .map_err(|err| column_error(name, err))
}

/// Read a JSON text column produced by `json_group_array`.
pub(crate) fn json<T: DeserializeOwned>(row: &SqliteRow, name: &str) -> Result<T, sqlx::Error> {
    let raw: String = row.try_get(name)?;
    serde_json::from_str(&raw).map_err(|err| column_error(name, err))
}
