//! `SQLite` implementation of [`RehearsalRepository`].
//!
//! Rehearsals are always read hydrated: attendee and song rows are folded
//! into JSON arrays by correlated subqueries, so a rehearsal without
//! children comes back with `[]` rather than placeholder entries.

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use bandstand_app::ports::RehearsalRepository;
use bandstand_domain::error::{BandstandError, ValidationError};
use bandstand_domain::id::{BandId, RehearsalId, UserId};
use bandstand_domain::rehearsal::{
    AttendanceRecord, Rehearsal, RehearsalChanges, RehearsalSong, RehearsalStatus, RsvpStatus,
    UpcomingRehearsal,
};
use bandstand_domain::time::Timestamp;

use crate::codec::{json, parsed, timestamp};
use crate::error::StorageError;

/// Wrapper for converting hydrated rows into domain [`Rehearsal`].
struct Wrapper(Rehearsal);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Rehearsal> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Rehearsal {
            id: parsed(row, "id")?,
            band_id: parsed(row, "band_id")?,
            title: row.try_get("title")?,
            location: row.try_get("location")?,
            starts_at: parsed(row, "start_datetime")?,
            ends_at: parsed(row, "end_datetime")?,
            status: parsed(row, "status")?,
            notes: row.try_get("notes")?,
            created_by: parsed(row, "created_by")?,
            created_at: parsed(row, "created_at")?,
            updated_at: parsed(row, "updated_at")?,
            attendees: json(row, "attendees")?,
            songs: json(row, "songs")?,
        }))
    }
}

/// A hydrated rehearsal plus the name of its band.
struct UpcomingWrapper(UpcomingRehearsal);

impl<'r> FromRow<'r, SqliteRow> for UpcomingWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let Wrapper(rehearsal) = Wrapper::from_row(row)?;
        Ok(Self(UpcomingRehearsal {
            rehearsal,
            band_name: row.try_get("band_name")?,
        }))
    }
}

macro_rules! hydrated_columns {
    () => {
        "r.id, r.band_id, r.title, r.location, r.start_datetime, r.end_datetime, r.status, \
         r.notes, r.created_by, r.created_at, r.updated_at, \
         (SELECT json_group_array(json_object('userId', ra.user_id, 'status', ra.status, \
                 'actualAttendance', ra.actual_attendance) ORDER BY ra.rowid) \
            FROM rehearsal_attendance ra WHERE ra.rehearsal_id = r.id) AS attendees, \
         (SELECT json_group_array(json_object('songId', rs.song_id, 'priority', rs.priority) \
                 ORDER BY rs.position) \
            FROM rehearsal_songs rs WHERE rs.rehearsal_id = r.id) AS songs"
    };
}

const SELECT_BY_ID: &str = concat!("SELECT ", hydrated_columns!(), " FROM rehearsals r WHERE r.id = ?");
const SELECT_FOR_BAND: &str = concat!(
    "SELECT ",
    hydrated_columns!(),
    " FROM rehearsals r WHERE r.band_id = ? ORDER BY r.start_datetime"
);
const SELECT_UPCOMING: &str = concat!(
    "SELECT ",
    hydrated_columns!(),
    ", b.name AS band_name FROM rehearsals r \
     JOIN bands b ON b.id = r.band_id \
     JOIN band_members bm ON bm.band_id = r.band_id \
     WHERE bm.user_id = ? AND r.status = 'scheduled' AND r.start_datetime > ? \
     ORDER BY r.start_datetime"
);

const INSERT: &str = "INSERT INTO rehearsals (id, band_id, title, location, start_datetime, end_datetime, status, notes, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
const SEED_ATTENDEES: &str = "INSERT INTO rehearsal_attendance (rehearsal_id, user_id, status) SELECT ?, user_id, 'no_response' FROM band_members WHERE band_id = ? ORDER BY joined_at, rowid";
const INSERT_SONG: &str = "INSERT INTO rehearsal_songs (rehearsal_id, song_id, priority, position) SELECT ?, id, ?, ? FROM songs WHERE id = ? AND band_id = ?";
const DELETE_SONGS: &str = "DELETE FROM rehearsal_songs WHERE rehearsal_id = ?";
const UPDATE: &str = "UPDATE rehearsals SET \
     title = CASE WHEN ? THEN ? ELSE title END, \
     location = CASE WHEN ? THEN ? ELSE location END, \
     start_datetime = CASE WHEN ? THEN ? ELSE start_datetime END, \
     end_datetime = CASE WHEN ? THEN ? ELSE end_datetime END, \
     notes = CASE WHEN ? THEN ? ELSE notes END, \
     status = CASE WHEN ? THEN ? ELSE status END, \
     updated_at = ? \
     WHERE id = ?";
const SELECT_BAND_ID: &str = "SELECT band_id FROM rehearsals WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM rehearsals WHERE id = ?";
const UPDATE_RSVP: &str =
    "UPDATE rehearsal_attendance SET status = ? WHERE rehearsal_id = ? AND user_id = ?";
const UPDATE_ATTENDANCE: &str =
    "UPDATE rehearsal_attendance SET actual_attendance = ? WHERE rehearsal_id = ? AND user_id = ?";

/// Insert planned songs in order, refusing songs of another band.
async fn insert_songs(
    conn: &mut SqliteConnection,
    rehearsal_id: RehearsalId,
    band_id: BandId,
    songs: &[RehearsalSong],
) -> Result<(), BandstandError> {
    let mut position: i64 = 0;
    for song in songs {
        let result = sqlx::query(INSERT_SONG)
            .bind(rehearsal_id.to_string())
            .bind(song.priority.as_str())
            .bind(position)
            .bind(song.song_id.to_string())
            .bind(band_id.to_string())
            .execute(&mut *conn)
            .await
            .map_err(StorageError::from)?;
        if result.rows_affected() != 1 {
            return Err(ValidationError::SongNotInBand {
                song_id: song.song_id,
                band_id,
            }
            .into());
        }
        position += 1;
    }
    Ok(())
}

async fn band_of(conn: &mut SqliteConnection, id: RehearsalId) -> Result<Option<BandId>, BandstandError> {
    let row = sqlx::query(SELECT_BAND_ID)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::from)?;
    let band_id = row
        .map(|row| parsed(&row, "band_id"))
        .transpose()
        .map_err(StorageError::from)?;
    Ok(band_id)
}

/// `SQLite`-backed rehearsal repository.
pub struct SqliteRehearsalRepository {
    pool: SqlitePool,
}

impl SqliteRehearsalRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RehearsalRepository for SqliteRehearsalRepository {
    /// Insert the rehearsal, one `no_response` attendee per current band
    /// member and the planned songs, all in one transaction.
    fn create(
        &self,
        rehearsal: Rehearsal,
    ) -> impl Future<Output = Result<Rehearsal, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;

            sqlx::query(INSERT)
                .bind(rehearsal.id.to_string())
                .bind(rehearsal.band_id.to_string())
                .bind(&rehearsal.title)
                .bind(&rehearsal.location)
                .bind(timestamp(rehearsal.starts_at))
                .bind(timestamp(rehearsal.ends_at))
                .bind(rehearsal.status.as_str())
                .bind(&rehearsal.notes)
                .bind(rehearsal.created_by.to_string())
                .bind(timestamp(rehearsal.created_at))
                .bind(timestamp(rehearsal.updated_at))
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            sqlx::query(SEED_ATTENDEES)
                .bind(rehearsal.id.to_string())
                .bind(rehearsal.band_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            insert_songs(&mut tx, rehearsal.id, rehearsal.band_id, &rehearsal.songs).await?;

            let created: Wrapper = sqlx::query_as(SELECT_BY_ID)
                .bind(rehearsal.id.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(created.0)
        }
    }

    fn get_by_id(
        &self,
        id: RehearsalId,
    ) -> impl Future<Output = Result<Option<Rehearsal>, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn list_for_band(
        &self,
        band_id: BandId,
    ) -> impl Future<Output = Result<Vec<Rehearsal>, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_FOR_BAND)
                .bind(band_id.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn list_upcoming_for_user(
        &self,
        user_id: UserId,
        after: Timestamp,
    ) -> impl Future<Output = Result<Vec<UpcomingRehearsal>, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<UpcomingWrapper> = sqlx::query_as(SELECT_UPCOMING)
                .bind(user_id.to_string())
                .bind(timestamp(after))
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    /// Apply the supplied columns and, when present, replace the song list
    /// at medium priority. Absent fields keep their stored values.
    fn update(
        &self,
        id: RehearsalId,
        changes: &RehearsalChanges,
        updated_at: Timestamp,
    ) -> impl Future<Output = Result<Option<Rehearsal>, BandstandError>> + Send {
        let pool = self.pool.clone();
        let changes = changes.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            let Some(band_id) = band_of(&mut tx, id).await? else {
                return Ok(None);
            };

            sqlx::query(UPDATE)
                .bind(changes.title.is_some())
                .bind(changes.title.as_deref())
                .bind(changes.location.is_some())
                .bind(changes.location.as_deref())
                .bind(changes.starts_at.is_some())
                .bind(changes.starts_at.map(timestamp))
                .bind(changes.ends_at.is_some())
                .bind(changes.ends_at.map(timestamp))
                .bind(changes.notes.is_some())
                .bind(changes.notes.clone().flatten())
                .bind(changes.status.is_some())
                .bind(changes.status.map(RehearsalStatus::as_str))
                .bind(timestamp(updated_at))
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            if let Some(songs) = changes.replacement_songs() {
                sqlx::query(DELETE_SONGS)
                    .bind(id.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(StorageError::from)?;
                insert_songs(&mut tx, id, band_id, &songs).await?;
            }

            let updated: Wrapper = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(Some(updated.0))
        }
    }

    fn delete(&self, id: RehearsalId) -> impl Future<Output = Result<bool, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(DELETE_BY_ID)
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(result.rows_affected() > 0)
        }
    }

    fn band_of(
        &self,
        id: RehearsalId,
    ) -> impl Future<Output = Result<Option<BandId>, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut conn = pool.acquire().await.map_err(StorageError::from)?;
            band_of(&mut conn, id).await
        }
    }

    /// Only an existing attendee row is updated; `false` when there is none.
    fn set_rsvp(
        &self,
        id: RehearsalId,
        user_id: UserId,
        status: RsvpStatus,
    ) -> impl Future<Output = Result<bool, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(UPDATE_RSVP)
                .bind(status.as_str())
                .bind(id.to_string())
                .bind(user_id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(result.rows_affected() > 0)
        }
    }

    fn set_attendance(
        &self,
        id: RehearsalId,
        records: &[AttendanceRecord],
    ) -> impl Future<Output = Result<usize, BandstandError>> + Send {
        let pool = self.pool.clone();
        let records = records.to_vec();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            let mut updated: u64 = 0;
            for record in &records {
                let result = sqlx::query(UPDATE_ATTENDANCE)
                    .bind(record.attendance.as_str())
                    .bind(id.to_string())
                    .bind(record.user_id.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(StorageError::from)?;
                updated += result.rows_affected();
            }
            tx.commit().await.map_err(StorageError::from)?;

            Ok(usize::try_from(updated).unwrap_or(usize::MAX))
        }
    }
}
