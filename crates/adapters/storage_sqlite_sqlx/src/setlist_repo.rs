//! `SQLite` implementation of [`SetlistRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use bandstand_app::ports::SetlistRepository;
use bandstand_domain::error::{BandstandError, ValidationError};
use bandstand_domain::id::{BandId, SetlistId, SongId};
use bandstand_domain::setlist::{Setlist, distinct};

use crate::codec::{json, parsed, parsed_opt, timestamp};
use crate::error::StorageError;

/// Wrapper for converting hydrated rows into domain [`Setlist`].
struct Wrapper(Setlist);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Setlist> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Setlist {
            id: parsed(row, "id")?,
            band_id: parsed(row, "band_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            event_date: parsed_opt(row, "event_date")?,
            created_by: parsed(row, "created_by")?,
            created_at: parsed(row, "created_at")?,
            song_ids: json(row, "song_ids")?,
        }))
    }
}

macro_rules! hydrated_columns {
    () => {
        "s.id, s.band_id, s.name, s.description, s.event_date, s.created_by, s.created_at, \
         (SELECT json_group_array(ss.song_id ORDER BY ss.position) \
            FROM setlist_songs ss WHERE ss.setlist_id = s.id) AS song_ids"
    };
}

const SELECT_BY_ID: &str = concat!("SELECT ", hydrated_columns!(), " FROM setlists s WHERE s.id = ?");
const SELECT_FOR_BAND: &str = concat!(
    "SELECT ",
    hydrated_columns!(),
    " FROM setlists s WHERE s.band_id = ? ORDER BY s.created_at DESC, s.rowid DESC"
);
const INSERT: &str = "INSERT INTO setlists (id, band_id, name, description, event_date, created_by, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)";
const INSERT_SONG: &str = "INSERT INTO setlist_songs (setlist_id, song_id, position) SELECT ?, id, ? FROM songs WHERE id = ? AND band_id = ?";
const DELETE_SONGS: &str = "DELETE FROM setlist_songs WHERE setlist_id = ?";
const SELECT_BAND_ID: &str = "SELECT band_id FROM setlists WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM setlists WHERE id = ?";

/// Insert entries in order, refusing songs of another band.
async fn insert_songs(
    conn: &mut SqliteConnection,
    setlist_id: SetlistId,
    band_id: BandId,
    song_ids: &[SongId],
) -> Result<(), BandstandError> {
    let mut position: i64 = 0;
    for song_id in song_ids {
        let result = sqlx::query(INSERT_SONG)
            .bind(setlist_id.to_string())
            .bind(position)
            .bind(song_id.to_string())
            .bind(band_id.to_string())
            .execute(&mut *conn)
            .await
            .map_err(StorageError::from)?;
        if result.rows_affected() != 1 {
            return Err(ValidationError::SongNotInBand {
                song_id: *song_id,
                band_id,
            }
            .into());
        }
        position += 1;
    }
    Ok(())
}

/// `SQLite`-backed setlist repository.
pub struct SqliteSetlistRepository {
    pool: SqlitePool,
}

impl SqliteSetlistRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SetlistRepository for SqliteSetlistRepository {
    fn create(
        &self,
        setlist: Setlist,
    ) -> impl Future<Output = Result<Setlist, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;

            sqlx::query(INSERT)
                .bind(setlist.id.to_string())
                .bind(setlist.band_id.to_string())
                .bind(&setlist.name)
                .bind(&setlist.description)
                .bind(setlist.event_date.map(|date| date.to_string()))
                .bind(setlist.created_by.to_string())
                .bind(timestamp(setlist.created_at))
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            insert_songs(&mut tx, setlist.id, setlist.band_id, &distinct(&setlist.song_ids)).await?;

            let created: Wrapper = sqlx::query_as(SELECT_BY_ID)
                .bind(setlist.id.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(created.0)
        }
    }

    fn get_by_id(
        &self,
        id: SetlistId,
    ) -> impl Future<Output = Result<Option<Setlist>, BandstandError>> + Send {
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
    ) -> impl Future<Output = Result<Vec<Setlist>, BandstandError>> + Send {
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

    fn replace_songs(
        &self,
        id: SetlistId,
        song_ids: &[SongId],
    ) -> impl Future<Output = Result<Option<Setlist>, BandstandError>> + Send {
        let pool = self.pool.clone();
        let song_ids = distinct(song_ids);
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;

            let row = sqlx::query(SELECT_BAND_ID)
                .bind(id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            let Some(row) = row else {
                return Ok(None);
            };
            let band_id: BandId = parsed(&row, "band_id").map_err(StorageError::from)?;

            sqlx::query(DELETE_SONGS)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            insert_songs(&mut tx, id, band_id, &song_ids).await?;

            let updated: Wrapper = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(Some(updated.0))
        }
    }

    fn delete(&self, id: SetlistId) -> impl Future<Output = Result<bool, BandstandError>> + Send {
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
}
