//! `SQLite` implementation of [`SongRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use bandstand_app::ports::SongRepository;
use bandstand_domain::error::BandstandError;
use bandstand_domain::id::{BandId, SongId, SongResourceId};
use bandstand_domain::song::{Song, SongChanges, SongResource, SongStatus};

use crate::codec::{json, parsed, timestamp};
use crate::error::StorageError;

/// Wrapper for converting hydrated rows into domain [`Song`].
struct Wrapper(Song);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Song> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Song {
            id: parsed(row, "id")?,
            band_id: parsed(row, "band_id")?,
            title: row.try_get("title")?,
            artist: row.try_get("artist")?,
            status: parsed(row, "status")?,
            notes: row.try_get("notes")?,
            added_by: parsed(row, "added_by")?,
            added_at: parsed(row, "added_at")?,
            resources: json(row, "resources")?,
        }))
    }
}

macro_rules! hydrated_columns {
    () => {
        "s.id, s.band_id, s.title, s.artist, s.status, s.notes, s.added_by, s.added_at, \
         (SELECT json_group_array(json_object('id', sr.id, 'songId', sr.song_id, \
                 'resourceType', sr.resource_type, 'fileUrl', sr.file_url, \
                 'description', sr.description, 'uploadedBy', sr.uploaded_by, \
                 'uploadedAt', sr.uploaded_at) ORDER BY sr.uploaded_at, sr.rowid) \
            FROM song_resources sr WHERE sr.song_id = s.id) AS resources"
    };
}

const SELECT_BY_ID: &str = concat!("SELECT ", hydrated_columns!(), " FROM songs s WHERE s.id = ?");
const SELECT_FOR_BAND: &str = concat!(
    "SELECT ",
    hydrated_columns!(),
    " FROM songs s WHERE s.band_id = ? ORDER BY s.title, s.added_at"
);
const INSERT: &str = "INSERT INTO songs (id, band_id, title, artist, status, notes, added_by, added_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
const UPDATE: &str = "UPDATE songs SET \
     title = CASE WHEN ? THEN ? ELSE title END, \
     artist = CASE WHEN ? THEN ? ELSE artist END, \
     status = CASE WHEN ? THEN ? ELSE status END, \
     notes = CASE WHEN ? THEN ? ELSE notes END \
     WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM songs WHERE id = ?";
const INSERT_RESOURCE: &str = "INSERT INTO song_resources (id, song_id, resource_type, file_url, description, uploaded_by, uploaded_at) VALUES (?, ?, ?, ?, ?, ?, ?)";
const DELETE_RESOURCE: &str = "DELETE FROM song_resources WHERE id = ? AND song_id = ?";

/// `SQLite`-backed song repository.
pub struct SqliteSongRepository {
    pool: SqlitePool,
}

impl SqliteSongRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SongRepository for SqliteSongRepository {
    fn create(&self, song: Song) -> impl Future<Output = Result<Song, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(song.id.to_string())
                .bind(song.band_id.to_string())
                .bind(&song.title)
                .bind(&song.artist)
                .bind(song.status.as_str())
                .bind(&song.notes)
                .bind(song.added_by.to_string())
                .bind(timestamp(song.added_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(song)
        }
    }

    fn get_by_id(
        &self,
        id: SongId,
    ) -> impl Future<Output = Result<Option<Song>, BandstandError>> + Send {
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
    ) -> impl Future<Output = Result<Vec<Song>, BandstandError>> + Send {
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

    fn update(
        &self,
        id: SongId,
        changes: &SongChanges,
    ) -> impl Future<Output = Result<Option<Song>, BandstandError>> + Send {
        let pool = self.pool.clone();
        let changes = changes.clone();
        async move {
            let result = sqlx::query(UPDATE)
                .bind(changes.title.is_some())
                .bind(changes.title.as_deref())
                .bind(changes.artist.is_some())
                .bind(changes.artist.clone().flatten())
                .bind(changes.status.is_some())
                .bind(changes.status.map(SongStatus::as_str))
                .bind(changes.notes.is_some())
                .bind(changes.notes.clone().flatten())
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;
            if result.rows_affected() == 0 {
                return Ok(None);
            }

            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    /// Deleting a song also removes it from rehearsal plans and setlists.
    fn delete(&self, id: SongId) -> impl Future<Output = Result<bool, BandstandError>> + Send {
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

    fn add_resource(
        &self,
        resource: SongResource,
    ) -> impl Future<Output = Result<SongResource, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT_RESOURCE)
                .bind(resource.id.to_string())
                .bind(resource.song_id.to_string())
                .bind(resource.resource_type.as_str())
                .bind(&resource.file_url)
                .bind(&resource.description)
                .bind(resource.uploaded_by.to_string())
                .bind(timestamp(resource.uploaded_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(resource)
        }
    }

    fn delete_resource(
        &self,
        song_id: SongId,
        resource_id: SongResourceId,
    ) -> impl Future<Output = Result<bool, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(DELETE_RESOURCE)
                .bind(resource_id.to_string())
                .bind(song_id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(result.rows_affected() > 0)
        }
    }
}
