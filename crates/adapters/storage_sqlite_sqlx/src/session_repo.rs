//! `SQLite` implementation of [`SessionRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use bandstand_app::ports::SessionRepository;
use bandstand_domain::error::BandstandError;
use bandstand_domain::id::SessionId;
use bandstand_domain::session::Session;

use crate::codec::{parsed, timestamp};
use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`Session`].
struct Wrapper(Session);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Session> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Session {
            id: parsed(row, "id")?,
            user_id: parsed(row, "user_id")?,
            secret_hash: row.try_get("secret_hash")?,
            created_at: parsed(row, "created_at")?,
            expires_at: parsed(row, "expires_at")?,
        }))
    }
}

const INSERT: &str =
    "INSERT INTO sessions (id, user_id, secret_hash, created_at, expires_at) VALUES (?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM sessions WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM sessions WHERE id = ?";

/// `SQLite`-backed session repository.
pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SessionRepository for SqliteSessionRepository {
    fn create(
        &self,
        session: Session,
    ) -> impl Future<Output = Result<Session, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(session.id.to_string())
                .bind(session.user_id.to_string())
                .bind(&session.secret_hash)
                .bind(timestamp(session.created_at))
                .bind(timestamp(session.expires_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(session)
        }
    }

    fn get_by_id(
        &self,
        id: SessionId,
    ) -> impl Future<Output = Result<Option<Session>, BandstandError>> + Send {
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

    fn delete(&self, id: SessionId) -> impl Future<Output = Result<bool, BandstandError>> + Send {
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
