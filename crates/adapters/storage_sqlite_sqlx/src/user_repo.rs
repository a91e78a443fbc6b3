//! `SQLite` implementation of [`UserRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use bandstand_app::ports::UserRepository;
use bandstand_domain::error::{BandstandError, ValidationError};
use bandstand_domain::id::{InstrumentId, UserId};
use bandstand_domain::time::Timestamp;
use bandstand_domain::user::{Instrument, User, UserChanges, UserInstrument};

use crate::codec::{parsed, timestamp};
use crate::error::{StorageError, is_unique_violation};

/// Wrapper for converting database rows into domain [`User`].
struct Wrapper(User);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<User> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(User {
            id: parsed(row, "id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            role: parsed(row, "role")?,
            created_at: parsed(row, "created_at")?,
            updated_at: parsed(row, "updated_at")?,
        }))
    }
}

/// A user row together with its password hash.
struct Credentials(User, String);

impl<'r> FromRow<'r, SqliteRow> for Credentials {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let Wrapper(user) = Wrapper::from_row(row)?;
        Ok(Self(user, row.try_get("password_hash")?))
    }
}

struct InstrumentRow(Instrument);

impl<'r> FromRow<'r, SqliteRow> for InstrumentRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Instrument {
            id: parsed(row, "id")?,
            name: row.try_get("name")?,
        }))
    }
}

struct PlayedRow(UserInstrument);

impl<'r> FromRow<'r, SqliteRow> for PlayedRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(UserInstrument {
            id: parsed(row, "id")?,
            name: row.try_get("name")?,
            proficiency: row.try_get("proficiency")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO users (id, username, email, password_hash, full_name, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM users WHERE id = ?";
const SELECT_BY_EMAIL: &str = "SELECT * FROM users WHERE email = ?";
const SELECT_BY_USERNAME: &str = "SELECT * FROM users WHERE username = ?";
const UPDATE: &str = "UPDATE users SET \
     username = CASE WHEN ? THEN ? ELSE username END, \
     email = CASE WHEN ? THEN ? ELSE email END, \
     full_name = CASE WHEN ? THEN ? ELSE full_name END, \
     updated_at = ? \
     WHERE id = ?";
const SELECT_INSTRUMENTS: &str = "SELECT id, name FROM instruments ORDER BY name";
const SELECT_PLAYED: &str = "SELECT i.id, i.name, ui.proficiency \
     FROM user_instruments ui JOIN instruments i ON i.id = ui.instrument_id \
     WHERE ui.user_id = ? ORDER BY i.name";
const DELETE_PLAYED: &str = "DELETE FROM user_instruments WHERE user_id = ?";
const INSERT_PLAYED: &str = "INSERT INTO user_instruments (user_id, instrument_id) \
     SELECT ?, id FROM instruments WHERE id = ?";

/// Map a unique-constraint race on insert or update to the matching
/// validation error.
fn insert_error(err: sqlx::Error) -> BandstandError {
    if is_unique_violation(&err) {
        let message = err
            .as_database_error()
            .map(|db| db.message().to_string())
            .unwrap_or_default();
        if message.contains("users.email") {
            return ValidationError::EmailTaken.into();
        }
        return ValidationError::UsernameTaken.into();
    }
    StorageError::from(err).into()
}

/// `SQLite`-backed user repository.
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl UserRepository for SqliteUserRepository {
    fn create(
        &self,
        user: User,
        password_hash: String,
    ) -> impl Future<Output = Result<User, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(user.id.to_string())
                .bind(&user.username)
                .bind(&user.email)
                .bind(password_hash)
                .bind(&user.full_name)
                .bind(user.role.as_str())
                .bind(timestamp(user.created_at))
                .bind(timestamp(user.updated_at))
                .execute(&pool)
                .await
                .map_err(insert_error)?;

            Ok(user)
        }
    }

    fn get_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, BandstandError>> + Send {
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

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, BandstandError>> + Send {
        let pool = self.pool.clone();
        let email = email.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_EMAIL)
                .bind(email)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, BandstandError>> + Send {
        let pool = self.pool.clone();
        let username = username.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_USERNAME)
                .bind(username)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<(User, String)>, BandstandError>> + Send {
        let pool = self.pool.clone();
        let email = email.to_string();
        async move {
            let row: Option<Credentials> = sqlx::query_as(SELECT_BY_EMAIL)
                .bind(email)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|Credentials(user, hash)| (user, hash)))
        }
    }

    fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<User>, BandstandError>> + Send {
        let pool = self.pool.clone();
        let changes = changes.clone();
        async move {
            let result = sqlx::query(UPDATE)
                .bind(changes.username.is_some())
                .bind(changes.username.as_deref())
                .bind(changes.email.is_some())
                .bind(changes.email.as_deref())
                .bind(changes.full_name.is_some())
                .bind(changes.full_name.clone().flatten())
                .bind(timestamp(at))
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(insert_error)?;
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

    fn list_instruments(
        &self,
    ) -> impl Future<Output = Result<Vec<Instrument>, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<InstrumentRow> = sqlx::query_as(SELECT_INSTRUMENTS)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|r| r.0).collect())
        }
    }

    fn instruments_of(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Vec<UserInstrument>, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<PlayedRow> = sqlx::query_as(SELECT_PLAYED)
                .bind(id.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|r| r.0).collect())
        }
    }

    fn replace_instruments(
        &self,
        id: UserId,
        instruments: &[InstrumentId],
    ) -> impl Future<Output = Result<(), BandstandError>> + Send {
        let pool = self.pool.clone();
        let instruments = instruments.to_vec();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            sqlx::query(DELETE_PLAYED)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            for instrument_id in instruments {
                let result = sqlx::query(INSERT_PLAYED)
                    .bind(id.to_string())
                    .bind(instrument_id.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(StorageError::from)?;
                if result.rows_affected() == 0 {
                    return Err(ValidationError::UnknownValue {
                        kind: "instrument",
                        value: instrument_id.to_string(),
                    }
                    .into());
                }
            }

            tx.commit().await.map_err(StorageError::from)?;
            Ok(())
        }
    }
}
