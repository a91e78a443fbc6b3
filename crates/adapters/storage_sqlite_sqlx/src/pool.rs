//! `SQLite` connection pool setup and migration runner.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::band_repo::SqliteBandRepository;
use crate::error::StorageError;
use crate::rehearsal_repo::SqliteRehearsalRepository;
use crate::session_repo::SqliteSessionRepository;
use crate::setlist_repo::SqliteSetlistRepository;
use crate::song_repo::SqliteSongRepository;
use crate::user_repo::SqliteUserRepository;

/// Configuration for the `SQLite` storage adapter.
pub struct Config {
    /// `SQLite` connection URL (e.g. `sqlite:bandstand.db` or `sqlite::memory:`).
    pub database_url: String,
}

impl Config {
    /// Build a [`Database`] from this configuration.
    ///
    /// Creates the connection pool, creates the database file if missing,
    /// and runs all pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the connection or migrations fail.
    pub async fn build(self) -> Result<Database, StorageError> {
        Database::initialize(&self.database_url).await
    }
}

/// Whether the URL names a private in-memory database.
fn is_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Holds the `SQLite` connection pool and provides access to it.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and run migrations.
    ///
    /// Foreign keys are enforced on every connection so deletes cascade.
    /// An in-memory database lives inside a single connection, so the pool
    /// is pinned to one connection that never expires.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the connection or migrations fail.
    async fn initialize(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if is_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = pool_options.connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!(memory = is_memory(database_url), "database ready");

        Ok(Self { pool })
    }

    /// Borrow the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[must_use]
    pub fn users(&self) -> SqliteUserRepository {
        SqliteUserRepository::new(self.pool.clone())
    }

    #[must_use]
    pub fn sessions(&self) -> SqliteSessionRepository {
        SqliteSessionRepository::new(self.pool.clone())
    }

    #[must_use]
    pub fn bands(&self) -> SqliteBandRepository {
        SqliteBandRepository::new(self.pool.clone())
    }

    #[must_use]
    pub fn rehearsals(&self) -> SqliteRehearsalRepository {
        SqliteRehearsalRepository::new(self.pool.clone())
    }

    #[must_use]
    pub fn songs(&self) -> SqliteSongRepository {
        SqliteSongRepository::new(self.pool.clone())
    }

    #[must_use]
    pub fn setlists(&self) -> SqliteSetlistRepository {
        SqliteSetlistRepository::new(self.pool.clone())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the repository tests.

    use bandstand_app::ports::{BandRepository, UserRepository};
    use bandstand_domain::band::{Band, BandMember, BandRole};
    use bandstand_domain::id::{BandId, UserId};
    use bandstand_domain::user::{Registration, User};

    use super::{Config, Database};

    pub(crate) async fn memory_db() -> Database {
        Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap()
    }

    pub(crate) async fn seed_user(db: &Database, username: &str) -> User {
        let user = Registration {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "irrelevant".to_string(),
            full_name: None,
        }
        .to_user();
        db.users()
            .create(user, "not-a-real-hash".to_string())
            .await
            .unwrap()
    }

    /// A band owned by `owner`, with every other user joined as `member`.
    pub(crate) async fn seed_band(db: &Database, owner: UserId, members: &[UserId]) -> BandId {
        let band = Band::builder()
            .name("The Fixtures")
            .created_by(owner)
            .build()
            .unwrap();
        let band = db.bands().create_with_owner(band).await.unwrap();
        for user_id in members {
            db.bands()
                .add_member(BandMember::new(band.id, *user_id, BandRole::Member))
                .await
                .unwrap();
        }
        band.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_create_pool_and_run_migrations_when_using_memory_db() {
        let db = testing::memory_db().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|row| row.0.as_str()).collect();
        for expected in [
            "availability",
            "band_members",
            "bands",
            "conflicts",
            "instruments",
            "rehearsal_attendance",
            "rehearsal_songs",
            "rehearsals",
            "sessions",
            "setlist_songs",
            "setlists",
            "song_resources",
            "songs",
            "user_instruments",
            "users",
        ] {
            assert!(names.contains(&expected), "missing {expected} table");
        }
    }

    #[tokio::test]
    async fn should_seed_instrument_catalogue() {
        let db = testing::memory_db().await;
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM instruments")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 13);
    }

    #[tokio::test]
    async fn should_reject_day_of_week_outside_range() {
        let db = testing::memory_db().await;
        let user = testing::seed_user(&db, "weekday").await;

        let result = sqlx::query(
            "INSERT INTO availability (id, user_id, day_of_week) VALUES ('a', ?, 7)",
        )
        .bind(user.id.to_string())
        .execute(db.pool())
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn should_detect_memory_urls() {
        assert!(is_memory("sqlite::memory:"));
        assert!(is_memory("sqlite:file:test?mode=memory&cache=shared"));
        assert!(!is_memory("sqlite:bandstand.db"));
    }
}
