//! # bandstand-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `bandstand-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows, hydrating child lists with
//!   correlated `json_group_array` subqueries
//!
//! ## Dependency rule
//! Depends on `bandstand-app` (for port traits) and `bandstand-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod codec;

pub mod band_repo;
pub mod error;
pub mod pool;
pub mod rehearsal_repo;
pub mod session_repo;
pub mod setlist_repo;
pub mod song_repo;
pub mod user_repo;

use bandstand_app::ports::Repositories;

/// The `SQLite` family of repositories.
pub struct SqliteRepositories;

impl Repositories for SqliteRepositories {
    type Users = user_repo::SqliteUserRepository;
    type Sessions = session_repo::SqliteSessionRepository;
    type Bands = band_repo::SqliteBandRepository;
    type Rehearsals = rehearsal_repo::SqliteRehearsalRepository;
    type Songs = song_repo::SqliteSongRepository;
    type Setlists = setlist_repo::SqliteSetlistRepository;
}
