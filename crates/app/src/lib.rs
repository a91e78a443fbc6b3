//! # bandstand-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `UserRepository`, `SessionRepository` — accounts and login sessions
//!   - `BandRepository` — bands and memberships
//!   - `RehearsalRepository` — rehearsals with attendees and song plans
//!   - `SongRepository`, `SetlistRepository` — repertoire and setlists
//!   - `Notifier` — real-time fan-out of mutation events
//! - Define **driving/inbound ports** as use-case structs:
//!   - `AuthService` — register, login, authenticate a bearer token, logout
//!   - `BandService`, `RehearsalService`, `SongService`, `SetlistService`,
//!     `UserService`
//! - Run the **authorization gate** before every band-scoped operation
//! - Provide **in-process infrastructure** that doesn't need IO: the room
//!   registry, session tokens and password hashing
//!
//! ## Dependency rule
//! Depends on `bandstand-domain` only (plus `tokio::sync` for channels and the
//! hashing crates). Never imports adapter crates. Adapters depend on *this*
//! crate, not the reverse.

pub mod credentials;
pub mod ports;
pub mod rooms;
pub mod services;
pub mod token;
