//! Application services — use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod access;
pub mod auth_service;
pub mod band_service;
pub mod rehearsal_service;
pub mod setlist_service;
pub mod song_service;
pub mod user_service;

mod announce;

#[cfg(any(test, feature = "testing"))]
#[allow(clippy::missing_panics_doc)]
pub mod testing;
