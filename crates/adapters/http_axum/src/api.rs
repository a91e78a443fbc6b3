//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod auth;
#[allow(clippy::missing_errors_doc)]
pub mod bands;
#[allow(clippy::missing_errors_doc)]
pub mod rehearsals;
#[allow(clippy::missing_errors_doc)]
pub mod setlists;
#[allow(clippy::missing_errors_doc)]
pub mod songs;
#[allow(clippy::missing_errors_doc)]
pub mod users;

use std::str::FromStr;

use axum::Router;
use axum::extract::FromRequest;
use axum::routing::{delete, get, post, put};
use serde::{Deserialize, Deserializer};

use bandstand_app::ports::Repositories;
use bandstand_domain::error::ValidationError;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<P: Repositories>() -> Router<AppState<P>> {
    Router::new()
        // Accounts
        .route("/auth/register", post(auth::register::<P>))
        .route("/auth/login", post(auth::login::<P>))
        .route("/auth/check-token", get(auth::check_token))
        .route("/auth/logout", post(auth::logout::<P>))
        // Profile
        .route(
            "/users/me",
            get(users::profile::<P>).put(users::update_profile::<P>),
        )
        .route(
            "/users/me/instruments",
            put(users::replace_instruments::<P>),
        )
        .route("/instruments", get(users::catalogue::<P>))
        // Bands
        .route("/bands", get(bands::list::<P>).post(bands::create::<P>))
        .route("/bands/{id}", get(bands::get::<P>))
        .route(
            "/bands/{id}/members",
            get(bands::list_members::<P>).post(bands::add_member::<P>),
        )
        .route(
            "/bands/{id}/members/{user_id}",
            delete(bands::remove_member::<P>),
        )
        // Rehearsals
        .route("/rehearsals", post(rehearsals::create::<P>))
        .route("/rehearsals/user/upcoming", get(rehearsals::upcoming::<P>))
        .route(
            "/rehearsals/band/{band_id}",
            get(rehearsals::list_for_band::<P>),
        )
        .route(
            "/rehearsals/{id}",
            get(rehearsals::get::<P>)
                .put(rehearsals::update::<P>)
                .delete(rehearsals::delete::<P>),
        )
        .route("/rehearsals/{id}/rsvp", post(rehearsals::rsvp::<P>))
        .route(
            "/rehearsals/{id}/attendance",
            post(rehearsals::attendance::<P>),
        )
        // Songs
        .route("/songs", post(songs::create::<P>))
        .route("/songs/band/{band_id}", get(songs::list_for_band::<P>))
        .route(
            "/songs/{id}",
            get(songs::get::<P>)
                .put(songs::update::<P>)
                .delete(songs::delete::<P>),
        )
        .route("/songs/{id}/resources", post(songs::add_resource::<P>))
        .route(
            "/songs/{id}/resources/{resource_id}",
            delete(songs::delete_resource::<P>),
        )
        // Setlists
        .route("/setlists", post(setlists::create::<P>))
        .route(
            "/setlists/band/{band_id}",
            get(setlists::list_for_band::<P>),
        )
        .route(
            "/setlists/{id}",
            get(setlists::get::<P>).delete(setlists::delete::<P>),
        )
        .route("/setlists/{id}/songs", put(setlists::replace_songs::<P>))
        // Real-time
        .route("/ws", get(crate::ws::upgrade::<P>))
}

/// JSON request body whose decoding failures answer like every other
/// validation error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct ApiJson<T>(pub T);

/// Parse an identifier from a path segment or request body.
pub(crate) fn parse_id<T: FromStr>(raw: &str, field: &'static str) -> Result<T, ValidationError> {
    T::from_str(raw.trim()).map_err(|_| ValidationError::InvalidId { field })
}

/// Parse every identifier of a list field.
pub(crate) fn parse_ids<T: FromStr>(
    raw: &[String],
    field: &'static str,
) -> Result<Vec<T>, ValidationError> {
    raw.iter().map(|value| parse_id(value, field)).collect()
}

/// Unwrap a required body field.
pub(crate) fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

/// Distinguish an explicit `null` (`Some(None)`) from an absent key (`None`).
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
