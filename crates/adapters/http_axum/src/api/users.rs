//! JSON handlers for the acting user's profile and instruments.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use bandstand_app::ports::Repositories;
use bandstand_app::services::user_service::UserProfile;
use bandstand_domain::id::InstrumentId;
use bandstand_domain::user::{Instrument, User, UserChanges, UserInstrument};

use crate::api::{ApiJson, parse_ids, required};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for a partial profile update.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "crate::api::double_option")]
    pub full_name: Option<Option<String>>,
}

impl From<UpdateProfileRequest> for UserChanges {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            full_name: req.full_name,
        }
    }
}

/// Request body replacing the instruments a user plays.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceInstrumentsRequest {
    pub instrument_ids: Option<Vec<String>>,
}

/// Possible responses from the profile endpoint.
pub enum ProfileResponse {
    Ok(Json<UserProfile>),
}

impl IntoResponse for ProfileResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the profile update endpoint.
pub enum UpdateProfileResponse {
    Ok(Json<User>),
}

impl IntoResponse for UpdateProfileResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the instrument replacement endpoint.
pub enum ReplaceInstrumentsResponse {
    Ok(Json<Vec<UserInstrument>>),
}

impl IntoResponse for ReplaceInstrumentsResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the instrument catalogue endpoint.
pub enum CatalogueResponse {
    Ok(Json<Vec<Instrument>>),
}

impl IntoResponse for CatalogueResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/users/me`
pub async fn profile<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
) -> Result<ProfileResponse, ApiError> {
    let profile = state.users.get_profile(user.id).await?;
    Ok(ProfileResponse::Ok(Json(profile)))
}

/// `PUT /api/users/me`
pub async fn update_profile<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<UpdateProfileResponse, ApiError> {
    let updated = state.users.update_profile(user.id, req.into()).await?;
    Ok(UpdateProfileResponse::Ok(Json(updated)))
}

/// `PUT /api/users/me/instruments`
pub async fn replace_instruments<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<ReplaceInstrumentsRequest>,
) -> Result<ReplaceInstrumentsResponse, ApiError> {
    let raw = required(req.instrument_ids, "instrumentIds")?;
    let instrument_ids: Vec<InstrumentId> = parse_ids(&raw, "instrumentIds")?;
    let played = state
        .users
        .replace_instruments(user.id, &instrument_ids)
        .await?;
    Ok(ReplaceInstrumentsResponse::Ok(Json(played)))
}

/// `GET /api/instruments`
pub async fn catalogue<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(_user): AuthUser,
) -> Result<CatalogueResponse, ApiError> {
    let instruments = state.users.list_instruments().await?;
    Ok(CatalogueResponse::Ok(Json(instruments)))
}
