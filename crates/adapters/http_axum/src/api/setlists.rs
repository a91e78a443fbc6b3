//! JSON handlers for setlists.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use bandstand_app::ports::Repositories;
use bandstand_domain::id::{BandId, SetlistId, SongId};
use bandstand_domain::setlist::Setlist;
use bandstand_domain::time::Date;

use crate::api::{ApiJson, parse_id, parse_ids, required};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a setlist.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSetlistRequest {
    pub band_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<Date>,
    #[serde(default)]
    pub song_ids: Vec<String>,
}

/// Request body for replacing the song order.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSongsRequest {
    pub song_ids: Option<Vec<String>>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Setlist>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and replace endpoints.
pub enum GetResponse {
    Ok(Json<Setlist>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Setlist>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/setlists/band/{band_id}`
pub async fn list_for_band<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(band_id): Path<String>,
) -> Result<ListResponse, ApiError> {
    let band_id: BandId = parse_id(&band_id, "bandId")?;
    let setlists = state.setlists.list_for_band(user.id, band_id).await?;
    Ok(ListResponse::Ok(Json(setlists)))
}

/// `GET /api/setlists/{id}`
pub async fn get<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError> {
    let id: SetlistId = parse_id(&id, "id")?;
    let setlist = state.setlists.get_setlist(user.id, id).await?;
    Ok(GetResponse::Ok(Json(setlist)))
}

/// `POST /api/setlists`
pub async fn create<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateSetlistRequest>,
) -> Result<CreateResponse, ApiError> {
    let band_id: BandId = parse_id(&required(req.band_id, "bandId")?, "bandId")?;
    let song_ids: Vec<SongId> = parse_ids(&req.song_ids, "songIds")?;

    let setlist = Setlist::new(band_id, required(req.name, "name")?, user.id, &song_ids)?
        .with_description(req.description)
        .with_event_date(req.event_date);
    let created = state.setlists.create_setlist(setlist).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/setlists/{id}/songs`
pub async fn replace_songs<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ReplaceSongsRequest>,
) -> Result<GetResponse, ApiError> {
    let id: SetlistId = parse_id(&id, "id")?;
    let song_ids: Vec<SongId> = parse_ids(&required(req.song_ids, "songIds")?, "songIds")?;
    let setlist = state.setlists.replace_songs(user.id, id, &song_ids).await?;
    Ok(GetResponse::Ok(Json(setlist)))
}

/// `DELETE /api/setlists/{id}`
pub async fn delete<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError> {
    let id: SetlistId = parse_id(&id, "id")?;
    state.setlists.delete_setlist(user.id, id).await?;
    Ok(DeleteResponse::NoContent)
}
