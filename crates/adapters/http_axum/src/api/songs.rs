//! JSON handlers for songs and their resources.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use bandstand_app::ports::Repositories;
use bandstand_domain::id::{BandId, SongId, SongResourceId};
use bandstand_domain::song::{ResourceType, Song, SongChanges, SongResource, SongStatus};

use crate::api::{ApiJson, parse_id, required};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for adding a song.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSongRequest {
    pub band_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub status: Option<SongStatus>,
    pub notes: Option<String>,
}

/// Request body for a partial update. `null` clears `artist` or `notes`.
#[derive(Deserialize)]
pub struct UpdateSongRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "crate::api::double_option")]
    pub artist: Option<Option<String>>,
    pub status: Option<SongStatus>,
    #[serde(default, deserialize_with = "crate::api::double_option")]
    pub notes: Option<Option<String>>,
}

/// Request body for attaching a resource.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddResourceRequest {
    pub resource_type: Option<ResourceType>,
    pub file_url: Option<String>,
    pub description: Option<String>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Song>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<Song>),
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
    Created(Json<Song>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the add-resource endpoint.
pub enum AddResourceResponse {
    Created(Json<SongResource>),
}

impl IntoResponse for AddResourceResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoints.
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

/// `GET /api/songs/band/{band_id}`
pub async fn list_for_band<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(band_id): Path<String>,
) -> Result<ListResponse, ApiError> {
    let band_id: BandId = parse_id(&band_id, "bandId")?;
    let songs = state.songs.list_for_band(user.id, band_id).await?;
    Ok(ListResponse::Ok(Json(songs)))
}

/// `GET /api/songs/{id}`
pub async fn get<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError> {
    let id: SongId = parse_id(&id, "id")?;
    let song = state.songs.get_song(user.id, id).await?;
    Ok(GetResponse::Ok(Json(song)))
}

/// `POST /api/songs`
pub async fn create<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateSongRequest>,
) -> Result<CreateResponse, ApiError> {
    let band_id: BandId = parse_id(&required(req.band_id, "bandId")?, "bandId")?;

    let mut builder = Song::builder()
        .band_id(band_id)
        .title(required(req.title, "title")?)
        .added_by(user.id);
    if let Some(artist) = req.artist {
        builder = builder.artist(artist);
    }
    if let Some(status) = req.status {
        builder = builder.status(status);
    }
    if let Some(notes) = req.notes {
        builder = builder.notes(notes);
    }

    let created = state.songs.create_song(builder.build()?).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/songs/{id}`
pub async fn update<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateSongRequest>,
) -> Result<GetResponse, ApiError> {
    let id: SongId = parse_id(&id, "id")?;
    let changes = SongChanges {
        title: req.title,
        artist: req.artist,
        status: req.status,
        notes: req.notes,
    };
    let song = state.songs.update_song(user.id, id, changes).await?;
    Ok(GetResponse::Ok(Json(song)))
}

/// `DELETE /api/songs/{id}`
pub async fn delete<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError> {
    let id: SongId = parse_id(&id, "id")?;
    state.songs.delete_song(user.id, id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/songs/{id}/resources`
pub async fn add_resource<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AddResourceRequest>,
) -> Result<AddResourceResponse, ApiError> {
    let id: SongId = parse_id(&id, "id")?;
    let resource = state
        .songs
        .add_resource(
            user.id,
            id,
            required(req.resource_type, "resourceType")?,
            required(req.file_url, "fileUrl")?,
            req.description,
        )
        .await?;
    Ok(AddResourceResponse::Created(Json(resource)))
}

/// `DELETE /api/songs/{id}/resources/{resource_id}`
pub async fn delete_resource<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path((id, resource_id)): Path<(String, String)>,
) -> Result<DeleteResponse, ApiError> {
    let id: SongId = parse_id(&id, "id")?;
    let resource_id: SongResourceId = parse_id(&resource_id, "resourceId")?;
    state.songs.delete_resource(user.id, id, resource_id).await?;
    Ok(DeleteResponse::NoContent)
}
