//! JSON handlers for rehearsals, RSVPs and attendance.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use bandstand_app::ports::Repositories;
use bandstand_domain::id::{BandId, RehearsalId, SongId};
use bandstand_domain::rehearsal::{
    AttendanceRecord, Rehearsal, RehearsalChanges, RehearsalStatus, RsvpStatus,
    UpcomingRehearsal,
};
use bandstand_domain::time::Timestamp;

use crate::api::{ApiJson, parse_id, parse_ids, required};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for scheduling a rehearsal.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRehearsalRequest {
    pub band_id: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "startDateTime")]
    pub starts_at: Option<Timestamp>,
    #[serde(rename = "endDateTime")]
    pub ends_at: Option<Timestamp>,
    pub notes: Option<String>,
    #[serde(default)]
    pub song_ids: Vec<String>,
}

/// Request body for a partial update. Absent keys are left untouched and
/// `"notes": null` clears the notes.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRehearsalRequest {
    pub title: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "startDateTime")]
    pub starts_at: Option<Timestamp>,
    #[serde(rename = "endDateTime")]
    pub ends_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "crate::api::double_option")]
    pub notes: Option<Option<String>>,
    pub status: Option<RehearsalStatus>,
    pub song_ids: Option<Vec<String>>,
}

/// Request body for an RSVP.
#[derive(Deserialize)]
pub struct RsvpRequest {
    pub status: Option<RsvpStatus>,
}

/// Request body for recording attendance.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    pub attendance_records: Option<Vec<AttendanceRecord>>,
}

/// Body of the RSVP and attendance endpoints.
#[derive(Serialize)]
pub struct OutcomeBody<T> {
    pub message: &'static str,
    pub updated: T,
}

/// Possible responses from the list endpoints.
pub enum ListResponse {
    Ok(Json<Vec<Rehearsal>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the upcoming endpoint.
pub enum UpcomingResponse {
    Ok(Json<Vec<UpcomingRehearsal>>),
}

impl IntoResponse for UpcomingResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<Rehearsal>),
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
    Created(Json<Rehearsal>),
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

/// Possible responses from the RSVP endpoint.
pub enum RsvpResponse {
    Ok(Json<OutcomeBody<bool>>),
}

impl IntoResponse for RsvpResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the attendance endpoint.
pub enum AttendanceResponse {
    Ok(Json<OutcomeBody<usize>>),
}

impl IntoResponse for AttendanceResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/rehearsals/band/{band_id}`
pub async fn list_for_band<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(band_id): Path<String>,
) -> Result<ListResponse, ApiError> {
    let band_id: BandId = parse_id(&band_id, "bandId")?;
    let rehearsals = state.rehearsals.list_for_band(user.id, band_id).await?;
    Ok(ListResponse::Ok(Json(rehearsals)))
}

/// `GET /api/rehearsals/user/upcoming`
pub async fn upcoming<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
) -> Result<UpcomingResponse, ApiError> {
    let rehearsals = state.rehearsals.list_upcoming(user.id).await?;
    Ok(UpcomingResponse::Ok(Json(rehearsals)))
}

/// `GET /api/rehearsals/{id}`
pub async fn get<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError> {
    let id: RehearsalId = parse_id(&id, "id")?;
    let rehearsal = state.rehearsals.get_rehearsal(user.id, id).await?;
    Ok(GetResponse::Ok(Json(rehearsal)))
}

/// `POST /api/rehearsals`
pub async fn create<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateRehearsalRequest>,
) -> Result<CreateResponse, ApiError> {
    let band_id: BandId = parse_id(&required(req.band_id, "bandId")?, "bandId")?;
    let song_ids: Vec<SongId> = parse_ids(&req.song_ids, "songIds")?;

    let mut builder = Rehearsal::builder()
        .band_id(band_id)
        .title(required(req.title, "title")?)
        .location(required(req.location, "location")?)
        .starts_at(required(req.starts_at, "startDateTime")?)
        .ends_at(required(req.ends_at, "endDateTime")?)
        .created_by(user.id)
        .song_ids(song_ids);
    if let Some(notes) = req.notes {
        builder = builder.notes(notes);
    }

    let rehearsal = builder.build()?;
    let created = state.rehearsals.create_rehearsal(rehearsal).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/rehearsals/{id}`
pub async fn update<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateRehearsalRequest>,
) -> Result<GetResponse, ApiError> {
    let id: RehearsalId = parse_id(&id, "id")?;
    let song_ids = req
        .song_ids
        .as_deref()
        .map(|raw| parse_ids::<SongId>(raw, "songIds"))
        .transpose()?;

    let changes = RehearsalChanges {
        title: req.title,
        location: req.location,
        starts_at: req.starts_at,
        ends_at: req.ends_at,
        notes: req.notes,
        status: req.status,
        song_ids,
    };
    let rehearsal = state
        .rehearsals
        .update_rehearsal(user.id, id, changes)
        .await?;
    Ok(GetResponse::Ok(Json(rehearsal)))
}

/// `DELETE /api/rehearsals/{id}`
pub async fn delete<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError> {
    let id: RehearsalId = parse_id(&id, "id")?;
    state.rehearsals.delete_rehearsal(user.id, id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/rehearsals/{id}/rsvp`
pub async fn rsvp<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RsvpRequest>,
) -> Result<RsvpResponse, ApiError> {
    let id: RehearsalId = parse_id(&id, "id")?;
    let status = required(req.status, "status")?;
    let updated = state.rehearsals.set_rsvp(user.id, id, status).await?;
    Ok(RsvpResponse::Ok(Json(OutcomeBody {
        message: "RSVP updated successfully",
        updated,
    })))
}

/// `POST /api/rehearsals/{id}/attendance`
pub async fn attendance<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AttendanceRequest>,
) -> Result<AttendanceResponse, ApiError> {
    let id: RehearsalId = parse_id(&id, "id")?;
    let records = required(req.attendance_records, "attendanceRecords")?;
    let updated = state
        .rehearsals
        .record_attendance(user.id, id, &records)
        .await?;
    Ok(AttendanceResponse::Ok(Json(OutcomeBody {
        message: "Attendance records updated successfully",
        updated,
    })))
}
