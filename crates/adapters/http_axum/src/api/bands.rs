//! JSON handlers for bands and their members.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use bandstand_app::ports::Repositories;
use bandstand_domain::band::{Band, BandMember, BandRole};
use bandstand_domain::id::{BandId, UserId};

use crate::api::{ApiJson, parse_id, required};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a band.
#[derive(Deserialize)]
pub struct CreateBandRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request body for adding a member. The role defaults to `member`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Option<String>,
    pub role: Option<BandRole>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Band>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Band>),
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
    Created(Json<Band>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the member listing endpoint.
pub enum MembersResponse {
    Ok(Json<Vec<BandMember>>),
}

impl IntoResponse for MembersResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the add-member endpoint.
pub enum AddMemberResponse {
    Created(Json<BandMember>),
}

impl IntoResponse for AddMemberResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the remove-member endpoint.
pub enum RemoveMemberResponse {
    NoContent,
}

impl IntoResponse for RemoveMemberResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/bands`
pub async fn list<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
) -> Result<ListResponse, ApiError> {
    let bands = state.bands.list_bands(user.id).await?;
    Ok(ListResponse::Ok(Json(bands)))
}

/// `GET /api/bands/{id}`
pub async fn get<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError> {
    let band_id: BandId = parse_id(&id, "id")?;
    let band = state.bands.get_band(user.id, band_id).await?;
    Ok(GetResponse::Ok(Json(band)))
}

/// `POST /api/bands`
pub async fn create<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateBandRequest>,
) -> Result<CreateResponse, ApiError> {
    let mut builder = Band::builder()
        .name(required(req.name, "name")?)
        .created_by(user.id);
    if let Some(description) = req.description {
        builder = builder.description(description);
    }

    let band = builder.build()?;
    let created = state.bands.create_band(band).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `GET /api/bands/{id}/members`
pub async fn list_members<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<MembersResponse, ApiError> {
    let band_id: BandId = parse_id(&id, "id")?;
    let members = state.bands.list_members(user.id, band_id).await?;
    Ok(MembersResponse::Ok(Json(members)))
}

/// `POST /api/bands/{id}/members`
pub async fn add_member<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AddMemberRequest>,
) -> Result<AddMemberResponse, ApiError> {
    let band_id: BandId = parse_id(&id, "id")?;
    let user_id: UserId = parse_id(&required(req.user_id, "userId")?, "userId")?;
    let role = req.role.unwrap_or(BandRole::Member);

    let member = state
        .bands
        .add_member(user.id, band_id, user_id, role)
        .await?;
    Ok(AddMemberResponse::Created(Json(member)))
}

/// `DELETE /api/bands/{id}/members/{user_id}`
pub async fn remove_member<P: Repositories>(
    State(state): State<AppState<P>>,
    AuthUser(user): AuthUser,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<RemoveMemberResponse, ApiError> {
    let band_id: BandId = parse_id(&id, "id")?;
    let user_id: UserId = parse_id(&user_id, "userId")?;
    state.bands.remove_member(user.id, band_id, user_id).await?;
    Ok(RemoveMemberResponse::NoContent)
}
