//! JSON handlers for registration, login and sessions.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use bandstand_app::ports::Repositories;
use bandstand_app::services::auth_service::AuthSession;
use bandstand_domain::error::AuthError;
use bandstand_domain::user::{Registration, User};

use crate::api::{ApiJson, required};
use crate::auth::{AuthUser, bearer_token};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for registering an account.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

/// Request body for logging in.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A session together with a human-readable outcome.
#[derive(Serialize)]
pub struct SessionBody {
    pub message: &'static str,
    #[serde(flatten)]
    pub session: AuthSession,
}

/// Body of a successful token check.
#[derive(Serialize)]
pub struct TokenBody {
    pub message: &'static str,
    pub user: User,
}

/// Possible responses from the register endpoint.
pub enum RegisterResponse {
    Created(Json<SessionBody>),
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the login endpoint.
pub enum LoginResponse {
    Ok(Json<SessionBody>),
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the check-token endpoint.
pub enum CheckTokenResponse {
    Ok(Json<TokenBody>),
}

impl IntoResponse for CheckTokenResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the logout endpoint.
pub enum LogoutResponse {
    NoContent,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `POST /api/auth/register`
pub async fn register<P: Repositories>(
    State(state): State<AppState<P>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<RegisterResponse, ApiError> {
    let registration = Registration {
        username: required(req.username, "username")?,
        email: required(req.email, "email")?,
        password: required(req.password, "password")?,
        full_name: req.full_name,
    };
    let session = state.auth.register(registration).await?;
    Ok(RegisterResponse::Created(Json(SessionBody {
        message: "User registered successfully",
        session,
    })))
}

/// `POST /api/auth/login`
pub async fn login<P: Repositories>(
    State(state): State<AppState<P>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<LoginResponse, ApiError> {
    let email = required(req.email, "email")?;
    let password = required(req.password, "password")?;
    let session = state.auth.login(&email, &password).await?;
    Ok(LoginResponse::Ok(Json(SessionBody {
        message: "Login successful",
        session,
    })))
}

/// `GET /api/auth/check-token`
pub async fn check_token(AuthUser(user): AuthUser) -> Result<CheckTokenResponse, ApiError> {
    Ok(CheckTokenResponse::Ok(Json(TokenBody {
        message: "Token is valid",
        user,
    })))
}

/// `POST /api/auth/logout`
pub async fn logout<P: Repositories>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Result<LogoutResponse, ApiError> {
    let token = bearer_token(&headers).ok_or(AuthError::MissingToken)?;
    state.auth.logout(token).await?;
    Ok(LogoutResponse::NoContent)
}
