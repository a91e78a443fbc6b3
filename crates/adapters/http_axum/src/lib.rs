//! # bandstand-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON API** under `/api` (auth, bands, rehearsals, songs,
//!   setlists)
//! - Resolve bearer tokens into the acting user ([`auth::AuthUser`])
//! - Accept **WebSocket** connections at `/api/ws`, join them to their user
//!   and band rooms, and stream notifications out of the room registry
//! - Map application results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `bandstand-app` (for port traits and services) and
//! `bandstand-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod auth;
pub mod error;
pub mod router;
pub mod state;
pub mod ws;
