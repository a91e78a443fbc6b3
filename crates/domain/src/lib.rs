//! # bandstand-domain
//!
//! Pure domain model for the bandstand rehearsal scheduler.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Users** and their login **Sessions**
//! - Define **Bands** and **memberships** (the roles used by the authorization gate)
//! - Define **Rehearsals** with their **Attendees** (RSVP / attendance) and
//!   song priorities, plus the partial-update change set
//! - Define **Songs**, their **resources**, and **Setlists**
//! - Define **Rooms** and **Notifications** for real-time fan-out
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod label;
pub mod time;

pub mod band;
pub mod notification;
pub mod rehearsal;
pub mod session;
pub mod setlist;
pub mod song;
pub mod user;
