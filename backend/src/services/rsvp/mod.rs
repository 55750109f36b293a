//! # RSVP Submission
//!
//! - `POST /submitrsvp`: body `{ GroupId, Message?, GuestRsvps: [{ Id, Attending }] }`.
//!
//! The optional message is appended to the group with the current time, then
//! each listed guest's attendance is set. Guest ids that do not belong to the
//! group are ignored and echoed back in the acknowledgment; an unknown group
//! is a `404`. Once the store has been updated the submission summary is
//! handed to the notification dispatcher, whose failure is logged but does
//! not change the response.

mod submit;

use actix_web::web::{post, resource};
use actix_web::Resource;

const API_PATH: &str = "/submitrsvp";

/// Longest message accepted, in characters.
pub(crate) const MAX_MESSAGE_CHARS: usize = 2000;

pub fn configure_routes() -> Resource {
    resource(API_PATH).route(post().to(submit::process))
}
