//! Guest lookup for the RSVP page.
//!
//! - `GET /findguests?name=<string>`: returns the group (guests and messages
//!   embedded) owning a guest whose name matches case-insensitively, or
//!   `null` when nobody matches. A missing or blank `name` is a `400`.

mod find;

use actix_web::web::{get, resource};
use actix_web::Resource;

const API_PATH: &str = "/findguests";

pub fn configure_routes() -> Resource {
    resource(API_PATH).route(get().to(find::process))
}
