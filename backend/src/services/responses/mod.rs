//! - `GET /getresponses`: every group with its guests, messages and the
//!   timestamp of its latest message, ordered by group id.

mod list;

use actix_web::web::{get, resource};
use actix_web::Resource;

const API_PATH: &str = "/getresponses";

pub fn configure_routes() -> Resource {
    resource(API_PATH).route(get().to(list::process))
}
