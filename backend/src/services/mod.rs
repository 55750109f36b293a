//! # HTTP Services
//!
//! Every public endpoint of the RSVP backend. Each sub-module owns one
//! resource or scope and exposes a `configure_routes()` the way the app
//! factory in `main.rs` expects:
//!
//! - `guests`: `GET /findguests?name=...`, look up the group owning a guest.
//! - `rsvp`: `POST /submitrsvp`, record attendance and an optional message.
//! - `responses`: `GET /getresponses`, list every group with its answers.
//! - `roster`: `/api/roster/...`, start and follow reconciliation jobs.
//!
//! Handlers expect `web::Data` for `SqliteStore`, `Dispatcher`, `JobsState`
//! and `Config` to be registered on the `App`.

pub mod error;
mod guests;
mod responses;
mod roster;
mod rsvp;

use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

/// Registers every route on an `App` or scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .route("/", web::get().to(index))
        .service(guests::configure_routes())
        .service(rsvp::configure_routes())
        .service(responses::configure_routes())
        .service(roster::configure_routes());
}

/// JSON extractor settings: size limit and 422 on rejected bodies.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(error::json_error_handler)
}

async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "RSVP backend is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
