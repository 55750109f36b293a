//! Manages roster reconciliation jobs over HTTP.
//!
//! The roster file itself is configured at startup (`Config::roster`); these
//! routes only trigger and observe passes over it:
//! - `POST /api/roster/reconcile`: starts a background pass and immediately
//!   returns `{ "job_id": ... }`.
//! - `GET /api/roster/status/{job_id}`: current `JobStatus` of a pass
//!   (`Pending`, `InProgress`, `Completed` with its report, or `Failed`).

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod get_status;
mod reconcile;

const API_PATH: &str = "/api/roster";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/reconcile", post().to(reconcile::process))
        .route("/status/{job_id}", get().to(get_status::process))
}
