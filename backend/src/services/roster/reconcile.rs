use crate::config::Config;
use crate::job_controller::reconcile::schedule_reconcile_job;
use crate::job_controller::state::JobsState;
use crate::store::SqliteStore;
use actix_web::{web, HttpResponse, Responder};
use common::requests::StartReconcileResponse;
use log::info;

pub(crate) async fn process(
    state: web::Data<JobsState>,
    store: web::Data<SqliteStore>,
    config: web::Data<Config>,
) -> impl Responder {
    let job_id =
        schedule_reconcile_job(&state, store.get_ref().clone(), config.roster.clone()).await;
    info!("Roster reconciliation {} requested over HTTP", job_id);
    HttpResponse::Accepted().json(StartReconcileResponse { job_id })
}
