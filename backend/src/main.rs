use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use rsvp_backend::config::Config;
use rsvp_backend::job_controller;
use rsvp_backend::job_controller::state::JobsState;
use rsvp_backend::notify::Dispatcher;
use rsvp_backend::services;
use rsvp_backend::store::SqliteStore;
use std::io;
use std::time::Duration;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::load().map_err(io::Error::other)?;
    let store = SqliteStore::open(&config.database).map_err(io::Error::other)?;
    let dispatcher =
        Dispatcher::from_url(config.notify_webhook.as_deref()).map_err(io::Error::other)?;

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new();
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    if config.reconcile_on_startup {
        let job_id = job_controller::reconcile::schedule_reconcile_job(
            &jobs_state,
            store.clone(),
            config.roster.clone(),
        )
        .await;
        info!("Startup roster reconciliation scheduled as {}", job_id);
    }
    if config.reconcile_interval_secs > 0 {
        tokio::spawn(job_controller::reconcile::run_periodic(
            jobs_state.clone(),
            store.clone(),
            config.roster.clone(),
            Duration::from_secs(config.reconcile_interval_secs),
        ));
    }

    let (host, port) = config.bind_address();
    info!("Server running at http://{}:{}", host, port);

    let json_limit = config.json_limit;
    let config = web::Data::new(config);
    let store = web::Data::new(store);
    let dispatcher = web::Data::new(dispatcher);
    let jobs_state = web::Data::new(jobs_state);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(services::json_config(json_limit))
            .app_data(config.clone())
            .app_data(store.clone())
            .app_data(dispatcher.clone())
            .app_data(jobs_state.clone())
            .configure(services::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
