//! Scheduling of roster reconciliation passes.
//!
//! `schedule_reconcile_job` registers a job as `Pending`, returns its id right
//! away and runs the pass in the background: the pass waits for the pass
//! lock, then runs on Tokio's blocking pool since every store call is
//! synchronous SQLite I/O.

use crate::job_controller::state::{JobUpdate, JobsState};
use crate::reconcile::reconcile_file;
use crate::store::SqliteStore;
use common::jobs::JobStatus;
use log::{error, info};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

/// Starts a reconciliation pass in the background and returns its job id.
pub async fn schedule_reconcile_job(
    state: &JobsState,
    store: SqliteStore,
    roster: PathBuf,
) -> String {
    let job_id = Uuid::new_v4().to_string();
    state
        .jobs
        .write()
        .await
        .insert(job_id.clone(), JobStatus::Pending);

    let tx = state.tx.clone();
    let pass_lock = state.pass_lock.clone();
    let id = job_id.clone();

    tokio::spawn(async move {
        let _pass = pass_lock.lock().await;
        let _ = tx
            .send(JobUpdate {
                job_id: id.clone(),
                status: JobStatus::InProgress,
            })
            .await;

        let handle = tokio::task::spawn_blocking(move || reconcile_file(&store, &roster));

        let status = match handle.await {
            Ok(Ok(report)) => JobStatus::Completed(report),
            Ok(Err(e)) => JobStatus::Failed(e.to_string()),
            Err(join_err) => {
                error!("Reconciliation job {} panicked: {}", id, join_err);
                JobStatus::Failed(format!("join error: {}", join_err))
            }
        };
        let _ = tx.send(JobUpdate { job_id: id, status }).await;
    });

    job_id
}

/// Schedules a pass every `every`, the first one a full period from now.
pub async fn run_periodic(state: JobsState, store: SqliteStore, roster: PathBuf, every: Duration) {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let job_id = schedule_reconcile_job(&state, store.clone(), roster.clone()).await;
        info!("Scheduled periodic roster reconciliation {}", job_id);
    }
}
