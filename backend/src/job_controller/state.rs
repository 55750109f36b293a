//! Manages the state of background roster reconciliation jobs.
//!
//! A reconciliation pass reads the whole roster and touches many rows, so it
//! never runs inside a request. Passes are started at boot, by the periodic
//! timer, or through `POST /api/roster/reconcile`, and their progress is
//! tracked here.
//!
//! The main components are:
//! - `JobsState`: A clonable, thread-safe struct that holds the status of every
//!   job. It is injected into the Actix application state in `main.rs`.
//! - `JobUpdate`: A message used to report a status change from a running job
//!   back to the central state.
//! - `start_job_updater`: A long-running task that applies `JobUpdate`s to
//!   the shared `JobsState`.

use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, Mutex, RwLock};

/// Capacity of the update channel between running jobs and the updater.
const UPDATE_CHANNEL_SIZE: usize = 100;

/// A thread-safe, shareable container for the state of all background jobs.
#[derive(Clone)]
pub struct JobsState {
    /// A map from a unique job ID to its current `JobStatus`.
    ///
    /// Read concurrently by `GET /api/roster/status/{job_id}`; written by
    /// `start_job_updater` and when a job is registered.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Sender half of the update channel.
    ///
    /// Running jobs push `JobUpdate`s here instead of locking `jobs`
    /// themselves.
    pub tx: mpsc::Sender<JobUpdate>,

    /// Held for the whole duration of a reconciliation pass so that two
    /// passes never interleave their merge and sweep phases.
    pub pass_lock: Arc<Mutex<()>>,
}

/// Represents a status update for a specific background job.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobsState {
    /// Creates an empty job registry and the receiver to hand to
    /// `start_job_updater`.
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_SIZE);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
            pass_lock: Arc::new(Mutex::new(())),
        };
        (state, rx)
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

/// Starts the central job state updater task.
///
/// Spawned once at startup. It applies every received `JobUpdate` to the
/// `jobs` map until all senders are dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id, update.status);
    }
}
