//! RSVP backend: guest groups reconciled from a roster file, answered over HTTP.

pub mod config;
pub mod job_controller;
pub mod notify;
pub mod reconcile;
pub mod roster;
pub mod services;
pub mod store;
