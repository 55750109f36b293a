//! Wire models shared by the RSVP API and its clients.

pub mod jobs;
pub mod model;
pub mod requests;
