//! Outbound notification of recorded RSVPs.
//!
//! The dispatcher is called after a submission has been written to the store.
//! Its result is only ever logged: a failed notification never undoes the
//! recorded answers.

use chrono::{DateTime, Utc};
use common::model::guest::Guest;
use log::info;
use serde::Serialize;
use std::time::Duration;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// What is sent out for one submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmissionSummary {
    pub group_id: i64,
    /// Guests of the group after the submission was applied.
    pub guests: Vec<Guest>,
    pub message: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionSummary {
    /// One line per guest, used as the body of the logged notification.
    pub fn describe(&self) -> String {
        let mut lines: Vec<String> = self
            .guests
            .iter()
            .map(|guest| {
                let answer = match guest.attending {
                    Some(true) => "attending",
                    Some(false) => "not attending",
                    None => "no answer",
                };
                format!("{}: {}", guest.name, answer)
            })
            .collect();
        if let Some(message) = &self.message {
            lines.push(format!("Message: {}", message));
        }
        lines.join("\n")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("notification endpoint answered HTTP {0}")]
    Status(u16),
}

#[derive(Clone)]
pub enum Dispatcher {
    /// Writes the summary to the log only.
    Log,
    /// POSTs the summary as JSON to a relay (mailer, chat hook, ...).
    Webhook { http: reqwest::Client, url: String },
}

impl Dispatcher {
    pub fn webhook(url: impl Into<String>) -> Result<Self, DispatchError> {
        let http = reqwest::Client::builder()
            .user_agent(format!("rsvp-backend/{}", env!("CARGO_PKG_VERSION")))
            .timeout(WEBHOOK_TIMEOUT)
            .build()?;
        Ok(Dispatcher::Webhook {
            http,
            url: url.into(),
        })
    }

    /// Picks the webhook dispatcher when a URL is configured.
    pub fn from_url(url: Option<&str>) -> Result<Self, DispatchError> {
        match url {
            Some(url) => Self::webhook(url),
            None => Ok(Dispatcher::Log),
        }
    }

    pub async fn dispatch(&self, summary: &SubmissionSummary) -> Result<(), DispatchError> {
        match self {
            Dispatcher::Log => {
                info!(
                    "RSVP received for group {}:\n{}",
                    summary.group_id,
                    summary.describe()
                );
                Ok(())
            }
            Dispatcher::Webhook { http, url } => {
                let response = http.post(url.as_str()).json(summary).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(DispatchError::Status(status.as_u16()));
                }
                info!("RSVP notification for group {} delivered", summary.group_id);
                Ok(())
            }
        }
    }
}
