use crate::notify::{Dispatcher, SubmissionSummary};
use crate::services::error::ApiError;
use crate::services::rsvp::MAX_MESSAGE_CHARS;
use crate::store::{GuestKey, GuestStore, SqliteStore, StoreError};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use common::requests::{SubmitRsvpRequest, SubmitRsvpResponse};
use log::{error, info};

/// What the store did with one submission.
struct Recorded {
    updated: Vec<i64>,
    ignored: Vec<i64>,
    summary: SubmissionSummary,
}

pub(crate) async fn process(
    store: web::Data<SqliteStore>,
    dispatcher: web::Data<Dispatcher>,
    payload: web::Json<SubmitRsvpRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = validate(payload.into_inner())?;
    let group_id = request.group_id;

    let recorded = web::block(move || record_submission(store.get_ref(), request))
        .await??
        .ok_or_else(|| ApiError::NotFound(format!("group {} does not exist", group_id)))?;

    info!(
        "RSVP recorded for group {}: {} answers, {} ignored ids",
        group_id,
        recorded.updated.len(),
        recorded.ignored.len()
    );

    if let Err(e) = dispatcher.dispatch(&recorded.summary).await {
        error!("RSVP notification for group {} failed: {}", group_id, e);
    }

    Ok(HttpResponse::Ok().json(SubmitRsvpResponse {
        status: "completed".to_string(),
        updated: recorded.updated,
        ignored: recorded.ignored,
    }))
}

fn validate(mut request: SubmitRsvpRequest) -> Result<SubmitRsvpRequest, ApiError> {
    request.message = request
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    if let Some(message) = &request.message {
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ApiError::Validation(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_CHARS
            )));
        }
    }
    Ok(request)
}

/// Applies a submission. Returns `None` if the group does not exist, or
/// stopped existing while the submission was being applied.
fn record_submission<S>(
    store: &S,
    request: SubmitRsvpRequest,
) -> Result<Option<Recorded>, StoreError>
where
    S: GuestStore + ?Sized,
{
    let group_id = request.group_id;
    if store.get_group(group_id)?.is_none() {
        return Ok(None);
    }

    let submitted_at = Utc::now();
    if let Some(message) = &request.message {
        if !store.append_message(group_id, message, submitted_at)? {
            return Ok(None);
        }
    }

    let mut updated = Vec::new();
    let mut ignored = Vec::new();
    for rsvp in &request.guest_rsvps {
        if store.set_attendance(GuestKey::new(group_id, rsvp.id), rsvp.attending)? {
            updated.push(rsvp.id);
        } else {
            ignored.push(rsvp.id);
        }
    }

    // Re-read so the summary carries names and the answers as stored. A group
    // removed by a reconciliation pass in the meantime took the writes with it.
    let guests = match store.get_group(group_id)? {
        Some(group) => group.guests,
        None => return Ok(None),
    };

    Ok(Some(Recorded {
        updated,
        ignored,
        summary: SubmissionSummary {
            group_id,
            guests,
            message: request.message,
            submitted_at,
        },
    }))
}
