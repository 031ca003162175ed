use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{ApplicationId, DecisionAction, LeaveApplication, LeaveSubmission};
use super::mask::{mask_email, mask_phone};
use super::notify::DecisionNotifier;
use super::repository::{ApplicationStore, StoreError};
use super::service::{DecisionOutcome, LeaveWorkflowService, SubmitError};

/// Router builder exposing HTTP endpoints for intake, status, and the
/// emailed decision links.
pub fn leave_router<S, N>(service: Arc<LeaveWorkflowService<S, N>>) -> Router
where
    S: ApplicationStore + 'static,
    N: DecisionNotifier + 'static,
{
    Router::new()
        .route("/api/v1/leave/applications", post(submit_handler::<S, N>))
        .route(
            "/api/v1/leave/applications/:application_id",
            get(status_handler::<S, N>),
        )
        .route("/api/v1/leave/decision", get(decision_handler::<S, N>))
        .with_state(service)
}

/// Status view with contact details redacted; safe to show to anyone who
/// knows the application id.
#[derive(Debug, Serialize)]
struct ApplicationView {
    application_id: String,
    status: &'static str,
    submitted_at: DateTime<FixedOffset>,
    from_date: chrono::NaiveDate,
    to_date: chrono::NaiveDate,
    duration_days: i64,
    reason_type: &'static str,
    student_name: String,
    student_email: String,
    parent_email: Option<String>,
    parent_mobile: Option<String>,
    decided_at: Option<DateTime<FixedOffset>>,
}

impl ApplicationView {
    fn from_application(application: &LeaveApplication) -> Self {
        let parent = application.parent_on_record();
        Self {
            application_id: application.application_id.as_str().to_string(),
            status: application.status.label(),
            submitted_at: application.submitted_at,
            from_date: application.from_date,
            to_date: application.to_date,
            duration_days: application.duration_days(),
            reason_type: application.reason_type.label(),
            student_name: application.student.name.clone(),
            student_email: mask_email(&application.student.email),
            parent_email: parent
                .and_then(|p| p.email.as_deref())
                .map(mask_email),
            parent_mobile: parent
                .and_then(|p| p.mobile.as_deref())
                .map(mask_phone),
            decided_at: application.decided_at,
        }
    }
}

pub(crate) async fn submit_handler<S, N>(
    State(service): State<Arc<LeaveWorkflowService<S, N>>>,
    axum::Json(submission): axum::Json<LeaveSubmission>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: DecisionNotifier + 'static,
{
    match service.submit(submission).await {
        Ok(receipt) => (StatusCode::ACCEPTED, axum::Json(receipt)).into_response(),
        Err(SubmitError::Intake(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(SubmitError::Store(StoreError::Conflict(_))) => {
            let payload = json!({
                "error": "application already exists",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => {
            tracing::error!(error = %other, "submission failed");
            let payload = json!({
                "error": "internal error",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn status_handler<S, N>(
    State(service): State<Arc<LeaveWorkflowService<S, N>>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: DecisionNotifier + 'static,
{
    let id = ApplicationId(application_id);
    match service.get(&id) {
        Ok(Some(application)) => {
            let view = ApplicationView::from_application(&application);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Ok(None) => {
            let payload = json!({
                "error": "application not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => {
            tracing::error!(application_id = %id, error = %error, "status lookup failed");
            let payload = json!({
                "error": "internal error",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

/// Query parameters carried by the emailed action links. Everything is
/// optional so a mangled link still lands on the generic outcome page
/// instead of a framework-generated 400.
#[derive(Debug, Deserialize)]
pub(crate) struct DecisionQuery {
    aid: Option<String>,
    action: Option<String>,
    t: Option<String>,
    note: Option<String>,
}

pub(crate) async fn decision_handler<S, N>(
    State(service): State<Arc<LeaveWorkflowService<S, N>>>,
    Query(query): Query<DecisionQuery>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: DecisionNotifier + 'static,
{
    let (Some(aid), Some(action), Some(token)) = (query.aid, query.action, query.t) else {
        return outcome_page(DecisionOutcome::GENERIC_REFUSAL, false);
    };

    let action = match action.as_str() {
        "approve" => DecisionAction::Approve,
        "reject" => DecisionAction::Reject,
        _ => return outcome_page(DecisionOutcome::GENERIC_REFUSAL, false),
    };

    let id = ApplicationId(aid);
    match service
        .decide(&id, action, &token, query.note.as_deref())
        .await
    {
        Ok(outcome) => outcome_page(&outcome.message(), outcome.is_recorded()),
        Err(error) => {
            tracing::error!(application_id = %id, error = %error, "decision failed");
            failure_page()
        }
    }
}

/// Renders the outcome page shown after following an action link. Policy
/// refusals and recorded decisions alike come back as 200: the page text
/// is the only signal.
fn outcome_page(message: &str, recorded: bool) -> Response {
    let tone = if recorded { "#2e7d32" } else { "#555555" };
    let heading = if recorded {
        "Decision recorded"
    } else {
        "Nothing to do"
    };
    let body = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <title>Campus Gate Pass</title></head>\
         <body style=\"font-family:Arial,Helvetica,sans-serif;background:#f5f5f5;\
         display:flex;justify-content:center;padding-top:10vh;\">\
         <div style=\"background:#ffffff;border:1px solid #e0e0e0;border-radius:6px;\
         padding:32px;max-width:480px;\">\
         <h2 style=\"color:{tone};margin-top:0;\">{heading}</h2>\
         <p>{message}</p>\
         <p style=\"color:#888888;font-size:12px;\">You may close this window.</p>\
         </div></body></html>"
    );
    (StatusCode::OK, Html(body)).into_response()
}

/// Shown when the store itself failed mid-decision. The decision may not
/// have been recorded, so this must not read like a processed request.
fn failure_page() -> Response {
    let body = "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <title>Campus Gate Pass</title></head>\
         <body style=\"font-family:Arial,Helvetica,sans-serif;background:#f5f5f5;\
         display:flex;justify-content:center;padding-top:10vh;\">\
         <div style=\"background:#ffffff;border:1px solid #e0e0e0;border-radius:6px;\
         padding:32px;max-width:480px;\">\
         <h2 style=\"color:#c62828;margin-top:0;\">Something went wrong</h2>\
         <p>We could not record this decision. Please try the link again shortly.</p>\
         </div></body></html>";
    (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
}
