//! Service composing intake, the application store, and notification
//! fan-out into the submission and decision operations.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;

use crate::config::WorkflowConfig;

use super::domain::{
    campus_offset, ApplicationId, DecisionAction, LeaveApplication, LeaveStatus, LeaveSubmission,
    ReasonKind,
};
use super::intake::{IntakeError, IntakePolicy};
use super::notify::DecisionNotifier;
use super::repository::{ApplicationStore, StoreError, StudentDirectory};
use super::token::ActionToken;

/// Wiring for the leave workflow: durable store, notifier, roster lookup.
pub struct LeaveWorkflowService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    directory: Arc<dyn StudentDirectory>,
    intake: IntakePolicy,
    config: WorkflowConfig,
}

/// What the submitter gets back; deliberately excludes the tokens.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    pub status: LeaveStatus,
    pub submitted_at: DateTime<FixedOffset>,
    pub token_expires_at: DateTime<FixedOffset>,
}

/// Result of presenting an action token.
///
/// Every non-success variant renders the same outward message, so the
/// response never reveals whether an application exists, was already
/// decided, or the token merely expired.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    Approved(Box<LeaveApplication>),
    Rejected(Box<LeaveApplication>),
    NotFound,
    AlreadyDecided,
    Expired,
    TokenMismatch,
}

impl DecisionOutcome {
    pub const GENERIC_REFUSAL: &'static str =
        "This request has already been processed or the link has expired.";

    pub fn message(&self) -> String {
        match self {
            DecisionOutcome::Approved(application) => format!(
                "Leave request {} has been APPROVED. All parties have been notified.",
                application.application_id
            ),
            DecisionOutcome::Rejected(application) => format!(
                "Leave request {} has been REJECTED. All parties have been notified.",
                application.application_id
            ),
            _ => Self::GENERIC_REFUSAL.to_string(),
        }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(
            self,
            DecisionOutcome::Approved(_) | DecisionOutcome::Rejected(_)
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<S, N> LeaveWorkflowService<S, N>
where
    S: ApplicationStore + 'static,
    N: DecisionNotifier + 'static,
{
    pub fn new(
        store: Arc<S>,
        notifier: Arc<N>,
        directory: Arc<dyn StudentDirectory>,
        config: WorkflowConfig,
    ) -> Self {
        let intake = IntakePolicy::new(config.max_leave_days);
        Self {
            store,
            notifier,
            directory,
            intake,
            config,
        }
    }

    /// Submit a new leave request, persist it, and email the reviewer.
    pub async fn submit(
        &self,
        submission: LeaveSubmission,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let now = Utc::now().with_timezone(&campus_offset());
        self.submit_at(submission, now).await
    }

    /// Submission with an explicit clock, used directly by tests.
    pub async fn submit_at(
        &self,
        submission: LeaveSubmission,
        now: DateTime<FixedOffset>,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let record = self
            .intake
            .admit(&submission, &*self.directory, now.date_naive())?;

        let reason = submission.reason.trim().to_string();
        let application_id = ApplicationId::generate();
        let approve_token = ActionToken::generate();
        let reject_token = ActionToken::generate();

        let application = LeaveApplication {
            application_id: application_id.clone(),
            status: LeaveStatus::Pending,
            submitted_at: now,
            from_date: submission.from_date,
            to_date: submission.to_date,
            reason_type: ReasonKind::classify(&reason),
            reason,
            document: submission.document,
            student: record.student,
            father: record.father,
            mother: record.mother,
            approve_token_hash: approve_token.digest(),
            reject_token_hash: reject_token.digest(),
            token_expires_at: now + Duration::hours(self.config.token_ttl_hours),
            decided_at: None,
            decided_by: None,
        };

        self.store.create(&application)?;

        tracing::info!(
            application_id = %application.application_id,
            student = %application.student.email,
            from = %application.from_date,
            to = %application.to_date,
            "leave request accepted"
        );

        let approve_url = self.decision_url(&application_id, DecisionAction::Approve, &approve_token);
        let reject_url = self.decision_url(&application_id, DecisionAction::Reject, &reject_token);
        self.notifier
            .review_requested(&application, &approve_url, &reject_url)
            .await;

        Ok(SubmissionReceipt {
            application_id,
            status: application.status,
            submitted_at: application.submitted_at,
            token_expires_at: application.token_expires_at,
        })
    }

    /// Apply a decision carried by an emailed action link.
    pub async fn decide(
        &self,
        id: &ApplicationId,
        action: DecisionAction,
        token: &str,
        note: Option<&str>,
    ) -> Result<DecisionOutcome, StoreError> {
        let now = Utc::now().with_timezone(&campus_offset());
        self.decide_at(id, action, token, note, now).await
    }

    /// Decision with an explicit clock, used directly by tests.
    ///
    /// Checks run in hiding order: existence, terminal status, expiry, and
    /// only then the token itself, so a mismatched token learns nothing
    /// about the application's state.
    pub async fn decide_at(
        &self,
        id: &ApplicationId,
        action: DecisionAction,
        token: &str,
        note: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> Result<DecisionOutcome, StoreError> {
        let Some(application) = self.store.fetch(id)? else {
            tracing::warn!(application_id = %id, "decision link for unknown application");
            return Ok(DecisionOutcome::NotFound);
        };

        if application.status.is_terminal() {
            tracing::info!(
                application_id = %id,
                status = application.status.label(),
                "decision link replayed after terminal status"
            );
            return Ok(DecisionOutcome::AlreadyDecided);
        }

        if now > application.token_expires_at {
            tracing::info!(application_id = %id, "decision link presented after expiry");
            return Ok(DecisionOutcome::Expired);
        }

        if !application.token_hash_for(action).verify(token) {
            tracing::warn!(
                application_id = %id,
                action = action.label(),
                "decision link token mismatch"
            );
            return Ok(DecisionOutcome::TokenMismatch);
        }

        let updated = match self.store.transition(
            id,
            action.resulting_status(),
            &self.config.admin_email,
            now,
        ) {
            Ok(updated) => updated,
            // Lost the race to a concurrent decision.
            Err(StoreError::Conflict(_)) => return Ok(DecisionOutcome::AlreadyDecided),
            Err(StoreError::NotFound(_)) => return Ok(DecisionOutcome::NotFound),
            Err(err) => return Err(err),
        };

        tracing::info!(
            application_id = %id,
            status = updated.status.label(),
            "decision recorded"
        );

        self.notifier.decision_recorded(&updated, note).await;

        Ok(match updated.status {
            LeaveStatus::Approved => DecisionOutcome::Approved(Box::new(updated)),
            _ => DecisionOutcome::Rejected(Box::new(updated)),
        })
    }

    /// Fetch an application for the status endpoint.
    pub fn get(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, StoreError> {
        self.store.fetch(id)
    }

    fn decision_url(
        &self,
        id: &ApplicationId,
        action: DecisionAction,
        token: &ActionToken,
    ) -> String {
        format!(
            "{}/api/v1/leave/decision?aid={}&action={}&t={}",
            self.config.public_base_url,
            id,
            action.label(),
            token.as_str()
        )
    }
}
