//! Persistence seams for the leave workflow.
//!
//! The service talks to these traits only; `store.rs` provides the embedded
//! database implementation and the tests substitute in-memory doubles.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::domain::{ApplicationId, LeaveApplication, LeaveStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("application {0} already exists")]
    Conflict(ApplicationIdRepr),

    #[error("application {0} not found")]
    NotFound(ApplicationIdRepr),

    #[error("read-back verification failed for application {0}")]
    Verification(ApplicationIdRepr),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Plain string form of an id, so error values stay cheap to construct.
pub type ApplicationIdRepr = String;

impl StoreError {
    pub fn conflict(id: &ApplicationId) -> Self {
        Self::Conflict(id.as_str().to_string())
    }

    pub fn not_found(id: &ApplicationId) -> Self {
        Self::NotFound(id.as_str().to_string())
    }

    pub fn verification(id: &ApplicationId) -> Self {
        Self::Verification(id.as_str().to_string())
    }
}

/// Durable home for leave applications.
pub trait ApplicationStore: Send + Sync {
    /// Persists a new application and re-reads it before reporting success.
    /// Fails with `Conflict` when the id is already taken and with
    /// `Verification` when the read-back does not match what was written.
    fn create(&self, application: &LeaveApplication) -> Result<(), StoreError>;

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, StoreError>;

    /// Atomically moves a PENDING application to a terminal status.
    ///
    /// The compare happens inside the same write transaction as the swap,
    /// so two concurrent decisions can never both succeed. Returns the
    /// updated row; `Conflict` means the application was already decided.
    fn transition(
        &self,
        id: &ApplicationId,
        to: LeaveStatus,
        decided_by: &str,
        decided_at: DateTime<FixedOffset>,
    ) -> Result<LeaveApplication, StoreError>;
}

/// Delivery outcome recorded for every notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    Sent,
    Failed,
    /// No transport configured; the send was deliberately skipped.
    Skipped,
}

impl DeliveryOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            DeliveryOutcome::Sent => "SENT",
            DeliveryOutcome::Failed => "FAILED",
            DeliveryOutcome::Skipped => "SKIPPED_NO_SMTP",
        }
    }
}

/// One row of the notification audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationLogEntry {
    pub application_id: ApplicationId,
    pub channel: String,
    pub recipient: String,
    pub subject: String,
    pub sent_at: DateTime<FixedOffset>,
    pub outcome: DeliveryOutcome,
    pub error: Option<String>,
}

/// Append-only audit log of notification attempts. A failed append must
/// never abort the send that produced it.
pub trait NotificationLog: Send + Sync {
    fn append(&self, entry: &NotificationLogEntry) -> Result<(), StoreError>;

    fn entries_for(&self, id: &ApplicationId) -> Result<Vec<NotificationLogEntry>, StoreError>;
}

/// Lookup of enrolled students by email, backed by the roster import.
pub trait StudentDirectory: Send + Sync {
    fn find_by_email(&self, email: &str) -> Option<super::domain::StudentRecord>;
}
