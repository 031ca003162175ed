//! Student leave workflow: intake, token-gated decisions, and fan-out.
//!
//! A submission is validated against the roster and the configured caps,
//! persisted as a PENDING application, and announced to the administrator
//! with two single-use action links. Following a link moves the
//! application to its one terminal status and notifies everyone involved;
//! every later or mismatched link lands on the same generic outcome page.

pub mod domain;
pub(crate) mod intake;
pub mod mask;
pub mod notify;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;
pub mod templates;
pub mod token;

#[cfg(test)]
pub(crate) mod tests;

pub use domain::{
    campus_offset, ApplicationId, DecisionAction, DocumentDescriptor, LeaveApplication,
    LeaveStatus, LeaveSubmission, ParentContact, ReasonKind, StudentContact, StudentRecord,
};
pub use intake::{IntakeError, IntakePolicy};
pub use notify::{DecisionNotifier, EmailNotifier, MailTransport, NotifyError, SmtpMailer};
pub use repository::{
    ApplicationStore, DeliveryOutcome, NotificationLog, NotificationLogEntry, StoreError,
    StudentDirectory,
};
pub use router::leave_router;
pub use service::{DecisionOutcome, LeaveWorkflowService, SubmissionReceipt, SubmitError};
pub use store::RedbStore;
pub use templates::RenderedEmail;
pub use token::{ActionToken, TokenDigest};
