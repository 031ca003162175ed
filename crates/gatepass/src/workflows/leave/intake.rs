//! Submission guardrails applied before anything is persisted.

use chrono::NaiveDate;
use thiserror::Error;

use super::domain::{LeaveSubmission, ReasonKind, StudentRecord};
use super::repository::StudentDirectory;

const MAX_REASON_LEN: usize = 500;
const ALLOWED_DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("end date must not be before start date")]
    DatesOutOfOrder,

    #[error("start date must not be in the past")]
    StartsInPast,

    #[error("leave may not exceed {max} days (requested {requested})")]
    TooLong { requested: i64, max: u32 },

    #[error("a reason is required")]
    ReasonRequired,

    #[error("reason must be at most {MAX_REASON_LEN} characters")]
    ReasonTooLong,

    #[error("medical leave requires a supporting document")]
    MedicalDocumentMissing,

    #[error("unsupported document type {extension:?}")]
    UnsupportedDocument { extension: String },

    #[error("no enrolled student found for {email}")]
    UnknownStudent { email: String },
}

/// Stateless validation of a submission against the configured caps.
///
/// Checks run in a fixed order and the first failure wins, so a student
/// fixing errors sees them one at a time rather than as a moving target.
#[derive(Debug, Clone)]
pub struct IntakePolicy {
    max_leave_days: u32,
}

impl IntakePolicy {
    pub fn new(max_leave_days: u32) -> Self {
        Self { max_leave_days }
    }

    /// Validates the submission and resolves the student against the
    /// roster. Returns the roster record so the caller can snapshot the
    /// contact details into the application.
    pub fn admit(
        &self,
        submission: &LeaveSubmission,
        directory: &dyn StudentDirectory,
        today: NaiveDate,
    ) -> Result<StudentRecord, IntakeError> {
        if submission.to_date < submission.from_date {
            return Err(IntakeError::DatesOutOfOrder);
        }
        if submission.from_date < today {
            return Err(IntakeError::StartsInPast);
        }

        let requested = (submission.to_date - submission.from_date).num_days() + 1;
        if requested > i64::from(self.max_leave_days) {
            return Err(IntakeError::TooLong {
                requested,
                max: self.max_leave_days,
            });
        }

        let reason = submission.reason.trim();
        if reason.is_empty() {
            return Err(IntakeError::ReasonRequired);
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(IntakeError::ReasonTooLong);
        }

        if let Some(document) = &submission.document {
            let extension = document.extension().unwrap_or_default();
            if !ALLOWED_DOCUMENT_EXTENSIONS.contains(&extension.as_str()) {
                return Err(IntakeError::UnsupportedDocument { extension });
            }
        } else if ReasonKind::classify(reason) == ReasonKind::Medical {
            return Err(IntakeError::MedicalDocumentMissing);
        }

        directory
            .find_by_email(&submission.student_email)
            .ok_or_else(|| IntakeError::UnknownStudent {
                email: submission.student_email.clone(),
            })
    }
}
