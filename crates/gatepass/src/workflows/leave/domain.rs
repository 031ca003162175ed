use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::token::TokenDigest;

/// Identifier wrapper for submitted leave applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    /// Derives a numeric-looking id from a fresh UUID: the first 64 bits of
    /// its SHA-256 digest rendered in decimal. Hard to guess, easy to read
    /// over the phone.
    pub fn generate() -> Self {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(uuid::Uuid::new_v4().as_bytes());
        let digest = hasher.finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(prefix).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Campus wall clock: all timestamps in the workflow use UTC+05:30.
pub fn campus_offset() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("UTC+05:30 is a valid offset")
}

/// High level status tracked throughout the approval life cycle.
///
/// `Pending` is the only non-terminal state; nothing ever transitions out
/// of `Approved` or `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeaveStatus::Pending => "PENDING",
            LeaveStatus::Approved => "APPROVED",
            LeaveStatus::Rejected => "REJECTED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }
}

/// The two actions reachable from the emailed review links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Approve,
    Reject,
}

impl DecisionAction {
    pub const fn label(self) -> &'static str {
        match self {
            DecisionAction::Approve => "approve",
            DecisionAction::Reject => "reject",
        }
    }

    pub const fn resulting_status(self) -> LeaveStatus {
        match self {
            DecisionAction::Approve => LeaveStatus::Approved,
            DecisionAction::Reject => LeaveStatus::Rejected,
        }
    }
}

/// Coarse reason classification derived from the free-text reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonKind {
    Medical,
    Other,
}

impl ReasonKind {
    /// Medical leave is inferred from the reason text and carries a
    /// mandatory supporting document at intake.
    pub fn classify(reason: &str) -> Self {
        if reason.to_lowercase().contains("medical") {
            ReasonKind::Medical
        } else {
            ReasonKind::Other
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ReasonKind::Medical => "MEDICAL",
            ReasonKind::Other => "OTHER",
        }
    }
}

/// Metadata for a supporting document; the content itself is never stored,
/// only its digest for later integrity checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub name: String,
    pub sha256_hex: String,
}

impl DocumentDescriptor {
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }
}

/// Student identity snapshot copied from the roster at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentContact {
    pub name: String,
    pub email: String,
    pub program: Option<String>,
    pub semester: Option<String>,
    pub section: Option<String>,
}

/// One parent's contact details; every field may be absent in the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

impl ParentContact {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.mobile.is_none()
    }
}

/// Roster row resolved for a student email; produced by the roster module
/// and consumed read-only by intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student: StudentContact,
    pub father: Option<ParentContact>,
    pub mother: Option<ParentContact>,
}

/// What a student sends from the submission form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveSubmission {
    pub student_email: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub reason: String,
    #[serde(default)]
    pub document: Option<DocumentDescriptor>,
}

/// The single durable entity: one leave request and its approval life cycle.
///
/// Created once at submission, mutated at most once by the decision
/// processor, never deleted. All datetime fields carry the fixed +05:30
/// offset and serialize as ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveApplication {
    pub application_id: ApplicationId,
    pub status: LeaveStatus,
    pub submitted_at: DateTime<FixedOffset>,

    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub reason: String,
    pub reason_type: ReasonKind,
    pub document: Option<DocumentDescriptor>,

    pub student: StudentContact,
    pub father: Option<ParentContact>,
    pub mother: Option<ParentContact>,

    pub approve_token_hash: TokenDigest,
    pub reject_token_hash: TokenDigest,
    pub token_expires_at: DateTime<FixedOffset>,

    pub decided_at: Option<DateTime<FixedOffset>>,
    pub decided_by: Option<String>,
}

impl LeaveApplication {
    /// Inclusive length of the requested window in days.
    pub fn duration_days(&self) -> i64 {
        (self.to_date - self.from_date).num_days() + 1
    }

    /// The stored digest the presented token must match for `action`.
    pub fn token_hash_for(&self, action: DecisionAction) -> &TokenDigest {
        match action {
            DecisionAction::Approve => &self.approve_token_hash,
            DecisionAction::Reject => &self.reject_token_hash,
        }
    }

    /// First parent with any contact detail on file, father preferred.
    pub fn parent_on_record(&self) -> Option<&ParentContact> {
        self.father
            .as_ref()
            .filter(|parent| !parent.is_empty())
            .or_else(|| self.mother.as_ref().filter(|parent| !parent.is_empty()))
    }

    /// Best parent email for decision notifications, father preferred.
    pub fn parent_email(&self) -> Option<&str> {
        let father = self.father.as_ref().and_then(|p| p.email.as_deref());
        father.or_else(|| self.mother.as_ref().and_then(|p| p.email.as_deref()))
    }
}
