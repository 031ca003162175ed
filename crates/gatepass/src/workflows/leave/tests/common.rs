use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::workflows::leave::domain::{
    campus_offset, ApplicationId, LeaveApplication, LeaveStatus, LeaveSubmission, ParentContact,
    ReasonKind, StudentContact, StudentRecord,
};
use crate::workflows::leave::notify::DecisionNotifier;
use crate::workflows::leave::repository::{
    ApplicationStore, NotificationLog, NotificationLogEntry, StoreError, StudentDirectory,
};
use crate::workflows::leave::token::TokenDigest;
use crate::workflows::leave::LeaveWorkflowService;

pub(crate) const APPROVE_TOKEN: &str = "approve-token-fixture";
pub(crate) const REJECT_TOKEN: &str = "reject-token-fixture";
pub(crate) const ADMIN_EMAIL: &str = "warden@campus.example.edu";
pub(crate) const SECURITY_EMAIL: &str = "gate@campus.example.edu";

pub(crate) fn now() -> DateTime<FixedOffset> {
    campus_offset()
        .with_ymd_and_hms(2026, 9, 1, 9, 0, 0)
        .single()
        .expect("fixture timestamp")
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(crate) fn workflow_config() -> WorkflowConfig {
    WorkflowConfig {
        admin_email: ADMIN_EMAIL.to_string(),
        security_email: SECURITY_EMAIL.to_string(),
        public_base_url: "https://gate.campus.example.edu".to_string(),
        token_ttl_hours: 24,
        max_leave_days: 14,
    }
}

pub(crate) fn student_record() -> StudentRecord {
    StudentRecord {
        student: StudentContact {
            name: "Rahul Sharma".to_string(),
            email: "rahul.sharma@example.edu".to_string(),
            program: Some("BTech".to_string()),
            semester: Some("5".to_string()),
            section: Some("A".to_string()),
        },
        father: Some(ParentContact {
            name: Some("Suresh Sharma".to_string()),
            email: Some("suresh.sharma@example.com".to_string()),
            mobile: Some("9876543210".to_string()),
        }),
        mother: Some(ParentContact {
            name: Some("Kavita Sharma".to_string()),
            email: Some("kavita.sharma@example.com".to_string()),
            mobile: Some("9876543211".to_string()),
        }),
    }
}

pub(crate) fn submission() -> LeaveSubmission {
    LeaveSubmission {
        student_email: "rahul.sharma@example.edu".to_string(),
        from_date: date(2026, 9, 3),
        to_date: date(2026, 9, 5),
        reason: "Family function at home".to_string(),
        document: None,
    }
}

pub(crate) fn pending_application() -> LeaveApplication {
    let record = student_record();
    LeaveApplication {
        application_id: ApplicationId("4242424242424242".to_string()),
        status: LeaveStatus::Pending,
        submitted_at: now(),
        from_date: date(2026, 9, 3),
        to_date: date(2026, 9, 5),
        reason: "Family function at home".to_string(),
        reason_type: ReasonKind::Other,
        document: None,
        student: record.student,
        father: record.father,
        mother: record.mother,
        approve_token_hash: TokenDigest::of(APPROVE_TOKEN),
        reject_token_hash: TokenDigest::of(REJECT_TOKEN),
        token_expires_at: now() + Duration::hours(24),
        decided_at: None,
        decided_by: None,
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    rows: Mutex<HashMap<String, LeaveApplication>>,
}

impl ApplicationStore for MemoryStore {
    fn create(&self, application: &LeaveApplication) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().expect("store mutex poisoned");
        let key = application.application_id.as_str().to_string();
        if rows.contains_key(&key) {
            return Err(StoreError::conflict(&application.application_id));
        }
        rows.insert(key, application.clone());
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, StoreError> {
        let rows = self.rows.lock().expect("store mutex poisoned");
        Ok(rows.get(id.as_str()).cloned())
    }

    fn transition(
        &self,
        id: &ApplicationId,
        to: LeaveStatus,
        decided_by: &str,
        decided_at: DateTime<FixedOffset>,
    ) -> Result<LeaveApplication, StoreError> {
        let mut rows = self.rows.lock().expect("store mutex poisoned");
        let row = rows
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::not_found(id))?;
        if row.status != LeaveStatus::Pending {
            return Err(StoreError::conflict(id));
        }
        row.status = to;
        row.decided_by = Some(decided_by.to_string());
        row.decided_at = Some(decided_at);
        Ok(row.clone())
    }
}

#[derive(Default)]
pub(crate) struct MemoryLog {
    entries: Mutex<Vec<NotificationLogEntry>>,
}

impl MemoryLog {
    pub(crate) fn entries(&self) -> Vec<NotificationLogEntry> {
        self.entries.lock().expect("log mutex poisoned").clone()
    }
}

impl NotificationLog for MemoryLog {
    fn append(&self, entry: &NotificationLogEntry) -> Result<(), StoreError> {
        self.entries
            .lock()
            .expect("log mutex poisoned")
            .push(entry.clone());
        Ok(())
    }

    fn entries_for(&self, id: &ApplicationId) -> Result<Vec<NotificationLogEntry>, StoreError> {
        Ok(self
            .entries()
            .into_iter()
            .filter(|entry| entry.application_id == *id)
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct MemoryDirectory {
    records: HashMap<String, StudentRecord>,
}

impl MemoryDirectory {
    pub(crate) fn with_default_roster() -> Self {
        let mut directory = Self::default();
        directory.insert(student_record());
        directory
    }

    pub(crate) fn insert(&mut self, record: StudentRecord) {
        self.records
            .insert(record.student.email.to_lowercase(), record);
    }
}

impl StudentDirectory for MemoryDirectory {
    fn find_by_email(&self, email: &str) -> Option<StudentRecord> {
        self.records.get(&email.trim().to_lowercase()).cloned()
    }
}

/// Records every notification request so tests can assert on the fan-out
/// without rendering or sending anything.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub(crate) reviews: Mutex<Vec<ReviewRequest>>,
    pub(crate) decisions: Mutex<Vec<DecisionNotice>>,
}

#[derive(Debug, Clone)]
pub(crate) struct ReviewRequest {
    pub(crate) application_id: String,
    pub(crate) approve_url: String,
    pub(crate) reject_url: String,
}

#[derive(Debug, Clone)]
pub(crate) struct DecisionNotice {
    pub(crate) application_id: String,
    pub(crate) status: LeaveStatus,
    pub(crate) note: Option<String>,
}

impl RecordingNotifier {
    pub(crate) fn reviews(&self) -> Vec<ReviewRequest> {
        self.reviews.lock().expect("notifier mutex poisoned").clone()
    }

    pub(crate) fn decisions(&self) -> Vec<DecisionNotice> {
        self.decisions
            .lock()
            .expect("notifier mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl DecisionNotifier for RecordingNotifier {
    async fn review_requested(
        &self,
        application: &LeaveApplication,
        approve_url: &str,
        reject_url: &str,
    ) {
        self.reviews
            .lock()
            .expect("notifier mutex poisoned")
            .push(ReviewRequest {
                application_id: application.application_id.as_str().to_string(),
                approve_url: approve_url.to_string(),
                reject_url: reject_url.to_string(),
            });
    }

    async fn decision_recorded(&self, application: &LeaveApplication, note: Option<&str>) {
        self.decisions
            .lock()
            .expect("notifier mutex poisoned")
            .push(DecisionNotice {
                application_id: application.application_id.as_str().to_string(),
                status: application.status,
                note: note.map(str::to_string),
            });
    }
}

/// Store whose writes always fail, for the internal-error paths.
pub(crate) struct UnavailableStore;

impl ApplicationStore for UnavailableStore {
    fn create(&self, _application: &LeaveApplication) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<LeaveApplication>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn transition(
        &self,
        _id: &ApplicationId,
        _to: LeaveStatus,
        _decided_by: &str,
        _decided_at: DateTime<FixedOffset>,
    ) -> Result<LeaveApplication, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Store that reports a pending row but loses every transition race.
pub(crate) struct RacingStore;

impl ApplicationStore for RacingStore {
    fn create(&self, _application: &LeaveApplication) -> Result<(), StoreError> {
        Ok(())
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<LeaveApplication>, StoreError> {
        Ok(Some(pending_application()))
    }

    fn transition(
        &self,
        id: &ApplicationId,
        _to: LeaveStatus,
        _decided_by: &str,
        _decided_at: DateTime<FixedOffset>,
    ) -> Result<LeaveApplication, StoreError> {
        Err(StoreError::conflict(id))
    }
}

pub(crate) type TestService = LeaveWorkflowService<MemoryStore, RecordingNotifier>;

pub(crate) fn build_service() -> (Arc<TestService>, Arc<MemoryStore>, Arc<RecordingNotifier>) {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let directory = Arc::new(MemoryDirectory::with_default_roster());
    let service = Arc::new(LeaveWorkflowService::new(
        store.clone(),
        notifier.clone(),
        directory,
        workflow_config(),
    ));
    (service, store, notifier)
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(crate) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
