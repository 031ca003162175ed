use chrono::{DateTime, FixedOffset, NaiveDate};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use gatepass::workflows::leave::{
    ApplicationId, ApplicationStore, LeaveApplication, LeaveStatus, NotificationLog,
    NotificationLogEntry, StoreError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Volatile store used by the CLI demo; the service proper runs on the
/// embedded database.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationStore {
    rows: Arc<Mutex<HashMap<String, LeaveApplication>>>,
}

impl ApplicationStore for InMemoryApplicationStore {
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationLog {
    entries: Arc<Mutex<Vec<NotificationLogEntry>>>,
}

impl NotificationLog for InMemoryNotificationLog {
    fn append(&self, entry: &NotificationLogEntry) -> Result<(), StoreError> {
        self.entries
            .lock()
            .expect("log mutex poisoned")
            .push(entry.clone());
        Ok(())
    }

    fn entries_for(&self, id: &ApplicationId) -> Result<Vec<NotificationLogEntry>, StoreError> {
        Ok(self
            .entries
            .lock()
            .expect("log mutex poisoned")
            .iter()
            .filter(|entry| entry.application_id == *id)
            .cloned()
            .collect())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
