//! Embedded database implementation of the persistence traits.
//!
//! Backed by redb with one table per concern: applications keyed by id,
//! the notification log keyed by an append sequence. Rows are stored as
//! JSON so the on-disk format stays inspectable.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use redb::{Database, ReadableTable, TableDefinition};

use super::domain::{ApplicationId, LeaveApplication, LeaveStatus};
use super::repository::{ApplicationStore, NotificationLog, NotificationLogEntry, StoreError};

const APPLICATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("leave_applications");
const NOTIFICATIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("notifications_log");

/// redb-backed store; cheap to clone, safe to share across handlers.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Opens (or creates) the database file and ensures both tables exist,
    /// so later reads never trip over a missing table.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let txn = db
            .begin_write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        {
            txn.open_table(APPLICATIONS)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            txn.open_table(NOTIFICATIONS)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
        txn.commit()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn encode(application: &LeaveApplication) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(application).map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<LeaveApplication, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl ApplicationStore for RedbStore {
    fn create(&self, application: &LeaveApplication) -> Result<(), StoreError> {
        let id = application.application_id.as_str();
        let encoded = Self::encode(application)?;

        let txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        {
            let mut table = txn
                .open_table(APPLICATIONS)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;

            let occupied = table
                .get(id)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
                .is_some();
            if occupied {
                return Err(StoreError::conflict(&application.application_id));
            }

            table
                .insert(id, encoded.as_slice())
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;

            // Read back what was just written before acknowledging.
            let stored = table
                .get(id)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
                .ok_or_else(|| StoreError::verification(&application.application_id))?;
            let round_trip = Self::decode(stored.value())?;
            if &round_trip != application {
                return Err(StoreError::verification(&application.application_id));
            }
        }
        txn.commit()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LeaveApplication>, StoreError> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let table = txn
            .open_table(APPLICATIONS)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let Some(stored) = table
            .get(id.as_str())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
        else {
            return Ok(None);
        };

        Self::decode(stored.value()).map(Some)
    }

    fn transition(
        &self,
        id: &ApplicationId,
        to: LeaveStatus,
        decided_by: &str,
        decided_at: DateTime<FixedOffset>,
    ) -> Result<LeaveApplication, StoreError> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let updated = {
            let mut table = txn
                .open_table(APPLICATIONS)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;

            let current = {
                let Some(stored) = table
                    .get(id.as_str())
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?
                else {
                    return Err(StoreError::not_found(id));
                };
                Self::decode(stored.value())?
            };

            // Compare-and-swap: only PENDING rows may move, and the check
            // shares the write transaction with the update.
            if current.status != LeaveStatus::Pending {
                return Err(StoreError::conflict(id));
            }

            let mut updated = current;
            updated.status = to;
            updated.decided_by = Some(decided_by.to_string());
            updated.decided_at = Some(decided_at);

            let encoded = Self::encode(&updated)?;
            table
                .insert(id.as_str(), encoded.as_slice())
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;

            updated
        };

        txn.commit()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(updated)
    }
}

impl NotificationLog for RedbStore {
    fn append(&self, entry: &NotificationLogEntry) -> Result<(), StoreError> {
        let encoded =
            serde_json::to_vec(entry).map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        {
            let mut table = txn
                .open_table(NOTIFICATIONS)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;

            let next = table
                .last()
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
                .map(|(key, _)| key.value() + 1)
                .unwrap_or(0);

            table
                .insert(next, encoded.as_slice())
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
        txn.commit()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(())
    }

    fn entries_for(&self, id: &ApplicationId) -> Result<Vec<NotificationLogEntry>, StoreError> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let table = txn
            .open_table(NOTIFICATIONS)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut entries = Vec::new();
        for row in table
            .iter()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
        {
            let (_, value) = row.map_err(|e| StoreError::Unavailable(e.to_string()))?;
            let entry: NotificationLogEntry = serde_json::from_slice(value.value())
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            if entry.application_id == *id {
                entries.push(entry);
            }
        }

        Ok(entries)
    }
}
