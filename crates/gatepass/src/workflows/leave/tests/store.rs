use super::common::*;
use chrono::Duration;

use crate::workflows::leave::domain::{ApplicationId, LeaveStatus};
use crate::workflows::leave::repository::{
    ApplicationStore, DeliveryOutcome, NotificationLog, NotificationLogEntry, StoreError,
};
use crate::workflows::leave::store::RedbStore;

fn open_store() -> (RedbStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = RedbStore::open(&dir.path().join("gatepass.redb")).expect("store opens");
    (store, dir)
}

#[test]
fn create_then_fetch_round_trips_the_row() {
    let (store, _dir) = open_store();
    let application = pending_application();

    store.create(&application).expect("create succeeds");

    let fetched = store
        .fetch(&application.application_id)
        .expect("fetch succeeds")
        .expect("row present");
    assert_eq!(fetched, application);
}

#[test]
fn duplicate_ids_are_rejected() {
    let (store, _dir) = open_store();
    let application = pending_application();

    store.create(&application).expect("first create succeeds");
    let error = store
        .create(&application)
        .expect_err("duplicate create refused");
    assert!(matches!(error, StoreError::Conflict(_)));
}

#[test]
fn fetch_of_missing_id_is_none() {
    let (store, _dir) = open_store();
    let missing = store
        .fetch(&ApplicationId("absent".to_string()))
        .expect("fetch succeeds");
    assert!(missing.is_none());
}

#[test]
fn transition_moves_a_pending_row_exactly_once() {
    let (store, _dir) = open_store();
    let application = pending_application();
    store.create(&application).expect("create succeeds");

    let decided_at = now() + Duration::hours(3);
    let updated = store
        .transition(
            &application.application_id,
            LeaveStatus::Approved,
            ADMIN_EMAIL,
            decided_at,
        )
        .expect("first transition succeeds");
    assert_eq!(updated.status, LeaveStatus::Approved);
    assert_eq!(updated.decided_by.as_deref(), Some(ADMIN_EMAIL));
    assert_eq!(updated.decided_at, Some(decided_at));

    let second = store.transition(
        &application.application_id,
        LeaveStatus::Rejected,
        ADMIN_EMAIL,
        decided_at + Duration::minutes(1),
    );
    assert!(matches!(second, Err(StoreError::Conflict(_))));

    // The losing attempt must not have touched the row.
    let fetched = store
        .fetch(&application.application_id)
        .expect("fetch succeeds")
        .expect("row present");
    assert_eq!(fetched.status, LeaveStatus::Approved);
}

#[test]
fn transition_of_missing_row_is_not_found() {
    let (store, _dir) = open_store();
    let error = store
        .transition(
            &ApplicationId("absent".to_string()),
            LeaveStatus::Approved,
            ADMIN_EMAIL,
            now(),
        )
        .expect_err("missing row refused");
    assert!(matches!(error, StoreError::NotFound(_)));
}

#[test]
fn rows_survive_reopening_the_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("gatepass.redb");
    let application = pending_application();

    {
        let store = RedbStore::open(&path).expect("store opens");
        store.create(&application).expect("create succeeds");
    }

    let reopened = RedbStore::open(&path).expect("store reopens");
    let fetched = reopened
        .fetch(&application.application_id)
        .expect("fetch succeeds")
        .expect("row survived");
    assert_eq!(fetched, application);
}

#[test]
fn notification_log_appends_in_order_and_filters_by_application() {
    let (store, _dir) = open_store();
    let id = ApplicationId("1111".to_string());
    let other = ApplicationId("2222".to_string());

    for (application_id, recipient, outcome) in [
        (id.clone(), "warden@campus.example.edu", DeliveryOutcome::Sent),
        (other.clone(), "gate@campus.example.edu", DeliveryOutcome::Skipped),
        (id.clone(), "rahul.sharma@example.edu", DeliveryOutcome::Failed),
    ] {
        store
            .append(&NotificationLogEntry {
                application_id,
                channel: "email".to_string(),
                recipient: recipient.to_string(),
                subject: "subject".to_string(),
                sent_at: now(),
                outcome,
                error: None,
            })
            .expect("append succeeds");
    }

    let entries = store.entries_for(&id).expect("entries read");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].recipient, "warden@campus.example.edu");
    assert_eq!(entries[0].outcome, DeliveryOutcome::Sent);
    assert_eq!(entries[1].recipient, "rahul.sharma@example.edu");
    assert_eq!(entries[1].outcome, DeliveryOutcome::Failed);

    assert_eq!(store.entries_for(&other).expect("entries read").len(), 1);
}
