use super::common::*;
use chrono::Duration;

use crate::workflows::leave::domain::{DocumentDescriptor, LeaveStatus, ReasonKind};
use crate::workflows::leave::intake::IntakeError;
use crate::workflows::leave::repository::ApplicationStore;
use crate::workflows::leave::service::SubmitError;

#[tokio::test]
async fn submit_persists_pending_application_and_requests_review() {
    let (service, store, notifier) = build_service();

    let receipt = service
        .submit_at(submission(), now())
        .await
        .expect("submission accepted");

    assert_eq!(receipt.status, LeaveStatus::Pending);
    assert_eq!(receipt.submitted_at, now());
    assert_eq!(receipt.token_expires_at, now() + Duration::hours(24));

    let stored = store
        .fetch(&receipt.application_id)
        .expect("fetch succeeds")
        .expect("application persisted");
    assert_eq!(stored.status, LeaveStatus::Pending);
    assert_eq!(stored.reason_type, ReasonKind::Other);
    assert_eq!(stored.student.name, "Rahul Sharma");
    assert_eq!(stored.duration_days(), 3);
    assert!(stored.decided_at.is_none());

    let reviews = notifier.reviews();
    assert_eq!(reviews.len(), 1);
    let review = &reviews[0];
    assert_eq!(review.application_id, receipt.application_id.as_str());
    assert!(review
        .approve_url
        .starts_with("https://gate.campus.example.edu/api/v1/leave/decision?aid="));
    assert!(review.approve_url.contains("action=approve"));
    assert!(review.reject_url.contains("action=reject"));
    assert_ne!(review.approve_url, review.reject_url);
}

#[tokio::test]
async fn receipt_never_carries_token_material() {
    let (service, _, _) = build_service();

    let receipt = service
        .submit_at(submission(), now())
        .await
        .expect("submission accepted");

    let encoded = serde_json::to_string(&receipt).expect("receipt serializes");
    assert!(!encoded.contains("hash"));
    assert!(!encoded.contains("approve"));
    assert!(!encoded.contains("reject"));
}

#[tokio::test]
async fn medical_reason_requires_a_document() {
    let (service, _, notifier) = build_service();

    let mut medical = submission();
    medical.reason = "Medical emergency at home".to_string();

    let error = service
        .submit_at(medical, now())
        .await
        .expect_err("medical leave without document refused");
    assert!(matches!(
        error,
        SubmitError::Intake(IntakeError::MedicalDocumentMissing)
    ));
    assert!(notifier.reviews().is_empty());
}

#[tokio::test]
async fn medical_reason_with_document_is_classified_medical() {
    let (service, store, _) = build_service();

    let mut medical = submission();
    medical.reason = "Medical checkup at the city hospital".to_string();
    medical.document = Some(DocumentDescriptor {
        name: "prescription.pdf".to_string(),
        sha256_hex: "ab".repeat(32),
    });

    let receipt = service
        .submit_at(medical, now())
        .await
        .expect("submission accepted");

    let stored = store
        .fetch(&receipt.application_id)
        .expect("fetch succeeds")
        .expect("application persisted");
    assert_eq!(stored.reason_type, ReasonKind::Medical);
    assert_eq!(
        stored.document.expect("document kept").name,
        "prescription.pdf"
    );
}

#[tokio::test]
async fn rejects_unsupported_document_type() {
    let (service, _, _) = build_service();

    let mut bad_document = submission();
    bad_document.document = Some(DocumentDescriptor {
        name: "note.docx".to_string(),
        sha256_hex: "cd".repeat(32),
    });

    let error = service
        .submit_at(bad_document, now())
        .await
        .expect_err("docx refused");
    assert!(matches!(
        error,
        SubmitError::Intake(IntakeError::UnsupportedDocument { ref extension }) if extension == "docx"
    ));
}

#[tokio::test]
async fn rejects_dates_out_of_order() {
    let (service, _, _) = build_service();

    let mut swapped = submission();
    swapped.from_date = date(2026, 9, 5);
    swapped.to_date = date(2026, 9, 3);

    let error = service
        .submit_at(swapped, now())
        .await
        .expect_err("swapped dates refused");
    assert!(matches!(
        error,
        SubmitError::Intake(IntakeError::DatesOutOfOrder)
    ));
}

#[tokio::test]
async fn rejects_start_in_the_past() {
    let (service, _, _) = build_service();

    let mut stale = submission();
    stale.from_date = date(2026, 8, 30);
    stale.to_date = date(2026, 9, 2);

    let error = service
        .submit_at(stale, now())
        .await
        .expect_err("past start refused");
    assert!(matches!(
        error,
        SubmitError::Intake(IntakeError::StartsInPast)
    ));
}

#[tokio::test]
async fn rejects_leave_longer_than_the_cap() {
    let (service, _, _) = build_service();

    let mut long = submission();
    long.from_date = date(2026, 9, 3);
    long.to_date = date(2026, 9, 20);

    let error = service
        .submit_at(long, now())
        .await
        .expect_err("18-day leave refused");
    assert!(matches!(
        error,
        SubmitError::Intake(IntakeError::TooLong {
            requested: 18,
            max: 14
        })
    ));
}

#[tokio::test]
async fn fourteen_days_exactly_is_accepted() {
    let (service, _, _) = build_service();

    let mut at_cap = submission();
    at_cap.from_date = date(2026, 9, 3);
    at_cap.to_date = date(2026, 9, 16);

    service
        .submit_at(at_cap, now())
        .await
        .expect("leave at the cap accepted");
}

#[tokio::test]
async fn rejects_blank_and_oversized_reasons() {
    let (service, _, _) = build_service();

    let mut blank = submission();
    blank.reason = "   ".to_string();
    assert!(matches!(
        service.submit_at(blank, now()).await,
        Err(SubmitError::Intake(IntakeError::ReasonRequired))
    ));

    let mut oversized = submission();
    oversized.reason = "x".repeat(501);
    assert!(matches!(
        service.submit_at(oversized, now()).await,
        Err(SubmitError::Intake(IntakeError::ReasonTooLong))
    ));
}

#[tokio::test]
async fn rejects_students_missing_from_the_roster() {
    let (service, _, _) = build_service();

    let mut stranger = submission();
    stranger.student_email = "unknown@example.edu".to_string();

    let error = service
        .submit_at(stranger, now())
        .await
        .expect_err("unknown student refused");
    assert!(matches!(
        error,
        SubmitError::Intake(IntakeError::UnknownStudent { .. })
    ));
}

#[tokio::test]
async fn roster_lookup_ignores_email_case() {
    let (service, _, _) = build_service();

    let mut shouting = submission();
    shouting.student_email = "RAHUL.SHARMA@Example.EDU".to_string();

    service
        .submit_at(shouting, now())
        .await
        .expect("case-insensitive lookup");
}
