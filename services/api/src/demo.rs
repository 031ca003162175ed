//! CLI walkthrough of the leave workflow against in-memory infrastructure.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use clap::Args;

use gatepass::config::WorkflowConfig;
use gatepass::error::AppError;
use chrono::Utc;

use gatepass::workflows::leave::{
    campus_offset, DecisionAction, DecisionNotifier, DeliveryOutcome, LeaveApplication,
    LeaveStatus, LeaveSubmission, LeaveWorkflowService, NotificationLog, NotificationLogEntry,
};
use gatepass::workflows::roster::CsvRoster;

use crate::infra::{InMemoryApplicationStore, InMemoryNotificationLog};

const DEMO_ROSTER: &str = "\
Student Name,Candidate Adress Email,Course,Semester,Section,Father Name,Father Mobile Number,Father Adress Email,Mother Name,Mother Address Email,Mother Mobile Number
Rahul Sharma,rahul.sharma@example.edu,BTech,5,A,Suresh Sharma,9876543210,suresh.sharma@example.com,Kavita Sharma,kavita.sharma@example.com,9876543211
";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Leave start date (YYYY-MM-DD). Defaults to tomorrow.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) from: Option<NaiveDate>,
    /// Leave end date (YYYY-MM-DD). Defaults to the start date + 2 days.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) to: Option<NaiveDate>,
    /// Reason for the sample leave request.
    #[arg(long)]
    pub(crate) reason: Option<String>,
    /// Apply `approve` or `reject` when following the action link.
    #[arg(long, default_value = "approve")]
    pub(crate) decision: String,
}

/// Notifier that narrates the workflow on stdout, keeps the action links
/// so the demo can follow them, and records skipped sends in the log.
struct ConsoleNotifier {
    links: Mutex<Option<(String, String)>>,
    log: Arc<InMemoryNotificationLog>,
}

impl ConsoleNotifier {
    fn new(log: Arc<InMemoryNotificationLog>) -> Self {
        Self {
            links: Mutex::new(None),
            log,
        }
    }

    fn links(&self) -> Option<(String, String)> {
        self.links.lock().expect("links mutex poisoned").clone()
    }

    fn record(&self, application: &LeaveApplication, recipient: &str, subject: String) {
        let entry = NotificationLogEntry {
            application_id: application.application_id.clone(),
            channel: "console".to_string(),
            recipient: recipient.to_string(),
            subject,
            sent_at: Utc::now().with_timezone(&campus_offset()),
            outcome: DeliveryOutcome::Skipped,
            error: None,
        };
        let _ = self.log.append(&entry);
    }
}

#[async_trait]
impl DecisionNotifier for ConsoleNotifier {
    async fn review_requested(
        &self,
        application: &LeaveApplication,
        approve_url: &str,
        reject_url: &str,
    ) {
        println!("  -> review request emailed to the administrator");
        println!("     approve: {approve_url}");
        println!("     reject:  {reject_url}");
        *self.links.lock().expect("links mutex poisoned") =
            Some((approve_url.to_string(), reject_url.to_string()));
        self.record(application, "administrator", "Leave review request".to_string());
    }

    async fn decision_recorded(&self, application: &LeaveApplication, note: Option<&str>) {
        println!(
            "  -> decision notices sent for {} ({})",
            application.application_id,
            application.status.label()
        );
        if let Some(note) = note {
            println!("     note: {note}");
        }

        let status = application.status.label();
        self.record(application, "administrator", format!("Decision recorded: {status}"));
        if application.status == LeaveStatus::Approved {
            self.record(application, "security desk", "Gate clearance".to_string());
        }
        if let Some(parent) = application.parent_email() {
            self.record(application, parent, format!("Leave {status}"));
        }
        self.record(
            application,
            &application.student.email,
            format!("Your leave request is {status}"),
        );
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let from = args
        .from
        .unwrap_or_else(|| Local::now().date_naive() + Duration::days(1));
    let to = args.to.unwrap_or(from + Duration::days(2));
    let reason = args
        .reason
        .unwrap_or_else(|| "Family function at home".to_string());
    let action = match args.decision.as_str() {
        "reject" => DecisionAction::Reject,
        _ => DecisionAction::Approve,
    };

    let roster = CsvRoster::from_reader(DEMO_ROSTER.as_bytes())?;
    let store = Arc::new(InMemoryApplicationStore::default());
    let log = Arc::new(InMemoryNotificationLog::default());
    let notifier = Arc::new(ConsoleNotifier::new(log.clone()));
    let config = WorkflowConfig {
        admin_email: "warden@campus.example.edu".to_string(),
        security_email: "gate@campus.example.edu".to_string(),
        public_base_url: "http://localhost:3000".to_string(),
        token_ttl_hours: 24,
        max_leave_days: 14,
    };

    let service = LeaveWorkflowService::new(store, notifier.clone(), Arc::new(roster), config);

    println!("Submitting leave request for rahul.sharma@example.edu ({from} to {to})");
    let receipt = match service
        .submit(LeaveSubmission {
            student_email: "rahul.sharma@example.edu".to_string(),
            from_date: from,
            to_date: to,
            reason,
            document: None,
        })
        .await
    {
        Ok(receipt) => receipt,
        Err(err) => {
            eprintln!("demo submission rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "Accepted as application {} (links valid until {})",
        receipt.application_id, receipt.token_expires_at
    );

    let (approve_url, reject_url) = notifier.links().expect("review links recorded");
    let (followed, replayed) = match action {
        DecisionAction::Approve => (approve_url, reject_url),
        DecisionAction::Reject => (reject_url, approve_url),
    };

    println!("\nFollowing the {} link...", action.label());
    let outcome = service
        .decide(
            &receipt.application_id,
            action,
            token_of(&followed),
            None,
        )
        .await?;
    println!("  {}", outcome.message());

    println!("\nReplaying the other link an instant later...");
    let other_action = match action {
        DecisionAction::Approve => DecisionAction::Reject,
        DecisionAction::Reject => DecisionAction::Approve,
    };
    let replay = service
        .decide(&receipt.application_id, other_action, token_of(&replayed), None)
        .await?;
    println!("  {}", replay.message());

    println!("\nNotification audit trail:");
    for entry in log.entries_for(&receipt.application_id)? {
        println!(
            "  [{}] {} -> {} ({})",
            entry.outcome.label(),
            entry.subject,
            entry.recipient,
            entry.sent_at
        );
    }

    Ok(())
}

fn token_of(url: &str) -> &str {
    url.rsplit("&t=").next().unwrap_or_default()
}
