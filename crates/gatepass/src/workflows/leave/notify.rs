//! Notification fan-out for review requests and recorded decisions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::config::{MailConfig, SmtpConfig};

use super::domain::{campus_offset, LeaveApplication, LeaveStatus};
use super::repository::{DeliveryOutcome, NotificationLog, NotificationLogEntry};
use super::templates::{self, RenderedEmail};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mail address {0:?}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Message(String),

    #[error("smtp transport error: {0}")]
    Transport(String),
}

/// Low-level delivery seam; the workflow tests substitute a recording
/// double so no test ever opens a socket.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, recipient: &str, email: &RenderedEmail) -> Result<(), NotifyError>;
}

/// What the decision workflow asks of its notification layer.
///
/// Delivery failures are recorded, never propagated: a dead mailbox must
/// not fail a submission or roll back a recorded decision.
#[async_trait]
pub trait DecisionNotifier: Send + Sync {
    /// Sends the administrator the review request with both action links.
    async fn review_requested(
        &self,
        application: &LeaveApplication,
        approve_url: &str,
        reject_url: &str,
    );

    /// Fans out the recorded decision to everyone it concerns.
    async fn decision_recorded(&self, application: &LeaveApplication, note: Option<&str>);
}

/// Email fan-out with a persistent audit trail.
///
/// `transport: None` means no SMTP host is configured; every send is then
/// logged as skipped and the workflow proceeds as if delivery succeeded.
pub struct EmailNotifier<M, L> {
    transport: Option<M>,
    log: Arc<L>,
    admin_email: String,
    security_email: String,
}

impl<M, L> EmailNotifier<M, L>
where
    M: MailTransport,
    L: NotificationLog,
{
    pub fn new(
        transport: Option<M>,
        log: Arc<L>,
        admin_email: String,
        security_email: String,
    ) -> Self {
        Self {
            transport,
            log,
            admin_email,
            security_email,
        }
    }

    async fn send_and_log(
        &self,
        application: &LeaveApplication,
        recipient: &str,
        email: &RenderedEmail,
    ) {
        let (outcome, error) = match &self.transport {
            Some(transport) => match transport.deliver(recipient, email).await {
                Ok(()) => (DeliveryOutcome::Sent, None),
                Err(err) => {
                    tracing::warn!(
                        application_id = %application.application_id,
                        recipient,
                        error = %err,
                        "email delivery failed"
                    );
                    (DeliveryOutcome::Failed, Some(err.to_string()))
                }
            },
            None => {
                tracing::info!(
                    application_id = %application.application_id,
                    recipient,
                    subject = %email.subject,
                    "smtp not configured, skipping send"
                );
                (DeliveryOutcome::Skipped, None)
            }
        };

        let entry = NotificationLogEntry {
            application_id: application.application_id.clone(),
            channel: "email".to_string(),
            recipient: recipient.to_string(),
            subject: email.subject.clone(),
            sent_at: Utc::now().with_timezone(&campus_offset()),
            outcome,
            error,
        };
        if let Err(err) = self.log.append(&entry) {
            tracing::warn!(
                application_id = %application.application_id,
                error = %err,
                "failed to append notification log entry"
            );
        }
    }
}

#[async_trait]
impl<M, L> DecisionNotifier for EmailNotifier<M, L>
where
    M: MailTransport,
    L: NotificationLog,
{
    async fn review_requested(
        &self,
        application: &LeaveApplication,
        approve_url: &str,
        reject_url: &str,
    ) {
        let email = templates::admin_review(application, approve_url, reject_url);
        self.send_and_log(application, &self.admin_email, &email)
            .await;
    }

    async fn decision_recorded(&self, application: &LeaveApplication, note: Option<&str>) {
        let confirmation = templates::admin_confirmation(application);
        self.send_and_log(application, &self.admin_email, &confirmation)
            .await;

        if application.status == LeaveStatus::Approved {
            let clearance = templates::security_clearance(application);
            self.send_and_log(application, &self.security_email, &clearance)
                .await;
        }

        if let Some(parent_email) = application.parent_email() {
            let parent_email = parent_email.to_string();
            let email = templates::parent_outcome(application, note);
            self.send_and_log(application, &parent_email, &email).await;
        } else {
            tracing::info!(
                application_id = %application.application_id,
                "no parent contact on record, skipping parent notice"
            );
        }

        let email = templates::student_outcome(application, note);
        self.send_and_log(application, &application.student.email, &email)
            .await;
    }
}

/// Production transport over SMTP with TLS.
pub struct SmtpMailer {
    transport: lettre::AsyncSmtpTransport<lettre::Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Builds the transport up front so a bad host name fails at startup
    /// rather than on the first send.
    pub fn from_config(mail: &MailConfig, smtp: &SmtpConfig) -> Result<Self, NotifyError> {
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, Tokio1Executor};

        let builder = if smtp.security.use_starttls(smtp.port) {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                .map_err(|e| NotifyError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
                .map_err(|e| NotifyError::Transport(e.to_string()))?
        };

        let mut builder = builder.port(smtp.port);
        if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from_address: mail.from_address.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(&self, recipient: &str, email: &RenderedEmail) -> Result<(), NotifyError> {
        use lettre::message::header::ContentType;
        use lettre::{AsyncTransport, Message};

        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::Address(self.from_address.clone()))?,
            )
            .to(recipient
                .parse()
                .map_err(|_| NotifyError::Address(recipient.to_string()))?)
            .subject(&email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| NotifyError::Message(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError::Transport(e.to_string()))
    }
}
