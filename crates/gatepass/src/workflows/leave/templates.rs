//! HTML bodies for every email the workflow sends.
//!
//! Plain string templates rather than a template engine: the set is small,
//! fixed, and reviewed as a whole.

use super::domain::{LeaveApplication, LeaveStatus};

const HEADER: &str = "<div style=\"font-family:Arial,Helvetica,sans-serif;max-width:560px;\
margin:0 auto;border:1px solid #e0e0e0;border-radius:6px;\">\
<div style=\"background:#1a3c6e;color:#ffffff;padding:14px 20px;\
border-radius:6px 6px 0 0;\"><strong>Campus Gate Pass</strong></div>\
<div style=\"padding:20px;color:#222222;\">";

const FOOTER: &str = "</div><div style=\"padding:12px 20px;color:#888888;\
font-size:12px;border-top:1px solid #e0e0e0;\">\
This is an automated message from the leave approval system. \
Please do not reply to this email.</div></div>";

/// A fully rendered message, ready for the mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

fn wrap(inner: &str) -> String {
    format!("{HEADER}{inner}{FOOTER}")
}

fn summary_rows(application: &LeaveApplication) -> String {
    let document = application
        .document
        .as_ref()
        .map(|d| d.name.as_str())
        .unwrap_or("none");
    format!(
        "<table style=\"border-collapse:collapse;width:100%;margin:12px 0;\">\
         <tr><td style=\"padding:4px 8px;color:#666;\">Application</td>\
         <td style=\"padding:4px 8px;\"><strong>{id}</strong></td></tr>\
         <tr><td style=\"padding:4px 8px;color:#666;\">Student</td>\
         <td style=\"padding:4px 8px;\">{name} ({email})</td></tr>\
         <tr><td style=\"padding:4px 8px;color:#666;\">Dates</td>\
         <td style=\"padding:4px 8px;\">{from} to {to} ({days} day(s))</td></tr>\
         <tr><td style=\"padding:4px 8px;color:#666;\">Reason</td>\
         <td style=\"padding:4px 8px;\">{reason}</td></tr>\
         <tr><td style=\"padding:4px 8px;color:#666;\">Type</td>\
         <td style=\"padding:4px 8px;\">{kind}</td></tr>\
         <tr><td style=\"padding:4px 8px;color:#666;\">Document</td>\
         <td style=\"padding:4px 8px;\">{document}</td></tr></table>",
        id = escape(application.application_id.as_str()),
        name = escape(&application.student.name),
        email = escape(&application.student.email),
        from = application.from_date,
        to = application.to_date,
        days = application.duration_days(),
        reason = escape(&application.reason),
        kind = application.reason_type.label(),
        document = escape(document),
    )
}

/// Review request sent to the administrator, carrying both action links.
pub fn admin_review(
    application: &LeaveApplication,
    approve_url: &str,
    reject_url: &str,
) -> RenderedEmail {
    let body = format!(
        "<h3 style=\"margin-top:0;\">Leave request awaiting review</h3>{rows}\
         <p style=\"margin:20px 0;\">\
         <a href=\"{approve}\" style=\"background:#2e7d32;color:#ffffff;\
         padding:10px 22px;border-radius:4px;text-decoration:none;\
         margin-right:12px;\">Approve</a>\
         <a href=\"{reject}\" style=\"background:#c62828;color:#ffffff;\
         padding:10px 22px;border-radius:4px;text-decoration:none;\">Reject</a></p>\
         <p style=\"color:#888;font-size:12px;\">Each link works once and \
         expires {expires}.</p>",
        rows = summary_rows(application),
        approve = approve_url,
        reject = reject_url,
        expires = application.token_expires_at.format("%d %b %Y %H:%M %Z"),
    );
    RenderedEmail {
        subject: format!(
            "[Action required] Leave request {} from {}",
            application.application_id, application.student.name
        ),
        html: wrap(&body),
    }
}

/// Confirmation back to the administrator after a decision is recorded.
pub fn admin_confirmation(application: &LeaveApplication) -> RenderedEmail {
    let body = format!(
        "<h3 style=\"margin-top:0;\">Decision recorded: {status}</h3>{rows}\
         <p>Decided at {at}.</p>",
        status = application.status.label(),
        rows = summary_rows(application),
        at = application
            .decided_at
            .map(|at| at.format("%d %b %Y %H:%M %Z").to_string())
            .unwrap_or_default(),
    );
    RenderedEmail {
        subject: format!(
            "Leave request {} {}",
            application.application_id,
            application.status.label()
        ),
        html: wrap(&body),
    }
}

/// Gate clearance notice for the security desk; approved requests only.
pub fn security_clearance(application: &LeaveApplication) -> RenderedEmail {
    let body = format!(
        "<h3 style=\"margin-top:0;\">Approved exit: allow passage</h3>\
         <p>The following student is cleared to leave campus for the dates \
         below.</p>{rows}",
        rows = summary_rows(application),
    );
    RenderedEmail {
        subject: format!(
            "Gate clearance: {} ({} to {})",
            application.student.name, application.from_date, application.to_date
        ),
        html: wrap(&body),
    }
}

/// Outcome notice to the parent on record.
pub fn parent_outcome(application: &LeaveApplication, note: Option<&str>) -> RenderedEmail {
    let salutation = application
        .parent_on_record()
        .and_then(|parent| parent.name.as_deref())
        .unwrap_or("Parent/Guardian");
    RenderedEmail {
        subject: format!(
            "Leave request for {} has been {}",
            application.student.name,
            status_word(application.status)
        ),
        html: wrap(&outcome_body(
            &format!("Dear {},", escape(salutation)),
            application,
            note,
        )),
    }
}

/// Outcome notice to the student who applied.
pub fn student_outcome(application: &LeaveApplication, note: Option<&str>) -> RenderedEmail {
    RenderedEmail {
        subject: format!(
            "Your leave request {} has been {}",
            application.application_id,
            status_word(application.status)
        ),
        html: wrap(&outcome_body(
            &format!("Dear {},", escape(&application.student.name)),
            application,
            note,
        )),
    }
}

fn outcome_body(salutation: &str, application: &LeaveApplication, note: Option<&str>) -> String {
    let verdict = match application.status {
        LeaveStatus::Approved => {
            "<p style=\"color:#2e7d32;\"><strong>The leave request has been \
             approved.</strong></p>"
        }
        _ => {
            "<p style=\"color:#c62828;\"><strong>The leave request has been \
             rejected.</strong></p>"
        }
    };
    let note_block = note
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| format!("<p><em>Note from the administrator:</em> {}</p>", escape(n)))
        .unwrap_or_default();
    format!(
        "<p>{salutation}</p>{verdict}{rows}{note_block}",
        rows = summary_rows(application)
    )
}

fn status_word(status: LeaveStatus) -> &'static str {
    match status {
        LeaveStatus::Approved => "approved",
        LeaveStatus::Rejected => "rejected",
        LeaveStatus::Pending => "received",
    }
}

/// Minimal HTML escaping for values interpolated into the templates.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::leave::tests::common::pending_application;

    #[test]
    fn review_email_carries_both_action_links() {
        let application = pending_application();
        let email = admin_review(
            &application,
            "https://gate.example.edu/approve",
            "https://gate.example.edu/reject",
        );
        assert!(email.html.contains("https://gate.example.edu/approve"));
        assert!(email.html.contains("https://gate.example.edu/reject"));
        assert!(email.subject.contains(application.application_id.as_str()));
    }

    #[test]
    fn outcome_note_is_escaped_and_included() {
        let mut application = pending_application();
        application.status = LeaveStatus::Rejected;
        let email = student_outcome(&application, Some("see <matron> first"));
        assert!(email.html.contains("see &lt;matron&gt; first"));
        assert!(email.subject.contains("rejected"));
    }

    #[test]
    fn blank_note_is_omitted() {
        let mut application = pending_application();
        application.status = LeaveStatus::Approved;
        let email = parent_outcome(&application, Some("   "));
        assert!(!email.html.contains("Note from the administrator"));
    }
}
