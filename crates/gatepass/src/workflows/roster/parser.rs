//! Student master list import.
//!
//! The roster is read once at startup into an in-memory directory keyed by
//! every email address found on each row. Lookups are case-insensitive.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

use crate::workflows::leave::domain::{ParentContact, StudentContact, StudentRecord};
use crate::workflows::leave::repository::StudentDirectory;

use super::columns::{self, normalize_header, RowView};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to open roster file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse roster: {0}")]
    Csv(#[from] csv::Error),

    #[error("roster has no email column")]
    NoEmailColumn,
}

/// In-memory student directory loaded from the registrar's CSV export.
#[derive(Debug, Clone, Default)]
pub struct CsvRoster {
    by_email: HashMap<String, StudentRecord>,
}

impl CsvRoster {
    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RosterError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(normalize_header)
            .collect();
        if !headers.iter().any(|header| header.contains("email")) {
            return Err(RosterError::NoEmailColumn);
        }

        let mut by_email = HashMap::new();
        for record in csv_reader.records() {
            let record = record?;
            let row = RowView::new(&headers, &record);

            let emails = row.email_values();
            let Some(primary_email) = row
                .get(columns::STUDENT_EMAIL)
                .or_else(|| emails.first().copied())
            else {
                // Row without any address can never be looked up.
                continue;
            };

            let student = StudentContact {
                name: student_name(&row, primary_email),
                email: primary_email.to_string(),
                program: row.get(columns::PROGRAM).map(str::to_string),
                semester: row.get(columns::SEMESTER).map(str::to_string),
                section: row.get(columns::SECTION).map(str::to_string),
            };

            let father = parent(
                &row,
                columns::FATHER_NAME,
                columns::FATHER_EMAIL,
                columns::FATHER_MOBILE,
            );
            let mother = parent(
                &row,
                columns::MOTHER_NAME,
                columns::MOTHER_EMAIL,
                columns::MOTHER_MOBILE,
            );

            let entry = StudentRecord {
                student,
                father,
                mother,
            };

            // Index under every address on the row, so lookups succeed no
            // matter which one the student types in.
            for email in emails {
                by_email.insert(email.to_lowercase(), entry.clone());
            }
        }

        Ok(Self { by_email })
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}

impl StudentDirectory for CsvRoster {
    fn find_by_email(&self, email: &str) -> Option<StudentRecord> {
        self.by_email.get(&email.trim().to_lowercase()).cloned()
    }
}

fn parent(
    row: &RowView<'_>,
    name: &[&str],
    email: &[&str],
    mobile: &[&str],
) -> Option<ParentContact> {
    let contact = ParentContact {
        name: row.get(name).map(normalize_space),
        email: row.get(email).map(str::to_string),
        mobile: row.get(mobile).map(str::to_string),
    };
    if contact.is_empty() {
        None
    } else {
        Some(contact)
    }
}

/// Resolves the student's display name through the generations of roster
/// templates, falling back to a best-effort name from the email address.
fn student_name(row: &RowView<'_>, email: &str) -> String {
    if let Some(name) = row.get(columns::STUDENT_NAME) {
        return normalize_space(name);
    }

    let first_middle = row.get(columns::FIRST_AND_MIDDLE_NAME);
    let last = row.get(columns::LAST_NAME);
    if first_middle.is_some() {
        return normalize_space(&format!(
            "{} {}",
            first_middle.unwrap_or(""),
            last.unwrap_or("")
        ));
    }

    if let Some(name) = row.get(columns::SINGLE_NAME) {
        return normalize_space(name);
    }

    let first = row.get(columns::FIRST_NAME);
    if first.is_some() || last.is_some() {
        return normalize_space(&format!("{} {}", first.unwrap_or(""), last.unwrap_or("")));
    }

    name_from_email(email)
}

fn normalize_space(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `rahul.sharma_22@example.edu` becomes `Rahul Sharma 22`.
fn name_from_email(email: &str) -> String {
    let Some((local, _)) = email.split_once('@') else {
        return String::new();
    };

    local
        .split(|c: char| c == '.' || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
