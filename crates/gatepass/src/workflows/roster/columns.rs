//! Header aliases for the student master list.
//!
//! Registrar exports have gone through several template generations, so
//! every field is looked up by a list of known header spellings, matched
//! case-insensitively after whitespace normalization.

pub(crate) const STUDENT_EMAIL: &[&str] = &[
    "candidate adress email",
    "candidate address email",
    "student email",
    "email",
];

pub(crate) const STUDENT_NAME: &[&str] = &["student name"];

pub(crate) const FIRST_AND_MIDDLE_NAME: &[&str] = &["first name and middle name"];

pub(crate) const SINGLE_NAME: &[&str] = &["full name", "name", "student_name", "studentname"];

pub(crate) const FIRST_NAME: &[&str] = &[
    "first name",
    "first_name",
    "firstname",
    "given name",
    "givenname",
    "forename",
];

pub(crate) const LAST_NAME: &[&str] = &[
    "last name",
    "last_name",
    "lastname",
    "surname",
    "family name",
    "family_name",
];

pub(crate) const PROGRAM: &[&str] = &["course", "programs", "program"];
pub(crate) const SEMESTER: &[&str] = &["semester"];
pub(crate) const SECTION: &[&str] = &["section"];

pub(crate) const FATHER_NAME: &[&str] = &["father name", "father's name"];
pub(crate) const FATHER_EMAIL: &[&str] = &["father adress email", "father email", "parent email"];
pub(crate) const FATHER_MOBILE: &[&str] = &[
    "father mobile number",
    "father mobile no.",
    "father mobile",
    "father phone",
];

pub(crate) const MOTHER_NAME: &[&str] = &["mother name", "mother's name"];
pub(crate) const MOTHER_EMAIL: &[&str] = &["mother address email", "mother adress email"];
pub(crate) const MOTHER_MOBILE: &[&str] = &[
    "mother mobile number",
    "mother mobile no.",
    "mother mobile",
    "mother phone",
    "guardian 2 mobile no",
];

pub(crate) fn normalize_header(header: &str) -> String {
    header.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// One parsed row paired with the normalized header set.
pub(crate) struct RowView<'a> {
    headers: &'a [String],
    record: &'a csv::StringRecord,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(headers: &'a [String], record: &'a csv::StringRecord) -> Self {
        Self { headers, record }
    }

    /// First non-empty value under any of the given header aliases.
    pub(crate) fn get(&self, aliases: &[&str]) -> Option<&'a str> {
        for alias in aliases {
            for (index, header) in self.headers.iter().enumerate() {
                if header == alias {
                    let value = self.record.get(index).unwrap_or("").trim();
                    if !value.is_empty() {
                        return Some(value);
                    }
                }
            }
        }
        None
    }

    /// Values under every column whose header mentions "email", used for
    /// lookup so a student is found under whichever address was exported.
    pub(crate) fn email_values(&self) -> Vec<&'a str> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, header)| header.contains("email"))
            .filter_map(|(index, _)| self.record.get(index))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .collect()
    }
}
