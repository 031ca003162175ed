//! Redaction helpers for contact details shown on public status pages.

/// Masks the local part of an email, keeping its first and last character.
///
/// `rahul.sharma@example.edu` becomes `r**********a@example.edu`. Inputs
/// without an `@` are returned unchanged; they carry nothing to protect.
pub fn mask_email(email: &str) -> String {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return email.to_string();
    };
    if local.is_empty() {
        return email.to_string();
    }

    let chars: Vec<char> = local.chars().collect();
    let masked = if chars.len() <= 2 {
        format!("{}*", chars[0])
    } else {
        format!(
            "{}{}{}",
            chars[0],
            "*".repeat(chars.len() - 2),
            chars[chars.len() - 1]
        )
    };
    format!("{masked}@{domain}")
}

/// Masks a phone number down to its digits, keeping only the last four.
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    if digits.len() < 4 {
        return "*".repeat(digits.len());
    }

    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(digits.len() - 4), tail)
}
