use lazy_static::lazy_static;
use regex::Regex;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Name fields (first/last/patronymic): 2-50 characters, letters, spaces
/// and hyphens only.
pub fn validate_name(value: &str) -> Result<(), &'static str> {
    let len = value.chars().count();
    if !(2..=50).contains(&len) {
        return Err("must be 2 to 50 characters");
    }
    if !value
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '-')
    {
        return Err("may only contain letters, spaces and hyphens");
    }
    Ok(())
}

/// Strips formatting and validates digit count. Numbers starting with 7 or
/// 8 must be exactly 11 digits; anything else 10 to 15.
pub fn normalize_phone(raw: &str) -> Result<String, &'static str> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.starts_with('7') || digits.starts_with('8') {
        if digits.len() != 11 {
            return Err("Phone number must contain 11 digits");
        }
        return Ok(digits);
    }
    if !(10..=15).contains(&digits.len()) {
        return Err("Phone number must contain 10 to 15 digits");
    }
    Ok(digits)
}
