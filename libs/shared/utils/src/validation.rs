use std::sync::LazyLock;

use regex::Regex;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9(][0-9\s\-\.\(\)]{5,19}$").expect("phone pattern compiles")
});

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_PATTERN.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone.trim())
}

/// Returns the trimmed value, or `None` when it is blank.
pub fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_contacts() {
        assert!(is_valid_email("front.desk@clinic.example"));
        assert!(is_valid_phone("+353 1 234 5678"));
        assert!(is_valid_phone("(01) 555-0100"));
    }

    #[test]
    fn rejects_malformed_contacts() {
        assert!(!is_valid_email("no-at-sign.example"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_phone("call me"));
        assert!(!is_valid_phone("12"));
    }

    #[test]
    fn blank_values_are_none() {
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(" Ann "), Some("Ann"));
    }
}
