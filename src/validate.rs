use lazy_static::lazy_static;
use regex::Regex;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= 100 && EMAIL_RE.is_match(email)
}

pub fn is_valid_password(password: &str) -> bool {
    password.len() >= 8
}

/// Exactly six characters; the verifier compares the raw string, so "000000"
/// stays distinct from an absent code.
pub fn is_valid_code(code: &str) -> bool {
    code.chars().count() == 6
}

pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= 100
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn password_minimum_length() {
        assert!(is_valid_password("12345678"));
        assert!(!is_valid_password("1234567"));
    }

    #[test]
    fn code_must_be_six_characters() {
        assert!(is_valid_code("000000"));
        assert!(is_valid_code("123456"));
        assert!(!is_valid_code("12345"));
        assert!(!is_valid_code("1234567"));
        assert!(!is_valid_code(""));
    }

    #[test]
    fn phone_is_ten_digits() {
        assert!(is_valid_phone("5512345678"));
        assert!(!is_valid_phone("55123"));
        assert!(!is_valid_phone("55123456ab"));
    }
}
