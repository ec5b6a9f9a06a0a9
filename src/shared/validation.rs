use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::shared::constants::{
    EMAIL_MAX_LEN, HASHTAG_MAX_LEN, PASSWORD_MIN_LEN, USERNAME_MAX_LEN, USERNAME_MIN_LEN,
};
use crate::shared::error::SocialError;

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("static pattern compiles"))
}

fn hashtag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\w+)").expect("static pattern compiles"))
}

fn mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@([A-Za-z0-9]+)").expect("static pattern compiles"))
}

/// Length in characters, not bytes.
pub fn check_len(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), SocialError> {
    let len = value.chars().count();
    if len < min {
        return Err(SocialError::validation(
            field,
            format!("must be at least {min} characters"),
        ));
    }
    if len > max {
        return Err(SocialError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub fn check_max(field: &'static str, value: Option<&str>, max: usize) -> Result<(), SocialError> {
    match value {
        Some(v) => check_len(field, v, 0, max),
        None => Ok(()),
    }
}

pub fn check_username(username: &str) -> Result<(), SocialError> {
    check_len("username", username, USERNAME_MIN_LEN, USERNAME_MAX_LEN)?;
    if !username_regex().is_match(username) {
        return Err(SocialError::validation(
            "username",
            "only letters and digits are allowed",
        ));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn check_email(email: &str) -> Result<(), SocialError> {
    check_len("email", email, 1, EMAIL_MAX_LEN)?;
    if !email_address::EmailAddress::is_valid(email) {
        return Err(SocialError::validation("email", "not a valid address"));
    }
    Ok(())
}

pub fn check_password(password: &str) -> Result<(), SocialError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(SocialError::validation(
            "password",
            format!("must be at least {PASSWORD_MIN_LEN} characters"),
        ));
    }
    Ok(())
}

/// Lowercased, first occurrence order, duplicates dropped.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    hashtag_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .filter(|tag| tag.chars().count() <= HASHTAG_MAX_LEN)
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Usernames as written, duplicates dropped.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    mention_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_len_counts_chars() {
        assert!(check_len("caption", "héllo", 1, 5).is_ok());
        assert!(check_len("caption", "", 1, 5).is_err());
        assert!(check_len("caption", "toolong", 1, 5).is_err());
    }

    #[test]
    fn test_username_rules() {
        assert!(check_username("alice42").is_ok());
        assert!(check_username("al").is_err());
        assert!(check_username("alice_42").is_err());
        assert!(check_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(check_email("alice@example.com").is_ok());
        assert!(check_email("not-an-email").is_err());
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_password_min_length() {
        assert!(check_password("secret").is_ok());
        assert!(check_password("short").is_err());
    }

    #[test]
    fn test_extract_hashtags_dedupes_and_lowercases() {
        let tags = extract_hashtags("Sunset #Beach at the #beach with #friends!");
        assert_eq!(tags, vec!["beach".to_string(), "friends".to_string()]);
    }

    #[test]
    fn test_extract_mentions() {
        let names = extract_mentions("hi @bob and @carol, also @bob again");
        assert_eq!(names, vec!["bob".to_string(), "carol".to_string()]);
    }

    #[test]
    fn test_validation_error_code() {
        let err = check_username("x").unwrap_err();
        assert_eq!(err.code(), "validation_failed");
    }
}
