//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Fresh primary key for a new row.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Canonical form of an email address: trimmed, NFKC, lowercase.
///
/// Lookups by email compare canonical forms, which makes them
/// case-insensitive.
pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email: String = value.trim().nfkc().collect::<String>().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(EngineError::ValidationFailed(format!(
            "invalid email: {}",
            value.trim()
        )));
    }
    Ok(email)
}

pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::ValidationFailed(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn require_positive(amount: i64, label: &str) -> ResultEngine<i64> {
    if amount <= 0 {
        return Err(EngineError::ValidationFailed(format!(
            "{label} must be > 0"
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_case_folded_and_trimmed() {
        assert_eq!(
            normalize_email("  Bat.Erdene@Example.MN ").unwrap(),
            "bat.erdene@example.mn"
        );
    }

    #[test]
    fn email_fullwidth_forms_are_folded() {
        assert_eq!(normalize_email("ＢＡＴ@example.mn").unwrap(), "bat@example.mn");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for raw in ["", "bat", "@example.mn", "bat@localhost", "b at@example.mn"] {
            assert!(normalize_email(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn required_text_rejects_blank() {
        assert!(normalize_required_text("   ", "name").is_err());
        assert_eq!(normalize_required_text(" Family ", "name").unwrap(), "Family");
    }

    #[test]
    fn optional_text_drops_blank() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(normalize_optional_text(Some(" hi ")), Some("hi".to_string()));
        assert_eq!(normalize_optional_text(None), None);
    }

    #[test]
    fn amounts_must_be_positive() {
        assert!(require_positive(0, "amount").is_err());
        assert!(require_positive(-5, "amount").is_err());
        assert_eq!(require_positive(5, "amount").unwrap(), 5);
    }
}
