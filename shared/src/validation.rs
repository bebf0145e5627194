//! Input validation helpers
//!
//! Field rules live on the request types as `validator` derives; this module
//! holds the pieces shared by every request: flattening validator output
//! into client messages and normalizing free-form input.

use chrono::NaiveDate;
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Calendar dates on the wire, e.g. `2020-01-31`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Request bodies that report their validation messages field by field
pub trait FieldOrder {
    /// Validated fields in declaration order
    const FIELDS: &'static [&'static str];
}

/// Flatten validation errors into client-facing messages.
///
/// Fields named in `order` come first, in that order. Anything else follows
/// sorted by name.
pub fn collect_messages(errors: &ValidationErrors, order: &[&str]) -> Vec<String> {
    let rank = |field: &str| order.iter().position(|f| *f == field).unwrap_or(order.len());

    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| rank(a.0).cmp(&rank(b.0)).then_with(|| a.0.cmp(b.0)));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field))
            })
        })
        .collect()
}

/// Split a comma separated skills string into trimmed, non-empty entries
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Canonical form of an email address used for lookups and avatars
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Parse a wire date, ignoring surrounding whitespace
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// `validator` rule for date strings. Blank input is left to `required`.
pub fn validate_date(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() {
        return Ok(());
    }

    match parse_date(raw) {
        Some(_) => Ok(()),
        None => {
            let mut error = ValidationError::new("date");
            error.message = Some(Cow::from("Invalid date"));
            Err(error)
        }
    }
}

/// Treat empty or whitespace-only optional input as absent
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RegisterRequest;
    use proptest::prelude::*;
    use rstest::rstest;
    use validator::Validate;

    fn invalid_registration() -> RegisterRequest {
        RegisterRequest {
            name: String::new(),
            email: "nope".to_string(),
            password: "123".to_string(),
        }
    }

    #[test]
    fn test_collect_messages_follows_declaration_order() {
        let errors = invalid_registration().validate().unwrap_err();
        assert_eq!(
            collect_messages(&errors, RegisterRequest::FIELDS),
            vec![
                "Name is required".to_string(),
                "Please include a valid email".to_string(),
                "Please enter a password with 6 or more characters".to_string(),
            ]
        );
    }

    #[test]
    fn test_collect_messages_unlisted_fields_sorted_by_name() {
        let errors = invalid_registration().validate().unwrap_err();
        assert_eq!(
            collect_messages(&errors, &["password"]),
            vec![
                "Please enter a password with 6 or more characters".to_string(),
                "Please include a valid email".to_string(),
                "Name is required".to_string(),
            ]
        );
    }

    #[rstest]
    #[case("2020-01-31", Some((2020, 1, 31)))]
    #[case(" 2020-01-31 ", Some((2020, 1, 31)))]
    #[case("2020-02-30", None)]
    #[case("31/01/2020", None)]
    #[case("", None)]
    #[case("soon", None)]
    fn test_parse_date(#[case] raw: &str, #[case] expected: Option<(i32, u32, u32)>) {
        let expected = expected.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        assert_eq!(parse_date(raw), expected);
    }

    #[test]
    fn test_validate_date_message() {
        let error = validate_date("not-a-date").unwrap_err();
        assert_eq!(error.message.as_deref(), Some("Invalid date"));
        assert!(validate_date("2021-06-01").is_ok());
        assert!(validate_date("").is_ok());
    }

    #[rstest]
    #[case("rust, go ,sql", vec!["rust", "go", "sql"])]
    #[case("rust", vec!["rust"])]
    #[case(" , ,", vec![])]
    #[case("a,,b", vec!["a", "b"])]
    fn test_parse_skills(#[case] raw: &str, #[case] expected: Vec<&str>) {
        assert_eq!(parse_skills(raw), expected);
    }

    #[rstest]
    #[case("  A@B.com ", "a@b.com")]
    #[case("dev@example.org", "dev@example.org")]
    fn test_normalize_email(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_email(raw), expected);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("x".to_string())), Some("x".to_string()));
    }

    proptest! {
        #[test]
        fn prop_parsed_skills_are_trimmed_and_non_empty(raw in "[a-z ,]{0,64}") {
            for skill in parse_skills(&raw) {
                prop_assert!(!skill.is_empty());
                prop_assert_eq!(skill.trim(), skill.as_str());
                prop_assert!(!skill.contains(','));
            }
        }

        #[test]
        fn prop_short_passwords_rejected(password in ".{0,5}") {
            prop_assume!(password.chars().count() < MIN_PASSWORD_LENGTH);
            let req = RegisterRequest {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password,
            };
            prop_assert!(req.validate().is_err());
        }
    }
}
