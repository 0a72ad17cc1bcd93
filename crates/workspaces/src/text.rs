//! Shared text normalization for names, titles and bodies.

use workhub_core::{DomainError, DomainResult};

pub const NAME_MAX_CHARS: usize = 120;
pub const BODY_MAX_CHARS: usize = 10_000;

/// Trim and validate a single-line name or title.
pub fn normalize_name(field: &str, raw: &str) -> DomainResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > NAME_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "{field} must be at most {NAME_MAX_CHARS} characters"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(DomainError::validation(format!("{field} must be a single line")));
    }
    Ok(value.to_string())
}

/// Trim and validate free text (descriptions, comment bodies). Newlines allowed.
pub fn normalize_body(field: &str, raw: &str) -> DomainResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > BODY_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "{field} must be at most {BODY_MAX_CHARS} characters"
        )));
    }
    Ok(value.to_string())
}

/// Optional free text: blank collapses to `None`.
pub fn normalize_optional_body(field: &str, raw: Option<&str>) -> DomainResult<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => normalize_body(field, value).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn names_are_trimmed() {
        assert_eq!(normalize_name("name", "  Alpha  ").unwrap(), "Alpha");
    }

    #[test]
    fn blank_and_multiline_names_are_rejected() {
        assert!(normalize_name("name", "   ").is_err());
        assert!(normalize_name("name", "a\nb").is_err());
        assert!(normalize_name("name", &"x".repeat(NAME_MAX_CHARS + 1)).is_err());
    }

    #[test]
    fn optional_body_collapses_blank() {
        assert_eq!(normalize_optional_body("description", Some("  ")).unwrap(), None);
        assert_eq!(normalize_optional_body("description", None).unwrap(), None);
        assert_eq!(
            normalize_optional_body("description", Some(" line 1\nline 2 ")).unwrap(),
            Some("line 1\nline 2".to_string())
        );
    }

    proptest! {
        /// Any accepted name is already normalized: normalizing again is a no-op.
        #[test]
        fn normalize_name_is_idempotent(raw in "\\PC{0,140}") {
            if let Ok(once) = normalize_name("name", &raw) {
                prop_assert_eq!(normalize_name("name", &once).unwrap(), once.clone());
                prop_assert!(!once.is_empty());
                prop_assert!(once.chars().count() <= NAME_MAX_CHARS);
            }
        }
    }
}
