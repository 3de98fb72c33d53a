//! Secret masking and edit-diff rules.
//!
//! This module is the single source of truth for the mask token and for the
//! rule that keeps a display placeholder from ever being written back over a
//! real secret. It is deliberately free of storage concerns so the rules can
//! be tested in isolation.
//!
//! # Masking policy
//!
//! A secret field always displays as [`MASK_TOKEN`], whether its stored
//! value is empty, unset, short, or long. Showing "not configured" for an
//! unset secret would leak set-vs-unset to any caller that can read the
//! configuration shape, so the engine does not do it.

use crate::registry::ValueType;

/// The fixed placeholder shown in place of every secret value.
///
/// Twelve bullet characters. Fixed length by design: the mask must carry no
/// information about the real value, including its length.
pub const MASK_TOKEN: &str = "••••••••••••";

/// Mask a value for display.
///
/// Non-secret values pass through unchanged. Secret values are replaced by
/// [`MASK_TOKEN`] irrespective of content or length.
#[must_use]
pub fn mask(value: &str, value_type: ValueType) -> String {
    match value_type {
        ValueType::Secret => MASK_TOKEN.to_owned(),
        ValueType::Text | ValueType::Number | ValueType::Url => value.to_owned(),
    }
}

/// Whether a submitted value is exactly the mask placeholder.
///
/// Full-string comparison only. A real secret that happens to *start* with
/// bullet characters is a real secret and must not be discarded.
#[must_use]
pub fn is_mask_placeholder(value: &str) -> bool {
    value == MASK_TOKEN
}

/// Outcome of diffing a proposed value against the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    /// Persist this new value.
    Set(String),
    /// The proposal changes nothing — skip it.
    NoOp,
}

/// Decide whether a proposed value is a genuine edit.
///
/// For non-secret fields any difference from the current value is an edit.
/// For secret fields, a proposal is an edit only when it is non-empty and
/// not the mask placeholder — an untouched secret comes back from the
/// client as the mask, and writing that through would corrupt the stored
/// value.
#[must_use]
pub fn diff(value_type: ValueType, current: &str, proposed: &str) -> FieldEdit {
    match value_type {
        ValueType::Secret => {
            if proposed.is_empty() || is_mask_placeholder(proposed) {
                FieldEdit::NoOp
            } else {
                FieldEdit::Set(proposed.to_owned())
            }
        }
        ValueType::Text | ValueType::Number | ValueType::Url => {
            if proposed == current {
                FieldEdit::NoOp
            } else {
                FieldEdit::Set(proposed.to_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_secret_values_pass_through_unmasked() {
        assert_eq!(mask("db.internal", ValueType::Text), "db.internal");
        assert_eq!(mask("1433", ValueType::Number), "1433");
        assert_eq!(mask("https://x", ValueType::Url), "https://x");
    }

    #[test]
    fn secret_is_masked_regardless_of_length() {
        assert_eq!(mask("", ValueType::Secret), MASK_TOKEN);
        assert_eq!(mask("x", ValueType::Secret), MASK_TOKEN);
        assert_eq!(mask(&"a".repeat(500), ValueType::Secret), MASK_TOKEN);
    }

    #[test]
    fn mask_token_never_equals_its_input() {
        // The token must not round-trip as a plausible secret value check.
        assert_ne!(mask("Secr3t!", ValueType::Secret), "Secr3t!");
    }

    #[test]
    fn placeholder_match_is_exact() {
        assert!(is_mask_placeholder(MASK_TOKEN));
        assert!(!is_mask_placeholder(""));
        // Prefix of the token is not the token.
        assert!(!is_mask_placeholder("••••"));
        // A real secret starting with the token must not match.
        let tricky = format!("{MASK_TOKEN}suffix");
        assert!(!is_mask_placeholder(&tricky));
    }

    #[test]
    fn diff_non_secret_any_change_is_edit() {
        assert_eq!(
            diff(ValueType::Text, "old-host", "new-host"),
            FieldEdit::Set("new-host".to_owned())
        );
        assert_eq!(diff(ValueType::Text, "same", "same"), FieldEdit::NoOp);
        // Clearing a non-secret field is a legitimate edit.
        assert_eq!(
            diff(ValueType::Text, "something", ""),
            FieldEdit::Set(String::new())
        );
    }

    #[test]
    fn diff_secret_mask_is_noop() {
        assert_eq!(diff(ValueType::Secret, "real", MASK_TOKEN), FieldEdit::NoOp);
    }

    #[test]
    fn diff_secret_empty_is_noop() {
        assert_eq!(diff(ValueType::Secret, "real", ""), FieldEdit::NoOp);
    }

    #[test]
    fn diff_secret_genuine_value_is_edit() {
        assert_eq!(
            diff(ValueType::Secret, "old", "new-secret"),
            FieldEdit::Set("new-secret".to_owned())
        );
    }

    #[test]
    fn diff_secret_starting_with_mask_chars_is_kept() {
        let tricky = format!("{MASK_TOKEN}tail");
        assert_eq!(
            diff(ValueType::Secret, "old", &tricky),
            FieldEdit::Set(tricky.clone())
        );
    }

    #[test]
    fn diff_secret_same_as_current_still_writes() {
        // The engine cannot tell "retyped the same secret" from "new
        // secret" without comparing plaintext, and an overwrite with the
        // identical value is harmless.
        assert_eq!(
            diff(ValueType::Secret, "same", "same"),
            FieldEdit::Set("same".to_owned())
        );
    }
}
