//! Helpers for embedding values into rendered script text
//!
//! Each command picks the helper that matches where a value lands: inside a
//! string literal, as a JSON blob, as a numeric literal, or as a bare
//! identifier. Identifiers cannot be escaped, so they are validated when the
//! command is built.

use std::fmt;

use serde_json::Value as Json;

use crate::error::{CommandError, CommandResult};

/// Render `text` as a quoted script string literal
pub fn string_literal(text: &str) -> String {
    escape_line_separators(Json::String(text.to_string()).to_string())
}

/// Render a structured value as an inline JSON blob
pub fn json_blob(value: &Json) -> String {
    escape_line_separators(value.to_string())
}

/// Render a numeric literal
///
/// Whole numbers render without a fractional part (`5`, not `5.0`).
pub fn number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{value}")
    }
}

/// Render a coordinate pair as a two-element array literal
pub fn pair(first: f64, second: f64) -> String {
    format!("[{}, {}]", number(first), number(second))
}

// JSON permits U+2028 and U+2029 unescaped; older script engines treat them as
// line terminators inside string literals.
fn escape_line_separators(text: String) -> String {
    if text.contains(['\u{2028}', '\u{2029}']) {
        text.replace('\u{2028}', "\\u2028")
            .replace('\u{2029}', "\\u2029")
    } else {
        text
    }
}

/// Ensure a numeric field is finite
pub fn finite(field: &'static str, value: f64) -> CommandResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CommandError::NonFinite { field, value })
    }
}

/// Name that is safe to embed as a bare script identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validate an identifier: ASCII letters, digits, `_` and `$`, not starting with a digit
    pub fn new(name: impl Into<String>) -> CommandResult<Self> {
        let name = name.into();
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

        if valid_start && valid_rest {
            Ok(Self(name))
        } else {
            Err(CommandError::InvalidIdentifier(name))
        }
    }

    /// The identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_literal_escapes_quotes_and_newlines() {
        assert_eq!(string_literal("a\"b"), r#""a\"b""#);
        assert_eq!(string_literal("line\nbreak"), r#""line\nbreak""#);
        assert_eq!(string_literal("back\\slash"), r#""back\\slash""#);
        assert_eq!(string_literal("sep\u{2028}x"), r#""sep\u2028x""#);
    }

    #[test]
    fn test_json_blob_escapes_embedded_strings() {
        let blob = json_blob(&json!({"title": "it's \"quoted\"\n"}));
        assert_eq!(blob, r#"{"title":"it's \"quoted\"\n"}"#);
    }

    #[test]
    fn test_number_rendering() {
        assert_eq!(number(5.0), "5");
        assert_eq!(number(2.5), "2.5");
        assert_eq!(number(-0.25), "-0.25");
        assert_eq!(number(f64::NAN), "NaN");
        assert_eq!(number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_identifier_validation() {
        assert!(Identifier::new("mapbridge").is_ok());
        assert!(Identifier::new("_handler$2").is_ok());
        assert!(Identifier::new("").is_err());
        assert!(Identifier::new("2fast").is_err());
        assert!(Identifier::new("a.b").is_err());
        assert!(Identifier::new("x;alert(1)").is_err());
    }
}
