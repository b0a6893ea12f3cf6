//! Caller-supplied message text

use crate::error::ValidationError;
use std::fmt;

/// A single input message, trimmed and guaranteed non-empty.
///
/// No other validation is applied: there is no length cap and no character-set
/// restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(String);

impl Message {
    /// Validate raw caller input. A missing field and whitespace-only text are
    /// rejected the same way.
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        let trimmed = raw.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_surrounding_whitespace() {
        let message = Message::parse(Some("  Meeting moved to 3pm tomorrow \n")).unwrap();
        assert_eq!(message.as_str(), "Meeting moved to 3pm tomorrow");
    }

    #[test]
    fn test_parse_rejects_missing_and_blank() {
        assert_eq!(Message::parse(None), Err(ValidationError::EmptyMessage));
        assert_eq!(Message::parse(Some("")), Err(ValidationError::EmptyMessage));
        assert_eq!(Message::parse(Some("   \t\n")), Err(ValidationError::EmptyMessage));
    }

    #[test]
    fn test_parse_keeps_inner_content() {
        let long = "x".repeat(100_000);
        assert_eq!(Message::parse(Some(&long)).unwrap().as_str().len(), 100_000);
        assert_eq!(Message::parse(Some(" a  b ")).unwrap().as_str(), "a  b");
    }
}
