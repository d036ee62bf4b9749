//! Text validation for todo input.

use thiserror::Error;

/// Maximum length of todo text, in characters, after trimming
pub const MAX_TODO_LENGTH: usize = 500;

/// Why a piece of todo text was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing left after trimming
    #[error("Todo text cannot be empty")]
    Empty,

    /// Longer than [`MAX_TODO_LENGTH`] after trimming
    #[error("Todo text is too long ({length}/{max} characters)")]
    TooLong {
        /// Trimmed length in characters
        length: usize,
        /// Allowed maximum
        max: usize,
    },
}

impl ValidationError {
    /// Machine-readable reason
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::TooLong { .. } => "TOO_LONG",
        }
    }
}

/// Checks that `text` is non-empty and at most [`MAX_TODO_LENGTH`] characters
/// once surrounding whitespace is removed.
///
/// The input is not modified; callers store the trimmed text themselves.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] or [`ValidationError::TooLong`].
pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let length = trimmed.chars().count();
    if length > MAX_TODO_LENGTH {
        return Err(ValidationError::TooLong {
            length,
            max: MAX_TODO_LENGTH,
        });
    }

    Ok(())
}

/// Trims a category label, treating blank labels as no category.
#[must_use]
pub fn normalize_category(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_are_rejected() {
        assert_eq!(validate_text(""), Err(ValidationError::Empty));
        assert_eq!(validate_text("   "), Err(ValidationError::Empty));
        assert_eq!(validate_text("\n\t"), Err(ValidationError::Empty));
    }

    #[test]
    fn too_long_is_rejected() {
        let err = validate_text(&"a".repeat(501)).unwrap_err();
        assert_eq!(err.code(), "TOO_LONG");
        assert_eq!(err, ValidationError::TooLong { length: 501, max: 500 });
    }

    #[test]
    fn limit_is_inclusive_and_measured_after_trim() {
        assert!(validate_text(&"a".repeat(500)).is_ok());
        assert!(validate_text(&format!("  {}  ", "a".repeat(500))).is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(validate_text(&"é".repeat(500)).is_ok());
    }

    #[test]
    fn ok_text_passes() {
        assert!(validate_text("ok").is_ok());
        assert_eq!(ValidationError::Empty.code(), "EMPTY");
    }

    #[test]
    fn category_normalization() {
        assert_eq!(normalize_category(Some("  work ".into())), Some("work".into()));
        assert_eq!(normalize_category(Some("   ".into())), None);
        assert_eq!(normalize_category(None), None);
    }
}
