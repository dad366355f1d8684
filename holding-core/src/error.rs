use thiserror::Error;

/// Errors raised by the in-memory stores and the backup codec.
///
/// Every store operation validates its inputs before touching state, so an
/// `Err` always means the state is exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Step index {index} out of bounds for template category {category_id} ({len} steps)")]
    IndexOutOfBounds {
        category_id: String,
        index: usize,
        len: usize,
    },

    #[error("Invalid backup format: {0}")]
    Format(String),

    #[error("Backup failed integrity check: {0}")]
    Integrity(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(kind: &'static str, id: &str) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Rejects blank names and labels, returning the trimmed value
pub(crate) fn require_text(value: &str, field: &str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Rejects percentages above 100
pub(crate) fn require_percentage(value: u8, field: &str) -> StoreResult<u8> {
    if value > 100 {
        return Err(StoreError::Validation(format!(
            "{} must be between 0 and 100, got {}",
            field, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("  Legal ", "Name").unwrap(), "Legal");
    }

    #[test]
    fn test_require_text_rejects_whitespace() {
        let err = require_text(" \t ", "Category name").unwrap_err();
        assert_eq!(
            err,
            StoreError::Validation("Category name must not be empty".to_string())
        );
    }

    #[test]
    fn test_require_percentage_bounds() {
        assert_eq!(require_percentage(100, "Ownership").unwrap(), 100);
        assert!(require_percentage(101, "Ownership").is_err());
    }

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found("Entity", "c9");
        assert_eq!(err.to_string(), "Entity not found: c9");
    }
}
