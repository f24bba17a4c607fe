//! Field validation for board records.
//!
//! The schema enforces the same limits with CHECK constraints; validating up
//! front lets the API answer with a 400 instead of a database error.

use thiserror::Error;

/// Maximum length of a column name, in characters.
pub const MAX_COLUMN_NAME_LEN: usize = 100;

/// Maximum length of a task name, in characters.
pub const MAX_TASK_NAME_LEN: usize = 200;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

fn validate_name(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Validate a column name
///
/// # Examples
/// ```
/// use db::validation::validate_column_name;
///
/// assert!(validate_column_name("Backlog").is_ok());
/// assert!(validate_column_name("  ").is_err());
/// ```
pub fn validate_column_name(name: &str) -> Result<(), ValidationError> {
    validate_name("Column name", name, MAX_COLUMN_NAME_LEN)
}

/// Validate a task name
pub fn validate_task_name(name: &str) -> Result<(), ValidationError> {
    validate_name("Task name", name, MAX_TASK_NAME_LEN)
}
