/// Errors raised while building model values from untrusted input
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A month string was not in `YYYY-MM` form or named an impossible month
    #[error("Invalid month: {0}")]
    InvalidMonth(String),

    /// A date range ends before it starts
    #[error("Invalid date range: {start} to {end}")]
    InvalidDateRange {
        /// First date of the rejected range
        start: chrono::NaiveDate,
        /// Last date of the rejected range
        end: chrono::NaiveDate,
    },

    /// Request payload failed field validation
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for ModelError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ModelError::Validation(errors.to_string())
    }
}
