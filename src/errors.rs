use thiserror::Error;

/// Error type for invalid operations.
///
/// Numeric overdrafts (a transfer driving a pool below zero) are *not*
/// errors; they are clamped locally and counted on the site state. Only
/// defects that invalidate the whole scenario surface here.
#[derive(Error, Debug)]
pub enum CenturyError {
    /// A missing or out-of-range parameter, raised at the point of use.
    #[error("configuration error for {entity}: {message}")]
    Configuration { entity: String, message: String },
    /// A mortality or residue input that should never be negative.
    /// Indicates a logic defect upstream, not an expected physical state.
    #[error("negative input to {operation}: {value}")]
    NegativeInput { operation: String, value: f64 },
}

impl CenturyError {
    pub fn configuration(entity: impl Into<String>, message: impl Into<String>) -> Self {
        CenturyError::Configuration {
            entity: entity.into(),
            message: message.into(),
        }
    }
}

/// Convenience type for `Result<T, CenturyError>`.
pub type CenturyResult<T> = Result<T, CenturyError>;
