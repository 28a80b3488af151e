/// Errors that can occur during gate evaluation.
///
/// A check that *rejects* a transaction is not an error; it returns
/// [`crate::CheckDecision::Fail`]. These variants mean the check itself
/// could not run.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A check returned an unexpected error.
    #[error("check error in '{check}': {message}")]
    CheckError { check: String, message: String },

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GateError {
    /// Create a check error with a name and message.
    pub fn check(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CheckError {
            check: check.into(),
            message: message.into(),
        }
    }
}
