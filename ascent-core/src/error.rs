// error.rs
use thiserror::Error;

/// A read or command on the live telemetry/control link failed.
#[derive(Debug, Error)]
#[error("{context}: {message}")]
pub struct LinkError {
    /// What was being read or commanded, e.g. "mean altitude".
    pub context: &'static str,
    pub message: String,
}

impl LinkError {
    pub fn new(context: &'static str, cause: impl core::fmt::Display) -> Self {
        Self {
            context,
            message: cause.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AscentError {
    #[error("telemetry link failed: {0}")]
    Link(#[from] LinkError),
    #[error("failed to export telemetry trace: {0}")]
    Export(#[from] std::io::Error),
}
