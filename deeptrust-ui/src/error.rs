//! Error types for deeptrust-ui

use thiserror::Error;

/// Shown when a failure carries no message of its own
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

/// Failure of the call to the analysis service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoundaryError {
    /// Service answered with a non-2xx status and an `{error}` body
    #[error("{message}")]
    Service { status: u16, message: String },

    /// Service could not be reached
    #[error("Could not reach the analysis service: {0}")]
    Transport(String),

    /// 200 answer that is not a valid analysis result
    #[error("Unexpected response from the analysis service: {0}")]
    Decode(String),
}

impl BoundaryError {
    /// Message surfaced to the user
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        }
    }
}

/// Orchestrator failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    /// A submission is already in flight for this session
    #[error("An analysis is already in progress")]
    Busy,

    /// The session was reset while this submission was in flight
    #[error("Analysis was superseded by a reset")]
    Superseded,

    /// The analysis failed; the session is now in `Error`
    #[error("{}", .0.user_message())]
    Analysis(#[from] BoundaryError),
}
