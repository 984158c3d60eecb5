//! Error taxonomy for link lookups.
//!
//! Every failed lookup falls into one of three categories: the input was
//! rejected locally, the metadata service could not be reached (or answered
//! with something unusable), or the service answered and reported a failure.

use thiserror::Error;

use crate::link::ValidationError;

/// Fallback shown when a transport failure carries no message.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch file info.";

/// Fallback shown when the service reports failure without a message.
pub const SERVICE_REJECTED_MESSAGE: &str = "The API could not process the URL.";

/// Errors that end a single lookup attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The source link was rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Network failure, unexpected HTTP status, or an unreadable response.
    #[error("{message}")]
    Transport {
        /// Human-readable description
        message: String,
    },

    /// The service was reached and reported a logical failure.
    #[error("{message}")]
    Application {
        /// The service's message, or [`SERVICE_REJECTED_MESSAGE`]
        message: String,
    },
}

impl ResolveError {
    /// Creates a `Transport` error, falling back to [`FETCH_FAILED_MESSAGE`].
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Transport {
            message: non_empty_or(message, FETCH_FAILED_MESSAGE),
        }
    }

    /// Creates a `Transport` error for a status that carries no usable body.
    #[must_use]
    pub fn unexpected_status(status: u16) -> Self {
        Self::Transport {
            message: format!("API responded with status: {status}"),
        }
    }

    /// Creates an `Application` error from the service's optional message.
    #[must_use]
    pub fn application(message: Option<String>) -> Self {
        Self::Application {
            message: non_empty_or(message.unwrap_or_default(), SERVICE_REJECTED_MESSAGE),
        }
    }

    /// The text shown to the user for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Short machine-readable category label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transport { .. } => "transport",
            Self::Application { .. } => "application",
        }
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
