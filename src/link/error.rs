//! Error type for source link validation.

use thiserror::Error;

/// The message shown for every rejected source link.
pub const UNSUPPORTED_LINK_MESSAGE: &str = "Only Mega.nz file links are supported (must start with https://mega.nz/file/). Folders are not supported.";

/// A source link that cannot be resolved.
///
/// The rejected input is kept for logging; the display text is always
/// [`UNSUPPORTED_LINK_MESSAGE`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", UNSUPPORTED_LINK_MESSAGE)]
pub struct ValidationError {
    input: String,
}

impl ValidationError {
    /// Creates a validation error for the rejected input.
    #[must_use]
    pub fn unsupported(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }

    /// The input as received, before trimming.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}
