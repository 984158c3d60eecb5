//! Source link validation.
//!
//! Only MEGA single-file links are accepted. Anything else, folder links
//! included, is rejected before any network traffic happens.
//!
//! # Example
//!
//! ```
//! use megalink_core::link::validate_link;
//!
//! let query = validate_link(" https://mega.nz/file/abc#key ").unwrap();
//! assert_eq!(query.as_str(), "https://mega.nz/file/abc#key");
//! assert!(validate_link("https://mega.nz/folder/abc").is_err());
//! ```

mod error;

pub use error::{UNSUPPORTED_LINK_MESSAGE, ValidationError};

use std::fmt;

use tracing::debug;

/// Canonical prefix of a MEGA file link.
pub const MEGA_FILE_PREFIX: &str = "https://mega.nz/file/";

/// A validated source link.
///
/// Only [`validate_link`] constructs this type, so a `LinkQuery` always
/// starts with [`MEGA_FILE_PREFIX`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkQuery(String);

impl LinkQuery {
    /// The trimmed source URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LinkQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validates a raw source link.
///
/// The input is trimmed; it must then be non-empty and start with the exact
/// literal [`MEGA_FILE_PREFIX`].
///
/// # Errors
///
/// Returns [`ValidationError`] for empty input and for any other link shape.
pub fn validate_link(raw: &str) -> Result<LinkQuery, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.starts_with(MEGA_FILE_PREFIX) {
        debug!(input = %trimmed, "rejected source link");
        return Err(ValidationError::unsupported(raw));
    }
    Ok(LinkQuery(trimmed.to_string()))
}
