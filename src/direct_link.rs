//! Direct link derivation.
//!
//! The redirect service takes the source URL base64-encoded in a single `url`
//! query parameter. The encoded value is appended as-is; how the service
//! decodes it is its own business.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::link::LinkQuery;

/// Default base URL of the download redirect service.
pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://mega.wldbs.workers.dev/download";

/// A URL that serves the file bytes through the redirect service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectLink(String);

impl DirectLink {
    /// Builds the direct link for `query` against `base_url`.
    #[must_use]
    pub fn build(base_url: &str, query: &LinkQuery) -> Self {
        let encoded = STANDARD.encode(query.as_str());
        Self(format!("{base_url}?url={encoded}"))
    }

    /// The full direct link.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DirectLink {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DirectLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
