//! Shared User-Agent string for metadata and download HTTP clients.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/megalink";

/// Default User-Agent for every outgoing request.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("megalink/{version} (link-resolver; +{PROJECT_UA_URL})")
}
