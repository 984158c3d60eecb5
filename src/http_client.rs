//! Shared HTTP client construction policy.
//!
//! Metadata lookups and downloads use the same User-Agent, compression and
//! connect timeout; only the overall request timeout differs.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::user_agent;

/// Builds a client with the project User-Agent and gzip enabled.
///
/// `request_timeout` of `None` leaves the total request time unbounded, which
/// suits streamed downloads of unknown size.
pub(crate) fn build_http_client(
    connect_timeout: Duration,
    request_timeout: Option<Duration>,
) -> Result<Client, reqwest::Error> {
    debug!(?connect_timeout, ?request_timeout, "building HTTP client");
    let mut builder = Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(user_agent::default_user_agent())
        .gzip(true);
    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client_with_and_without_timeout() {
        assert!(build_http_client(Duration::from_secs(1), Some(Duration::from_secs(2))).is_ok());
        assert!(build_http_client(Duration::from_secs(1), None).is_ok());
    }
}
