//! HTTP backend for the metadata service.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::http_client::build_http_client;
use crate::link::LinkQuery;

use super::response::MetadataResponse;
use super::{FileMetadata, MetadataService};

/// Default metadata service endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://mega.wldbs.workers.dev/api/info";

/// Multipart field carrying the source URL.
pub const MEGA_URL_FIELD: &str = "megaurl";

/// Looks up file metadata by posting the source URL to the remote API.
///
/// The client is created once and reused across lookups.
#[derive(Debug, Clone)]
pub struct HttpMetadataService {
    client: Client,
    endpoint: String,
}

impl HttpMetadataService {
    /// Creates a service for `config.api_endpoint` with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Transport`] if HTTP client construction fails.
    pub fn new(config: &ResolverConfig) -> Result<Self, ResolveError> {
        let client = build_http_client(config.connect_timeout, Some(config.read_timeout))
            .map_err(|e| ResolveError::transport(format!("HTTP client construction failed: {e}")))?;
        Ok(Self::with_client(client, config.api_endpoint.clone()))
    }

    /// Creates a service from an existing client.
    #[must_use]
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// The endpoint lookups are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MetadataService for HttpMetadataService {
    #[tracing::instrument(skip(self, query), fields(endpoint = %self.endpoint))]
    async fn fetch(&self, query: &LinkQuery) -> Result<FileMetadata, ResolveError> {
        debug!("posting metadata lookup");
        let form = Form::new().text(MEGA_URL_FIELD, query.as_str().to_string());

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ResolveError::transport(error_chain(&e)))?;

        let status = response.status();
        debug!(status = status.as_u16(), "metadata service responded");
        // 400 still carries a JSON body explaining the failure.
        if !status.is_success() && status != StatusCode::BAD_REQUEST {
            return Err(ResolveError::unexpected_status(status.as_u16()));
        }

        let body: MetadataResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::transport(error_chain(&e)))?;
        let metadata = body.into_result()?;

        info!(
            file_name = %metadata.file_name,
            file_size = metadata.file_size,
            "resolved file metadata"
        );
        Ok(metadata)
    }
}

/// Joins an error with its sources; reqwest keeps the useful part in the chain.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
