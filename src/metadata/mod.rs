//! Metadata service client for resolving a source link to file details.
//!
//! # Architecture
//!
//! - [`MetadataService`] - Async trait that lookup backends implement
//! - [`HttpMetadataService`] - Production backend posting to the remote API
//! - [`FileMetadata`] - Name and size of the file behind a link
//!
//! # Example
//!
//! ```no_run
//! use megalink_core::{HttpMetadataService, MetadataService, ResolverConfig, validate_link};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = HttpMetadataService::new(&ResolverConfig::default())?;
//! let query = validate_link("https://mega.nz/file/abc#key")?;
//! let meta = service.fetch(&query).await?;
//! println!("{} ({} bytes)", meta.file_name, meta.file_size);
//! # Ok(())
//! # }
//! ```

mod client;
mod response;

pub use client::{DEFAULT_API_ENDPOINT, HttpMetadataService, MEGA_URL_FIELD};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ResolveError;
use crate::link::LinkQuery;

/// Name and size of a file, as reported by the metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    /// File name as stored by the provider.
    pub file_name: String,
    /// File size in bytes.
    pub file_size: u64,
}

/// A backend that can look up file metadata for a validated link.
///
/// # Object Safety
///
/// This trait uses `async_trait` so sessions can hold `Arc<dyn MetadataService>`
/// and tests can substitute scripted backends.
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Performs exactly one lookup for `query`.
    async fn fetch(&self, query: &LinkQuery) -> Result<FileMetadata, ResolveError>;
}
