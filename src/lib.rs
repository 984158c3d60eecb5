//! Megalink Core Library
//!
//! This library resolves MEGA file-sharing links into direct download links.
//! It validates the source URL, asks a remote metadata service for the file's
//! name and size, derives a direct link served by a download redirect service,
//! and can trigger a paced download of that link.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`link`] - Source URL validation
//! - [`metadata`] - Metadata service client and response contract
//! - [`direct_link`] - Direct link derivation
//! - [`format`] - Human-readable byte sizes
//! - [`download`] - Debounced download trigger and streaming navigator
//! - [`session`] - The link resolver session and its request state machine
//! - [`config`] - Runtime defaults and TOML file configuration
//! - [`error`] - Lookup error taxonomy

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod direct_link;
pub mod download;
pub mod error;
pub mod format;
pub(crate) mod http_client;
pub mod link;
pub mod metadata;
pub mod session;
pub(crate) mod sync;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, FileConfig, LoadedConfig, ResolverConfig, VerbositySetting};
pub use direct_link::{DEFAULT_DOWNLOAD_BASE_URL, DirectLink};
pub use download::{
    DownloadError, DownloadState, DownloadTrigger, Navigated, Navigator, StreamingNavigator,
    TriggerOutcome,
};
pub use error::ResolveError;
pub use format::{format_bytes, format_bytes_with_decimals};
pub use link::{LinkQuery, MEGA_FILE_PREFIX, ValidationError, validate_link};
pub use metadata::{DEFAULT_API_ENDPOINT, FileMetadata, HttpMetadataService, MetadataService};
pub use session::{LinkResolver, RequestState, SessionSnapshot, SubmitOutcome};
