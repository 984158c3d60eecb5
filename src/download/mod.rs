//! Paced navigation to a direct link.
//!
//! # Features
//!
//! - Debounced trigger: navigation starts after a short fixed delay
//! - Cool-down window: repeated triggers are ignored while a download is in flight
//! - Pluggable [`Navigator`]; [`StreamingNavigator`] streams the file to disk
//! - Output names taken from file metadata, with Content-Disposition fallback
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use megalink_core::{DownloadTrigger, ResolverConfig, StreamingNavigator};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ResolverConfig::default();
//! let navigator = StreamingNavigator::new("./downloads", config.connect_timeout)?;
//! let trigger = DownloadTrigger::from_config(Arc::new(navigator), &config);
//! # let _ = trigger;
//! # Ok(())
//! # }
//! ```

mod error;
mod filename;
mod navigator;
mod trigger;

pub use error::DownloadError;
pub use navigator::{Navigated, Navigator, StreamingNavigator};
pub use trigger::{DownloadState, DownloadTrigger, TriggerOutcome};
