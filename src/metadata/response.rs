//! Wire contract of the metadata service response.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::error::ResolveError;

use super::FileMetadata;

/// JSON body returned by the metadata service for 2xx and 400 responses.
///
/// A missing `ok` flag reads as a failure.
#[derive(Debug, Deserialize)]
pub(crate) struct MetadataResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_file_size")]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireSize {
    Integer(u64),
    Float(f64),
}

/// Accepts integer sizes and integral floats such as `2048.0`.
#[allow(
    clippy::float_cmp,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn deserialize_file_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<WireSize>::deserialize(deserializer)? {
        None => Ok(None),
        Some(WireSize::Integer(size)) => Ok(Some(size)),
        Some(WireSize::Float(size))
            if size >= 0.0 && size.trunc() == size && size <= u64::MAX as f64 =>
        {
            Ok(Some(size as u64))
        }
        Some(WireSize::Float(size)) => Err(D::Error::custom(format!(
            "invalid file_size {size}, expected a non-negative whole number"
        ))),
    }
}

impl MetadataResponse {
    /// Converts the body into metadata or the error it reports.
    pub(crate) fn into_result(self) -> Result<FileMetadata, ResolveError> {
        if !self.ok {
            return Err(ResolveError::application(self.error));
        }
        let file_name = self
            .file_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ResolveError::transport("metadata response is missing `file_name`"))?;
        Ok(FileMetadata {
            file_name,
            file_size: self.file_size.unwrap_or(0),
        })
    }
}
