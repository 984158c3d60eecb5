//! CLI output formatting and display helpers.

use std::path::Path;

use anyhow::Result;
use megalink_core::{DirectLink, FileMetadata, ResolveError, format_bytes};
use serde::Serialize;

/// Message when stdin was piped but contained no links.
pub const EMPTY_STDIN_GUIDANCE: &str = "No links received on stdin.";

/// Prompt shown when reading links interactively.
pub const INTERACTIVE_PROMPT: &str = "Enter MEGA file links, one per line (Ctrl-D to finish).";

/// Example for passing a link as an argument.
pub const INPUT_ARG_EXAMPLE: &str = "Example: megalink https://mega.nz/file/<id>#<key>";

/// Machine-readable result of one link.
#[derive(Debug, Serialize)]
pub(crate) struct ResultRecord<'a> {
    pub(crate) url: &'a str,
    pub(crate) ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) file_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) direct_link: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) saved_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

impl<'a> ResultRecord<'a> {
    pub(crate) fn resolved(
        url: &'a str,
        metadata: &'a FileMetadata,
        direct_link: &'a DirectLink,
        saved_to: Option<&Path>,
    ) -> Self {
        Self {
            url,
            ok: true,
            file_name: Some(&metadata.file_name),
            file_size: Some(metadata.file_size),
            size: Some(format_bytes(metadata.file_size)),
            direct_link: Some(direct_link.as_str()),
            saved_to: saved_to.map(|path| path.display().to_string()),
            error_kind: None,
            error: None,
        }
    }

    pub(crate) fn failed(url: &'a str, kind: &'static str, message: String) -> Self {
        Self {
            url,
            ok: false,
            file_name: None,
            file_size: None,
            size: None,
            direct_link: None,
            saved_to: None,
            error_kind: Some(kind),
            error: Some(message),
        }
    }

    pub(crate) fn from_error(url: &'a str, error: &ResolveError) -> Self {
        Self::failed(url, error.kind(), error.user_message())
    }
}

/// Lines of the human-readable result panel.
pub(crate) fn resolved_lines(metadata: &FileMetadata, direct_link: &DirectLink) -> [String; 3] {
    [
        format!("File: {}", metadata.file_name),
        format!("Size: {}", format_bytes(metadata.file_size)),
        format!("Direct link: {direct_link}"),
    ]
}

pub(crate) fn print_resolved(metadata: &FileMetadata, direct_link: &DirectLink) {
    for line in resolved_lines(metadata, direct_link) {
        println!("{line}");
    }
}

pub(crate) fn print_saved(path: &Path) {
    println!("Saved to: {}", path.display());
}

pub(crate) fn print_error(message: &str) {
    eprintln!("error: {message}");
}

pub(crate) fn print_record(record: &ResultRecord<'_>) -> Result<()> {
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}

pub(crate) fn print_interactive_prompt() {
    eprintln!("{INTERACTIVE_PROMPT}");
}

pub(crate) fn print_empty_input_guidance() {
    eprintln!("{EMPTY_STDIN_GUIDANCE}");
    eprintln!("{INPUT_ARG_EXAMPLE}");
}
