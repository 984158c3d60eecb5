//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Resolve MEGA file links into direct download links.
///
/// Looks up the file name and size through the metadata service and prints
/// a direct link served by the download redirect service. Without a URL,
/// links are read from stdin, one per line.
#[derive(Parser, Debug)]
#[command(name = "megalink")]
#[command(author, version, about)]
pub struct Args {
    /// MEGA file link (https://mega.nz/file/...); read from stdin when omitted
    pub url: Option<String>,

    /// Increase output verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Download the file after a successful lookup
    #[arg(short, long)]
    pub download: bool,

    /// Directory for downloaded files (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print results as JSON, one object per line
    #[arg(long)]
    pub json: bool,

    /// Metadata service endpoint
    #[arg(long, value_name = "URL")]
    pub api_endpoint: Option<String>,

    /// Download redirect service base URL
    #[arg(long, value_name = "URL")]
    pub download_base: Option<String>,

    /// Config file to use instead of the default location (must exist)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
