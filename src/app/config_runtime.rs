use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use megalink_core::{FileConfig, LoadedConfig, ResolverConfig, VerbositySetting};
use megalink_core::config::{load_default_file_config, load_file_config};

use crate::cli::Args;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

/// Everything a run needs after CLI flags and the config file are merged.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub(crate) resolver: ResolverConfig,
    pub(crate) output_dir: PathBuf,
    pub(crate) verbose: u8,
    pub(crate) quiet: bool,
    pub(crate) download: bool,
    pub(crate) json: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let command = Args::command();
    let matches = command.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    let sources = CliValueSources {
        verbose: is_commandline_value(&matches, "verbose"),
        quiet: is_commandline_value(&matches, "quiet"),
    };
    (args, sources)
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Loads `--config PATH` when given, otherwise the default config file if present.
pub(crate) fn load_config(args: &Args) -> Result<LoadedConfig> {
    if let Some(path) = &args.config {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.clone()),
            config: Some(config),
        });
    }
    Ok(load_default_file_config()?)
}

/// Merges CLI flags over config file values over built-in defaults.
pub(crate) fn resolve_settings(
    args: &Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<RunSettings> {
    let mut resolver = ResolverConfig::default();
    let mut output_dir = args.output_dir.clone();
    let mut verbose = args.verbose;
    let mut quiet = args.quiet;

    if let Some(file_config) = file_config {
        resolver.apply_file_config(file_config);

        if output_dir.is_none() {
            output_dir.clone_from(&file_config.output_dir);
        }

        if !cli_sources.verbose
            && !cli_sources.quiet
            && let Some(verbosity) = file_config.verbosity
        {
            (verbose, quiet) = verbosity_flags(verbosity);
        }
    }

    if let Some(endpoint) = &args.api_endpoint {
        resolver.api_endpoint.clone_from(endpoint);
    }
    if let Some(base) = &args.download_base {
        resolver.download_base_url.clone_from(base);
    }
    resolver.validate()?;

    Ok(RunSettings {
        resolver,
        output_dir: output_dir.unwrap_or_else(|| PathBuf::from(".")),
        verbose,
        quiet,
        download: args.download,
        json: args.json,
    })
}

fn verbosity_flags(verbosity: VerbositySetting) -> (u8, bool) {
    match verbosity {
        VerbositySetting::Default => (0, false),
        VerbositySetting::Verbose => (1, false),
        VerbositySetting::Debug => (2, false),
        VerbositySetting::Quiet => (0, true),
    }
}

pub(crate) fn resolve_default_log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn should_force_cli_log_level(cli_sources: &CliValueSources) -> bool {
    cli_sources.verbose || cli_sources.quiet
}
