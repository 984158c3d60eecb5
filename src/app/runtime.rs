use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use megalink_core::{
    DownloadError, HttpMetadataService, LinkResolver, MetadataService, Navigator,
    StreamingNavigator, SubmitOutcome, TriggerOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::app::config_runtime::{self, RunSettings};
use crate::app::{exit_handler, terminal};
use crate::{ProcessExit, output};

/// How often a batch run re-checks a cooling-down download trigger.
const DOWNLOAD_READY_POLL: Duration = Duration::from_millis(100);

pub(crate) async fn run_megalink() -> Result<ProcessExit> {
    let (args, cli_sources) = config_runtime::parse_cli_with_sources();
    let loaded = config_runtime::load_config(&args)?;
    let settings = config_runtime::resolve_settings(&args, &cli_sources, loaded.config.as_ref())?;

    let stderr_is_terminal = io::stderr().is_terminal();
    let default_level = config_runtime::resolve_default_log_level(settings.verbose, settings.quiet);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    let no_color = terminal::should_disable_color(
        stderr_is_terminal,
        terminal::no_color_env_requested(),
        terminal::is_dumb_terminal(),
    );
    terminal::init_tracing(default_level, force_cli_log_level, no_color);

    debug!(?args, "CLI arguments parsed");
    if let Some(path) = loaded.path.as_deref().filter(|_| loaded.loaded_from_file()) {
        info!(path = %path.display(), "Loaded config file");
    }

    let resolver = build_resolver(&settings, stderr_is_terminal)?;

    let mut failed = 0usize;
    if let Some(url) = args.url.as_deref() {
        if !resolve_link(&resolver, &settings, url).await? {
            failed += 1;
        }
    } else {
        let stdin_is_terminal = io::stdin().is_terminal();
        if stdin_is_terminal && !settings.json {
            output::print_interactive_prompt();
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut processed = 0usize;
        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            processed += 1;
            if !resolve_link(&resolver, &settings, line).await? {
                failed += 1;
            }
        }

        if processed == 0 && !stdin_is_terminal {
            output::print_empty_input_guidance();
        }
        info!(processed, failed, "Finished reading links");
    }

    Ok(exit_handler::determine_exit_outcome(failed))
}

fn build_resolver(settings: &RunSettings, stderr_is_terminal: bool) -> Result<LinkResolver> {
    let service: Arc<dyn MetadataService> = Arc::new(HttpMetadataService::new(&settings.resolver)?);

    let show_progress = terminal::should_show_progress(
        stderr_is_terminal,
        settings.quiet,
        settings.json,
        terminal::is_dumb_terminal(),
    );
    let navigator: Arc<dyn Navigator> = Arc::new(
        StreamingNavigator::new(&settings.output_dir, settings.resolver.connect_timeout)?
            .with_progress(show_progress),
    );

    Ok(LinkResolver::from_config(service, navigator, &settings.resolver))
}

/// Resolves one link and prints the outcome. Returns whether it succeeded.
async fn resolve_link(resolver: &LinkResolver, settings: &RunSettings, url: &str) -> Result<bool> {
    match resolver.submit(url).await {
        SubmitOutcome::Resolved {
            metadata,
            direct_link,
        } => {
            if !settings.json {
                output::print_resolved(&metadata, &direct_link);
            }

            let mut saved_to = None;
            if settings.download {
                match download_when_ready(resolver).await {
                    Ok(TriggerOutcome::Navigated(navigated)) => saved_to = navigated.path,
                    Ok(outcome) => debug!(?outcome, "Download not started"),
                    Err(error) => {
                        report_download_failure(settings, url, &error)?;
                        return Ok(false);
                    }
                }
            }

            if settings.json {
                output::print_record(&output::ResultRecord::resolved(
                    url,
                    &metadata,
                    &direct_link,
                    saved_to.as_deref(),
                ))?;
            } else if let Some(path) = saved_to.as_deref() {
                output::print_saved(path);
            }
            Ok(true)
        }
        SubmitOutcome::Failed(error) => {
            if settings.json {
                output::print_record(&output::ResultRecord::from_error(url, &error))?;
            } else {
                output::print_error(&error.user_message());
            }
            Ok(false)
        }
        SubmitOutcome::Busy | SubmitOutcome::Stale => {
            warn!(url, "Lookup superseded before it completed");
            Ok(false)
        }
    }
}

/// Waits out a previous download's cool-down, then triggers the next one.
async fn download_when_ready(resolver: &LinkResolver) -> Result<TriggerOutcome, DownloadError> {
    loop {
        match resolver.download().await? {
            TriggerOutcome::Busy(state) => {
                debug!(?state, "Waiting for download cool-down");
                tokio::time::sleep(DOWNLOAD_READY_POLL).await;
            }
            outcome => return Ok(outcome),
        }
    }
}

fn report_download_failure(settings: &RunSettings, url: &str, error: &DownloadError) -> Result<()> {
    if settings.json {
        output::print_record(&output::ResultRecord::failed(
            url,
            "download",
            error.to_string(),
        ))
    } else {
        output::print_error(&error.to_string());
        Ok(())
    }
}
