//! Debounced, cooled-down download trigger.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::direct_link::DirectLink;
use crate::metadata::FileMetadata;
use crate::sync::lock;

use super::error::DownloadError;
use super::navigator::{Navigated, Navigator};

/// Where the trigger is in its debounce/cool-down cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    /// Ready to accept a trigger.
    NotStarted,
    /// Triggered; waiting out the debounce delay.
    Pending,
    /// Navigation started; cool-down has not elapsed.
    InFlight,
}

/// Result of a trigger request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The navigator followed the link.
    Navigated(Navigated),
    /// Ignored because a previous trigger is still pending or in flight.
    Busy(DownloadState),
    /// Ignored because no direct link exists yet.
    NoLink,
}

/// Gates navigation so rapid repeated triggers produce one navigation.
///
/// A trigger waits `debounce`, navigates, then holds [`DownloadState::InFlight`]
/// for `cooldown` on a detached task. Triggers arriving in between are no-ops.
pub struct DownloadTrigger {
    navigator: Arc<dyn Navigator>,
    state: Arc<Mutex<DownloadState>>,
    debounce: Duration,
    cooldown: Duration,
}

impl DownloadTrigger {
    /// Creates a trigger with explicit timing.
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>, debounce: Duration, cooldown: Duration) -> Self {
        Self {
            navigator,
            state: Arc::new(Mutex::new(DownloadState::NotStarted)),
            debounce,
            cooldown,
        }
    }

    /// Creates a trigger using the debounce and cool-down from `config`.
    #[must_use]
    pub fn from_config(navigator: Arc<dyn Navigator>, config: &ResolverConfig) -> Self {
        Self::new(navigator, config.debounce, config.cooldown)
    }

    /// Current trigger state.
    #[must_use]
    pub fn state(&self) -> DownloadState {
        *lock(&self.state)
    }

    /// Navigates to `link` unless a download is already pending or in flight.
    ///
    /// The delays are not cancellable. If this future is dropped before
    /// navigation completes, whether during the debounce or mid-download, the
    /// trigger returns to [`DownloadState::NotStarted`] without a cool-down.
    ///
    /// # Errors
    ///
    /// Returns the navigator's [`DownloadError`]. The cool-down still applies.
    pub async fn trigger(
        &self,
        link: &DirectLink,
        metadata: &FileMetadata,
    ) -> Result<TriggerOutcome, DownloadError> {
        {
            let mut state = lock(&self.state);
            if *state != DownloadState::NotStarted {
                debug!(state = ?*state, "download trigger ignored");
                return Ok(TriggerOutcome::Busy(*state));
            }
            *state = DownloadState::Pending;
        }
        let mut release = ReleaseOnDrop::new(Arc::clone(&self.state));

        tokio::time::sleep(self.debounce).await;
        *lock(&self.state) = DownloadState::InFlight;

        let result = self.navigator.navigate(link, metadata).await;
        release.disarm();
        self.spawn_cooldown();

        match result {
            Ok(navigated) => Ok(TriggerOutcome::Navigated(navigated)),
            Err(error) => {
                warn!(error = %error, "navigation to direct link failed");
                Err(error)
            }
        }
    }

    fn spawn_cooldown(&self) {
        let state = Arc::clone(&self.state);
        let cooldown = self.cooldown;
        if cooldown.is_zero() {
            *lock(&state) = DownloadState::NotStarted;
            return;
        }
        tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            *lock(&state) = DownloadState::NotStarted;
            debug!("download cool-down elapsed");
        });
    }
}

impl std::fmt::Debug for DownloadTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadTrigger")
            .field("state", &self.state())
            .field("debounce", &self.debounce)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Resets the trigger to `NotStarted` unless disarmed first.
struct ReleaseOnDrop {
    state: Arc<Mutex<DownloadState>>,
    armed: bool,
}

impl ReleaseOnDrop {
    fn new(state: Arc<Mutex<DownloadState>>) -> Self {
        Self { state, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        if self.armed {
            *lock(&self.state) = DownloadState::NotStarted;
        }
    }
}
