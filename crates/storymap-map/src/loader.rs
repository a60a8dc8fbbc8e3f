//! SDK script loading and the adapter lifecycle state machine.

use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;
use storymap_core::ProviderKind;

use crate::error::LoadError;
use crate::host::{ScriptEvent, ScriptHost, ScriptTag, TagKind};
use crate::registry::ScriptRegistry;
use crate::retry::retry_with_backoff;

const CONTAINER_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Lifecycle of one map adapter.
///
/// ```text
/// NoScript -> Loading -> SdkReady -> Initializing -> Ready
///     \__________\__________\____________\____________\--> Error(msg)
/// any --------------------------------------------------> TornDown
/// ```
///
/// `Error` only leaves through a reload (back to `NoScript`) or teardown.
/// `TornDown` is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NoScript,
    Loading,
    SdkReady,
    Initializing,
    Ready,
    Error(String),
    TornDown,
}

impl LoadState {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready)
    }

    /// Still on the way to `Ready`.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            LoadState::NoScript | LoadState::Loading | LoadState::SdkReady | LoadState::Initializing
        )
    }

    #[must_use]
    pub fn can_transition_to(&self, next: &LoadState) -> bool {
        use LoadState::{Error, Initializing, Loading, NoScript, Ready, SdkReady, TornDown};
        match (self, next) {
            (TornDown, _) => false,
            (_, TornDown) => true,
            (Error(_), NoScript) => true,
            (Error(_), _) => false,
            (_, Error(_)) => true,
            (NoScript, Loading | SdkReady)
            | (Loading, SdkReady)
            | (SdkReady, Initializing)
            | (Initializing, Ready) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::NoScript => write!(f, "no-script"),
            LoadState::Loading => write!(f, "loading"),
            LoadState::SdkReady => write!(f, "sdk-ready"),
            LoadState::Initializing => write!(f, "initializing"),
            LoadState::Ready => write!(f, "ready"),
            LoadState::Error(msg) => write!(f, "error: {msg}"),
            LoadState::TornDown => write!(f, "torn-down"),
        }
    }
}

/// What to do when a script tag neither loads nor errors in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Treat the silence as failure.
    Fail,
    /// Carry on and let the global check decide.
    AssumeLoaded,
}

/// Everything needed to bring one provider's SDK onto the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptSpec {
    pub provider: ProviderKind,
    /// `window` property the SDK defines once evaluated.
    pub global: &'static str,
    pub tags: Vec<ScriptTag>,
    pub timeout: Duration,
    pub timeout_policy: TimeoutPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 1_000,
        }
    }
}

/// Make sure the provider's SDK global is defined, loading it if needed.
///
/// Returns immediately when the global already exists. Otherwise joins the
/// registry's shared load for this provider, starting one if none is in
/// flight.
///
/// # Errors
///
/// Returns the [`LoadError`] of the last attempt once retries are exhausted.
pub async fn ensure_loaded(
    host: &Arc<dyn ScriptHost>,
    registry: &ScriptRegistry,
    spec: &ScriptSpec,
    retry: RetryConfig,
) -> Result<(), LoadError> {
    if host.has_global(spec.global) {
        tracing::debug!(provider = %spec.provider, global = spec.global, "SDK global already present");
        return Ok(());
    }

    let load = registry.acquire_load(spec.provider, || {
        let host = Arc::clone(host);
        let spec = spec.clone();
        async move {
            retry_with_backoff(retry.max_retries, retry.backoff_base_ms, || {
                load_once(&host, &spec)
            })
            .await
        }
        .boxed()
    });
    load.await
}

async fn load_once(host: &Arc<dyn ScriptHost>, spec: &ScriptSpec) -> Result<(), LoadError> {
    for tag in &spec.tags {
        if tag.kind == TagKind::Stylesheet {
            // Stylesheets never block the map; only scripts are awaited.
            drop(host.inject(tag));
            continue;
        }

        tracing::debug!(provider = %spec.provider, url = %tag.url, "injecting map script");
        match tokio::time::timeout(spec.timeout, host.inject(tag)).await {
            Ok(ScriptEvent::Loaded) => {}
            Ok(ScriptEvent::Failed) => {
                return Err(LoadError::ScriptFailed {
                    url: tag.url.clone(),
                });
            }
            Err(_) => {
                let timeout_ms = u64::try_from(spec.timeout.as_millis()).unwrap_or(u64::MAX);
                match spec.timeout_policy {
                    TimeoutPolicy::AssumeLoaded => {
                        tracing::warn!(
                            provider = %spec.provider,
                            url = %tag.url,
                            timeout_ms,
                            "no load event from map script, assuming it loaded"
                        );
                    }
                    TimeoutPolicy::Fail => {
                        return Err(LoadError::TimedOut {
                            url: tag.url.clone(),
                            timeout_ms,
                        });
                    }
                }
            }
        }
    }

    if host.has_global(spec.global) {
        Ok(())
    } else {
        Err(LoadError::GlobalMissing(spec.global.to_string()))
    }
}

/// Poll for the map container until it exists or `max_wait` elapses.
pub async fn wait_for_container(
    host: &Arc<dyn ScriptHost>,
    container_id: &str,
    max_wait: Duration,
) -> bool {
    let poll = async {
        while !host.container_exists(container_id) {
            tokio::time::sleep(CONTAINER_POLL_INTERVAL).await;
        }
    };
    tokio::time::timeout(max_wait, poll).await.is_ok()
}
