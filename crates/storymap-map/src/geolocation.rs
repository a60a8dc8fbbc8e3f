//! Device position lookup with a bounded wait and a short-lived cache.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use storymap_core::{AppConfig, Coordinate};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("no position within {0} ms")]
    Timeout(u64),

    #[error("geolocation is not supported on this device")]
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Cached fixes younger than this are returned without asking the source.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(60),
        }
    }
}

impl PositionOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_millis(config.geolocation_timeout_ms),
            maximum_age: Duration::from_millis(config.geolocation_max_age_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coordinate: Coordinate,
    pub accuracy_m: f64,
    pub timestamp: DateTime<Utc>,
}

/// Platform position provider, e.g. the browser's `navigator.geolocation`.
pub trait PositionSource: Send + Sync {
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> BoxFuture<'static, Result<Position, GeolocationError>>;
}

pub struct Geolocator {
    source: Arc<dyn PositionSource>,
    options: PositionOptions,
    cache: Mutex<Option<Position>>,
}

impl Geolocator {
    #[must_use]
    pub fn new(source: Arc<dyn PositionSource>, options: PositionOptions) -> Self {
        Self {
            source,
            options,
            cache: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    /// Current position, served from cache when the last fix is fresh enough.
    ///
    /// # Errors
    ///
    /// Returns [`GeolocationError::Timeout`] when the source does not answer
    /// within `options.timeout`, or whatever error the source reports.
    pub async fn current_position(&self) -> Result<Position, GeolocationError> {
        self.current_position_at(Utc::now()).await
    }

    /// Same as [`Geolocator::current_position`], with cache age measured
    /// against `now`.
    ///
    /// # Errors
    ///
    /// See [`Geolocator::current_position`].
    pub async fn current_position_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Position, GeolocationError> {
        if let Some(cached) = self.fresh_cached(now) {
            tracing::debug!(age_ms = (now - cached.timestamp).num_milliseconds(), "using cached position");
            return Ok(cached);
        }

        let timeout_ms = u64::try_from(self.options.timeout.as_millis()).unwrap_or(u64::MAX);
        let position = tokio::time::timeout(
            self.options.timeout,
            self.source.current_position(&self.options),
        )
        .await
        .map_err(|_| GeolocationError::Timeout(timeout_ms))??;

        if !position.coordinate.is_valid() {
            return Err(GeolocationError::PositionUnavailable(format!(
                "source returned invalid coordinate {}",
                position.coordinate
            )));
        }

        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = Some(position);
        Ok(position)
    }

    /// Forget the cached fix.
    pub fn clear_cache(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn fresh_cached(&self, now: DateTime<Utc>) -> Option<Position> {
        let cached = (*self.cache.lock().unwrap_or_else(PoisonError::into_inner))?;
        let age = (now - cached.timestamp).to_std().ok()?;
        (age <= self.options.maximum_age).then_some(cached)
    }
}

impl std::fmt::Debug for Geolocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geolocator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
