//! Provider-agnostic map adapter.
//!
//! A [`MapAdapter`] drives one map instance through [`LoadState`]: it loads
//! the provider's SDK, waits for the container, creates the native map and
//! then projects markers and routes onto it. Every failure lands in
//! `LoadState::Error` and is rendered as [`AdapterView::Unavailable`]; the
//! adapter never panics on behalf of the SDK.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use storymap_core::geo::{DEFAULT_CENTER, DEFAULT_LEVEL, MAX_LEVEL, MIN_LEVEL};
use storymap_core::{AppConfig, Bounds, Coordinate, Marker, ProviderKind, Route};
use tokio::sync::oneshot;

use crate::error::{LoadError, MapError};
use crate::geocode::GeocodeResult;
use crate::handle::{MapHandle, OverlayHandle};
use crate::host::ScriptHost;
use crate::loader::{self, LoadState, RetryConfig};
use crate::providers::{NativeCall, Provider};
use crate::registry::ScriptRegistry;
use crate::sdk::{EventHandler, OverlayKind, Sdk};

pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Optional listeners forwarded from the host UI.
#[derive(Clone, Default)]
pub struct MapCallbacks {
    pub on_map_click: Option<Callback<Coordinate>>,
    pub on_marker_click: Option<Callback<Marker>>,
    pub on_bounds_changed: Option<Callback<Bounds>>,
    /// Receives the new level on the Kakao scale, whatever the provider.
    pub on_zoom_changed: Option<Callback<u8>>,
}

impl MapCallbacks {
    #[must_use]
    pub fn on_map_click(mut self, f: impl Fn(Coordinate) + Send + Sync + 'static) -> Self {
        self.on_map_click = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_marker_click(mut self, f: impl Fn(Marker) + Send + Sync + 'static) -> Self {
        self.on_marker_click = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_bounds_changed(mut self, f: impl Fn(Bounds) + Send + Sync + 'static) -> Self {
        self.on_bounds_changed = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_zoom_changed(mut self, f: impl Fn(u8) + Send + Sync + 'static) -> Self {
        self.on_zoom_changed = Some(Arc::new(f));
        self
    }
}

impl std::fmt::Debug for MapCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapCallbacks")
            .field("on_map_click", &self.on_map_click.is_some())
            .field("on_marker_click", &self.on_marker_click.is_some())
            .field("on_bounds_changed", &self.on_bounds_changed.is_some())
            .field("on_zoom_changed", &self.on_zoom_changed.is_some())
            .finish()
    }
}

/// The uniform prop surface every provider receives.
#[derive(Debug, Clone)]
pub struct MapProps {
    pub center: Coordinate,
    pub level: u8,
    pub markers: Vec<Marker>,
    pub routes: Vec<Route>,
    pub callbacks: MapCallbacks,
}

impl Default for MapProps {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            level: DEFAULT_LEVEL,
            markers: Vec::new(),
            routes: Vec::new(),
            callbacks: MapCallbacks::default(),
        }
    }
}

impl MapProps {
    /// Empty props centered on the configured default center.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            center: config.default_center,
            ..Self::default()
        }
    }
}

/// Loader and timing knobs for one adapter.
#[derive(Clone, PartialEq, Eq)]
pub struct AdapterOptions {
    pub container_id: String,
    pub api_key: Option<String>,
    pub load_timeout: Duration,
    pub retry: RetryConfig,
    pub container_wait: Duration,
    pub first_render_timeout: Duration,
}

impl AdapterOptions {
    #[must_use]
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            api_key: None,
            load_timeout: Duration::from_millis(5_000),
            retry: RetryConfig::default(),
            container_wait: Duration::from_millis(5_000),
            first_render_timeout: Duration::from_millis(3_000),
        }
    }

    #[must_use]
    pub fn from_config(
        config: &AppConfig,
        provider: ProviderKind,
        container_id: impl Into<String>,
    ) -> Self {
        Self {
            container_id: container_id.into(),
            api_key: config.api_key(provider).map(str::to_owned),
            load_timeout: Duration::from_millis(config.load_timeout_ms(provider)),
            retry: RetryConfig {
                max_retries: config.script_max_retries,
                backoff_base_ms: config.script_retry_backoff_ms,
            },
            container_wait: Duration::from_millis(config.container_wait_ms),
            first_render_timeout: Duration::from_millis(config.first_render_timeout_ms),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl std::fmt::Debug for AdapterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterOptions")
            .field("container_id", &self.container_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("load_timeout", &self.load_timeout)
            .field("retry", &self.retry)
            .field("container_wait", &self.container_wait)
            .field("first_render_timeout", &self.first_render_timeout)
            .finish()
    }
}

/// What the host UI should render for this adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterView {
    Loading {
        state: LoadState,
    },
    Ready,
    /// Shown with a reload button wired to [`MapAdapter::reload`].
    Unavailable {
        message: String,
        guidance: Option<String>,
    },
    Detached,
}

pub struct MapAdapter {
    provider: Arc<dyn Provider>,
    host: Arc<dyn ScriptHost>,
    registry: Arc<ScriptRegistry>,
    options: AdapterOptions,
    callbacks: MapCallbacks,
    state: LoadState,
    guidance: Option<String>,
    marker_overlays: Vec<OverlayHandle>,
    route_overlays: Vec<OverlayHandle>,
    map: Option<MapHandle>,
    sdk: Option<Arc<dyn Sdk>>,
    center: Coordinate,
    level: u8,
    markers: Vec<Marker>,
    routes: Vec<Route>,
    /// Cleared on teardown; native listeners check it before calling back.
    alive: Arc<AtomicBool>,
}

impl MapAdapter {
    #[must_use]
    pub fn new(
        provider: Arc<dyn Provider>,
        host: Arc<dyn ScriptHost>,
        registry: Arc<ScriptRegistry>,
        options: AdapterOptions,
        props: MapProps,
    ) -> Self {
        Self {
            provider,
            host,
            registry,
            options,
            callbacks: props.callbacks,
            state: LoadState::NoScript,
            guidance: None,
            marker_overlays: Vec::new(),
            route_overlays: Vec::new(),
            map: None,
            sdk: None,
            center: props.center,
            level: props.level.clamp(MIN_LEVEL, MAX_LEVEL),
            markers: props.markers,
            routes: props.routes,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    #[must_use]
    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    #[must_use]
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        self.center
    }

    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[must_use]
    pub fn rendered_marker_count(&self) -> usize {
        self.marker_overlays.len()
    }

    #[must_use]
    pub fn rendered_route_count(&self) -> usize {
        self.route_overlays.len()
    }

    #[must_use]
    pub fn view(&self) -> AdapterView {
        match &self.state {
            LoadState::Ready => AdapterView::Ready,
            LoadState::Error(message) => AdapterView::Unavailable {
                message: message.clone(),
                guidance: self.guidance.clone(),
            },
            LoadState::TornDown => AdapterView::Detached,
            pending => AdapterView::Loading {
                state: pending.clone(),
            },
        }
    }

    /// Load the SDK and create the native map.
    ///
    /// A no-op once `Ready`. Dropping the returned future abandons the mount;
    /// the next call starts over from `NoScript`.
    ///
    /// # Errors
    ///
    /// Returns the failure that moved the adapter into `LoadState::Error`, or
    /// [`MapError::NotReady`] when called after an error (use
    /// [`MapAdapter::reload`]) or after teardown.
    pub async fn mount(&mut self) -> Result<(), MapError> {
        match &self.state {
            LoadState::Ready => {
                tracing::debug!(provider = %self.provider.kind(), "map already mounted");
                return Ok(());
            }
            LoadState::Error(_) | LoadState::TornDown => return Err(MapError::NotReady),
            _ => {}
        }

        match self.try_mount().await {
            Ok(()) => {
                self.transition(LoadState::Ready);
                tracing::info!(
                    provider = %self.provider.kind(),
                    container = %self.options.container_id,
                    "map ready"
                );
                self.render_markers();
                self.render_routes();
                Ok(())
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    async fn try_mount(&mut self) -> Result<(), MapError> {
        let kind = self.provider.kind();
        if self.state != LoadState::NoScript {
            tracing::debug!(provider = %kind, state = %self.state, "restarting interrupted mount");
            self.release_native();
            self.state = LoadState::NoScript;
        }

        let spec = self
            .provider
            .script_spec(self.options.api_key.as_deref(), self.options.load_timeout)?;

        if self.host.has_global(spec.global) {
            self.transition(LoadState::SdkReady);
        } else {
            self.transition(LoadState::Loading);
            loader::ensure_loaded(&self.host, &self.registry, &spec, self.options.retry)
                .await
                .map_err(|e| MapError::from_load(kind, e))?;
            self.transition(LoadState::SdkReady);
        }

        let sdk = self.host.sdk(spec.global).ok_or_else(|| {
            MapError::from_load(kind, LoadError::GlobalMissing(spec.global.to_string()))
        })?;
        if self.provider.requires_boot() {
            sdk.boot()
                .await
                .map_err(|e| self.provider.classify_init_error(&e.to_string()))?;
        }
        self.sdk = Some(Arc::clone(&sdk));

        self.transition(LoadState::Initializing);
        let container_id = self.options.container_id.clone();
        if !loader::wait_for_container(&self.host, &container_id, self.options.container_wait).await
        {
            return Err(MapError::ContainerMissing(container_id));
        }

        let map_options = self.provider.map_options(self.center, self.level);
        let map_id = sdk
            .create_map(&container_id, &map_options)
            .map_err(|e| self.provider.classify_init_error(&e.to_string()))?;
        let map = MapHandle::new(Arc::clone(&sdk), map_id);

        let (tx, rx) = oneshot::channel::<()>();
        let tx = Mutex::new(Some(tx));
        map.listen(
            self.provider.events().first_render,
            Arc::new(move |_: Value| {
                if let Some(tx) = tx.lock().unwrap_or_else(PoisonError::into_inner).take() {
                    let _ = tx.send(());
                }
            }),
        )?;
        self.register_map_listeners(&map)?;
        self.map = Some(map);

        if tokio::time::timeout(self.options.first_render_timeout, rx)
            .await
            .is_err()
        {
            tracing::debug!(provider = %kind, "no first-render event before timeout, continuing");
        }
        Ok(())
    }

    fn register_map_listeners(&self, map: &MapHandle) -> Result<(), MapError> {
        let events = self.provider.events();
        if let Some(cb) = &self.callbacks.on_map_click {
            map.listen(events.click, self.guarded(cb, |p, v| p.parse_click(v)))?;
        }
        if let Some(cb) = &self.callbacks.on_bounds_changed {
            map.listen(
                events.bounds_changed,
                self.guarded(cb, |p, v| p.parse_bounds(v)),
            )?;
        }
        if let Some(cb) = &self.callbacks.on_zoom_changed {
            map.listen(events.zoom_changed, self.guarded(cb, |p, v| p.parse_level(v)))?;
        }
        Ok(())
    }

    /// Wrap a callback so it only fires while the adapter is alive and the
    /// payload parses.
    fn guarded<T: 'static>(
        &self,
        callback: &Callback<T>,
        parse: fn(&dyn Provider, &Value) -> Option<T>,
    ) -> EventHandler {
        let alive = Arc::clone(&self.alive);
        let provider = Arc::clone(&self.provider);
        let callback = Arc::clone(callback);
        Arc::new(move |payload: Value| {
            if !alive.load(Ordering::Acquire) {
                return;
            }
            match parse(provider.as_ref(), &payload) {
                Some(value) => callback(value),
                None => tracing::debug!(%payload, "ignoring unparseable map event"),
            }
        })
    }

    /// Move the camera. Applied on mount when not yet ready.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Sdk`] if the native call fails.
    pub fn set_center(&mut self, center: Coordinate) -> Result<(), MapError> {
        self.center = center;
        self.call_native(&self.provider.set_center_call(center))
    }

    /// Change the level (clamped to 1..=14). Applied on mount when not yet
    /// ready.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Sdk`] if the native call fails.
    pub fn set_level(&mut self, level: u8) -> Result<(), MapError> {
        self.level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        self.call_native(&self.provider.set_level_call(self.level))
    }

    fn call_native(&self, call: &NativeCall) -> Result<(), MapError> {
        match (&self.state, &self.map) {
            (LoadState::Ready, Some(map)) => {
                map.call(call.method, &call.args)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Replace the marker list. Rendered overlays are rebuilt from scratch
    /// when the map is ready.
    pub fn set_markers(&mut self, markers: &[Marker]) {
        self.markers = markers.to_vec();
        if self.state.is_ready() {
            self.render_markers();
        }
    }

    /// Replace the route list. Routes with fewer than two waypoints are kept
    /// but not drawn.
    pub fn set_routes(&mut self, routes: &[Route]) {
        self.routes = routes.to_vec();
        if self.state.is_ready() {
            self.render_routes();
        }
    }

    fn render_markers(&mut self) {
        self.marker_overlays.clear();
        let Some(map) = &self.map else {
            return;
        };
        let marker_click = self.provider.events().marker_click;
        let mut overlays = Vec::with_capacity(self.markers.len());

        for marker in &self.markers {
            let options = self.provider.marker_options(marker);
            let overlay = match map.add_overlay(OverlayKind::Marker, &options) {
                Ok(overlay) => overlay,
                Err(err) => {
                    tracing::warn!(marker_id = %marker.id, error = %err, "failed to create marker, skipping");
                    continue;
                }
            };
            if let Some(cb) = &self.callbacks.on_marker_click {
                let alive = Arc::clone(&self.alive);
                let cb = Arc::clone(cb);
                let clicked = marker.clone();
                let handler: EventHandler = Arc::new(move |_: Value| {
                    if alive.load(Ordering::Acquire) {
                        cb(clicked.clone());
                    }
                });
                if let Err(err) = overlay.listen(marker_click, handler) {
                    tracing::warn!(marker_id = %marker.id, error = %err, "failed to attach marker click listener");
                }
            }
            overlays.push(overlay);
        }

        tracing::debug!(
            provider = %self.provider.kind(),
            requested = self.markers.len(),
            rendered = overlays.len(),
            "markers rendered"
        );
        self.marker_overlays = overlays;
    }

    fn render_routes(&mut self) {
        self.route_overlays.clear();
        let Some(map) = &self.map else {
            return;
        };
        let mut overlays = Vec::with_capacity(self.routes.len());

        for route in &self.routes {
            if !route.is_renderable() {
                tracing::debug!(route_id = %route.id, waypoints = route.waypoints.len(), "skipping route with fewer than two waypoints");
                continue;
            }
            let options = self.provider.polyline_options(route);
            match map.add_overlay(OverlayKind::Polyline, &options) {
                Ok(overlay) => overlays.push(overlay),
                Err(err) => {
                    tracing::warn!(route_id = %route.id, error = %err, "failed to create polyline, skipping");
                }
            }
        }

        self.route_overlays = overlays;
    }

    /// Look up an address with the mounted SDK's geocoder.
    ///
    /// # Errors
    ///
    /// - [`MapError::NotReady`] before the map is ready.
    /// - [`MapError::Geocode`] when the provider has no geocoder or finds
    ///   nothing.
    /// - [`MapError::Sdk`] if the native geocoder throws.
    pub async fn geocode(&self, query: &str) -> Result<Vec<GeocodeResult>, MapError> {
        let sdk = match (&self.state, &self.sdk) {
            (LoadState::Ready, Some(sdk)) => Arc::clone(sdk),
            _ => return Err(MapError::NotReady),
        };
        if !self.provider.supports_geocoding() {
            return Err(MapError::Geocode(format!(
                "{} has no built-in geocoder",
                self.provider.kind()
            )));
        }
        let response = sdk.geocode(query).await?;
        self.provider.parse_geocode(&response)
    }

    /// Drop native state, forget the provider's script load and mount again.
    ///
    /// # Errors
    ///
    /// Same as [`MapAdapter::mount`]; [`MapError::NotReady`] after teardown.
    pub async fn reload(&mut self) -> Result<(), MapError> {
        if self.state == LoadState::TornDown {
            return Err(MapError::NotReady);
        }
        tracing::info!(provider = %self.provider.kind(), "reloading map");
        self.release_native();
        self.registry.reset(self.provider.kind());
        self.guidance = None;
        self.state = LoadState::NoScript;
        self.mount().await
    }

    /// Detach every overlay, release the map and stop delivering callbacks.
    /// Idempotent; also runs on drop.
    pub fn teardown(&mut self) {
        if self.state == LoadState::TornDown {
            return;
        }
        self.alive.store(false, Ordering::Release);
        self.release_native();
        self.transition(LoadState::TornDown);
    }

    fn release_native(&mut self) {
        self.marker_overlays.clear();
        self.route_overlays.clear();
        self.map = None;
        self.sdk = None;
    }

    fn fail(&mut self, err: &MapError) {
        tracing::warn!(provider = %self.provider.kind(), error = %err, "map unavailable");
        self.release_native();
        self.guidance = err.guidance();
        self.transition(LoadState::Error(err.to_string()));
    }

    fn transition(&mut self, next: LoadState) {
        if !self.state.can_transition_to(&next) {
            tracing::warn!(
                provider = %self.provider.kind(),
                from = %self.state,
                to = %next,
                "ignoring invalid map state transition"
            );
            return;
        }
        tracing::debug!(provider = %self.provider.kind(), from = %self.state, to = %next, "map state");
        self.state = next;
    }
}

impl Drop for MapAdapter {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for MapAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapAdapter")
            .field("provider", &self.provider.kind())
            .field("state", &self.state)
            .field("options", &self.options)
            .field("markers", &self.markers.len())
            .field("routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}
