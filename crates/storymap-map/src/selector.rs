//! Picks a provider and builds an adapter for it.

use std::sync::Arc;

use storymap_core::{AppConfig, ProviderKind};

use crate::adapter::{AdapterOptions, MapAdapter, MapProps};
use crate::host::ScriptHost;
use crate::providers::{GoogleProvider, KakaoProvider, LeafletProvider, Provider};
use crate::registry::ScriptRegistry;

#[must_use]
pub fn provider_for(kind: ProviderKind) -> Arc<dyn Provider> {
    match kind {
        ProviderKind::Kakao => Arc::new(KakaoProvider),
        ProviderKind::Google => Arc::new(GoogleProvider),
        ProviderKind::Leaflet => Arc::new(LeafletProvider),
    }
}

/// The provider that can actually be mounted: `requested` when its key is
/// configured, otherwise Leaflet, which needs none.
#[must_use]
pub fn resolve_provider(requested: ProviderKind, config: &AppConfig) -> ProviderKind {
    if requested.requires_api_key() && config.api_key(requested).is_none() {
        tracing::warn!(
            requested = %requested,
            fallback = %ProviderKind::Leaflet,
            "no API key configured for map provider, falling back"
        );
        return ProviderKind::Leaflet;
    }
    requested
}

pub struct MapSelector {
    host: Arc<dyn ScriptHost>,
    registry: Arc<ScriptRegistry>,
    config: AppConfig,
}

impl MapSelector {
    /// Selector sharing the process-wide script registry.
    #[must_use]
    pub fn new(host: Arc<dyn ScriptHost>, config: AppConfig) -> Self {
        Self::with_registry(host, ScriptRegistry::global(), config)
    }

    #[must_use]
    pub fn with_registry(
        host: Arc<dyn ScriptHost>,
        registry: Arc<ScriptRegistry>,
        config: AppConfig,
    ) -> Self {
        Self {
            host,
            registry,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Props to start a map with: the configured default center, no
    /// markers, no routes.
    #[must_use]
    pub fn props(&self) -> MapProps {
        MapProps::from_config(&self.config)
    }

    /// Build an unmounted adapter. `None` uses the configured default
    /// provider. The same props reach whichever provider is chosen.
    #[must_use]
    pub fn build(
        &self,
        requested: Option<ProviderKind>,
        container_id: &str,
        props: MapProps,
    ) -> MapAdapter {
        let kind = resolve_provider(requested.unwrap_or(self.config.map_provider), &self.config);
        tracing::debug!(provider = %kind, container_id, "building map adapter");
        MapAdapter::new(
            provider_for(kind),
            Arc::clone(&self.host),
            Arc::clone(&self.registry),
            AdapterOptions::from_config(&self.config, kind, container_id),
            props,
        )
    }
}

impl std::fmt::Debug for MapSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSelector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
