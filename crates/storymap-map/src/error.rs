use storymap_core::ProviderKind;
use thiserror::Error;

use crate::geolocation::GeolocationError;
use crate::sdk::SdkError;

/// Errors surfaced by map adapters, the REST geocoder and geolocation.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to load {provider} map script: {message}")]
    ScriptLoad {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider} map script did not load within {timeout_ms}ms")]
    LoadTimeout {
        provider: ProviderKind,
        timeout_ms: u64,
    },

    #[error("{0} map requires an API key")]
    MissingApiKey(ProviderKind),

    #[error("map container '{0}' not found")]
    ContainerMissing(String),

    #[error("map initialisation failed: {0}")]
    Init(String),

    /// The key is valid but the map service is switched off for the app.
    #[error("map service disabled: {message}")]
    ServiceDisabled { message: String, guidance: String },

    #[error("map is not ready")]
    NotReady,

    #[error("map SDK call failed: {0}")]
    Sdk(#[from] SdkError),

    #[error("geocoding failed: {0}")]
    Geocode(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("geolocation failed: {0}")]
    Geolocation(#[from] GeolocationError),
}

impl MapError {
    pub(crate) fn from_load(provider: ProviderKind, err: LoadError) -> Self {
        match err {
            LoadError::TimedOut { timeout_ms, .. } => MapError::LoadTimeout {
                provider,
                timeout_ms,
            },
            other => MapError::ScriptLoad {
                provider,
                message: other.to_string(),
            },
        }
    }

    /// User-facing hint shown next to the error in the unavailable view.
    #[must_use]
    pub fn guidance(&self) -> Option<String> {
        match self {
            MapError::ServiceDisabled { guidance, .. } => Some(guidance.clone()),
            MapError::MissingApiKey(ProviderKind::Kakao) => Some(
                "Set STORYMAP_KAKAO_JS_KEY or switch STORYMAP_MAP_PROVIDER to leaflet.".to_string(),
            ),
            MapError::MissingApiKey(ProviderKind::Google) => Some(
                "Set STORYMAP_GOOGLE_MAPS_KEY or switch STORYMAP_MAP_PROVIDER to leaflet."
                    .to_string(),
            ),
            MapError::ScriptLoad { .. } | MapError::LoadTimeout { .. } => {
                Some("네트워크 연결을 확인한 뒤 다시 시도해 주세요.".to_string())
            }
            MapError::ContainerMissing(_) => {
                Some("지도 영역이 화면에 표시된 뒤 다시 시도해 주세요.".to_string())
            }
            _ => None,
        }
    }
}

/// Outcome of a shared script load. `Clone` so every waiter on the same load
/// receives the same result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("script {url} failed to load")]
    ScriptFailed { url: String },

    #[error("timed out after {timeout_ms}ms waiting for {url}")]
    TimedOut { url: String, timeout_ms: u64 },

    #[error("script loaded but global '{0}' is not defined")]
    GlobalMissing(String),
}
