use std::path::PathBuf;

use crate::types::{Coordinate, ProviderKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub map_provider: ProviderKind,
    pub kakao_js_key: Option<String>,
    pub kakao_rest_key: Option<String>,
    pub google_maps_key: Option<String>,
    pub courses_path: PathBuf,
    pub default_center: Coordinate,
    pub script_max_retries: u32,
    pub script_retry_backoff_ms: u64,
    pub kakao_load_timeout_ms: u64,
    pub google_load_timeout_ms: u64,
    pub leaflet_load_timeout_ms: u64,
    pub container_wait_ms: u64,
    pub first_render_timeout_ms: u64,
    pub geolocation_timeout_ms: u64,
    pub geolocation_max_age_ms: u64,
    pub walking_speed_kmh: f64,
    pub cluster_distance: f64,
    pub stamp_radius_m: f64,
    pub geocode_timeout_secs: u64,
}

impl AppConfig {
    /// JS SDK key for the given provider. Leaflet has none.
    #[must_use]
    pub fn api_key(&self, provider: ProviderKind) -> Option<&str> {
        match provider {
            ProviderKind::Kakao => self.kakao_js_key.as_deref(),
            ProviderKind::Google => self.google_maps_key.as_deref(),
            ProviderKind::Leaflet => None,
        }
    }

    #[must_use]
    pub fn load_timeout_ms(&self, provider: ProviderKind) -> u64 {
        match provider {
            ProviderKind::Kakao => self.kakao_load_timeout_ms,
            ProviderKind::Google => self.google_load_timeout_ms,
            ProviderKind::Leaflet => self.leaflet_load_timeout_ms,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("map_provider", &self.map_provider)
            .field(
                "kakao_js_key",
                &self.kakao_js_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "kakao_rest_key",
                &self.kakao_rest_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "google_maps_key",
                &self.google_maps_key.as_ref().map(|_| "[redacted]"),
            )
            .field("courses_path", &self.courses_path)
            .field("default_center", &self.default_center)
            .field("script_max_retries", &self.script_max_retries)
            .field("script_retry_backoff_ms", &self.script_retry_backoff_ms)
            .field("kakao_load_timeout_ms", &self.kakao_load_timeout_ms)
            .field("google_load_timeout_ms", &self.google_load_timeout_ms)
            .field("leaflet_load_timeout_ms", &self.leaflet_load_timeout_ms)
            .field("container_wait_ms", &self.container_wait_ms)
            .field("first_render_timeout_ms", &self.first_render_timeout_ms)
            .field("geolocation_timeout_ms", &self.geolocation_timeout_ms)
            .field("geolocation_max_age_ms", &self.geolocation_max_age_ms)
            .field("walking_speed_kmh", &self.walking_speed_kmh)
            .field("cluster_distance", &self.cluster_distance)
            .field("stamp_radius_m", &self.stamp_radius_m)
            .field("geocode_timeout_secs", &self.geocode_timeout_secs)
            .finish()
    }
}
