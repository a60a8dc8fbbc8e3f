use crate::app_config::{AppConfig, Environment};
use crate::types::{Coordinate, ProviderKind};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default; map SDK keys are optional because a missing
/// key is reported by the map adapter, not at startup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(invalid(var, format!("must be a positive number, got {value}")))
        }
    };

    let env = parse_environment(&or_default("STORYMAP_ENV", "development"))?;
    let log_level = or_default("STORYMAP_LOG_LEVEL", "info");
    let map_provider = or_default("STORYMAP_MAP_PROVIDER", "kakao")
        .parse::<ProviderKind>()
        .map_err(|e| invalid("STORYMAP_MAP_PROVIDER", e.to_string()))?;

    let kakao_js_key = optional("STORYMAP_KAKAO_JS_KEY");
    let kakao_rest_key = optional("STORYMAP_KAKAO_REST_KEY");
    let google_maps_key = optional("STORYMAP_GOOGLE_MAPS_KEY");

    let courses_path = PathBuf::from(or_default("STORYMAP_COURSES_PATH", "./config/courses.yaml"));
    let default_center = parse_coordinate(
        "STORYMAP_DEFAULT_CENTER",
        &or_default("STORYMAP_DEFAULT_CENTER", "36.019,129.3435"),
    )?;

    let script_max_retries = parse_u32("STORYMAP_SCRIPT_MAX_RETRIES", "2")?;
    let script_retry_backoff_ms = parse_u64("STORYMAP_SCRIPT_RETRY_BACKOFF_MS", "1000")?;
    let kakao_load_timeout_ms = parse_u64("STORYMAP_KAKAO_LOAD_TIMEOUT_MS", "5000")?;
    let google_load_timeout_ms = parse_u64("STORYMAP_GOOGLE_LOAD_TIMEOUT_MS", "8000")?;
    let leaflet_load_timeout_ms = parse_u64("STORYMAP_LEAFLET_LOAD_TIMEOUT_MS", "3000")?;
    let container_wait_ms = parse_u64("STORYMAP_CONTAINER_WAIT_MS", "5000")?;
    let first_render_timeout_ms = parse_u64("STORYMAP_FIRST_RENDER_TIMEOUT_MS", "3000")?;
    let geolocation_timeout_ms = parse_u64("STORYMAP_GEOLOCATION_TIMEOUT_MS", "10000")?;
    let geolocation_max_age_ms = parse_u64("STORYMAP_GEOLOCATION_MAX_AGE_MS", "60000")?;
    let walking_speed_kmh = parse_positive_f64("STORYMAP_WALKING_SPEED_KMH", "4")?;
    let cluster_distance = parse_positive_f64("STORYMAP_CLUSTER_DISTANCE", "0.01")?;
    let stamp_radius_m = parse_positive_f64("STORYMAP_STAMP_RADIUS_M", "100")?;
    let geocode_timeout_secs = parse_u64("STORYMAP_GEOCODE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        env,
        log_level,
        map_provider,
        kakao_js_key,
        kakao_rest_key,
        google_maps_key,
        courses_path,
        default_center,
        script_max_retries,
        script_retry_backoff_ms,
        kakao_load_timeout_ms,
        google_load_timeout_ms,
        leaflet_load_timeout_ms,
        container_wait_ms,
        first_render_timeout_ms,
        geolocation_timeout_ms,
        geolocation_max_age_ms,
        walking_speed_kmh,
        cluster_distance,
        stamp_radius_m,
        geocode_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "STORYMAP_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Parse `"lat,lng"` into a validated coordinate.
fn parse_coordinate(var: &str, raw: &str) -> Result<Coordinate, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| invalid(format!("expected 'lat,lng', got '{raw}'")))?;
    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| invalid(e.to_string()))?;
    let lng = lng
        .trim()
        .parse::<f64>()
        .map_err(|e| invalid(e.to_string()))?;
    Coordinate::try_new(lat, lng).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
