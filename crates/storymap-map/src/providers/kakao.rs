use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use storymap_core::geo::{MAX_LEVEL, MIN_LEVEL};
use storymap_core::{Bounds, Coordinate, Marker, ProviderKind, Route};

use super::{
    bounds_from_corners, encode_query_value, lat_lng_json, marker_icon_url, marker_opacity,
    number_field, parse_lat_lng, require_key, EventNames, NativeCall, Provider,
};
use crate::error::MapError;
use crate::geocode::{kakao_documents_to_results, GeocodeResult, KakaoAddressDocument};
use crate::host::ScriptTag;
use crate::loader::{ScriptSpec, TimeoutPolicy};

const SDK_URL: &str = "https://dapi.kakao.com/v2/maps/sdk.js";
const GLOBAL: &str = "kakao";

const SERVICE_DISABLED_GUIDANCE: &str = "카카오 개발자 콘솔에서 [내 애플리케이션 > 앱 설정 > 플랫폼]에 \
현재 도메인을 등록하고 [카카오맵] 사용 설정을 켠 뒤 다시 시도해 주세요.";

/// Kakao Maps JavaScript SDK. Loaded with `autoload=false`, so the SDK must
/// be booted with `kakao.maps.load` before any map is created.
#[derive(Debug, Default, Clone, Copy)]
pub struct KakaoProvider;

#[derive(Debug, Deserialize)]
struct GeocoderResponse {
    status: String,
    #[serde(default)]
    result: Vec<KakaoAddressDocument>,
}

impl Provider for KakaoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Kakao
    }

    fn script_spec(
        &self,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<ScriptSpec, MapError> {
        let key = require_key(ProviderKind::Kakao, api_key)?;
        let url = format!(
            "{SDK_URL}?appkey={}&libraries=services,clusterer&autoload=false",
            encode_query_value(key)
        );
        Ok(ScriptSpec {
            provider: ProviderKind::Kakao,
            global: GLOBAL,
            tags: vec![ScriptTag::script(url)],
            timeout,
            // The SDK sometimes defines `kakao` without firing onload.
            timeout_policy: TimeoutPolicy::AssumeLoaded,
        })
    }

    fn requires_boot(&self) -> bool {
        true
    }

    fn map_options(&self, center: Coordinate, level: u8) -> Value {
        json!({
            "center": lat_lng_json(center),
            "level": level.clamp(MIN_LEVEL, MAX_LEVEL),
        })
    }

    fn marker_options(&self, marker: &Marker) -> Value {
        let (width, height) = marker.size.dimensions();
        json!({
            "position": lat_lng_json(marker.position),
            "title": marker.location.name,
            "clickable": true,
            "opacity": marker_opacity(marker),
            "image": {
                "src": marker_icon_url(marker),
                "size": { "width": width, "height": height },
                "offset": { "x": width / 2, "y": height },
            },
        })
    }

    fn polyline_options(&self, route: &Route) -> Value {
        let path: Vec<Value> = route.waypoints.iter().copied().map(lat_lng_json).collect();
        json!({
            "path": path,
            "strokeWeight": route.stroke_weight,
            "strokeColor": route.color,
            "strokeOpacity": route.stroke_opacity,
            "strokeStyle": if route.is_main_route { "solid" } else { "shortdash" },
        })
    }

    fn set_center_call(&self, center: Coordinate) -> NativeCall {
        NativeCall {
            method: "setCenter",
            args: vec![lat_lng_json(center)],
        }
    }

    fn set_level_call(&self, level: u8) -> NativeCall {
        NativeCall {
            method: "setLevel",
            args: vec![json!(level.clamp(MIN_LEVEL, MAX_LEVEL))],
        }
    }

    fn events(&self) -> EventNames {
        EventNames {
            click: "click",
            bounds_changed: "bounds_changed",
            zoom_changed: "zoom_changed",
            first_render: "tilesloaded",
            marker_click: "click",
        }
    }

    fn parse_click(&self, payload: &Value) -> Option<Coordinate> {
        parse_lat_lng(payload.get("latLng")?)
    }

    /// `{"sw": {lat, lng}, "ne": {lat, lng}}` from `getBounds()`.
    fn parse_bounds(&self, payload: &Value) -> Option<Bounds> {
        let sw = parse_lat_lng(payload.get("sw")?)?;
        let ne = parse_lat_lng(payload.get("ne")?)?;
        Some(bounds_from_corners(sw, ne))
    }

    fn parse_level(&self, payload: &Value) -> Option<u8> {
        let level = number_field(payload, "level")?;
        if !(f64::from(MIN_LEVEL)..=f64::from(MAX_LEVEL)).contains(&level) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let level = level.round() as u8;
        Some(level)
    }

    fn classify_init_error(&self, message: &str) -> MapError {
        let lower = message.to_ascii_lowercase();
        if lower.contains("open_map_and_local")
            || lower.contains("disabled")
            || lower.contains("notauthorized")
        {
            MapError::ServiceDisabled {
                message: message.to_string(),
                guidance: SERVICE_DISABLED_GUIDANCE.to_string(),
            }
        } else {
            MapError::Init(message.to_string())
        }
    }

    fn supports_geocoding(&self) -> bool {
        true
    }

    /// `{"status": "OK" | "ZERO_RESULT" | "ERROR", "result": [...]}` from
    /// `services.Geocoder#addressSearch`.
    fn parse_geocode(&self, response: &Value) -> Result<Vec<GeocodeResult>, MapError> {
        let parsed: GeocoderResponse =
            serde_json::from_value(response.clone()).map_err(|e| MapError::Deserialize {
                context: "kakao geocoder response".to_string(),
                source: e,
            })?;
        match parsed.status.as_str() {
            "OK" => {
                let results = kakao_documents_to_results(parsed.result);
                if results.is_empty() {
                    Err(MapError::Geocode("no usable results".to_string()))
                } else {
                    Ok(results)
                }
            }
            "ZERO_RESULT" => Err(MapError::Geocode("no results".to_string())),
            other => Err(MapError::Geocode(format!("geocoder status {other}"))),
        }
    }
}
