use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use storymap_core::geo::level_to_zoom;
use storymap_core::{Bounds, Coordinate, Marker, ProviderKind, Route};

use super::{
    encode_query_value, lat_lng_json, level_from_zoom, marker_icon_url, marker_opacity,
    number_field, parse_lat_lng, require_key, EventNames, NativeCall, Provider,
};
use crate::error::MapError;
use crate::geocode::GeocodeResult;
use crate::host::ScriptTag;
use crate::loader::{ScriptSpec, TimeoutPolicy};

const SDK_URL: &str = "https://maps.googleapis.com/maps/api/js";
const GLOBAL: &str = "google";

/// Google Maps JavaScript API, Korean UI, region-biased to KR.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleProvider;

#[derive(Debug, Deserialize)]
struct GeocoderResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocoderResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocoderResult {
    formatted_address: String,
    geometry: GeocoderGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocoderGeometry {
    location: Value,
}

impl Provider for GoogleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn script_spec(
        &self,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<ScriptSpec, MapError> {
        let key = require_key(ProviderKind::Google, api_key)?;
        let url = format!(
            "{SDK_URL}?key={}&libraries=geometry,places&language=ko&region=KR",
            encode_query_value(key)
        );
        Ok(ScriptSpec {
            provider: ProviderKind::Google,
            global: GLOBAL,
            tags: vec![ScriptTag::script(url)],
            timeout,
            timeout_policy: TimeoutPolicy::Fail,
        })
    }

    fn map_options(&self, center: Coordinate, level: u8) -> Value {
        json!({
            "center": lat_lng_json(center),
            "zoom": level_to_zoom(level),
            "mapTypeControl": false,
            "streetViewControl": false,
            "fullscreenControl": false,
            "gestureHandling": "greedy",
        })
    }

    fn marker_options(&self, marker: &Marker) -> Value {
        let (width, height) = marker.size.dimensions();
        json!({
            "position": lat_lng_json(marker.position),
            "title": marker.location.name,
            "opacity": marker_opacity(marker),
            "icon": {
                "url": marker_icon_url(marker),
                "scaledSize": { "width": width, "height": height },
                "anchor": { "x": width / 2, "y": height },
            },
        })
    }

    fn polyline_options(&self, route: &Route) -> Value {
        let path: Vec<Value> = route.waypoints.iter().copied().map(lat_lng_json).collect();
        json!({
            "path": path,
            "geodesic": true,
            "strokeColor": route.color,
            "strokeWeight": route.stroke_weight,
            "strokeOpacity": route.stroke_opacity,
            "zIndex": if route.is_main_route { 2 } else { 1 },
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
            method: "setZoom",
            args: vec![json!(level_to_zoom(level))],
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

    /// `LatLngBounds#toJSON()`: `{north, south, east, west}`.
    fn parse_bounds(&self, payload: &Value) -> Option<Bounds> {
        Some(Bounds {
            north: number_field(payload, "north")?,
            south: number_field(payload, "south")?,
            east: number_field(payload, "east")?,
            west: number_field(payload, "west")?,
        })
    }

    fn parse_level(&self, payload: &Value) -> Option<u8> {
        level_from_zoom(number_field(payload, "zoom")?)
    }

    fn classify_init_error(&self, message: &str) -> MapError {
        let guidance = if message.contains("ApiNotActivatedMapError") {
            Some("Google Cloud 콘솔에서 Maps JavaScript API를 사용 설정해 주세요.")
        } else if message.contains("BillingNotEnabledMapError") {
            Some("Google Cloud 프로젝트에 결제 계정을 연결해 주세요.")
        } else {
            None
        };
        match guidance {
            Some(guidance) => MapError::ServiceDisabled {
                message: message.to_string(),
                guidance: guidance.to_string(),
            },
            None => MapError::Init(message.to_string()),
        }
    }

    fn supports_geocoding(&self) -> bool {
        true
    }

    fn parse_geocode(&self, response: &Value) -> Result<Vec<GeocodeResult>, MapError> {
        let parsed: GeocoderResponse =
            serde_json::from_value(response.clone()).map_err(|e| MapError::Deserialize {
                context: "google geocoder response".to_string(),
                source: e,
            })?;
        match parsed.status.as_str() {
            "OK" => {
                let results: Vec<GeocodeResult> = parsed
                    .results
                    .into_iter()
                    .filter_map(|r| {
                        Some(GeocodeResult {
                            coordinate: parse_lat_lng(&r.geometry.location)?,
                            address: r.formatted_address,
                            road_address: None,
                        })
                    })
                    .collect();
                if results.is_empty() {
                    Err(MapError::Geocode("no usable results".to_string()))
                } else {
                    Ok(results)
                }
            }
            "ZERO_RESULTS" => Err(MapError::Geocode("no results".to_string())),
            other => Err(MapError::Geocode(match parsed.error_message {
                Some(msg) => format!("geocoder status {other}: {msg}"),
                None => format!("geocoder status {other}"),
            })),
        }
    }
}
