use std::time::Duration;

use serde_json::{json, Value};
use storymap_core::geo::level_to_zoom;
use storymap_core::{Bounds, Coordinate, Marker, ProviderKind, Route};

use super::{
    bounds_from_corners, level_from_zoom, marker_icon_url, marker_opacity, number_field,
    parse_lat_lng, EventNames, NativeCall, Provider,
};
use crate::error::MapError;
use crate::host::ScriptTag;
use crate::loader::{ScriptSpec, TimeoutPolicy};

const SCRIPT_URL: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const STYLESHEET_URL: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const GLOBAL: &str = "L";

const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";
const MAX_ZOOM: u8 = 19;

/// Leaflet over OpenStreetMap tiles. Needs no API key and has no geocoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeafletProvider;

fn lat_lng_pair(coord: Coordinate) -> Value {
    json!([coord.lat, coord.lng])
}

impl Provider for LeafletProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Leaflet
    }

    fn script_spec(
        &self,
        _api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<ScriptSpec, MapError> {
        Ok(ScriptSpec {
            provider: ProviderKind::Leaflet,
            global: GLOBAL,
            tags: vec![
                ScriptTag::stylesheet(STYLESHEET_URL),
                ScriptTag::script(SCRIPT_URL),
            ],
            timeout,
            timeout_policy: TimeoutPolicy::Fail,
        })
    }

    fn map_options(&self, center: Coordinate, level: u8) -> Value {
        json!({
            "center": lat_lng_pair(center),
            "zoom": level_to_zoom(level),
            "zoomControl": true,
            "tileLayer": {
                "url": TILE_URL,
                "attribution": TILE_ATTRIBUTION,
                "maxZoom": MAX_ZOOM,
            },
        })
    }

    fn marker_options(&self, marker: &Marker) -> Value {
        let (width, height) = marker.size.dimensions();
        json!({
            "latlng": lat_lng_pair(marker.position),
            "title": marker.location.name,
            "opacity": marker_opacity(marker),
            "icon": {
                "iconUrl": marker_icon_url(marker),
                "iconSize": [width, height],
                "iconAnchor": [width / 2, height],
            },
        })
    }

    fn polyline_options(&self, route: &Route) -> Value {
        let latlngs: Vec<Value> = route.waypoints.iter().copied().map(lat_lng_pair).collect();
        json!({
            "latlngs": latlngs,
            "color": route.color,
            "weight": route.stroke_weight,
            "opacity": route.stroke_opacity,
            "dashArray": if route.is_main_route { Value::Null } else { json!("8 8") },
        })
    }

    fn set_center_call(&self, center: Coordinate) -> NativeCall {
        NativeCall {
            method: "panTo",
            args: vec![lat_lng_pair(center)],
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
            bounds_changed: "moveend",
            zoom_changed: "zoomend",
            first_render: "load",
            marker_click: "click",
        }
    }

    fn parse_click(&self, payload: &Value) -> Option<Coordinate> {
        parse_lat_lng(payload.get("latlng")?)
    }

    /// Serialised `LatLngBounds`: `{"_southWest": {..}, "_northEast": {..}}`.
    fn parse_bounds(&self, payload: &Value) -> Option<Bounds> {
        let sw = parse_lat_lng(payload.get("_southWest")?)?;
        let ne = parse_lat_lng(payload.get("_northEast")?)?;
        Some(bounds_from_corners(sw, ne))
    }

    fn parse_level(&self, payload: &Value) -> Option<u8> {
        level_from_zoom(number_field(payload, "zoom")?)
    }

    fn classify_init_error(&self, message: &str) -> MapError {
        MapError::Init(message.to_string())
    }
}
