//! Per-SDK translation of the logical map model.
//!
//! A [`Provider`] knows how to load its SDK and how to phrase markers,
//! polylines, camera moves and events in that SDK's own vocabulary. It holds
//! no native state; the adapter owns that.

mod google;
mod kakao;
mod leaflet;

pub use google::GoogleProvider;
pub use kakao::KakaoProvider;
pub use leaflet::LeafletProvider;

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::{json, Value};
use storymap_core::{Bounds, Coordinate, Marker, MarkerType, ProviderKind, Route};

use crate::error::MapError;
use crate::geocode::GeocodeResult;
use crate::loader::ScriptSpec;

pub const START_COLOR: &str = "#10B981";
pub const END_COLOR: &str = "#EF4444";
pub const WAYPOINT_COLOR: &str = "#3B82F6";
pub const STAMP_COLOR: &str = "#F59E0B";
pub const PHOTO_COLOR: &str = "#8B5CF6";
pub const COLLECTED_COLOR: &str = "#6B7280";

const VISITED_OPACITY: f64 = 0.6;

/// A method call on the native map object.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeCall {
    pub method: &'static str,
    pub args: Vec<Value>,
}

/// Native event names the adapter subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventNames {
    pub click: &'static str,
    pub bounds_changed: &'static str,
    pub zoom_changed: &'static str,
    /// Fired once the first tiles are on screen.
    pub first_render: &'static str,
    pub marker_click: &'static str,
}

pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Script tags, global name and timeout behaviour for this SDK.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingApiKey`] when the SDK needs a key and none
    /// (or a blank one) is given.
    fn script_spec(&self, api_key: Option<&str>, timeout: Duration)
        -> Result<ScriptSpec, MapError>;

    /// Whether [`crate::sdk::Sdk::boot`] must run after the script loads.
    fn requires_boot(&self) -> bool {
        false
    }

    fn map_options(&self, center: Coordinate, level: u8) -> Value;

    fn marker_options(&self, marker: &Marker) -> Value;

    fn polyline_options(&self, route: &Route) -> Value;

    fn set_center_call(&self, center: Coordinate) -> NativeCall;

    fn set_level_call(&self, level: u8) -> NativeCall;

    fn events(&self) -> EventNames;

    fn parse_click(&self, payload: &Value) -> Option<Coordinate>;

    fn parse_bounds(&self, payload: &Value) -> Option<Bounds>;

    /// Current level (Kakao scale) from a zoom-changed payload.
    fn parse_level(&self, payload: &Value) -> Option<u8>;

    /// Turn a native initialisation failure into a [`MapError`], recognising
    /// the "service disabled" case.
    fn classify_init_error(&self, message: &str) -> MapError;

    fn supports_geocoding(&self) -> bool {
        false
    }

    /// Parse the raw response of [`crate::sdk::Sdk::geocode`].
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Geocode`] for non-OK statuses, empty results or
    /// providers without a geocoder.
    fn parse_geocode(&self, response: &Value) -> Result<Vec<GeocodeResult>, MapError> {
        let _ = response;
        Err(MapError::Geocode(format!(
            "{} has no built-in geocoder",
            self.kind()
        )))
    }
}

pub(crate) fn require_key(provider: ProviderKind, api_key: Option<&str>) -> Result<&str, MapError> {
    api_key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(MapError::MissingApiKey(provider))
}

pub(crate) fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

#[must_use]
pub fn marker_color(marker_type: MarkerType) -> &'static str {
    match marker_type {
        MarkerType::Start => START_COLOR,
        MarkerType::End => END_COLOR,
        MarkerType::Waypoint => WAYPOINT_COLOR,
        MarkerType::Stamp => STAMP_COLOR,
        MarkerType::Photo => PHOTO_COLOR,
    }
}

/// Pin icon as an SVG data URL, coloured by marker type and sized by
/// [`storymap_core::MarkerSize`].
pub(crate) fn marker_icon_url(marker: &Marker) -> String {
    let (width, height) = marker.size.dimensions();
    let color = if marker.is_stamp_collected {
        COLLECTED_COLOR
    } else {
        marker_color(marker.marker_type)
    };
    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 24 32"><path d="M12 0C5.4 0 0 5.4 0 12c0 9 12 20 12 20s12-11 12-20C24 5.4 18.6 0 12 0z" fill="{color}"/><circle cx="12" cy="12" r="5" fill="#FFFFFF"/></svg>"##
    );
    format!(
        "data:image/svg+xml;charset=UTF-8,{}",
        utf8_percent_encode(&svg, NON_ALPHANUMERIC)
    )
}

pub(crate) fn marker_opacity(marker: &Marker) -> f64 {
    if marker.is_visited {
        VISITED_OPACITY
    } else {
        1.0
    }
}

pub(crate) fn lat_lng_json(coord: Coordinate) -> Value {
    json!({ "lat": coord.lat, "lng": coord.lng })
}

/// Reads a number that may arrive as a JSON number or a numeric string.
pub(crate) fn number_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `{"lat": .., "lng": ..}` into a valid coordinate.
pub(crate) fn parse_lat_lng(value: &Value) -> Option<Coordinate> {
    let lat = number_field(value, "lat")?;
    let lng = number_field(value, "lng")?;
    Coordinate::try_new(lat, lng).ok()
}

pub(crate) fn bounds_from_corners(sw: Coordinate, ne: Coordinate) -> Bounds {
    Bounds {
        north: ne.lat,
        south: sw.lat,
        east: ne.lng,
        west: sw.lng,
    }
}

/// Rounds a possibly fractional zoom into the Kakao level scale.
pub(crate) fn level_from_zoom(zoom: f64) -> Option<u8> {
    if !zoom.is_finite() || zoom < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let zoom = zoom.round().min(f64::from(u8::MAX)) as u8;
    Some(storymap_core::geo::zoom_to_level(zoom))
}

#[cfg(test)]
mod tests {
    use storymap_core::{Category, Location, MarkerSize};

    use super::*;

    fn marker(marker_type: MarkerType) -> Marker {
        Marker::from_location(
            Location {
                id: "homigot".to_string(),
                name: "호미곶".to_string(),
                description: String::new(),
                coordinates: Coordinate::new(36.0766, 129.5674),
                category: Category::History,
                qr_code: None,
                stamp_id: None,
                media: vec![],
                estimated_time: None,
                difficulty: None,
            },
            marker_type,
        )
    }

    #[test]
    fn require_key_rejects_blank() {
        assert!(matches!(
            require_key(ProviderKind::Kakao, Some("  ")),
            Err(MapError::MissingApiKey(ProviderKind::Kakao))
        ));
        assert!(matches!(
            require_key(ProviderKind::Google, None),
            Err(MapError::MissingApiKey(ProviderKind::Google))
        ));
        assert_eq!(require_key(ProviderKind::Kakao, Some(" abc ")).unwrap(), "abc");
    }

    #[test]
    fn icon_color_follows_marker_type() {
        let url = marker_icon_url(&marker(MarkerType::Stamp));
        assert!(url.starts_with("data:image/svg+xml;charset=UTF-8,"));
        assert!(url.contains("F59E0B"), "{url}");
    }

    #[test]
    fn collected_stamp_is_greyed_out() {
        let mut m = marker(MarkerType::Stamp);
        m.is_stamp_collected = true;
        assert!(marker_icon_url(&m).contains("6B7280"));
    }

    #[test]
    fn icon_uses_marker_dimensions() {
        let mut m = marker(MarkerType::Start);
        m.size = MarkerSize::Large;
        let url = marker_icon_url(&m);
        assert!(url.contains("width%3D%2240%22"), "{url}");
        assert!(url.contains("height%3D%2252%22"), "{url}");
    }

    #[test]
    fn visited_markers_are_dimmed() {
        let mut m = marker(MarkerType::Waypoint);
        assert!((marker_opacity(&m) - 1.0).abs() < f64::EPSILON);
        m.is_visited = true;
        assert!((marker_opacity(&m) - VISITED_OPACITY).abs() < f64::EPSILON);
    }

    #[test]
    fn number_field_accepts_numeric_strings() {
        let v = json!({ "x": "129.3435", "y": 36.019, "z": "n/a" });
        assert_eq!(number_field(&v, "x"), Some(129.3435));
        assert_eq!(number_field(&v, "y"), Some(36.019));
        assert_eq!(number_field(&v, "z"), None);
        assert_eq!(number_field(&v, "missing"), None);
    }

    #[test]
    fn parse_lat_lng_rejects_out_of_range() {
        assert_eq!(
            parse_lat_lng(&json!({ "lat": 36.0, "lng": 129.0 })),
            Some(Coordinate::new(36.0, 129.0))
        );
        assert_eq!(parse_lat_lng(&json!({ "lat": 95.0, "lng": 129.0 })), None);
    }

    #[test]
    fn level_from_zoom_rounds_and_clamps() {
        assert_eq!(level_from_zoom(17.0), Some(3));
        assert_eq!(level_from_zoom(16.6), Some(3));
        assert_eq!(level_from_zoom(1.0), Some(14));
        assert_eq!(level_from_zoom(-1.0), None);
        assert_eq!(level_from_zoom(f64::NAN), None);
    }
}
