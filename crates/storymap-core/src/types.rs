//! Logical map model shared by every provider adapter.
//!
//! Nothing here holds a native SDK object. Markers and routes are plain values
//! that the adapters project onto whichever map is mounted.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::{DEFAULT_CENTER, DEFAULT_LEVEL};
use crate::CoreError;

/// A WGS84 point. Valid when both components are finite and inside
/// lat ∈ [-90, 90], lng ∈ [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        crate::geo::is_valid_coordinate(self)
    }

    /// Build a coordinate, rejecting out-of-range or non-finite input.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] when the point fails validation.
    pub fn try_new(lat: f64, lng: f64) -> Result<Self, CoreError> {
        let coord = Self { lat, lng };
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(CoreError::InvalidCoordinate { lat, lng })
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

/// Map center plus an optional Kakao-style level (smaller = closer).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCenter {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

impl MapCenter {
    #[must_use]
    pub fn level_or_default(&self) -> u8 {
        self.level.unwrap_or(DEFAULT_LEVEL)
    }
}

/// Axis-aligned lat/lng box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    #[must_use]
    pub fn contains(&self, coord: &Coordinate) -> bool {
        coord.lat <= self.north
            && coord.lat >= self.south
            && coord.lng <= self.east
            && coord.lng >= self.west
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "맛집탐방")]
    Food,
    #[serde(rename = "역사여행")]
    History,
    #[serde(rename = "자연경관")]
    Nature,
    #[serde(rename = "골목산책")]
    Alley,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Food => write!(f, "맛집탐방"),
            Category::History => write!(f, "역사여행"),
            Category::Nature => write!(f, "자연경관"),
            Category::Alley => write!(f, "골목산책"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "쉬움")]
    Easy,
    #[serde(rename = "보통")]
    Normal,
    #[serde(rename = "어려움")]
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: String,
    pub kind: MediaKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// A point of interest on a story course. Read-only to the map layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub coordinates: Coordinate,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    /// Minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerType {
    Start,
    End,
    Waypoint,
    Stamp,
    Photo,
}

impl std::fmt::Display for MarkerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerType::Start => write!(f, "start"),
            MarkerType::End => write!(f, "end"),
            MarkerType::Waypoint => write!(f, "waypoint"),
            MarkerType::Stamp => write!(f, "stamp"),
            MarkerType::Photo => write!(f, "photo"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl MarkerSize {
    /// Icon width and height in CSS pixels.
    #[must_use]
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            MarkerSize::Small => (24, 32),
            MarkerSize::Medium => (32, 42),
            MarkerSize::Large => (40, 52),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: String,
    pub location: Location,
    #[serde(rename = "type")]
    pub marker_type: MarkerType,
    pub position: Coordinate,
    #[serde(default)]
    pub size: MarkerSize,
    #[serde(default)]
    pub is_visited: bool,
    #[serde(default)]
    pub is_stamp_collected: bool,
}

impl Marker {
    /// Marker positioned at the location, keyed by the location id.
    #[must_use]
    pub fn from_location(location: Location, marker_type: MarkerType) -> Self {
        let size = match marker_type {
            MarkerType::Start | MarkerType::End => MarkerSize::Large,
            MarkerType::Stamp => MarkerSize::Medium,
            MarkerType::Waypoint | MarkerType::Photo => MarkerSize::Small,
        };
        Self {
            id: location.id.clone(),
            position: location.coordinates,
            location,
            marker_type,
            size,
            is_visited: false,
            is_stamp_collected: false,
        }
    }
}

pub const DEFAULT_ROUTE_COLOR: &str = "#3B82F6";
pub const DEFAULT_STROKE_WEIGHT: u32 = 4;
pub const DEFAULT_STROKE_OPACITY: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub name: String,
    pub waypoints: Vec<Coordinate>,
    pub color: String,
    pub stroke_weight: u32,
    pub stroke_opacity: f64,
    #[serde(default)]
    pub is_main_route: bool,
}

impl Route {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, waypoints: Vec<Coordinate>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            waypoints,
            color: DEFAULT_ROUTE_COLOR.to_string(),
            stroke_weight: DEFAULT_STROKE_WEIGHT,
            stroke_opacity: DEFAULT_STROKE_OPACITY,
            is_main_route: false,
        }
    }

    #[must_use]
    pub fn as_main_route(mut self) -> Self {
        self.is_main_route = true;
        self
    }

    #[must_use]
    pub fn with_style(mut self, color: impl Into<String>, weight: u32, opacity: f64) -> Self {
        self.color = color.into();
        self.stroke_weight = weight;
        self.stroke_opacity = opacity;
        self
    }

    /// Polylines need at least two points.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.waypoints.len() >= 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StampStatus {
    Locked,
    Collected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stamp {
    pub id: String,
    pub location_id: String,
    pub status: StampStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<Reward>,
}

impl Stamp {
    #[must_use]
    pub fn locked(id: impl Into<String>, location_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location_id: location_id.into(),
            status: StampStatus::Locked,
            collected_at: None,
            reward: None,
        }
    }

    /// Collected copy of this stamp. Only the timestamp changes on an already
    /// collected stamp.
    #[must_use]
    pub fn collect(&self, at: DateTime<Utc>) -> Self {
        Self {
            status: StampStatus::Collected,
            collected_at: Some(at),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn is_collected(&self) -> bool {
        self.status == StampStatus::Collected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceKind {
    Visit,
    Photo,
    Story,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceRecord {
    pub id: Uuid,
    pub location_id: String,
    pub kind: ExperienceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ExperienceRecord {
    #[must_use]
    pub fn new(location_id: impl Into<String>, kind: ExperienceKind, note: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            location_id: location_id.into(),
            kind,
            note,
            created_at: Utc::now(),
        }
    }
}

/// Aggregate state for one map view.
#[derive(Debug, Clone, PartialEq)]
pub struct MapState {
    pub is_loaded: bool,
    pub is_initialized: bool,
    pub current_center: Coordinate,
    pub current_level: u8,
    pub visible_markers: Vec<Marker>,
    pub routes: Vec<Route>,
    /// Id of a marker in `visible_markers`.
    pub selected_marker: Option<String>,
    /// Id of a route in `routes`.
    pub selected_route: Option<String>,
    pub collected_stamps: Vec<Stamp>,
    pub experience_records: Vec<ExperienceRecord>,
    pub user_location: Option<Coordinate>,
    pub error: Option<String>,
}

impl MapState {
    /// Fresh state looking at `center` instead of the built-in default.
    #[must_use]
    pub fn centered_at(center: Coordinate) -> Self {
        Self {
            current_center: center,
            ..Self::default()
        }
    }
}

impl Default for MapState {
    fn default() -> Self {
        Self {
            is_loaded: false,
            is_initialized: false,
            current_center: DEFAULT_CENTER,
            current_level: DEFAULT_LEVEL,
            visible_markers: Vec::new(),
            routes: Vec::new(),
            selected_marker: None,
            selected_route: None,
            collected_stamps: Vec::new(),
            experience_records: Vec::new(),
            user_location: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Kakao,
    Google,
    Leaflet,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Kakao,
        ProviderKind::Google,
        ProviderKind::Leaflet,
    ];

    /// Leaflet runs on OpenStreetMap tiles and needs no key.
    #[must_use]
    pub fn requires_api_key(self) -> bool {
        !matches!(self, ProviderKind::Leaflet)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Kakao => write!(f, "kakao"),
            ProviderKind::Google => write!(f, "google"),
            ProviderKind::Leaflet => write!(f, "leaflet"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kakao" => Ok(ProviderKind::Kakao),
            "google" => Ok(ProviderKind::Google),
            "leaflet" | "osm" => Ok(ProviderKind::Leaflet),
            other => Err(CoreError::InvalidProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_location() -> Location {
        Location {
            id: "yeongildae".to_string(),
            name: "영일대 해수욕장".to_string(),
            description: "포항의 대표 해변".to_string(),
            coordinates: Coordinate::new(36.0563, 129.3781),
            category: Category::Nature,
            qr_code: None,
            stamp_id: Some("stamp-yeongildae".to_string()),
            media: vec![],
            estimated_time: Some(40),
            difficulty: Some(Difficulty::Easy),
        }
    }

    #[test]
    fn location_deserializes_from_camel_case_json() {
        let json = serde_json::json!({
            "id": "jukdo",
            "name": "죽도시장",
            "description": "동해안 최대 전통시장",
            "coordinates": {"lat": 36.0355, "lng": 129.3657},
            "category": "맛집탐방",
            "stampId": "stamp-jukdo",
            "estimatedTime": 60,
            "difficulty": "보통"
        });
        let loc: Location = serde_json::from_value(json).unwrap();
        assert_eq!(loc.category, Category::Food);
        assert_eq!(loc.stamp_id.as_deref(), Some("stamp-jukdo"));
        assert_eq!(loc.estimated_time, Some(60));
        assert_eq!(loc.difficulty, Some(Difficulty::Normal));
        assert!(loc.media.is_empty());
    }

    #[test]
    fn marker_from_location_uses_location_position_and_id() {
        let marker = Marker::from_location(sample_location(), MarkerType::Start);
        assert_eq!(marker.id, "yeongildae");
        assert_eq!(marker.position, Coordinate::new(36.0563, 129.3781));
        assert_eq!(marker.size, MarkerSize::Large);
        assert!(!marker.is_visited);
    }

    #[test]
    fn marker_type_serializes_as_type_tag() {
        let marker = Marker::from_location(sample_location(), MarkerType::Stamp);
        let value = serde_json::to_value(&marker).unwrap();
        assert_eq!(value["type"], "stamp");
        assert_eq!(value["isStampCollected"], false);
    }

    #[test]
    fn route_renderable_needs_two_points() {
        let single = Route::new("r1", "single", vec![Coordinate::new(36.0, 129.0)]);
        assert!(!single.is_renderable());
        let pair = Route::new(
            "r2",
            "pair",
            vec![Coordinate::new(36.0, 129.0), Coordinate::new(36.1, 129.1)],
        );
        assert!(pair.is_renderable());
    }

    #[test]
    fn stamp_collect_keeps_identity() {
        let stamp = Stamp::locked("s1", "loc1");
        let at = Utc::now();
        let collected = stamp.collect(at);
        assert!(collected.is_collected());
        assert_eq!(collected.id, "s1");
        assert_eq!(collected.location_id, "loc1");
        assert_eq!(collected.collected_at, Some(at));
    }

    #[test]
    fn provider_kind_parses_case_insensitively() {
        assert_eq!("Kakao".parse::<ProviderKind>().unwrap(), ProviderKind::Kakao);
        assert_eq!(" google ".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert_eq!("osm".parse::<ProviderKind>().unwrap(), ProviderKind::Leaflet);
        assert!("naver".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn bounds_contains_edges() {
        let b = Bounds {
            north: 36.1,
            south: 36.0,
            east: 129.4,
            west: 129.3,
        };
        assert!(b.contains(&Coordinate::new(36.0, 129.3)));
        assert!(!b.contains(&Coordinate::new(36.2, 129.35)));
    }

    #[test]
    fn try_new_rejects_out_of_range() {
        assert!(Coordinate::try_new(91.0, 0.0).is_err());
        assert!(Coordinate::try_new(36.0, 129.0).is_ok());
    }
}
