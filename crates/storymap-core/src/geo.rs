//! Geometry utilities for the map layer.
//!
//! Pure functions over [`Coordinate`]s: great-circle distance, centers and
//! bounds, route length/time, nearest-neighbour ordering, greedy clustering
//! and Web Mercator tile math.

use std::f64::consts::PI;

use crate::types::{Bounds, Coordinate, Marker};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Downtown Pohang. Used whenever a center or bounds is asked of no points.
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(36.019, 129.3435);

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 14;
pub const DEFAULT_LEVEL: u8 = 3;

pub const DEFAULT_WALKING_SPEED_KMH: f64 = 4.0;

/// Planar degrees, roughly 1 km at Pohang's latitude.
pub const DEFAULT_CLUSTER_DISTANCE: f64 = 0.01;

/// Haversine distance in kilometres.
#[must_use]
pub fn calculate_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Euclidean distance on raw lat/lng degrees. Only meaningful for short
/// regional hops.
#[must_use]
pub fn planar_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let d_lat = a.lat - b.lat;
    let d_lng = a.lng - b.lng;
    (d_lat * d_lat + d_lng * d_lng).sqrt()
}

/// Arithmetic mean of latitudes and longitudes; [`DEFAULT_CENTER`] when empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_center(coords: &[Coordinate]) -> Coordinate {
    if coords.is_empty() {
        return DEFAULT_CENTER;
    }
    let n = coords.len() as f64;
    let (lat_sum, lng_sum) = coords
        .iter()
        .fold((0.0, 0.0), |(lat, lng), c| (lat + c.lat, lng + c.lng));
    Coordinate::new(lat_sum / n, lng_sum / n)
}

/// Min/max box around the points; a zero-area box at [`DEFAULT_CENTER`] when
/// empty.
#[must_use]
pub fn calculate_bounds(coords: &[Coordinate]) -> Bounds {
    let Some(first) = coords.first() else {
        return Bounds {
            north: DEFAULT_CENTER.lat,
            south: DEFAULT_CENTER.lat,
            east: DEFAULT_CENTER.lng,
            west: DEFAULT_CENTER.lng,
        };
    };

    coords.iter().skip(1).fold(
        Bounds {
            north: first.lat,
            south: first.lat,
            east: first.lng,
            west: first.lng,
        },
        |b, c| Bounds {
            north: b.north.max(c.lat),
            south: b.south.min(c.lat),
            east: b.east.max(c.lng),
            west: b.west.min(c.lng),
        },
    )
}

/// Total haversine length of the polyline in kilometres.
#[must_use]
pub fn calculate_route_distance(waypoints: &[Coordinate]) -> f64 {
    waypoints
        .windows(2)
        .map(|pair| calculate_distance(&pair[0], &pair[1]))
        .sum()
}

/// Walking minutes along the polyline, rounded to the nearest minute.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn calculate_route_time(waypoints: &[Coordinate], walking_speed_kmh: f64) -> u32 {
    if !(walking_speed_kmh > 0.0) {
        return 0;
    }
    let distance = calculate_route_distance(waypoints);
    (distance / walking_speed_kmh * 60.0).round() as u32
}

/// Nearest-neighbour ordering starting from `waypoints[0]`.
///
/// Candidate selection uses [`planar_distance`], not haversine. Ties go to the
/// earliest remaining point. No 2-opt pass.
#[must_use]
pub fn optimize_route(waypoints: &[Coordinate]) -> Vec<Coordinate> {
    let Some((&first, rest)) = waypoints.split_first() else {
        return Vec::new();
    };

    let mut remaining = rest.to_vec();
    let mut ordered = Vec::with_capacity(waypoints.len());
    ordered.push(first);
    let mut current = first;

    while !remaining.is_empty() {
        let mut best_index = 0;
        let mut best_distance = f64::INFINITY;
        for (i, candidate) in remaining.iter().enumerate() {
            let d = planar_distance(&current, candidate);
            if d < best_distance {
                best_index = i;
                best_distance = d;
            }
        }
        current = remaining.remove(best_index);
        ordered.push(current);
    }

    ordered
}

/// A group of markers drawn as one pin.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerCluster {
    /// Position of the first marker that opened the cluster. Never recomputed.
    pub center: Coordinate,
    pub markers: Vec<Marker>,
}

impl MarkerCluster {
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Greedy single-pass clustering in input order.
///
/// Each marker joins the first cluster whose center lies within
/// `cluster_distance` planar degrees, otherwise it opens a new cluster.
#[must_use]
pub fn cluster_markers(markers: &[Marker], cluster_distance: f64) -> Vec<MarkerCluster> {
    let mut clusters: Vec<MarkerCluster> = Vec::new();

    for marker in markers {
        let existing = clusters
            .iter_mut()
            .find(|c| planar_distance(&c.center, &marker.position) < cluster_distance);
        match existing {
            Some(cluster) => cluster.markers.push(marker.clone()),
            None => clusters.push(MarkerCluster {
                center: marker.position,
                markers: vec![marker.clone()],
            }),
        }
    }

    clusters
}

/// Slippy-map tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

/// Tile containing `coord` at `zoom` (Web Mercator).
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn lat_lng_to_tile(coord: &Coordinate, zoom: u8) -> TileCoord {
    let n = 2f64.powi(i32::from(zoom));
    let lat_rad = coord.lat.to_radians();
    let x = ((coord.lng + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();
    TileCoord {
        x: x.clamp(0.0, n - 1.0) as u32,
        y: y.clamp(0.0, n - 1.0) as u32,
        z: zoom,
    }
}

/// North-west corner of the tile.
#[must_use]
pub fn tile_to_lat_lng(x: u32, y: u32, zoom: u8) -> Coordinate {
    let n = 2f64.powi(i32::from(zoom));
    let lng = f64::from(x) / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * f64::from(y) / n)).sinh().atan().to_degrees();
    Coordinate::new(lat, lng)
}

#[must_use]
pub fn is_valid_coordinate(coord: &Coordinate) -> bool {
    coord.lat.is_finite()
        && coord.lng.is_finite()
        && (-90.0..=90.0).contains(&coord.lat)
        && (-180.0..=180.0).contains(&coord.lng)
}

/// `true` when every element is valid. An empty slice is valid.
#[must_use]
pub fn is_valid_coordinate_array(coords: &[Coordinate]) -> bool {
    coords.iter().all(is_valid_coordinate)
}

#[must_use]
pub fn filter_valid_coordinates(coords: &[Coordinate]) -> Vec<Coordinate> {
    coords
        .iter()
        .copied()
        .filter(is_valid_coordinate)
        .collect()
}

#[must_use]
pub fn is_within_radius(a: &Coordinate, b: &Coordinate, radius_m: f64) -> bool {
    calculate_distance(a, b) * 1000.0 <= radius_m
}

/// Kakao level to standard web zoom (level 3 ≈ zoom 17).
#[must_use]
pub fn level_to_zoom(level: u8) -> u8 {
    20 - level.clamp(MIN_LEVEL, MAX_LEVEL)
}

#[must_use]
pub fn zoom_to_level(zoom: u8) -> u8 {
    20u8.saturating_sub(zoom).clamp(MIN_LEVEL, MAX_LEVEL)
}

/// "350m" below one kilometre, "1.2km" above.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_distance(km: f64) -> String {
    let metres = (km.max(0.0) * 1000.0).round();
    if metres < 1000.0 {
        format!("{}m", metres as u64)
    } else {
        format!("{km:.1}km")
    }
}

#[must_use]
pub fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{minutes}분");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        format!("{hours}시간")
    } else {
        format!("{hours}시간 {rest}분")
    }
}

#[cfg(test)]
#[path = "geo_test.rs"]
mod tests;
