//! Provider-agnostic marker collection.
//!
//! Edits only touch the in-memory list; nothing reaches the native map until
//! [`MarkerManager::show_on_map`] hands the whole list to an adapter.

use std::collections::BTreeMap;

use storymap_core::{course_markers, Coordinate, Location, Marker, MarkerSize, MarkerType};

use crate::adapter::MapAdapter;

/// Partial update for [`MarkerManager::update`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerPatch {
    pub marker_type: Option<MarkerType>,
    pub position: Option<Coordinate>,
    pub size: Option<MarkerSize>,
    pub is_visited: Option<bool>,
    pub is_stamp_collected: Option<bool>,
}

impl MarkerPatch {
    pub fn apply_to(&self, marker: &mut Marker) {
        if let Some(marker_type) = self.marker_type {
            marker.marker_type = marker_type;
        }
        if let Some(position) = self.position {
            marker.position = position;
        }
        if let Some(size) = self.size {
            marker.size = size;
        }
        if let Some(visited) = self.is_visited {
            marker.is_visited = visited;
        }
        if let Some(collected) = self.is_stamp_collected {
            marker.is_stamp_collected = collected;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStats {
    pub total: usize,
    pub by_type: BTreeMap<MarkerType, usize>,
    pub visited: usize,
    pub stamps_collected: usize,
    /// `visited / total`, 0 when empty.
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MarkerManager {
    markers: Vec<Marker>,
}

impl MarkerManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers for a course walk, typed by position in the list.
    #[must_use]
    pub fn from_locations(locations: &[Location]) -> Self {
        Self {
            markers: course_markers(locations),
        }
    }

    #[must_use]
    pub fn all(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// Insert, replacing any marker with the same id in place.
    pub fn add(&mut self, marker: Marker) {
        match self.markers.iter_mut().find(|m| m.id == marker.id) {
            Some(existing) => *existing = marker,
            None => self.markers.push(marker),
        }
    }

    pub fn add_many(&mut self, markers: impl IntoIterator<Item = Marker>) {
        for marker in markers {
            self.add(marker);
        }
    }

    /// Returns `false` when no marker has this id.
    pub fn update(&mut self, id: &str, patch: &MarkerPatch) -> bool {
        match self.markers.iter_mut().find(|m| m.id == id) {
            Some(marker) => {
                patch.apply_to(marker);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Marker> {
        let index = self.markers.iter().position(|m| m.id == id)?;
        Some(self.markers.remove(index))
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn mark_visited(&mut self, id: &str) -> bool {
        self.update(
            id,
            &MarkerPatch {
                is_visited: Some(true),
                ..MarkerPatch::default()
            },
        )
    }

    /// Collecting a stamp also counts as a visit.
    pub fn collect_stamp(&mut self, id: &str) -> bool {
        self.update(
            id,
            &MarkerPatch {
                is_visited: Some(true),
                is_stamp_collected: Some(true),
                ..MarkerPatch::default()
            },
        )
    }

    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&Marker) -> bool) -> Vec<Marker> {
        self.markers.iter().filter(|m| predicate(m)).cloned().collect()
    }

    #[must_use]
    pub fn by_type(&self, marker_type: MarkerType) -> Vec<Marker> {
        self.filter(|m| m.marker_type == marker_type)
    }

    /// Case-insensitive substring match on location name and description.
    /// A blank query matches everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Marker> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.markers.clone();
        }
        self.filter(|m| {
            m.location.name.to_lowercase().contains(&needle)
                || m.location.description.to_lowercase().contains(&needle)
        })
    }

    #[must_use]
    pub fn positions(&self) -> Vec<Coordinate> {
        self.markers.iter().map(|m| m.position).collect()
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> MarkerStats {
        let mut by_type = BTreeMap::new();
        for marker in &self.markers {
            *by_type.entry(marker.marker_type).or_insert(0) += 1;
        }
        let total = self.markers.len();
        let visited = self.markers.iter().filter(|m| m.is_visited).count();
        let stamps_collected = self
            .markers
            .iter()
            .filter(|m| m.is_stamp_collected)
            .count();
        let completion_rate = if total == 0 {
            0.0
        } else {
            visited as f64 / total as f64
        };
        MarkerStats {
            total,
            by_type,
            visited,
            stamps_collected,
            completion_rate,
        }
    }

    /// Project the current list onto the adapter, replacing whatever it drew.
    pub fn show_on_map(&self, adapter: &mut MapAdapter) {
        adapter.set_markers(&self.markers);
    }
}
