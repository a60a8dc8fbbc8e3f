//! Reducer-driven state for one map view.
//!
//! Every change goes through [`reduce`], which never mutates its input. The
//! store keeps the latest state and logs each action it applies.

use storymap_core::geo::{calculate_center, DEFAULT_CENTER, MAX_LEVEL, MIN_LEVEL};
use storymap_core::{AppConfig, Coordinate, ExperienceRecord, MapState, Marker, Route, Stamp};

use crate::markers::MarkerPatch;
use crate::routes::RoutePatch;

#[derive(Debug, Clone, PartialEq)]
pub enum MapAction {
    SetCenter(Coordinate),
    /// Clamped to the supported level range.
    SetLevel(u8),
    SetLoaded(bool),
    SetInitialized(bool),
    /// Replaces a marker with the same id.
    AddMarker(Marker),
    UpdateMarker { id: String, patch: MarkerPatch },
    RemoveMarker(String),
    /// Ignored when the id is not a visible marker.
    SelectMarker(Option<String>),
    AddRoute(Route),
    UpdateRoute { id: String, patch: RoutePatch },
    RemoveRoute(String),
    SelectRoute(Option<String>),
    /// Records the stamp once and flags the markers at its location.
    CollectStamp(Stamp),
    AddExperienceRecord(ExperienceRecord),
    SetError(String),
    ClearError,
    SetUserLocation(Option<Coordinate>),
    Reset,
}

impl MapAction {
    fn name(&self) -> &'static str {
        match self {
            MapAction::SetCenter(_) => "set_center",
            MapAction::SetLevel(_) => "set_level",
            MapAction::SetLoaded(_) => "set_loaded",
            MapAction::SetInitialized(_) => "set_initialized",
            MapAction::AddMarker(_) => "add_marker",
            MapAction::UpdateMarker { .. } => "update_marker",
            MapAction::RemoveMarker(_) => "remove_marker",
            MapAction::SelectMarker(_) => "select_marker",
            MapAction::AddRoute(_) => "add_route",
            MapAction::UpdateRoute { .. } => "update_route",
            MapAction::RemoveRoute(_) => "remove_route",
            MapAction::SelectRoute(_) => "select_route",
            MapAction::CollectStamp(_) => "collect_stamp",
            MapAction::AddExperienceRecord(_) => "add_experience_record",
            MapAction::SetError(_) => "set_error",
            MapAction::ClearError => "clear_error",
            MapAction::SetUserLocation(_) => "set_user_location",
            MapAction::Reset => "reset",
        }
    }
}

/// Apply one action to a state, returning the next state.
#[must_use]
pub fn reduce(state: &MapState, action: MapAction) -> MapState {
    let mut next = state.clone();
    match action {
        MapAction::SetCenter(center) => next.current_center = center,
        MapAction::SetLevel(level) => next.current_level = level.clamp(MIN_LEVEL, MAX_LEVEL),
        MapAction::SetLoaded(loaded) => next.is_loaded = loaded,
        MapAction::SetInitialized(initialized) => next.is_initialized = initialized,
        MapAction::AddMarker(marker) => {
            match next.visible_markers.iter_mut().find(|m| m.id == marker.id) {
                Some(existing) => *existing = marker,
                None => next.visible_markers.push(marker),
            }
        }
        MapAction::UpdateMarker { id, patch } => {
            if let Some(marker) = next.visible_markers.iter_mut().find(|m| m.id == id) {
                patch.apply_to(marker);
            }
        }
        MapAction::RemoveMarker(id) => {
            next.visible_markers.retain(|m| m.id != id);
            if next.selected_marker.as_deref() == Some(id.as_str()) {
                next.selected_marker = None;
            }
        }
        MapAction::SelectMarker(id) => match id {
            Some(id) if next.visible_markers.iter().any(|m| m.id == id) => {
                next.selected_marker = Some(id);
            }
            Some(_) => {}
            None => next.selected_marker = None,
        },
        MapAction::AddRoute(route) => match next.routes.iter_mut().find(|r| r.id == route.id) {
            Some(existing) => *existing = route,
            None => next.routes.push(route),
        },
        MapAction::UpdateRoute { id, patch } => {
            if let Some(route) = next.routes.iter_mut().find(|r| r.id == id) {
                patch.apply_to(route);
            }
        }
        MapAction::RemoveRoute(id) => {
            next.routes.retain(|r| r.id != id);
            if next.selected_route.as_deref() == Some(id.as_str()) {
                next.selected_route = None;
            }
        }
        MapAction::SelectRoute(id) => match id {
            Some(id) if next.routes.iter().any(|r| r.id == id) => next.selected_route = Some(id),
            Some(_) => {}
            None => next.selected_route = None,
        },
        MapAction::CollectStamp(stamp) => {
            for marker in next
                .visible_markers
                .iter_mut()
                .filter(|m| m.location.stamp_id.as_deref() == Some(stamp.id.as_str()))
            {
                marker.is_visited = true;
                marker.is_stamp_collected = true;
            }
            if !next.collected_stamps.iter().any(|s| s.id == stamp.id) {
                next.collected_stamps.push(stamp);
            }
        }
        MapAction::AddExperienceRecord(record) => next.experience_records.push(record),
        MapAction::SetError(message) => next.error = Some(message),
        MapAction::ClearError => next.error = None,
        MapAction::SetUserLocation(location) => next.user_location = location,
        MapAction::Reset => next = MapState::default(),
    }
    next
}

#[derive(Debug)]
pub struct MapStore {
    state: MapState,
    /// Center restored by `MapAction::Reset`.
    home: Coordinate,
}

impl Default for MapStore {
    fn default() -> Self {
        Self::centered_at(DEFAULT_CENTER)
    }
}

impl MapStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose initial and reset center is `home`.
    #[must_use]
    pub fn centered_at(home: Coordinate) -> Self {
        Self {
            state: MapState::centered_at(home),
            home,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::centered_at(config.default_center)
    }

    /// Resume from `state`; its center becomes the reset center.
    #[must_use]
    pub fn with_state(state: MapState) -> Self {
        let home = state.current_center;
        Self { state, home }
    }

    #[must_use]
    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn dispatch(&mut self, action: MapAction) -> &MapState {
        tracing::trace!(action = action.name(), "map action");
        let reset = matches!(action, MapAction::Reset);
        self.state = reduce(&self.state, action);
        if reset {
            self.state.current_center = self.home;
        }
        &self.state
    }

    /// Center on the mean of the marker positions. Zoom is left alone, and
    /// an empty list changes nothing.
    pub fn fit_bounds(&mut self, markers: &[Marker]) {
        if markers.is_empty() {
            return;
        }
        let positions: Vec<Coordinate> = markers.iter().map(|m| m.position).collect();
        self.dispatch(MapAction::SetCenter(calculate_center(&positions)));
    }

    #[must_use]
    pub fn selected_marker(&self) -> Option<&Marker> {
        let id = self.state.selected_marker.as_deref()?;
        self.state.visible_markers.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn selected_route(&self) -> Option<&Route> {
        let id = self.state.selected_route.as_deref()?;
        self.state.routes.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn is_stamp_collected(&self, stamp_id: &str) -> bool {
        self.state.collected_stamps.iter().any(|s| s.id == stamp_id)
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
