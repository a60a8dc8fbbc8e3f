//! Provider-agnostic route collection, projected onto an adapter on request.

use storymap_core::geo::{calculate_route_distance, calculate_route_time, optimize_route};
use storymap_core::{Coordinate, Route};

use crate::adapter::MapAdapter;

/// Partial update for [`RouteManager::update`]. Style and main-route flag
/// only change through here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutePatch {
    pub name: Option<String>,
    pub waypoints: Option<Vec<Coordinate>>,
    pub color: Option<String>,
    pub stroke_weight: Option<u32>,
    pub stroke_opacity: Option<f64>,
    pub is_main_route: Option<bool>,
}

impl RoutePatch {
    pub fn apply_to(&self, route: &mut Route) {
        if let Some(name) = &self.name {
            route.name.clone_from(name);
        }
        if let Some(waypoints) = &self.waypoints {
            route.waypoints.clone_from(waypoints);
        }
        if let Some(color) = &self.color {
            route.color.clone_from(color);
        }
        if let Some(weight) = self.stroke_weight {
            route.stroke_weight = weight;
        }
        if let Some(opacity) = self.stroke_opacity {
            route.stroke_opacity = opacity;
        }
        if let Some(main) = self.is_main_route {
            route.is_main_route = main;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteStats {
    pub total: usize,
    pub main_routes: usize,
    pub total_distance_km: f64,
    pub total_minutes: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RouteManager {
    routes: Vec<Route>,
}

impl RouteManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn all(&self) -> &[Route] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.id == id)
    }

    /// Insert, replacing any route with the same id in place.
    pub fn add(&mut self, route: Route) {
        match self.routes.iter_mut().find(|r| r.id == route.id) {
            Some(existing) => *existing = route,
            None => self.routes.push(route),
        }
    }

    pub fn add_many(&mut self, routes: impl IntoIterator<Item = Route>) {
        for route in routes {
            self.add(route);
        }
    }

    /// Add a route whose waypoints are reordered nearest-neighbour first,
    /// starting from the first given point.
    pub fn add_optimized(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        waypoints: &[Coordinate],
    ) -> &Route {
        let route = Route::new(id, name, optimize_route(waypoints));
        let index = match self.routes.iter().position(|r| r.id == route.id) {
            Some(index) => {
                self.routes[index] = route;
                index
            }
            None => {
                self.routes.push(route);
                self.routes.len() - 1
            }
        };
        &self.routes[index]
    }

    pub fn update(&mut self, id: &str, patch: &RoutePatch) -> bool {
        match self.routes.iter_mut().find(|r| r.id == id) {
            Some(route) => {
                patch.apply_to(route);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Route> {
        let index = self.routes.iter().position(|r| r.id == id)?;
        Some(self.routes.remove(index))
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&Route) -> bool) -> Vec<Route> {
        self.routes.iter().filter(|r| predicate(r)).cloned().collect()
    }

    /// Case-insensitive substring match on the route name.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Route> {
        let needle = query.trim().to_lowercase();
        self.filter(|r| r.name.to_lowercase().contains(&needle))
    }

    #[must_use]
    pub fn main_route(&self) -> Option<&Route> {
        self.routes.iter().find(|r| r.is_main_route)
    }

    #[must_use]
    pub fn stats(&self, walking_speed_kmh: f64) -> RouteStats {
        RouteStats {
            total: self.routes.len(),
            main_routes: self.routes.iter().filter(|r| r.is_main_route).count(),
            total_distance_km: self
                .routes
                .iter()
                .map(|r| calculate_route_distance(&r.waypoints))
                .sum(),
            total_minutes: self
                .routes
                .iter()
                .map(|r| calculate_route_time(&r.waypoints, walking_speed_kmh))
                .sum(),
        }
    }

    pub fn show_on_map(&self, adapter: &mut MapAdapter) {
        adapter.set_routes(&self.routes);
    }
}
