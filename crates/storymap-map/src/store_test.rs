use chrono::Utc;
use storymap_core::geo::DEFAULT_CENTER;
use storymap_core::{Category, ExperienceKind, Location, MarkerType};

use super::*;

fn location(id: &str, stamp_id: Option<&str>, lat: f64, lng: f64) -> Location {
    Location {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        coordinates: Coordinate::new(lat, lng),
        category: Category::History,
        qr_code: None,
        stamp_id: stamp_id.map(str::to_string),
        media: vec![],
        estimated_time: None,
        difficulty: None,
    }
}

fn marker(id: &str, stamp_id: Option<&str>, lat: f64, lng: f64) -> Marker {
    Marker::from_location(location(id, stamp_id, lat, lng), MarkerType::Waypoint)
}

fn route(id: &str) -> Route {
    Route::new(
        id,
        id,
        vec![Coordinate::new(36.0, 129.0), Coordinate::new(36.1, 129.1)],
    )
}

fn store_with_markers() -> MapStore {
    let mut store = MapStore::new();
    store.dispatch(MapAction::AddMarker(marker("a", Some("stamp-a"), 36.0, 129.0)));
    store.dispatch(MapAction::AddMarker(marker("b", None, 36.2, 129.4)));
    store
}

#[test]
fn reduce_leaves_input_untouched() {
    let before = MapState::default();
    let after = reduce(&before, MapAction::SetCenter(Coordinate::new(35.99, 129.56)));
    assert_eq!(before.current_center, DEFAULT_CENTER);
    assert_eq!(after.current_center, Coordinate::new(35.99, 129.56));
}

#[test]
fn set_level_is_clamped() {
    let state = reduce(&MapState::default(), MapAction::SetLevel(0));
    assert_eq!(state.current_level, 1);
    let state = reduce(&state, MapAction::SetLevel(99));
    assert_eq!(state.current_level, 14);
}

#[test]
fn add_marker_replaces_same_id() {
    let mut store = store_with_markers();
    let mut moved = marker("a", Some("stamp-a"), 36.5, 129.5);
    moved.marker_type = MarkerType::Start;
    store.dispatch(MapAction::AddMarker(moved));
    let state = store.state();
    assert_eq!(state.visible_markers.len(), 2);
    assert_eq!(state.visible_markers[0].marker_type, MarkerType::Start);
}

#[test]
fn update_marker_applies_patch() {
    let mut store = store_with_markers();
    store.dispatch(MapAction::UpdateMarker {
        id: "b".to_string(),
        patch: MarkerPatch {
            is_visited: Some(true),
            ..MarkerPatch::default()
        },
    });
    assert!(store.state().visible_markers[1].is_visited);
    assert!(!store.state().visible_markers[0].is_visited);
}

#[test]
fn selection_only_targets_existing_markers() {
    let mut store = store_with_markers();
    store.dispatch(MapAction::SelectMarker(Some("ghost".to_string())));
    assert!(store.selected_marker().is_none());

    store.dispatch(MapAction::SelectMarker(Some("b".to_string())));
    assert_eq!(store.selected_marker().unwrap().id, "b");

    store.dispatch(MapAction::SelectMarker(None));
    assert!(store.state().selected_marker.is_none());
}

#[test]
fn removing_selected_marker_clears_selection() {
    let mut store = store_with_markers();
    store.dispatch(MapAction::SelectMarker(Some("a".to_string())));
    store.dispatch(MapAction::RemoveMarker("a".to_string()));
    assert!(store.state().selected_marker.is_none());
    assert_eq!(store.state().visible_markers.len(), 1);
}

#[test]
fn route_actions() {
    let mut store = MapStore::new();
    store.dispatch(MapAction::AddRoute(route("r1")));
    store.dispatch(MapAction::AddRoute(route("r2")));
    store.dispatch(MapAction::UpdateRoute {
        id: "r2".to_string(),
        patch: RoutePatch {
            is_main_route: Some(true),
            ..RoutePatch::default()
        },
    });
    store.dispatch(MapAction::SelectRoute(Some("r2".to_string())));
    assert!(store.selected_route().unwrap().is_main_route);

    store.dispatch(MapAction::RemoveRoute("r2".to_string()));
    assert!(store.state().selected_route.is_none());
    assert_eq!(store.state().routes.len(), 1);
}

#[test]
fn collect_stamp_is_deduplicated_and_flags_markers() {
    let mut store = store_with_markers();
    let stamp = Stamp::locked("stamp-a", "a").collect(Utc::now());
    store.dispatch(MapAction::CollectStamp(stamp.clone()));
    store.dispatch(MapAction::CollectStamp(stamp));

    let state = store.state();
    assert_eq!(state.collected_stamps.len(), 1);
    assert!(store.is_stamp_collected("stamp-a"));
    assert!(state.visible_markers[0].is_stamp_collected);
    assert!(state.visible_markers[0].is_visited);
    assert!(!state.visible_markers[1].is_stamp_collected);
}

#[test]
fn error_and_user_location() {
    let mut store = MapStore::new();
    store.dispatch(MapAction::SetError("지도를 불러오지 못했습니다".to_string()));
    assert!(store.state().error.is_some());
    store.dispatch(MapAction::ClearError);
    assert!(store.state().error.is_none());

    let here = Coordinate::new(36.0563, 129.3781);
    store.dispatch(MapAction::SetUserLocation(Some(here)));
    assert_eq!(store.state().user_location, Some(here));
}

#[test]
fn experience_records_append() {
    let mut store = MapStore::new();
    store.dispatch(MapAction::AddExperienceRecord(ExperienceRecord::new(
        "a",
        ExperienceKind::Visit,
        None,
    )));
    store.dispatch(MapAction::AddExperienceRecord(ExperienceRecord::new(
        "a",
        ExperienceKind::Photo,
        Some("일출".to_string()),
    )));
    assert_eq!(store.state().experience_records.len(), 2);
}

#[test]
fn fit_bounds_centers_on_mean() {
    let mut store = store_with_markers();
    let markers = store.state().visible_markers.clone();
    store.fit_bounds(&markers);
    let center = store.state().current_center;
    assert!((center.lat - 36.1).abs() < 1e-9);
    assert!((center.lng - 129.2).abs() < 1e-9);
    assert_eq!(store.state().current_level, 3);
}

#[test]
fn fit_bounds_without_markers_is_noop() {
    let mut store = MapStore::new();
    store.dispatch(MapAction::SetCenter(Coordinate::new(35.9, 129.5)));
    store.fit_bounds(&[]);
    assert_eq!(store.state().current_center, Coordinate::new(35.9, 129.5));
}

#[test]
fn reset_restores_defaults() {
    let mut store = store_with_markers();
    store.dispatch(MapAction::SetLoaded(true));
    store.dispatch(MapAction::SetInitialized(true));
    store.dispatch(MapAction::Reset);
    assert_eq!(store.state(), &MapState::default());
}

#[test]
fn store_starts_and_resets_at_its_home_center() {
    let home = Coordinate::new(35.9876, 129.5586);
    let mut store = MapStore::centered_at(home);
    assert_eq!(store.state().current_center, home);

    store.dispatch(MapAction::AddMarker(marker("a", None, 36.0, 129.0)));
    store.dispatch(MapAction::SetCenter(Coordinate::new(36.2, 129.4)));
    store.dispatch(MapAction::Reset);

    assert_eq!(store.state(), &MapState::centered_at(home));
}

#[test]
fn resumed_store_resets_to_resumed_center() {
    let resumed = MapState::centered_at(Coordinate::new(36.0766, 129.5695));
    let mut store = MapStore::with_state(resumed.clone());
    store.dispatch(MapAction::SetLevel(7));
    store.dispatch(MapAction::Reset);
    assert_eq!(store.state(), &resumed);
}
