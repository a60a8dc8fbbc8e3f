use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo::{calculate_route_distance, calculate_route_time, is_valid_coordinate};
use crate::types::{Category, Coordinate, Location, Marker, MarkerType, Route};
use crate::ConfigError;

pub const MAIN_ROUTE_COLOR: &str = "#EF4444";

/// One authored story course: an ordered walk through locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseConfig {
    pub id: String,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    pub locations: Vec<Location>,
}

impl CourseConfig {
    #[must_use]
    pub fn waypoints(&self) -> Vec<Coordinate> {
        self.locations.iter().map(|l| l.coordinates).collect()
    }

    #[must_use]
    pub fn markers(&self) -> Vec<Marker> {
        course_markers(&self.locations)
    }

    /// The course walk as a main route, or `None` with fewer than two stops.
    #[must_use]
    pub fn main_route(&self) -> Option<Route> {
        let waypoints = self.waypoints();
        if waypoints.len() < 2 {
            return None;
        }
        Some(
            Route::new(format!("{}-main", self.id), self.name.clone(), waypoints)
                .with_style(MAIN_ROUTE_COLOR, 5, 0.9)
                .as_main_route(),
        )
    }

    #[must_use]
    pub fn distance_km(&self) -> f64 {
        calculate_route_distance(&self.waypoints())
    }

    /// Walking time plus the time budgeted at each stop.
    #[must_use]
    pub fn total_minutes(&self, walking_speed_kmh: f64) -> u32 {
        let walking = calculate_route_time(&self.waypoints(), walking_speed_kmh);
        self.locations
            .iter()
            .filter_map(|l| l.estimated_time)
            .fold(walking, u32::saturating_add)
    }
}

/// Markers in walking order: first is `start`, last is `end`, locations
/// carrying a stamp are `stamp`, photo-only stops are `photo`, the rest
/// `waypoint`. A single location is just a `start`.
#[must_use]
pub fn course_markers(locations: &[Location]) -> Vec<Marker> {
    let last = locations.len().saturating_sub(1);
    locations
        .iter()
        .enumerate()
        .map(|(i, location)| {
            let marker_type = if i == 0 {
                MarkerType::Start
            } else if i == last {
                MarkerType::End
            } else if location.stamp_id.is_some() {
                MarkerType::Stamp
            } else if !location.media.is_empty() {
                MarkerType::Photo
            } else {
                MarkerType::Waypoint
            };
            Marker::from_location(location.clone(), marker_type)
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct CoursesFile {
    pub courses: Vec<CourseConfig>,
}

impl CoursesFile {
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&CourseConfig> {
        self.courses.iter().find(|c| c.id == id)
    }
}

/// Load and validate story courses from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_courses(path: &Path) -> Result<CoursesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CourseFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_courses(&content)
}

/// Parse and validate course YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_courses(content: &str) -> Result<CoursesFile, ConfigError> {
    let courses_file: CoursesFile =
        serde_yaml::from_str(content).map_err(ConfigError::CourseFileParse)?;
    validate_courses(&courses_file)?;
    Ok(courses_file)
}

fn validate_courses(courses_file: &CoursesFile) -> Result<(), ConfigError> {
    let mut seen_courses = HashSet::new();

    for course in &courses_file.courses {
        if course.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "course id must be non-empty".to_string(),
            ));
        }
        if !seen_courses.insert(course.id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate course id: '{}'",
                course.id
            )));
        }
        if course.locations.is_empty() {
            return Err(ConfigError::Validation(format!(
                "course '{}' has no locations",
                course.id
            )));
        }

        let mut seen_locations = HashSet::new();
        for location in &course.locations {
            if location.id.trim().is_empty() || location.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "course '{}' has a location without id or name",
                    course.id
                )));
            }
            if !seen_locations.insert(location.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "course '{}' lists location '{}' twice",
                    course.id, location.id
                )));
            }
            if !is_valid_coordinate(&location.coordinates) {
                return Err(ConfigError::Validation(format!(
                    "location '{}' has invalid coordinates ({})",
                    location.id, location.coordinates
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_COURSES: &str = r"
courses:
  - id: seaside
    name: 바다 산책
    category: 자연경관
    locations:
      - id: yeongildae
        name: 영일대 해수욕장
        coordinates: { lat: 36.0563, lng: 129.3781 }
        category: 자연경관
        estimatedTime: 30
      - id: spacewalk
        name: 스페이스워크
        coordinates: { lat: 36.0647, lng: 129.3912 }
        category: 자연경관
        stampId: stamp-spacewalk
      - id: canal
        name: 포항운하
        coordinates: { lat: 36.0324, lng: 129.3716 }
        category: 골목산책
        estimatedTime: 20
  - id: market
    name: 시장 투어
    category: 맛집탐방
    locations:
      - id: jukdo
        name: 죽도시장
        coordinates: { lat: 36.0355, lng: 129.3657 }
        category: 맛집탐방
";

    #[test]
    fn parses_valid_courses() {
        let file = parse_courses(TWO_COURSES).unwrap();
        assert_eq!(file.courses.len(), 2);
        let seaside = file.find("seaside").unwrap();
        assert_eq!(seaside.category, Category::Nature);
        assert_eq!(seaside.locations[1].stamp_id.as_deref(), Some("stamp-spacewalk"));
    }

    #[test]
    fn markers_follow_course_order() {
        let file = parse_courses(TWO_COURSES).unwrap();
        let types: Vec<MarkerType> = file
            .find("seaside")
            .unwrap()
            .markers()
            .iter()
            .map(|m| m.marker_type)
            .collect();
        assert_eq!(
            types,
            vec![MarkerType::Start, MarkerType::Stamp, MarkerType::End]
        );
    }

    #[test]
    fn single_stop_course_has_no_main_route() {
        let file = parse_courses(TWO_COURSES).unwrap();
        let market = file.find("market").unwrap();
        assert!(market.main_route().is_none());
        assert_eq!(market.markers()[0].marker_type, MarkerType::Start);
    }

    #[test]
    fn main_route_is_flagged_and_styled() {
        let file = parse_courses(TWO_COURSES).unwrap();
        let route = file.find("seaside").unwrap().main_route().unwrap();
        assert!(route.is_main_route);
        assert_eq!(route.id, "seaside-main");
        assert_eq!(route.color, MAIN_ROUTE_COLOR);
        assert_eq!(route.waypoints.len(), 3);
    }

    #[test]
    fn total_minutes_adds_stop_time() {
        let file = parse_courses(TWO_COURSES).unwrap();
        let seaside = file.find("seaside").unwrap();
        let walking = calculate_route_time(&seaside.waypoints(), 4.0);
        assert_eq!(seaside.total_minutes(4.0), walking + 50);
    }

    #[test]
    fn total_minutes_saturates_on_huge_stop_times() {
        let yaml = r"
courses:
  - id: marathon
    name: Marathon
    category: 역사여행
    locations:
      - id: a
        name: A
        coordinates: { lat: 36.0, lng: 129.3 }
        category: 역사여행
        estimatedTime: 4294967295
      - id: b
        name: B
        coordinates: { lat: 36.01, lng: 129.31 }
        category: 역사여행
        estimatedTime: 10
";
        let file = parse_courses(yaml).unwrap();
        let course = file.find("marathon").unwrap();
        assert_eq!(course.total_minutes(4.0), u32::MAX);
    }

    #[test]
    fn rejects_duplicate_course_ids() {
        let yaml = r"
courses:
  - id: a
    name: A
    category: 골목산책
    locations:
      - { id: x, name: X, coordinates: { lat: 36.0, lng: 129.0 }, category: 골목산책 }
  - id: a
    name: A2
    category: 골목산책
    locations:
      - { id: y, name: Y, coordinates: { lat: 36.0, lng: 129.0 }, category: 골목산책 }
";
        let err = parse_courses(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("duplicate")));
    }

    #[test]
    fn rejects_invalid_coordinates() {
        let yaml = r"
courses:
  - id: broken
    name: Broken
    category: 역사여행
    locations:
      - { id: x, name: X, coordinates: { lat: 136.0, lng: 129.0 }, category: 역사여행 }
";
        let err = parse_courses(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("invalid coordinates")));
    }

    #[test]
    fn rejects_empty_course() {
        let yaml = r"
courses:
  - id: empty
    name: Empty
    category: 역사여행
    locations: []
";
        assert!(matches!(
            parse_courses(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_unknown_category() {
        let yaml = r"
courses:
  - id: c
    name: C
    category: 쇼핑
    locations: []
";
        assert!(matches!(
            parse_courses(yaml),
            Err(ConfigError::CourseFileParse(_))
        ));
    }

    #[test]
    fn bundled_course_file_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("courses.yaml");
        let file = load_courses(&path).unwrap();
        assert!(!file.courses.is_empty());
    }
}
