//! Story-course file commands.

use std::path::PathBuf;

use clap::Subcommand;
use storymap_core::geo::{format_distance, format_duration};
use storymap_core::{load_courses, AppConfig};
use storymap_map::MarkerManager;

#[derive(Debug, Subcommand)]
pub enum CourseCommands {
    /// List every course with its length and duration
    List {
        /// Course file (defaults to STORYMAP_COURSES_PATH)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Validate the course file and report what was loaded
    Validate {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print one course's stops, markers and main route
    Show {
        id: String,
        #[arg(long)]
        path: Option<PathBuf>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

pub(crate) fn run(config: &AppConfig, command: CourseCommands) -> anyhow::Result<()> {
    match command {
        CourseCommands::List { path } => {
            let path = path.unwrap_or_else(|| config.courses_path.clone());
            let courses = load_courses(&path)?;
            println!("{:<20}{:<10}{:<8}{:<10}NAME", "ID", "CATEGORY", "STOPS", "DISTANCE");
            for course in &courses.courses {
                println!(
                    "{:<20}{:<10}{:<8}{:<10}{}",
                    course.id,
                    course.category.to_string(),
                    course.locations.len(),
                    format_distance(course.distance_km()),
                    course.name
                );
            }
        }
        CourseCommands::Validate { path } => {
            let path = path.unwrap_or_else(|| config.courses_path.clone());
            let courses = load_courses(&path)?;
            let locations: usize = courses.courses.iter().map(|c| c.locations.len()).sum();
            tracing::info!(path = %path.display(), courses = courses.courses.len(), "course file valid");
            println!(
                "ok: {} courses, {locations} locations in {}",
                courses.courses.len(),
                path.display()
            );
        }
        CourseCommands::Show { id, path, json } => {
            let path = path.unwrap_or_else(|| config.courses_path.clone());
            let courses = load_courses(&path)?;
            let course = courses
                .find(&id)
                .ok_or_else(|| anyhow::anyhow!("course '{id}' not found in {}", path.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(course)?);
                return Ok(());
            }

            println!("{} ({})", course.name, course.category);
            if !course.description.is_empty() {
                println!("{}", course.description);
            }
            println!(
                "{} · about {}",
                format_distance(course.distance_km()),
                format_duration(course.total_minutes(config.walking_speed_kmh))
            );
            println!();

            let markers = MarkerManager::from_locations(&course.locations);
            println!("{:<4}{:<10}{:<22}STAMP", "#", "MARKER", "LOCATION");
            for (i, marker) in markers.all().iter().enumerate() {
                println!(
                    "{:<4}{:<10}{:<22}{}",
                    i + 1,
                    marker.marker_type.to_string(),
                    marker.location.name,
                    marker.location.stamp_id.as_deref().unwrap_or("-")
                );
            }
            if let Some(route) = course.main_route() {
                println!();
                println!(
                    "main route '{}' with {} waypoints, color {}",
                    route.id,
                    route.waypoints.len(),
                    route.color
                );
            }
        }
    }
    Ok(())
}
