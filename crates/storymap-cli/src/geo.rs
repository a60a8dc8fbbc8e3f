//! Geometry helpers exposed on the command line.

use clap::Subcommand;
use storymap_core::geo::{
    calculate_bounds, calculate_center, calculate_distance, calculate_route_distance,
    calculate_route_time, cluster_markers, format_distance, format_duration, lat_lng_to_tile,
    optimize_route, tile_to_lat_lng,
};
use storymap_core::{load_courses, AppConfig, Coordinate};

use crate::parse_coordinate;

#[derive(Debug, Subcommand)]
pub enum GeoCommands {
    /// Great-circle distance between two points
    Distance {
        /// Start as "lat,lng"
        #[arg(value_parser = parse_coordinate)]
        from: Coordinate,
        /// End as "lat,lng"
        #[arg(value_parser = parse_coordinate)]
        to: Coordinate,
    },
    /// Length and walking time of a route through the given points
    Route {
        /// Waypoints as "lat,lng", in walking order
        #[arg(required = true, num_args = 2.., value_parser = parse_coordinate)]
        points: Vec<Coordinate>,
        /// Reorder waypoints nearest-first before measuring
        #[arg(long)]
        optimize: bool,
        /// Walking speed in km/h (defaults to the configured speed)
        #[arg(long)]
        speed: Option<f64>,
    },
    /// Center and bounding box of a set of points
    Center {
        #[arg(required = true, value_parser = parse_coordinate)]
        points: Vec<Coordinate>,
    },
    /// Group a course's markers the way the map clusters them
    Cluster {
        /// Course id from the course file
        #[arg(long)]
        course: String,
        /// Cluster radius in degrees (defaults to the configured distance)
        #[arg(long)]
        distance: Option<f64>,
    },
    /// Slippy-map tile containing a point
    Tile {
        #[arg(value_parser = parse_coordinate)]
        point: Coordinate,
        #[arg(long, default_value = "15")]
        zoom: u8,
    },
}

pub(crate) fn run(config: &AppConfig, command: GeoCommands) -> anyhow::Result<()> {
    match command {
        GeoCommands::Distance { from, to } => {
            let km = calculate_distance(&from, &to);
            println!("{} ({km:.3} km)", format_distance(km));
        }
        GeoCommands::Route {
            points,
            optimize,
            speed,
        } => {
            let speed = speed.unwrap_or(config.walking_speed_kmh);
            anyhow::ensure!(speed > 0.0, "walking speed must be positive, got {speed}");
            let points = if optimize {
                optimize_route(&points)
            } else {
                points
            };
            let km = calculate_route_distance(&points);
            let minutes = calculate_route_time(&points, speed);
            for (i, point) in points.iter().enumerate() {
                println!("{:>3}. {point}", i + 1);
            }
            println!(
                "distance: {}  walking: {} at {speed} km/h",
                format_distance(km),
                format_duration(minutes)
            );
        }
        GeoCommands::Center { points } => {
            let center = calculate_center(&points);
            let bounds = calculate_bounds(&points);
            println!("center: {center}");
            println!(
                "bounds: N {:.6} S {:.6} E {:.6} W {:.6}",
                bounds.north, bounds.south, bounds.east, bounds.west
            );
        }
        GeoCommands::Cluster { course, distance } => {
            let courses = load_courses(&config.courses_path)?;
            let course = courses.find(&course).ok_or_else(|| {
                anyhow::anyhow!(
                    "course '{course}' not found in {}",
                    config.courses_path.display()
                )
            })?;
            let distance = distance.unwrap_or(config.cluster_distance);
            let clusters = cluster_markers(&course.markers(), distance);
            println!(
                "{} markers in {} clusters (radius {distance}°)",
                course.locations.len(),
                clusters.len()
            );
            for cluster in &clusters {
                let ids: Vec<&str> = cluster.markers.iter().map(|m| m.id.as_str()).collect();
                println!("{}  [{}]", cluster.center, ids.join(", "));
            }
        }
        GeoCommands::Tile { point, zoom } => {
            anyhow::ensure!(zoom <= 22, "zoom must be at most 22, got {zoom}");
            let tile = lat_lng_to_tile(&point, zoom);
            let corner = tile_to_lat_lng(tile.x, tile.y, tile.z);
            println!("z{}/{}/{}  (north-west corner {corner})", tile.z, tile.x, tile.y);
        }
    }
    Ok(())
}
