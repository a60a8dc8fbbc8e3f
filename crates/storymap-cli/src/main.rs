mod course;
mod geo;
mod geocode;
mod qr;

use clap::{Parser, Subcommand};
use storymap_core::Coordinate;
use tracing_subscriber::EnvFilter;

use crate::course::CourseCommands;
use crate::geo::GeoCommands;
use crate::geocode::GeocodeCommands;
use crate::qr::QrCommands;

#[derive(Debug, Parser)]
#[command(name = "storymap")]
#[command(about = "Pohang Storyteller map tooling")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Distances, routes, clusters and tiles
    Geo {
        #[command(subcommand)]
        command: GeoCommands,
    },
    /// Inspect and validate story-course files
    Course {
        #[command(subcommand)]
        command: CourseCommands,
    },
    /// Encode, decode and verify stamp QR payloads
    Qr {
        #[command(subcommand)]
        command: QrCommands,
    },
    /// Address lookups through the Kakao Local API
    Geocode {
        #[command(subcommand)]
        command: GeocodeCommands,
    },
    /// Print the effective configuration with keys redacted
    Config,
}

/// Parses `"lat,lng"` into a validated coordinate.
fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got \"{raw}\""))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude \"{}\": {e}", lat.trim()))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude \"{}\": {e}", lng.trim()))?;
    Coordinate::try_new(lat, lng).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = storymap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Geo { command }) => geo::run(&config, command)?,
        Some(Commands::Course { command }) => course::run(&config, command)?,
        Some(Commands::Qr { command }) => qr::run(&config, command)?,
        Some(Commands::Geocode { command }) => geocode::run(&config, command).await?,
        Some(Commands::Config) => println!("{config:#?}"),
        None => println!("storymap: run with --help to list commands"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
