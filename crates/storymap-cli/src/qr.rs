//! Stamp QR payload commands.

use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use storymap_core::{
    decode_qr_data_at, encode_qr_data, load_courses, AppConfig, Coordinate, QrCodeInfo,
};
use storymap_map::StampVerifier;

use crate::parse_coordinate;

#[derive(Debug, Subcommand)]
pub enum QrCommands {
    /// Encode a stamp payload for printing as a QR code
    Stamp {
        location: String,
        stamp: String,
        /// Expire the code this many minutes from now
        #[arg(long)]
        ttl_minutes: Option<i64>,
    },
    /// Decode a scanned payload and show what it carries
    Decode {
        payload: String,
        /// Evaluate expiry at this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Check a scanned payload against a course location
    Verify {
        payload: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        location: String,
        /// Scanner position as "lat,lng"; the geofence is skipped without it
        #[arg(long, value_parser = parse_coordinate)]
        position: Option<Coordinate>,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

/// `--ttl-minutes` as a positive duration chrono can represent.
pub(crate) fn ttl_from_minutes(minutes: i64) -> anyhow::Result<Duration> {
    anyhow::ensure!(minutes > 0, "--ttl-minutes must be positive, got {minutes}");
    Duration::try_minutes(minutes)
        .ok_or_else(|| anyhow::anyhow!("--ttl-minutes {minutes} is too large"))
}

pub(crate) fn run(config: &AppConfig, command: QrCommands) -> anyhow::Result<()> {
    match command {
        QrCommands::Stamp {
            location,
            stamp,
            ttl_minutes,
        } => {
            let ttl = ttl_minutes.map(ttl_from_minutes).transpose()?;
            let info = QrCodeInfo::stamp(&location, &stamp, ttl)?;
            println!("{}", encode_qr_data(&info)?);
        }
        QrCommands::Decode { payload, at } => {
            let now = at.unwrap_or_else(Utc::now);
            match decode_qr_data_at(&payload, now) {
                Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
                None => anyhow::bail!("payload is malformed or expired"),
            }
        }
        QrCommands::Verify {
            payload,
            course,
            location,
            position,
            at,
        } => {
            let courses = load_courses(&config.courses_path)?;
            let course = courses.find(&course).ok_or_else(|| {
                anyhow::anyhow!(
                    "course '{course}' not found in {}",
                    config.courses_path.display()
                )
            })?;
            let location = course
                .locations
                .iter()
                .find(|l| l.id == location)
                .ok_or_else(|| {
                    anyhow::anyhow!("location '{location}' is not part of course '{}'", course.id)
                })?;

            let verifier = StampVerifier::new(config.stamp_radius_m);
            let stamp = verifier.verify_at(
                &payload,
                location,
                position,
                &[],
                at.unwrap_or_else(Utc::now),
            )?;
            println!(
                "stamp {} collected at {} ({})",
                stamp.id,
                location.name,
                stamp
                    .collected_at
                    .map_or_else(|| "-".to_string(), |t| t.to_rfc3339())
            );
        }
    }
    Ok(())
}
