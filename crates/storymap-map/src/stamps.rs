//! Stamp collection from scanned QR codes.

use chrono::{DateTime, Utc};
use storymap_core::geo::is_within_radius;
use storymap_core::{decode_qr_data_at, Coordinate, Location, QrKind, Stamp};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StampError {
    #[error("QR code is malformed or expired")]
    InvalidCode,

    #[error("QR code is not a stamp code")]
    NotAStampCode,

    #[error("QR code belongs to location {actual}, expected {expected}")]
    WrongLocation { expected: String, actual: String },

    #[error("location {0} has no stamp")]
    NoStampAtLocation(String),

    #[error("stamp id in QR code does not match location stamp {0}")]
    StampMismatch(String),

    #[error("too far from {location_id} to collect its stamp")]
    OutOfRange { location_id: String },

    #[error("stamp {0} already collected")]
    AlreadyCollected(String),
}

/// Checks a scanned payload against the location the user is standing at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampVerifier {
    /// Geofence radius in metres, applied only when a user position is known.
    pub radius_m: f64,
}

impl Default for StampVerifier {
    fn default() -> Self {
        Self { radius_m: 100.0 }
    }
}

impl StampVerifier {
    #[must_use]
    pub fn new(radius_m: f64) -> Self {
        Self { radius_m }
    }

    /// Verify against the current clock. See [`StampVerifier::verify_at`].
    ///
    /// # Errors
    ///
    /// See [`StampVerifier::verify_at`].
    pub fn verify(
        &self,
        payload: &str,
        location: &Location,
        user_position: Option<Coordinate>,
        collected: &[Stamp],
    ) -> Result<Stamp, StampError> {
        self.verify_at(payload, location, user_position, collected, Utc::now())
    }

    /// Returns the collected stamp for `location` if `payload` is a valid,
    /// unexpired stamp code for it.
    ///
    /// # Errors
    ///
    /// One [`StampError`] per failed check, tested in order: decodable,
    /// stamp type, location id, location has a stamp, stamp id, geofence,
    /// not yet collected.
    pub fn verify_at(
        &self,
        payload: &str,
        location: &Location,
        user_position: Option<Coordinate>,
        collected: &[Stamp],
        now: DateTime<Utc>,
    ) -> Result<Stamp, StampError> {
        let info = decode_qr_data_at(payload, now).ok_or(StampError::InvalidCode)?;
        if info.kind != QrKind::Stamp {
            return Err(StampError::NotAStampCode);
        }
        if info.location_id != location.id {
            return Err(StampError::WrongLocation {
                expected: location.id.clone(),
                actual: info.location_id,
            });
        }
        let stamp_id = location
            .stamp_id
            .as_deref()
            .ok_or_else(|| StampError::NoStampAtLocation(location.id.clone()))?;
        // Codes without an embedded stamp id are accepted for the location's stamp.
        if info.stamp_id().is_some_and(|id| id != stamp_id) {
            return Err(StampError::StampMismatch(stamp_id.to_string()));
        }
        if let Some(position) = user_position {
            if !is_within_radius(&position, &location.coordinates, self.radius_m) {
                tracing::debug!(
                    location_id = %location.id,
                    radius_m = self.radius_m,
                    "stamp scan outside geofence"
                );
                return Err(StampError::OutOfRange {
                    location_id: location.id.clone(),
                });
            }
        }
        if collected.iter().any(|s| s.id == stamp_id && s.is_collected()) {
            return Err(StampError::AlreadyCollected(stamp_id.to_string()));
        }

        tracing::info!(stamp_id, location_id = %location.id, "stamp collected");
        Ok(Stamp::locked(stamp_id, location.id.clone()).collect(now))
    }
}
