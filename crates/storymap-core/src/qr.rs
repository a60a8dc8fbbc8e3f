//! QR payload codec for stamps, stories and media.
//!
//! Payloads are JSON objects: `{"type", "locationId", "data", "expiresAt"?}`.
//! Decoding never errors; a malformed or expired code is simply `None`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrKind {
    Stamp,
    Story,
    Media,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeInfo {
    #[serde(rename = "type")]
    pub kind: QrKind,
    pub location_id: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl QrCodeInfo {
    /// Stamp code carrying the stamp id, optionally valid for `ttl` only.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ExpiryOutOfRange`] when `ttl` is not positive or
    /// pushes the expiry past the representable date range.
    pub fn stamp(
        location_id: &str,
        stamp_id: &str,
        ttl: Option<Duration>,
    ) -> Result<Self, CoreError> {
        let expires_at = ttl
            .map(|ttl| {
                (ttl > Duration::zero())
                    .then(|| Utc::now().checked_add_signed(ttl))
                    .flatten()
                    .ok_or(CoreError::ExpiryOutOfRange {
                        minutes: ttl.num_minutes(),
                    })
            })
            .transpose()?;
        Ok(Self {
            kind: QrKind::Stamp,
            location_id: location_id.to_string(),
            data: serde_json::json!({ "stampId": stamp_id }),
            expires_at,
        })
    }

    /// Stamp id embedded in `data`, if any.
    #[must_use]
    pub fn stamp_id(&self) -> Option<&str> {
        self.data.get("stampId").and_then(serde_json::Value::as_str)
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Serialize a payload for rendering into a QR image.
///
/// # Errors
///
/// Returns the underlying `serde_json` error if `data` cannot be serialized.
pub fn encode_qr_data(info: &QrCodeInfo) -> Result<String, serde_json::Error> {
    serde_json::to_string(info)
}

/// Decode a scanned payload against the current clock.
#[must_use]
pub fn decode_qr_data(payload: &str) -> Option<QrCodeInfo> {
    decode_qr_data_at(payload, Utc::now())
}

/// Decode a scanned payload; `None` for malformed JSON or `expiresAt <= now`.
#[must_use]
pub fn decode_qr_data_at(payload: &str, now: DateTime<Utc>) -> Option<QrCodeInfo> {
    let info: QrCodeInfo = serde_json::from_str(payload.trim()).ok()?;
    if info.location_id.trim().is_empty() || info.is_expired_at(now) {
        return None;
    }
    Some(info)
}
