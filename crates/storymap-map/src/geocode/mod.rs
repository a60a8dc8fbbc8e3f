//! Address and coordinate lookups.
//!
//! Results come either from a mounted SDK's geocoder (see
//! [`crate::adapter::MapAdapter::geocode`]) or from the Kakao Local REST API
//! via [`KakaoLocalClient`]. Both Kakao paths share the same document shape.

mod rest;

pub use rest::KakaoLocalClient;

use serde::{Deserialize, Serialize};
use storymap_core::Coordinate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeResult {
    /// Lot-number address (지번 주소), or the formatted address for Google.
    pub address: String,
    /// Road-name address (도로명 주소) when the provider has one.
    pub road_address: Option<String>,
    pub coordinate: Coordinate,
}

/// One entry of a Kakao address search. `x` is longitude and `y` latitude,
/// both as decimal strings.
#[derive(Debug, Deserialize)]
pub(crate) struct KakaoAddressDocument {
    pub address_name: String,
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub road_address: Option<KakaoAddressName>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KakaoAddressName {
    pub address_name: String,
}

/// Documents with unparseable or out-of-range coordinates are dropped.
pub(crate) fn kakao_documents_to_results(docs: Vec<KakaoAddressDocument>) -> Vec<GeocodeResult> {
    docs.into_iter()
        .filter_map(|doc| {
            let lng = doc.x.trim().parse::<f64>().ok()?;
            let lat = doc.y.trim().parse::<f64>().ok()?;
            let Ok(coordinate) = Coordinate::try_new(lat, lng) else {
                tracing::debug!(address = %doc.address_name, "skipping geocode result with invalid coordinates");
                return None;
            };
            Some(GeocodeResult {
                address: doc.address_name,
                road_address: doc.road_address.map(|r| r.address_name),
                coordinate,
            })
        })
        .collect()
}
