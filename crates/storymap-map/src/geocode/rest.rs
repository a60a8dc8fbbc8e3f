//! HTTP client for the Kakao Local REST API.
//!
//! Server-side counterpart of the SDK geocoder: forward address search and
//! reverse lookup of a coordinate. Authenticated with the REST key in an
//! `Authorization: KakaoAK <key>` header. Failures are not retried.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Url};
use serde::Deserialize;
use storymap_core::Coordinate;

use super::{kakao_documents_to_results, GeocodeResult, KakaoAddressDocument, KakaoAddressName};
use crate::error::MapError;

const DEFAULT_BASE_URL: &str = "https://dapi.kakao.com/";
const ADDRESS_SEARCH_PATH: &str = "v2/local/search/address.json";
const COORD_TO_ADDRESS_PATH: &str = "v2/local/geo/coord2address.json";

#[derive(Debug, Deserialize)]
struct AddressSearchResponse {
    documents: Vec<KakaoAddressDocument>,
}

#[derive(Debug, Deserialize)]
struct CoordToAddressResponse {
    documents: Vec<CoordToAddressDocument>,
}

#[derive(Debug, Deserialize)]
struct CoordToAddressDocument {
    #[serde(default)]
    road_address: Option<KakaoAddressName>,
    #[serde(default)]
    address: Option<KakaoAddressName>,
}

/// Client for the Kakao Local REST API.
///
/// Use [`KakaoLocalClient::new`] for production or
/// [`KakaoLocalClient::with_base_url`] to point at a mock server in tests.
pub struct KakaoLocalClient {
    client: Client,
    rest_key: String,
    base_url: Url,
}

impl KakaoLocalClient {
    /// # Errors
    ///
    /// Returns [`MapError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(rest_key: &str, timeout_secs: u64) -> Result<Self, MapError> {
        Self::with_base_url(rest_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`MapError::Geocode`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        rest_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, MapError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("storymap/0.1 (pohang-storyteller)")
            .build()?;

        // Exactly one trailing slash so `join` appends the endpoint path.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| MapError::Geocode(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            rest_key: rest_key.to_owned(),
            base_url,
        })
    }

    /// Looks up coordinates for a free-form Korean address.
    ///
    /// # Errors
    ///
    /// - [`MapError::Geocode`] on a non-2xx status or when nothing matches.
    /// - [`MapError::Http`] on network failure.
    /// - [`MapError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn search_address(&self, query: &str) -> Result<Vec<GeocodeResult>, MapError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MapError::Geocode("empty address query".to_string()));
        }

        let url = self.build_url(ADDRESS_SEARCH_PATH, &[("query", query)])?;
        let body = self.request_json(&url).await?;
        let response: AddressSearchResponse =
            serde_json::from_value(body).map_err(|e| MapError::Deserialize {
                context: format!("search_address(query={query})"),
                source: e,
            })?;

        let results = kakao_documents_to_results(response.documents);
        if results.is_empty() {
            return Err(MapError::Geocode(format!("no results for '{query}'")));
        }
        tracing::debug!(query, count = results.len(), "address search complete");
        Ok(results)
    }

    /// Reverse-geocodes a coordinate, preferring the road-name address.
    ///
    /// # Errors
    ///
    /// - [`MapError::Geocode`] on a non-2xx status or when no address exists
    ///   at the point.
    /// - [`MapError::Http`] on network failure.
    /// - [`MapError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn coord_to_address(&self, coord: Coordinate) -> Result<String, MapError> {
        let x = coord.lng.to_string();
        let y = coord.lat.to_string();
        let url = self.build_url(COORD_TO_ADDRESS_PATH, &[("x", &x), ("y", &y)])?;
        let body = self.request_json(&url).await?;
        let response: CoordToAddressResponse =
            serde_json::from_value(body).map_err(|e| MapError::Deserialize {
                context: format!("coord_to_address({coord})"),
                source: e,
            })?;

        response
            .documents
            .into_iter()
            .find_map(|doc| doc.road_address.or(doc.address))
            .map(|a| a.address_name)
            .ok_or_else(|| MapError::Geocode(format!("no address at {coord}")))
    }

    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, MapError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| MapError::Geocode(format!("invalid endpoint path '{path}': {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends an authenticated GET and parses the body as JSON.
    ///
    /// Non-2xx statuses become [`MapError::Geocode`] carrying Kakao's
    /// `message` field when present.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, MapError> {
        let response = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, format!("KakaoAK {}", self.rest_key))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_owned)
                })
                .unwrap_or_else(|| "no error message".to_string());
            tracing::warn!(status = status.as_u16(), %message, "Kakao Local API error");
            return Err(MapError::Geocode(format!(
                "Kakao Local API returned {}: {message}",
                status.as_u16()
            )));
        }

        serde_json::from_str(&body).map_err(|e| MapError::Deserialize {
            context: url.path().to_string(),
            source: e,
        })
    }
}
