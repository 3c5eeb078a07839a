//! Google Maps web-service client.
//!
//! Implements geocoding, place details and place autocomplete against the
//! JSON endpoints under `/maps/api/`. The base URL is configurable so tests
//! can point it at a mock server.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{
    Coordinate, GeocodeProvider, GeocodeResult, PlaceDetails, PlaceDetailsProvider,
    ResolutionError,
};
use crate::error::ReviewQrError;
use crate::suggest::{Suggestion, SuggestionBatch, SuggestionProvider, SuggestionStatus};

/// Production Maps host.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

const DETAILS_FIELDS: &str = "name,formatted_phone_number,website,opening_hours";

/// Client for the Google Maps geocoding and places APIs.
#[derive(Debug, Clone)]
pub struct GoogleMapsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleMapsClient {
    /// Create a client for the production host.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ReviewQrError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client for a custom host (trailing `/` is ignored).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ReviewQrError> {
        let http = reqwest::Client::builder()
            .user_agent("reviewqr/0.1")
            .build()
            .map_err(|e| ReviewQrError::Transport(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/maps/api/{}/json", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, String> {
        let response = self
            .http
            .get(self.endpoint(path))
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        response.json::<T>().await.map_err(|e| e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<RawGeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct RawGeocodeResult {
    formatted_address: String,
    place_id: String,
    geometry: RawGeometry,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    location: Coordinate,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<RawPlace>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    name: Option<String>,
    formatted_phone_number: Option<String>,
    website: Option<String>,
    opening_hours: Option<RawOpeningHours>,
}

#[derive(Debug, Deserialize)]
struct RawOpeningHours {
    weekday_text: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<Suggestion>,
}

#[async_trait]
impl GeocodeProvider for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, ResolutionError> {
        let body: GeocodeResponse = self
            .get_json("geocode", &[("address", address)])
            .await
            .map_err(ResolutionError::Geocode)?;

        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(body
                .results
                .into_iter()
                .map(|r| GeocodeResult {
                    formatted_address: r.formatted_address,
                    place_id: r.place_id,
                    location: r.geometry.location,
                })
                .collect()),
            status => Err(ResolutionError::Geocode(status.to_string())),
        }
    }
}

#[async_trait]
impl PlaceDetailsProvider for GoogleMapsClient {
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, ResolutionError> {
        let body: DetailsResponse = self
            .get_json("place/details", &[("place_id", place_id), ("fields", DETAILS_FIELDS)])
            .await
            .map_err(ResolutionError::DetailsRequestFailed)?;

        match (body.status.as_str(), body.result) {
            ("OK", Some(place)) => Ok(PlaceDetails {
                name: place.name,
                formatted_phone_number: place.formatted_phone_number,
                website: place.website,
                weekday_text: place.opening_hours.and_then(|h| h.weekday_text),
            }),
            (status, _) => Err(ResolutionError::DetailsRequestFailed(status.to_string())),
        }
    }
}

#[async_trait]
impl SuggestionProvider for GoogleMapsClient {
    fn is_ready(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn suggest(&self, input: &str) -> Result<SuggestionBatch, ReviewQrError> {
        let body: AutocompleteResponse = self
            .get_json("place/autocomplete", &[("input", input)])
            .await
            .map_err(|e| ReviewQrError::Transport(format!("Autocomplete request failed: {}", e)))?;

        Ok(SuggestionBatch {
            status: SuggestionStatus::parse(&body.status),
            predictions: body.predictions,
        })
    }
}
