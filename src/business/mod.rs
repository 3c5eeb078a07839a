//! # Business Detail Resolution
//!
//! Turns an address picked from the suggestion list into a normalized
//! [`BusinessDetails`] record, a map [`Coordinate`] and a place identifier.
//!
//! ## Pipeline
//!
//! ```text
//! address ──geocode──▶ [GeocodeResult, ...]
//!                          │ first result
//!                          ├──▶ coordinate, formatted address
//!                          └──▶ place id ──place_details──▶ name, phone, website, hours
//! ```
//!
//! A failed geocode fails the whole resolution. A failed details lookup does
//! not: the caller still gets the address, coordinate and place id, with the
//! details fields left blank and the failure reported in
//! [`Resolution::details_error`].
//!
//! The providers are traits so the wizard can run against Google Maps
//! ([`google::GoogleMapsClient`]) or an in-memory fake in tests.

pub mod google;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Business metadata shown on the confirmation card.
///
/// `email` and `business_type` are never filled in by the resolver; they
/// exist so the confirmation card has a stable shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDetails {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    #[serde(rename = "type")]
    pub business_type: String,
    /// Opening hours flattened to one line, e.g. `"Monday: 9:00 AM – 5:00 PM, Tuesday: ..."`.
    pub hours: String,
}

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// One geocoder hit.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub place_id: String,
    pub location: Coordinate,
}

/// Extended place metadata. Every field may be missing upstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceDetails {
    pub name: Option<String>,
    pub formatted_phone_number: Option<String>,
    pub website: Option<String>,
    pub weekday_text: Option<Vec<String>>,
}

/// Errors from the geocoding and place-details providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("geocode request failed: {0}")]
    Geocode(String),

    #[error("geocode returned no results")]
    NoResults,

    #[error("details request failed: {0}")]
    DetailsRequestFailed(String),
}

/// Resolves free-text addresses to canonical results.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, ResolutionError>;
}

/// Fetches extended metadata for a place identifier.
#[async_trait]
pub trait PlaceDetailsProvider: Send + Sync {
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, ResolutionError>;
}

/// Outcome of a successful geocode, with details possibly degraded.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub place_id: String,
    pub coordinate: Coordinate,
    pub details: BusinessDetails,
    /// Set when the place-details step failed and `details` is degraded.
    pub details_error: Option<ResolutionError>,
}

impl Resolution {
    pub fn is_degraded(&self) -> bool {
        self.details_error.is_some()
    }
}

/// Runs the geocode → place-details pipeline against a pair of providers.
#[derive(Clone)]
pub struct Resolver {
    geocoder: Arc<dyn GeocodeProvider>,
    places: Arc<dyn PlaceDetailsProvider>,
}

impl Resolver {
    pub fn new(geocoder: Arc<dyn GeocodeProvider>, places: Arc<dyn PlaceDetailsProvider>) -> Self {
        Self { geocoder, places }
    }

    /// Resolve an address. Fails only if geocoding fails or finds nothing.
    pub async fn resolve(&self, address: &str) -> Result<Resolution, ResolutionError> {
        let results = self.geocoder.geocode(address).await.inspect_err(|e| {
            tracing::warn!(address, error = %e, "geocode failed");
        })?;
        let first = results.into_iter().next().ok_or(ResolutionError::NoResults)?;

        tracing::debug!(
            address,
            place_id = %first.place_id,
            lat = first.location.lat,
            lng = first.location.lng,
            "geocoded"
        );

        let (details, details_error) = match self.places.place_details(&first.place_id).await {
            Ok(place) => (normalize(place, &first.formatted_address), None),
            Err(e) => {
                tracing::warn!(place_id = %first.place_id, error = %e, "place details unavailable, using address only");
                (
                    BusinessDetails {
                        address: first.formatted_address.clone(),
                        ..Default::default()
                    },
                    Some(e),
                )
            }
        };

        Ok(Resolution {
            place_id: first.place_id,
            coordinate: first.location,
            details,
            details_error,
        })
    }
}

/// Flatten provider details into the record shown to the user.
fn normalize(place: PlaceDetails, formatted_address: &str) -> BusinessDetails {
    BusinessDetails {
        name: place.name.unwrap_or_default(),
        address: formatted_address.to_string(),
        phone: place.formatted_phone_number.unwrap_or_default(),
        email: String::new(),
        website: place.website.unwrap_or_default(),
        business_type: String::new(),
        hours: place
            .weekday_text
            .map(|days| days.join(", "))
            .unwrap_or_default(),
    }
}
