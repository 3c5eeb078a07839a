//! End-to-end wizard flow against in-memory providers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use reviewqr::business::{
    Coordinate, GeocodeProvider, GeocodeResult, PlaceDetails, PlaceDetailsProvider,
    ResolutionError,
};
use reviewqr::error::ReviewQrError;
use reviewqr::session::{Providers, WizardSession};
use reviewqr::suggest::{Suggestion, SuggestionBatch, SuggestionProvider, SuggestionStatus};
use reviewqr::templates::Color;
use reviewqr::wizard::{ResolutionOutcome, WizardStage};

struct Geocoder(HashMap<&'static str, GeocodeResult>);

#[async_trait]
impl GeocodeProvider for Geocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, ResolutionError> {
        Ok(self.0.get(address).cloned().into_iter().collect())
    }
}

struct Places(HashMap<&'static str, PlaceDetails>);

#[async_trait]
impl PlaceDetailsProvider for Places {
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, ResolutionError> {
        self.0
            .get(place_id)
            .cloned()
            .ok_or_else(|| ResolutionError::DetailsRequestFailed("NOT_FOUND".to_string()))
    }
}

struct Autocomplete {
    ready: bool,
}

#[async_trait]
impl SuggestionProvider for Autocomplete {
    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn suggest(&self, input: &str) -> Result<SuggestionBatch, ReviewQrError> {
        let predictions = [("P1", "221B Baker St"), ("P2", "10 Downing St")]
            .into_iter()
            .filter(|(_, d)| d.to_lowercase().contains(&input.to_lowercase()))
            .map(|(id, d)| Suggestion {
                place_id: id.to_string(),
                description: d.to_string(),
            })
            .collect::<Vec<_>>();
        let status = if predictions.is_empty() {
            SuggestionStatus::Other("ZERO_RESULTS".to_string())
        } else {
            SuggestionStatus::Ok
        };
        Ok(SuggestionBatch { status, predictions })
    }
}

fn providers(ready: bool) -> Providers {
    let geocoder = Geocoder(HashMap::from([
        (
            "221B Baker St",
            GeocodeResult {
                formatted_address: "221B Baker St, London NW1 6XE, UK".to_string(),
                place_id: "P1".to_string(),
                location: Coordinate::new(51.5237, -0.1585),
            },
        ),
        (
            "10 Downing St",
            GeocodeResult {
                formatted_address: "10 Downing St, London SW1A 2AA, UK".to_string(),
                place_id: "P2".to_string(),
                location: Coordinate::new(51.5034, -0.1276),
            },
        ),
    ]));
    let places = Places(HashMap::from([(
        "P1",
        PlaceDetails {
            name: Some("Baker Street Books".to_string()),
            formatted_phone_number: Some("020 7946 0000".to_string()),
            website: Some("https://example.com".to_string()),
            weekday_text: Some(vec!["Monday: 9-5".to_string()]),
        },
    )]));
    Providers {
        geocoder: Arc::new(geocoder),
        places: Arc::new(places),
        suggestions: Arc::new(Autocomplete { ready }),
    }
}

#[tokio::test]
async fn review_qr_from_search_to_download() {
    let mut session = WizardSession::new(&providers(true));

    session.input("221B").await.unwrap();
    assert_eq!(session.feed().suggestions().count(), 1);

    let outcome = session.select(0).await.unwrap();
    assert_eq!(outcome, ResolutionOutcome::Applied { degraded: false });
    assert_eq!(session.feed().value(), "221B Baker St");
    assert_eq!(session.feed().suggestions().count(), 0);

    let wizard = session.wizard();
    assert_eq!(wizard.place_id(), Some("P1"));
    assert_eq!(wizard.details().name, "Baker Street Books");
    assert_eq!(wizard.map_view().pin, Some(Coordinate::new(51.5237, -0.1585)));
    assert!(!wizard.qr_visible());

    session.request_details_confirmation().unwrap();
    assert!(session.wizard().flags().is_confirming_details);
    session.confirm_details().unwrap();
    assert!(session.wizard().qr_visible());

    session.set_captions("Visit Us", "").unwrap();
    session.select_template(2).unwrap();

    let blue = Color::rgb(0x1E, 0x40, 0xAF);
    let block = session.handle().block().unwrap();
    let layout = block.layout().clone();
    assert_eq!(block.payload(), "https://search.google.com/local/writereview?placeid=P1");
    // Top-left finder pattern corner is always dark.
    assert_eq!(block.pixel(layout.qr_x, layout.qr_y), blue);
    assert_eq!(layout.caption_ys.len(), 1);
    let y0 = layout.caption_ys[0];
    let caption_drawn = (y0..y0 + 24)
        .flat_map(|y| (layout.border..layout.width - layout.border).map(move |x| (x, y)))
        .any(|(x, y)| block.pixel(x, y) == blue);
    assert!(caption_drawn);

    session.request_download().unwrap();
    assert!(session.confirm_control().is_none());
    session.set_export_contact("owner@example.com", "").unwrap();
    assert!(session.confirm_control().is_none());
    session.set_export_contact("owner@example.com", "555-0100").unwrap();

    let control = session.confirm_control().unwrap();
    let artifact = session.download(control).unwrap().unwrap();
    assert_eq!(artifact.filename, "qrcode.png");
    assert_eq!(&artifact.png[..8], b"\x89PNG\r\n\x1a\n");

    let decoded = image::load_from_memory(&artifact.png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (layout.width, layout.height));
    assert_eq!(session.wizard().stage(), &WizardStage::QrReady);
}

#[tokio::test]
async fn cancelled_download_keeps_qr() {
    let mut session = WizardSession::new(&providers(true));
    session.input("221B").await.unwrap();
    session.select(0).await.unwrap();
    session.request_details_confirmation().unwrap();
    session.confirm_details().unwrap();

    session.request_download().unwrap();
    session.set_export_contact("a", "1").unwrap();
    session.cancel_download().unwrap();

    assert!(session.wizard().qr_visible());
    assert!(session.wizard().export_request().is_none());
    assert!(session.handle().is_attached());

    // Dialog reopens empty.
    session.request_download().unwrap();
    assert_eq!(session.wizard().export_request().unwrap().email(), "");
}

#[tokio::test]
async fn new_place_needs_reconfirmation() {
    let mut session = WizardSession::new(&providers(true));
    session.input("221B").await.unwrap();
    session.select(0).await.unwrap();
    session.request_details_confirmation().unwrap();
    session.confirm_details().unwrap();
    session.set_captions("Visit Us", "").unwrap();

    session.input("Downing").await.unwrap();
    let outcome = session.select(0).await.unwrap();

    // P2 has no details entry, so only the address comes back.
    assert_eq!(outcome, ResolutionOutcome::Applied { degraded: true });
    assert_eq!(session.wizard().details().address, "10 Downing St, London SW1A 2AA, UK");
    assert_eq!(session.wizard().details().name, "");
    assert!(!session.wizard().qr_visible());
    assert!(!session.handle().is_attached());
    assert_eq!(session.wizard().captions().primary.as_str(), "Visit Us");
}

#[tokio::test]
async fn search_disabled_until_ready() {
    let mut session = WizardSession::new(&providers(false));
    assert!(!session.is_ready());

    let err = session.input("221B").await.unwrap_err();
    assert!(matches!(err, ReviewQrError::ProviderUnavailable(_)));
    assert_eq!(session.feed().suggestions().count(), 0);
}
