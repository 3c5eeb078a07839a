//! # Wizard Session
//!
//! One user's complete wizard: the state machine, the search box, the
//! resolver that backs it, and the render handle the preview and export
//! share.
//!
//! Every action that changes what the QR block looks like re-renders it and
//! re-attaches the result to the handle, so the handle always holds exactly
//! what the user sees.
//!
//! Async work is split into `begin_*`/`finish_*` pairs. The caller can drop
//! its lock on the session between the two while the provider call runs.
//! The `async` convenience methods do both halves for a single owner.

use std::sync::Arc;

use crate::business::google::GoogleMapsClient;
use crate::business::{GeocodeProvider, PlaceDetailsProvider, ResolutionError, Resolution, Resolver};
use crate::error::ReviewQrError;
use crate::export::{self, ExportArtifact, RenderHandle};
use crate::qr;
use crate::suggest::{SuggestionBatch, SuggestionFeed, SuggestionProvider, SuggestionQuery};
use crate::wizard::{ConfirmDownload, ResolutionOutcome, SelectionTicket, Wizard};

/// The external collaborators a session talks to.
#[derive(Clone)]
pub struct Providers {
    pub geocoder: Arc<dyn GeocodeProvider>,
    pub places: Arc<dyn PlaceDetailsProvider>,
    pub suggestions: Arc<dyn SuggestionProvider>,
}

impl Providers {
    /// All three roles served by one Google Maps client.
    pub fn google(client: GoogleMapsClient) -> Self {
        let client = Arc::new(client);
        Self {
            geocoder: client.clone(),
            places: client.clone(),
            suggestions: client,
        }
    }
}

/// A pending suggestion fetch.
pub struct PendingInput {
    pub query: SuggestionQuery,
    pub provider: Arc<dyn SuggestionProvider>,
}

/// A pending address resolution.
pub struct PendingSelection {
    pub ticket: SelectionTicket,
    pub resolver: Resolver,
}

impl PendingSelection {
    pub async fn run(&self) -> Result<Resolution, ResolutionError> {
        self.resolver.resolve(&self.ticket.address).await
    }
}

/// One user's wizard plus everything it needs.
pub struct WizardSession {
    wizard: Wizard,
    feed: SuggestionFeed,
    resolver: Resolver,
    handle: RenderHandle,
    scale: u32,
}

impl WizardSession {
    pub fn new(providers: &Providers) -> Self {
        Self::with_scale(providers, 1)
    }

    /// Render previews and exports at an integer pixel scale, clamped to
    /// `1..=`[`qr::MAX_SCALE`].
    pub fn with_scale(providers: &Providers, scale: u32) -> Self {
        Self {
            wizard: Wizard::new(),
            feed: SuggestionFeed::new(providers.suggestions.clone()),
            resolver: Resolver::new(providers.geocoder.clone(), providers.places.clone()),
            handle: RenderHandle::default(),
            scale: scale.clamp(1, qr::MAX_SCALE),
        }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn feed(&self) -> &SuggestionFeed {
        &self.feed
    }

    pub fn handle(&self) -> &RenderHandle {
        &self.handle
    }

    /// Whether the places provider has finished loading.
    pub fn is_ready(&self) -> bool {
        self.feed.is_ready()
    }

    fn refresh_render(&mut self) -> Result<(), ReviewQrError> {
        match self.wizard.composition() {
            Some(composition) => self.handle.attach(qr::render(&composition, self.scale)?),
            None => self.handle.detach(),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    pub fn begin_input(&mut self, text: &str) -> Result<Option<PendingInput>, ReviewQrError> {
        Ok(self.feed.set_input(text)?.map(|query| PendingInput {
            query,
            provider: self.feed.provider(),
        }))
    }

    /// Returns `false` if a newer input superseded this one.
    pub fn finish_input(&mut self, query: &SuggestionQuery, batch: SuggestionBatch) -> bool {
        self.feed.apply(query, batch)
    }

    pub async fn input(&mut self, text: &str) -> Result<(), ReviewQrError> {
        self.feed.update(text).await
    }

    /// Pick suggestion `index` and start resolving it.
    pub fn begin_select(&mut self, index: usize) -> Result<PendingSelection, ReviewQrError> {
        if !self.is_ready() {
            return Err(ReviewQrError::ProviderUnavailable(
                "places provider is still loading".to_string(),
            ));
        }
        let chosen = self.feed.select(index).ok_or_else(|| {
            ReviewQrError::PreconditionNotMet(format!("no suggestion at index {}", index))
        })?;
        Ok(PendingSelection {
            ticket: self.wizard.begin_selection(&chosen.description),
            resolver: self.resolver.clone(),
        })
    }

    pub fn finish_select(
        &mut self,
        ticket: &SelectionTicket,
        result: Result<Resolution, ResolutionError>,
    ) -> Result<ResolutionOutcome, ReviewQrError> {
        let outcome = self.wizard.apply_resolution(ticket, result)?;
        self.refresh_render()?;
        Ok(outcome)
    }

    pub async fn select(&mut self, index: usize) -> Result<ResolutionOutcome, ReviewQrError> {
        let pending = self.begin_select(index)?;
        let result = pending.run().await;
        self.finish_select(&pending.ticket, result)
    }

    // ------------------------------------------------------------------
    // Details
    // ------------------------------------------------------------------

    pub fn request_details_confirmation(&mut self) -> Result<(), ReviewQrError> {
        self.wizard.request_details_confirmation()
    }

    pub fn confirm_details(&mut self) -> Result<(), ReviewQrError> {
        self.wizard.confirm_details()?;
        self.refresh_render()
    }

    pub fn edit_details(&mut self) -> Result<(), ReviewQrError> {
        self.wizard.edit_details()
    }

    // ------------------------------------------------------------------
    // Customization
    // ------------------------------------------------------------------

    pub fn set_captions(&mut self, primary: &str, secondary: &str) -> Result<(), ReviewQrError> {
        self.wizard.set_captions(primary, secondary)?;
        self.refresh_render()
    }

    pub fn select_template(&mut self, id: u32) -> Result<(), ReviewQrError> {
        self.wizard.select_template(id)?;
        self.refresh_render()
    }

    // ------------------------------------------------------------------
    // Download
    // ------------------------------------------------------------------

    pub fn request_download(&mut self) -> Result<(), ReviewQrError> {
        self.wizard.request_download()
    }

    pub fn set_export_contact(&mut self, email: &str, phone: &str) -> Result<(), ReviewQrError> {
        self.wizard.set_export_contact(email, phone)
    }

    pub fn confirm_control(&self) -> Option<ConfirmDownload> {
        self.wizard.confirm_control()
    }

    pub fn cancel_download(&mut self) -> Result<(), ReviewQrError> {
        self.wizard.cancel_download()
    }

    /// Confirm the download and hand back the handle to encode.
    ///
    /// The wizard stays in `Exported` until [`WizardSession::finish_export`].
    pub fn begin_export(&mut self, control: ConfirmDownload) -> Result<RenderHandle, ReviewQrError> {
        self.wizard.confirm_download(control)?;
        Ok(self.handle.clone())
    }

    pub fn finish_export(&mut self) -> Result<(), ReviewQrError> {
        self.wizard.finish_export()
    }

    /// Confirm, encode and close the dialog. `None` if nothing was rendered.
    pub fn download(&mut self, control: ConfirmDownload) -> Result<Option<ExportArtifact>, ReviewQrError> {
        let handle = self.begin_export(control)?;
        let artifact = export::export(&handle);
        self.finish_export()?;
        artifact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::PlaceDetails;
    use crate::business::fakes::{FakeGeocoder, FakePlaces};
    use crate::suggest::fakes::FakeSuggestions;

    fn providers(ready: bool) -> Providers {
        let mut places = FakePlaces::default();
        places.details.insert(
            "P1".to_string(),
            PlaceDetails {
                name: Some("Baker Street Books".to_string()),
                ..Default::default()
            },
        );
        let mut suggestions = FakeSuggestions::ready_with("221B", &[("P1", "221B Baker St")]);
        suggestions.ready = ready;
        Providers {
            geocoder: Arc::new(FakeGeocoder::with("221B Baker St", "P1", "221B Baker St, London", 51.5, -0.15)),
            places: Arc::new(places),
            suggestions: Arc::new(suggestions),
        }
    }

    async fn qr_ready() -> WizardSession {
        let mut session = WizardSession::new(&providers(true));
        session.input("221B").await.unwrap();
        session.select(0).await.unwrap();
        session.request_details_confirmation().unwrap();
        session.confirm_details().unwrap();
        session
    }

    #[tokio::test]
    async fn test_not_ready_blocks_search() {
        let mut session = WizardSession::new(&providers(false));
        assert!(!session.is_ready());
        assert!(matches!(
            session.input("221B").await,
            Err(ReviewQrError::ProviderUnavailable(_))
        ));
        assert!(matches!(
            session.begin_select(0),
            Err(ReviewQrError::ProviderUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_handle_follows_visibility() {
        let mut session = WizardSession::new(&providers(true));
        session.input("221B").await.unwrap();
        session.select(0).await.unwrap();
        assert!(!session.handle().is_attached());

        session.request_details_confirmation().unwrap();
        session.confirm_details().unwrap();
        assert!(session.handle().is_attached());
    }

    #[tokio::test]
    async fn test_template_switch_rerenders() {
        let mut session = qr_ready().await;
        let before = session.handle().block().unwrap().payload().to_string();
        session.select_template(4).unwrap();
        let block = session.handle().block().unwrap();
        assert_eq!(block.template_id(), 4);
        assert_eq!(block.payload(), before);
    }

    #[tokio::test]
    async fn test_download_exports_attached_block() {
        let mut session = qr_ready().await;
        session.set_captions("Visit Us", "").unwrap();
        session.request_download().unwrap();
        assert!(session.confirm_control().is_none());

        session.set_export_contact("a", "1").unwrap();
        let control = session.confirm_control().unwrap();
        let artifact = session.download(control).unwrap().unwrap();

        assert_eq!(artifact.filename, "qrcode.png");
        let decoded = image::load_from_memory(&artifact.png).unwrap().to_rgba8();
        assert_eq!(&decoded, session.handle().block().unwrap().image());
        assert!(session.wizard().qr_visible());
        assert!(!session.wizard().flags().is_confirming_download);
    }

    #[tokio::test]
    async fn test_select_out_of_range() {
        let mut session = WizardSession::new(&providers(true));
        assert!(matches!(
            session.begin_select(3),
            Err(ReviewQrError::PreconditionNotMet(_))
        ));
    }

    #[tokio::test]
    async fn test_scaled_session() {
        let mut session = WizardSession::with_scale(&providers(true), 2);
        session.input("221B").await.unwrap();
        session.select(0).await.unwrap();
        session.request_details_confirmation().unwrap();
        session.confirm_details().unwrap();
        assert_eq!(session.handle().block().unwrap().layout().width, (256 + 32) * 2);
    }

    #[tokio::test]
    async fn test_oversized_scale_clamped() {
        let mut session = WizardSession::with_scale(&providers(true), 100_000);
        session.input("221B").await.unwrap();
        session.select(0).await.unwrap();
        session.request_details_confirmation().unwrap();
        session.confirm_details().unwrap();
        let width = session.handle().block().unwrap().layout().width;
        assert_eq!(width, (256 + 32) * qr::MAX_SCALE);
    }
}
