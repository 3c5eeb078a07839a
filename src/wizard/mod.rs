//! # Confirmation State Machine
//!
//! Drives one user through the review-QR wizard:
//!
//! ```text
//!                      confirm-request            confirm
//!   ┌──────────┐  ───────────────────▶  ┌─────────────────┐ ─────────▶ ┌─────────┐
//!   │Searching │                        │DetailsPending   │            │ QrReady │◀──────┐
//!   └──────────┘  ◀───────────────────  │Confirmation     │            └─────────┘       │
//!        ▲                edit          └─────────────────┘         download │  ▲ cancel │
//!        │                                                                   ▼  │        │
//!        │ new place id                                          ┌─────────────────┐     │
//!        └────────────────────────────────────────────────────── │ DownloadPending │     │
//!                                                                └─────────────────┘     │
//!                                                     confirm (email + phone) │          │
//!                                                                             ▼   finish │
//!                                                                      ┌──────────┐      │
//!                                                                      │ Exported │──────┘
//!                                                                      └──────────┘
//! ```
//!
//! The stage is a tagged union, so combinations like "download dialog open
//! with no QR code" cannot be represented. The boolean view the frontend
//! consumes is derived on demand by [`Wizard::flags`].
//!
//! Address resolutions complete asynchronously. Each selection takes a
//! [`SelectionTicket`]; only the newest ticket's result is applied.

mod export_request;

pub use export_request::{ConfirmDownload, ExportRequest};

use serde::Serialize;

use crate::business::{BusinessDetails, Coordinate, Resolution, ResolutionError};
use crate::error::ReviewQrError;
use crate::qr::{Captions, QrComposition};
use crate::templates::{self, QrTemplate};

/// Map center shown before any address is resolved.
pub const DEFAULT_MAP_CENTER: Coordinate = Coordinate::new(10.7951172, 106.7195211);

/// Map zoom level.
pub const MAP_ZOOM: u8 = 15;

/// Where the user is in the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardStage {
    Searching,
    DetailsPendingConfirmation,
    QrReady,
    DownloadPending(ExportRequest),
    Exported,
}

impl WizardStage {
    pub fn name(&self) -> &'static str {
        match self {
            WizardStage::Searching => "searching",
            WizardStage::DetailsPendingConfirmation => "details_pending_confirmation",
            WizardStage::QrReady => "qr_ready",
            WizardStage::DownloadPending(_) => "download_pending",
            WizardStage::Exported => "exported",
        }
    }

    fn shows_qr(&self) -> bool {
        matches!(
            self,
            WizardStage::QrReady | WizardStage::DownloadPending(_) | WizardStage::Exported
        )
    }
}

/// Identifies one address selection. Results for older tickets are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    seq: u64,
    pub address: String,
}

/// What happened to a resolution handed to [`Wizard::apply_resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Applied; `degraded` when place details were unavailable.
    Applied { degraded: bool },
    /// A newer selection was made since this one started.
    Stale,
}

/// Flat view of the wizard for the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardFlags {
    pub stage: &'static str,
    pub is_confirming_details: bool,
    pub qr_visible: bool,
    pub is_confirming_download: bool,
    pub place_id: Option<String>,
    pub caption_primary: String,
    pub caption_secondary: String,
    pub selected_template_id: u32,
}

/// Map state: where to center and whether to drop a pin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: u8,
    pub pin: Option<Coordinate>,
}

/// Per-user wizard state.
#[derive(Debug, Clone)]
pub struct Wizard {
    stage: WizardStage,
    details: BusinessDetails,
    coordinate: Option<Coordinate>,
    place_id: Option<String>,
    /// Review URL, fixed when details are confirmed.
    payload: Option<String>,
    captions: Captions,
    template: &'static QrTemplate,
    selection_seq: u64,
}

impl Default for Wizard {
    fn default() -> Self {
        Self {
            stage: WizardStage::Searching,
            details: BusinessDetails::default(),
            coordinate: None,
            place_id: None,
            payload: None,
            captions: Captions::default(),
            template: templates::default_template(),
            selection_seq: 0,
        }
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> &WizardStage {
        &self.stage
    }

    pub fn details(&self) -> &BusinessDetails {
        &self.details
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    pub fn place_id(&self) -> Option<&str> {
        self.place_id.as_deref()
    }

    pub fn captions(&self) -> &Captions {
        &self.captions
    }

    pub fn template(&self) -> &'static QrTemplate {
        self.template
    }

    pub fn qr_visible(&self) -> bool {
        self.stage.shows_qr()
    }

    pub fn map_view(&self) -> MapView {
        MapView {
            center: self.coordinate.unwrap_or(DEFAULT_MAP_CENTER),
            zoom: MAP_ZOOM,
            pin: self.coordinate,
        }
    }

    pub fn flags(&self) -> WizardFlags {
        WizardFlags {
            stage: self.stage.name(),
            is_confirming_details: self.stage == WizardStage::DetailsPendingConfirmation,
            qr_visible: self.qr_visible(),
            is_confirming_download: matches!(self.stage, WizardStage::DownloadPending(_)),
            place_id: self.place_id.clone(),
            caption_primary: self.captions.primary.as_str().to_string(),
            caption_secondary: self.captions.secondary.as_str().to_string(),
            selected_template_id: self.template.id,
        }
    }

    /// The QR block to render, once the QR is visible.
    pub fn composition(&self) -> Option<QrComposition> {
        if !self.qr_visible() {
            return None;
        }
        let payload = self.payload.clone()?;
        Some(QrComposition::from_payload(payload, self.template, self.captions.clone()))
    }

    fn invalid(&self, action: &'static str) -> ReviewQrError {
        ReviewQrError::InvalidTransition {
            stage: self.stage.name(),
            action,
        }
    }

    // ------------------------------------------------------------------
    // Address selection
    // ------------------------------------------------------------------

    /// Start resolving a newly selected address.
    pub fn begin_selection(&mut self, address: &str) -> SelectionTicket {
        self.selection_seq += 1;
        SelectionTicket {
            seq: self.selection_seq,
            address: address.to_string(),
        }
    }

    /// Store the result of a resolution started with `ticket`.
    ///
    /// A result for a different place id than the current one hides the QR
    /// code and returns to `Searching`: it has to be confirmed again.
    pub fn apply_resolution(
        &mut self,
        ticket: &SelectionTicket,
        result: Result<Resolution, ResolutionError>,
    ) -> Result<ResolutionOutcome, ReviewQrError> {
        if ticket.seq != self.selection_seq {
            tracing::debug!(
                address = %ticket.address,
                seq = ticket.seq,
                latest = self.selection_seq,
                "dropping stale resolution"
            );
            return Ok(ResolutionOutcome::Stale);
        }

        let resolution = result.inspect_err(|e| {
            tracing::warn!(address = %ticket.address, error = %e, "address resolution failed");
        })?;

        let place_changed = self.place_id.as_deref() != Some(resolution.place_id.as_str());
        if place_changed && self.stage != WizardStage::Searching {
            tracing::debug!(from = self.stage.name(), "new place selected; back to search");
            self.stage = WizardStage::Searching;
        }
        if place_changed {
            self.payload = None;
        }

        let degraded = resolution.is_degraded();
        self.coordinate = Some(resolution.coordinate);
        self.place_id = Some(resolution.place_id);
        self.details = resolution.details;

        Ok(ResolutionOutcome::Applied { degraded })
    }

    // ------------------------------------------------------------------
    // Details confirmation
    // ------------------------------------------------------------------

    /// "Confirm Business Details": show the confirmation card.
    pub fn request_details_confirmation(&mut self) -> Result<(), ReviewQrError> {
        if self.stage != WizardStage::Searching {
            return Err(self.invalid("review business details"));
        }
        if self.place_id.is_none() {
            return Err(ReviewQrError::PreconditionNotMet(
                "select a business before confirming details".to_string(),
            ));
        }
        self.stage = WizardStage::DetailsPendingConfirmation;
        Ok(())
    }

    /// "Confirm and Proceed": accept the details as shown and reveal the QR.
    pub fn confirm_details(&mut self) -> Result<(), ReviewQrError> {
        if self.stage != WizardStage::DetailsPendingConfirmation {
            return Err(self.invalid("confirm details"));
        }
        let place_id = self
            .place_id
            .as_deref()
            .ok_or_else(|| self.invalid("confirm details"))?;

        tracing::info!(details = ?self.details, place_id, "business details confirmed");

        if self.payload.is_none() {
            self.payload = Some(crate::qr::review_url(place_id));
        }
        self.stage = WizardStage::QrReady;
        Ok(())
    }

    /// "Edit Details": back to search, keeping the resolved details.
    pub fn edit_details(&mut self) -> Result<(), ReviewQrError> {
        if self.stage != WizardStage::DetailsPendingConfirmation {
            return Err(self.invalid("edit details"));
        }
        self.stage = WizardStage::Searching;
        Ok(())
    }

    // ------------------------------------------------------------------
    // QR customization
    // ------------------------------------------------------------------

    /// Replace both captions. Each is truncated to 30 characters.
    pub fn set_captions(&mut self, primary: &str, secondary: &str) -> Result<(), ReviewQrError> {
        if self.stage != WizardStage::QrReady {
            return Err(self.invalid("edit captions"));
        }
        self.captions = Captions::new(primary, secondary);
        Ok(())
    }

    pub fn select_template(&mut self, id: u32) -> Result<(), ReviewQrError> {
        if self.stage != WizardStage::QrReady {
            return Err(self.invalid("change template"));
        }
        self.template = templates::by_id(id)
            .ok_or_else(|| ReviewQrError::PreconditionNotMet(format!("unknown template {}", id)))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Download confirmation
    // ------------------------------------------------------------------

    /// "Download QR Code": open the confirmation dialog.
    pub fn request_download(&mut self) -> Result<(), ReviewQrError> {
        if self.stage != WizardStage::QrReady {
            return Err(self.invalid("open the download dialog"));
        }
        self.stage = WizardStage::DownloadPending(ExportRequest::default());
        Ok(())
    }

    /// The open dialog's contact fields.
    pub fn export_request(&self) -> Option<&ExportRequest> {
        match &self.stage {
            WizardStage::DownloadPending(request) => Some(request),
            _ => None,
        }
    }

    /// Update the dialog's contact fields.
    pub fn set_export_contact(&mut self, email: &str, phone: &str) -> Result<(), ReviewQrError> {
        if !matches!(self.stage, WizardStage::DownloadPending(_)) {
            return Err(self.invalid("edit download contact"));
        }
        if let WizardStage::DownloadPending(request) = &mut self.stage {
            request.set_email(email);
            request.set_phone(phone);
        }
        Ok(())
    }

    /// The "Confirm and Download" control, present only when enabled.
    pub fn confirm_control(&self) -> Option<ConfirmDownload> {
        self.export_request().and_then(ExportRequest::confirm_control)
    }

    /// "Confirm and Download".
    ///
    /// The token must come from [`Wizard::confirm_control`] for the dialog
    /// as it currently reads; a token taken before the fields changed is
    /// rejected.
    pub fn confirm_download(&mut self, control: ConfirmDownload) -> Result<(), ReviewQrError> {
        let Some(request) = self.export_request() else {
            return Err(self.invalid("confirm download"));
        };
        if !control.matches(request) {
            return Err(ReviewQrError::PreconditionNotMet(
                "download contact changed since the control was enabled".to_string(),
            ));
        }
        self.stage = WizardStage::Exported;
        Ok(())
    }

    /// "Cancel": close the dialog and discard its fields.
    pub fn cancel_download(&mut self) -> Result<(), ReviewQrError> {
        if !matches!(self.stage, WizardStage::DownloadPending(_)) {
            return Err(self.invalid("cancel download"));
        }
        self.stage = WizardStage::QrReady;
        Ok(())
    }

    /// Close the dialog after the export side effect ran.
    pub fn finish_export(&mut self) -> Result<(), ReviewQrError> {
        if self.stage != WizardStage::Exported {
            return Err(self.invalid("finish export"));
        }
        self.stage = WizardStage::QrReady;
        Ok(())
    }
}
