//! # reviewqr - Review Request QR Codes
//!
//! reviewqr walks a business owner from "search for my business" to a
//! downloadable QR code that opens the Google review form for that business.
//! It provides:
//!
//! - **Business lookup**: address autocomplete, geocoding and place details
//!   behind provider traits, with a Google Maps implementation
//! - **Confirmation wizard**: an explicit state machine for confirming the
//!   business and then confirming the download
//! - **QR rendering**: themed QR blocks with optional captions, rendered to RGBA
//! - **Export**: PNG encoding of exactly the block shown in the preview
//! - **HTTP server**: a JSON API and embedded frontend driving one wizard per browser session
//!
//! ## Quick Start
//!
//! ```
//! use reviewqr::{
//!     export,
//!     qr::{self, Captions, QrComposition},
//!     templates,
//! };
//!
//! let composition = QrComposition::new(
//!     "ChIJN1t_tDeuEmsRUsoyG83frY4",
//!     templates::by_name("Blue Theme").unwrap(),
//!     Captions::new("Visit Us", "Leave us a review"),
//! );
//!
//! let mut handle = export::RenderHandle::default();
//! handle.attach(qr::render(&composition, 1)?);
//!
//! let artifact = export::export(&handle)?.unwrap();
//! assert_eq!(artifact.filename, "qrcode.png");
//!
//! # Ok::<(), reviewqr::error::ReviewQrError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`templates`] | Built-in color/border themes |
//! | [`business`] | Address → business details resolution |
//! | [`suggest`] | Autocomplete suggestion feed |
//! | [`wizard`] | Confirmation state machine |
//! | [`qr`] | Payload, captions and rendering |
//! | [`export`] | PNG export |
//! | [`session`] | One user's wizard with its providers |
//! | [`server`] | HTTP server |
//! | [`error`] | Error types |

pub mod business;
pub mod error;
pub mod export;
pub mod qr;
pub mod server;
pub mod session;
pub mod suggest;
pub mod templates;
pub mod wizard;

// Re-exports for convenience
pub use error::ReviewQrError;
pub use session::{Providers, WizardSession};
pub use wizard::{Wizard, WizardStage};
