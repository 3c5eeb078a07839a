//! # Error Types
//!
//! This module defines error types used throughout the reviewqr library.

use thiserror::Error;

use crate::business::ResolutionError;

/// Main error type for reviewqr operations
#[derive(Debug, Error)]
pub enum ReviewQrError {
    /// The mapping provider is not initialized (no credential, not loaded)
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Geocoding or place-details lookup failed
    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    /// An action's input precondition does not hold
    #[error("Precondition not met: {0}")]
    PreconditionNotMet(String),

    /// The action is not allowed in the current wizard stage
    #[error("Cannot {action} while {stage}")]
    InvalidTransition {
        stage: &'static str,
        action: &'static str,
    },

    /// QR code generation or layout error
    #[error("Render error: {0}")]
    Render(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Network/listener errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
