//! Download dialog contact fields and the confirm control they gate.

use serde::Serialize;

/// Email and phone typed into the download dialog.
///
/// Collected only to enable the download; nothing is sent anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportRequest {
    email: String,
    phone: String,
}

impl ExportRequest {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = email.to_string();
    }

    pub fn set_phone(&mut self, phone: &str) {
        self.phone = phone.to_string();
    }

    /// Both fields non-empty. No format checks.
    pub fn is_confirm_enabled(&self) -> bool {
        !self.email.is_empty() && !self.phone.is_empty()
    }

    /// The confirm control, or `None` while it is disabled.
    pub fn confirm_control(&self) -> Option<ConfirmDownload> {
        self.is_confirm_enabled().then(|| ConfirmDownload {
            email: self.email.clone(),
            phone: self.phone.clone(),
        })
    }
}

/// An enabled "Confirm and Download" control.
///
/// Only [`ExportRequest::confirm_control`] can create one, and only when
/// both contact fields are filled in.
#[derive(Debug, PartialEq, Eq)]
pub struct ConfirmDownload {
    email: String,
    phone: String,
}

impl ConfirmDownload {
    pub(super) fn matches(&self, request: &ExportRequest) -> bool {
        self.email == request.email && self.phone == request.phone
    }
}
