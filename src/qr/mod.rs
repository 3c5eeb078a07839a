//! # QR Composition
//!
//! Builds what goes into a review QR block: the review URL payload, the
//! selected [`QrTemplate`], and up to two caption lines.
//!
//! ## Architecture
//!
//! ```text
//! place id ──review_url──▶ payload ─┐
//! template ─────────────────────────┼──▶ QrComposition ──render──▶ RenderedBlock (RGBA)
//! captions (≤ 30 chars each) ───────┘
//! ```
//!
//! The payload is computed once per place id. Switching template or editing
//! captions produces a new composition with the same payload.
//!
//! ## Example
//!
//! ```
//! use reviewqr::qr::{Captions, QrComposition};
//! use reviewqr::templates;
//!
//! let composition = QrComposition::new("P1", templates::default_template(), Captions::default());
//! assert_eq!(
//!     composition.payload(),
//!     "https://search.google.com/local/writereview?placeid=P1"
//! );
//!
//! let blue = composition.with_template(templates::by_id(2).unwrap());
//! assert_eq!(blue.payload(), composition.payload());
//! ```

mod font;
pub mod render;

pub use render::{BlockLayout, MAX_SCALE, RenderedBlock, render};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

use crate::templates::QrTemplate;

/// Review endpoint the payload points at.
pub const REVIEW_ENDPOINT: &str = "https://search.google.com/local/writereview";

/// Maximum caption length in characters.
pub const CAPTION_MAX_CHARS: usize = 30;

/// Everything except RFC 3986 unreserved characters gets escaped.
const PLACE_ID: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the review-request URL for a place id.
pub fn review_url(place_id: &str) -> String {
    format!(
        "{}?placeid={}",
        REVIEW_ENDPOINT,
        utf8_percent_encode(place_id, PLACE_ID)
    )
}

/// A caption line, truncated to [`CAPTION_MAX_CHARS`] characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Caption(String);

impl Caption {
    pub fn new(text: &str) -> Self {
        Self(text.chars().take(CAPTION_MAX_CHARS).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

/// The two optional lines drawn under the code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Captions {
    /// Display name, e.g. "Bennam Solutions".
    pub primary: Caption,
    /// Review request, e.g. "Please review us".
    pub secondary: Caption,
}

impl Captions {
    pub fn new(primary: &str, secondary: &str) -> Self {
        Self {
            primary: Caption::new(primary),
            secondary: Caption::new(secondary),
        }
    }

    /// Non-empty captions in display order.
    pub fn lines(&self) -> impl Iterator<Item = &Caption> {
        [&self.primary, &self.secondary]
            .into_iter()
            .filter(|c| !c.is_empty())
    }
}

/// A fully specified QR block, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct QrComposition {
    payload: String,
    template: &'static QrTemplate,
    captions: Captions,
}

impl QrComposition {
    pub fn new(place_id: &str, template: &'static QrTemplate, captions: Captions) -> Self {
        Self {
            payload: review_url(place_id),
            template,
            captions,
        }
    }

    /// Reuse an already built payload.
    pub(crate) fn from_payload(
        payload: String,
        template: &'static QrTemplate,
        captions: Captions,
    ) -> Self {
        Self {
            payload,
            template,
            captions,
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn template(&self) -> &'static QrTemplate {
        self.template
    }

    pub fn captions(&self) -> &Captions {
        &self.captions
    }

    /// Same payload and captions, different styling.
    pub fn with_template(&self, template: &'static QrTemplate) -> Self {
        Self {
            payload: self.payload.clone(),
            template,
            captions: self.captions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates;

    #[test]
    fn test_review_url_exact() {
        assert_eq!(
            review_url("ChIJN1t_tDeuEmsRUsoyG83frY4"),
            "https://search.google.com/local/writereview?placeid=ChIJN1t_tDeuEmsRUsoyG83frY4"
        );
    }

    #[test]
    fn test_review_url_escapes_reserved() {
        assert_eq!(
            review_url("a b&c=d"),
            "https://search.google.com/local/writereview?placeid=a%20b%26c%3Dd"
        );
    }

    #[test]
    fn test_caption_truncated() {
        let long = "abcdefghijklmnopqrstuvwxyz0123456789";
        let caption = Caption::new(long);
        assert_eq!(caption.char_count(), CAPTION_MAX_CHARS);
        assert_eq!(caption.as_str(), &long[..30]);
    }

    #[test]
    fn test_caption_truncates_by_char() {
        let caption = Caption::new(&"é".repeat(40));
        assert_eq!(caption.char_count(), 30);
        assert_eq!(caption.as_str().len(), 60);
    }

    #[test]
    fn test_empty_captions_skipped() {
        assert_eq!(Captions::new("", "").lines().count(), 0);
        let captions = Captions::new("", "Review us");
        let lines: Vec<_> = captions.lines().map(|c| c.as_str()).collect();
        assert_eq!(lines, vec!["Review us"]);
    }

    #[test]
    fn test_template_switch_keeps_payload() {
        let base = QrComposition::new("P1", templates::default_template(), Captions::new("Visit Us", ""));
        for template in templates::all() {
            let switched = base.with_template(template);
            assert_eq!(switched.payload().as_bytes(), base.payload().as_bytes());
            assert_eq!(switched.captions(), base.captions());
            assert_eq!(switched.template().id, template.id);
        }
    }
}
