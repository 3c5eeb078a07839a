//! # QR Templates
//!
//! The fixed catalog of visual themes a QR block can be rendered with.
//!
//! | Id | Name | Foreground | Border |
//! |----|------|------------|--------|
//! | 1 | Default | `#000000` | none |
//! | 2 | Blue Theme | `#1E40AF` | 2px solid |
//! | 3 | Green Theme | `#065F46` | 2px solid |
//! | 4 | Red Theme | `#991B1B` | 2px solid |
//! | 5 | Purple Theme | `#5B21B6` | 2px solid |
//!
//! ## Usage
//!
//! ```
//! use reviewqr::templates::{self, Color};
//!
//! let blue = templates::by_id(2).unwrap();
//! assert_eq!(blue.qr_color, Color::rgb(0x1E, 0x40, 0xAF));
//! assert_eq!(blue.qr_color.hex(), "#1E40AF");
//! ```

use serde::{Serialize, Serializer};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Uppercase `#RRGGBB` form.
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 0xFF])
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

/// Container border style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    None,
    Solid { width: u32, color: Color },
}

impl Border {
    /// Border thickness in logical units (0 for `None`).
    pub fn width(&self) -> u32 {
        match self {
            Border::None => 0,
            Border::Solid { width, .. } => *width,
        }
    }

    /// CSS shorthand, e.g. `2px solid #1E40AF`.
    pub fn css(&self) -> String {
        match self {
            Border::None => "none".to_string(),
            Border::Solid { width, color } => format!("{}px solid {}", width, color.hex()),
        }
    }
}

impl Serialize for Border {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.css())
    }
}

/// A named bundle of colors and border applied to a QR render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrTemplate {
    pub id: u32,
    pub name: &'static str,
    pub qr_color: Color,
    pub bg_color: Color,
    pub text_color: Color,
    pub border: Border,
}

const fn themed(id: u32, name: &'static str, color: Color) -> QrTemplate {
    QrTemplate {
        id,
        name,
        qr_color: color,
        bg_color: Color::WHITE,
        text_color: color,
        border: Border::Solid { width: 2, color },
    }
}

/// Id of the template selected when a session starts.
pub const DEFAULT_TEMPLATE_ID: u32 = 1;

static TEMPLATES: [QrTemplate; 5] = [
    QrTemplate {
        id: DEFAULT_TEMPLATE_ID,
        name: "Default",
        qr_color: Color::BLACK,
        bg_color: Color::WHITE,
        text_color: Color::BLACK,
        border: Border::None,
    },
    themed(2, "Blue Theme", Color::rgb(0x1E, 0x40, 0xAF)),
    themed(3, "Green Theme", Color::rgb(0x06, 0x5F, 0x46)),
    themed(4, "Red Theme", Color::rgb(0x99, 0x1B, 0x1B)),
    themed(5, "Purple Theme", Color::rgb(0x5B, 0x21, 0xB6)),
];

/// All templates, in display order.
pub fn all() -> &'static [QrTemplate] {
    &TEMPLATES
}

/// Look up a template by id.
pub fn by_id(id: u32) -> Option<&'static QrTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Look up a template by display name (case-insensitive).
pub fn by_name(name: &str) -> Option<&'static QrTemplate> {
    TEMPLATES.iter().find(|t| t.name.eq_ignore_ascii_case(name))
}

/// The template selected at session start.
pub fn default_template() -> &'static QrTemplate {
    &TEMPLATES[0]
}
