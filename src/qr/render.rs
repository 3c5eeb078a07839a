//! Rasterization of a [`QrComposition`] into an RGBA block.
//!
//! ## Layout (logical units, multiplied by `scale`)
//!
//! ```text
//! ┌ border ─────────────────────────────┐
//! │  padding 16                          │
//! │        margin 24                     │
//! │      ┌──────────────┐                │
//! │      │  QR 256×256  │                │
//! │      └──────────────┘                │
//! │        margin 24                     │
//! │  gap 8 + caption line (24 high)      │  ← only for non-empty captions
//! │  gap 8 + caption line (24 high)      │
//! │  padding 16                          │
//! └──────────────────────────────────────┘
//! ```
//!
//! The block is as wide as the wider of the code and the longest caption.
//! Everything is horizontally centered.

use image::{Rgba, RgbaImage};
use qrcode::{Color as Module, EcLevel, QrCode};

use super::QrComposition;
use super::font::{self, GLYPH_HEIGHT};
use crate::error::ReviewQrError;
use crate::templates::{Border, Color};

/// Side length of the code in logical units.
pub const QR_SIZE: u32 = 256;
/// Container padding inside the border.
pub const CONTAINER_PADDING: u32 = 16;
/// Vertical margin above and below the code.
pub const CODE_MARGIN: u32 = 24;
/// Largest accepted pixel scale.
pub const MAX_SCALE: u32 = 16;
/// Gap above each caption line.
pub const CAPTION_GAP: u32 = 8;

/// Pixel positions of the parts of a rendered block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    pub width: u32,
    pub height: u32,
    pub border: u32,
    /// Top-left corner of the first QR module.
    pub qr_x: u32,
    pub qr_y: u32,
    /// Side of one QR module in pixels.
    pub module_px: u32,
    /// Modules per side.
    pub modules: u32,
    /// Top edge of each drawn caption line.
    pub caption_ys: Vec<u32>,
}

/// A composed QR block as pixels, plus where its parts landed.
#[derive(Debug, Clone)]
pub struct RenderedBlock {
    image: RgbaImage,
    layout: BlockLayout,
    payload: String,
    template_id: u32,
}

impl RenderedBlock {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    /// The URL encoded in the code.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn template_id(&self) -> u32 {
        self.template_id
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let Rgba([r, g, b, _]) = *self.image.get_pixel(x, y);
        Color::rgb(r, g, b)
    }
}

/// Render a composition at an integer pixel scale (1 = logical units).
///
/// `scale` 0 renders at 1. Scales above [`MAX_SCALE`] are rejected.
pub fn render(composition: &QrComposition, scale: u32) -> Result<RenderedBlock, ReviewQrError> {
    if scale > MAX_SCALE {
        return Err(ReviewQrError::Render(format!(
            "scale {} exceeds maximum {}",
            scale, MAX_SCALE
        )));
    }
    let s = scale.max(1);
    let template = composition.template();

    let code = QrCode::with_error_correction_level(composition.payload(), EcLevel::H)
        .map_err(|e| ReviewQrError::Render(format!("QR code generation failed: {}", e)))?;

    let captions: Vec<(u32, Vec<bool>)> = composition
        .captions()
        .lines()
        .map(|c| font::rasterize_line(c.as_str()))
        .collect();

    let widest_caption = captions.iter().map(|(w, _)| *w).max().unwrap_or(0);
    let content_w = QR_SIZE.max(widest_caption);
    let content_h = CODE_MARGIN * 2
        + QR_SIZE
        + captions.len() as u32 * (CAPTION_GAP + GLYPH_HEIGHT);

    let border = template.border.width();
    let inset = border + CONTAINER_PADDING;
    let scaled = |logical: u32| {
        logical
            .checked_add(inset * 2)
            .and_then(|v| v.checked_mul(s))
            .ok_or_else(|| ReviewQrError::Render(format!("block too large at scale {}", s)))
    };
    let width = scaled(content_w)?;
    let height = scaled(content_h)?;

    let mut image = RgbaImage::from_pixel(width, height, template.bg_color.to_rgba());

    if let Border::Solid { color, .. } = template.border {
        draw_frame(&mut image, border * s, color);
    }

    // Code: integer module size, centered in the 256 square.
    let modules = code.width() as u32;
    let area = QR_SIZE * s;
    let module_px = (area / modules).max(1);
    let drawn = module_px * modules;
    let qr_x = (inset + (content_w - QR_SIZE) / 2) * s + area.saturating_sub(drawn) / 2;
    let qr_y = (inset + CODE_MARGIN) * s + area.saturating_sub(drawn) / 2;

    let fg = template.qr_color.to_rgba();
    for my in 0..modules {
        for mx in 0..modules {
            if code[(mx as usize, my as usize)] == Module::Dark {
                fill_rect(&mut image, qr_x + mx * module_px, qr_y + my * module_px, module_px, module_px, fg);
            }
        }
    }

    // Captions
    let text = template.text_color.to_rgba();
    let mut y = inset + CODE_MARGIN * 2 + QR_SIZE;
    let mut caption_ys = Vec::with_capacity(captions.len());
    for (line_w, bitmap) in &captions {
        y += CAPTION_GAP;
        let x0 = inset + (content_w - line_w) / 2;
        for gy in 0..GLYPH_HEIGHT {
            for gx in 0..*line_w {
                if bitmap[(gy * line_w + gx) as usize] {
                    fill_rect(&mut image, (x0 + gx) * s, (y + gy) * s, s, s, text);
                }
            }
        }
        caption_ys.push(y * s);
        y += GLYPH_HEIGHT;
    }

    Ok(RenderedBlock {
        image,
        layout: BlockLayout {
            width,
            height,
            border: border * s,
            qr_x,
            qr_y,
            module_px,
            modules,
            caption_ys,
        },
        payload: composition.payload().to_string(),
        template_id: template.id,
    })
}

fn fill_rect(image: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let x_end = (x + w).min(image.width());
    let y_end = (y + h).min(image.height());
    for py in y..y_end {
        for px in x..x_end {
            image.put_pixel(px, py, color);
        }
    }
}

fn draw_frame(image: &mut RgbaImage, thickness: u32, color: Color) {
    let (w, h) = image.dimensions();
    let c = color.to_rgba();
    fill_rect(image, 0, 0, w, thickness, c);
    fill_rect(image, 0, h.saturating_sub(thickness), w, thickness, c);
    fill_rect(image, 0, 0, thickness, h, c);
    fill_rect(image, w.saturating_sub(thickness), 0, thickness, h, c);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::Captions;
    use crate::templates;

    fn compose(template_id: u32, primary: &str, secondary: &str) -> QrComposition {
        QrComposition::new(
            "P1",
            templates::by_id(template_id).unwrap(),
            Captions::new(primary, secondary),
        )
    }

    #[test]
    fn test_default_template_has_no_border() {
        let block = render(&compose(1, "", ""), 1).unwrap();
        let layout = block.layout();
        assert_eq!(layout.border, 0);
        assert_eq!(layout.width, QR_SIZE + CONTAINER_PADDING * 2);
        assert_eq!(layout.height, QR_SIZE + CODE_MARGIN * 2 + CONTAINER_PADDING * 2);
        assert_eq!(block.pixel(0, 0), Color::WHITE);
    }

    #[test]
    fn test_code_fits_square() {
        let block = render(&compose(1, "", ""), 1).unwrap();
        let layout = block.layout();
        assert!(layout.module_px * layout.modules <= QR_SIZE);
        // Level H forces a larger symbol than the payload alone needs
        assert!(layout.modules >= 29);
    }

    #[test]
    fn test_foreground_uses_template_color() {
        let block = render(&compose(2, "", ""), 1).unwrap();
        let layout = block.layout();
        // Top-left module of the finder pattern is always dark
        assert_eq!(block.pixel(layout.qr_x, layout.qr_y), Color::rgb(0x1E, 0x40, 0xAF));
        // Border pixel
        assert_eq!(block.pixel(0, 0), Color::rgb(0x1E, 0x40, 0xAF));
        assert_eq!(layout.border, 2);
    }

    #[test]
    fn test_caption_rows_add_height() {
        let none = render(&compose(1, "", ""), 1).unwrap();
        let one = render(&compose(1, "Visit Us", ""), 1).unwrap();
        let two = render(&compose(1, "Visit Us", "Leave a review"), 1).unwrap();

        let row = CAPTION_GAP + GLYPH_HEIGHT;
        assert_eq!(one.layout().height, none.layout().height + row);
        assert_eq!(two.layout().height, none.layout().height + row * 2);
        assert_eq!(one.layout().caption_ys.len(), 1);
    }

    #[test]
    fn test_empty_primary_not_laid_out() {
        let only_secondary = render(&compose(1, "", "Leave a review"), 1).unwrap();
        let only_primary = render(&compose(1, "Leave a review", ""), 1).unwrap();
        assert_eq!(only_secondary.layout(), only_primary.layout());
    }

    #[test]
    fn test_caption_drawn_in_text_color() {
        let block = render(&compose(3, "WWWW", ""), 1).unwrap();
        let layout = block.layout();
        let y0 = layout.caption_ys[0];
        let green = Color::rgb(0x06, 0x5F, 0x46);
        let inner = layout.border..layout.width - layout.border;
        let found = (y0..y0 + GLYPH_HEIGHT)
            .flat_map(|y| inner.clone().map(move |x| (x, y)))
            .any(|(x, y)| block.pixel(x, y) == green);
        assert!(found);
    }

    #[test]
    fn test_long_caption_widens_block() {
        let block = render(&compose(1, &"M".repeat(30), ""), 1).unwrap();
        assert_eq!(block.layout().width, 30 * 12 + CONTAINER_PADDING * 2);
    }

    #[test]
    fn test_scale() {
        let one = render(&compose(4, "Hi", ""), 1).unwrap();
        let two = render(&compose(4, "Hi", ""), 2).unwrap();
        assert_eq!(two.layout().width, one.layout().width * 2);
        assert_eq!(two.layout().height, one.layout().height * 2);
        assert_eq!(two.layout().border, 4);
    }

    #[test]
    fn test_scale_bounds() {
        let block = render(&compose(2, "Visit Us", ""), MAX_SCALE).unwrap();
        assert_eq!(block.layout().width, (QR_SIZE + 36) * MAX_SCALE);

        for scale in [MAX_SCALE + 1, 100_000, 20_000_000, u32::MAX] {
            assert!(matches!(
                render(&compose(2, "Visit Us", ""), scale),
                Err(ReviewQrError::Render(_))
            ));
        }
    }

    #[test]
    fn test_template_switch_same_payload_and_geometry() {
        let a = render(&compose(1, "Visit Us", ""), 1).unwrap();
        let b = render(&compose(5, "Visit Us", ""), 1).unwrap();
        assert_eq!(a.payload(), b.payload());
        assert_eq!(a.layout().modules, b.layout().modules);
        assert_eq!(b.template_id(), 5);
    }
}
