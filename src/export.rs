//! # Image Export
//!
//! Encodes the QR block the user is looking at into a downloadable PNG.
//!
//! The preview and the export share one [`RenderHandle`]: whatever block
//! was last attached for display is exactly what gets encoded. There is no
//! second render path. Exporting through a handle with nothing attached is a
//! no-op and returns `None`.

use base64::{Engine as _, engine::general_purpose};
use image::ImageEncoder;

use crate::error::ReviewQrError;
use crate::qr::RenderedBlock;

/// Filename offered for every download.
pub const EXPORT_FILENAME: &str = "qrcode.png";

/// Slot holding the block currently on screen.
#[derive(Debug, Clone, Default)]
pub struct RenderHandle {
    block: Option<RenderedBlock>,
}

impl RenderHandle {
    pub fn attach(&mut self, block: RenderedBlock) {
        self.block = Some(block);
    }

    pub fn detach(&mut self) {
        self.block = None;
    }

    pub fn is_attached(&self) -> bool {
        self.block.is_some()
    }

    pub fn block(&self) -> Option<&RenderedBlock> {
        self.block.as_ref()
    }
}

/// A finished PNG download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: &'static str,
    pub png: Vec<u8>,
}

impl ExportArtifact {
    /// `data:image/png;base64,...` form of the image.
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(&self.png))
    }
}

/// Encode a block as PNG bytes.
pub fn encode_png(block: &RenderedBlock) -> Result<Vec<u8>, ReviewQrError> {
    let image = block.image();
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e: image::ImageError| ReviewQrError::Image(e.to_string()))?;
    Ok(png_bytes)
}

/// Export whatever the handle holds. `Ok(None)` if nothing is attached.
pub fn export(handle: &RenderHandle) -> Result<Option<ExportArtifact>, ReviewQrError> {
    let Some(block) = handle.block() else {
        tracing::debug!("export requested before render; ignoring");
        return Ok(None);
    };

    let png = encode_png(block)?;
    tracing::info!(
        template = block.template_id(),
        bytes = png.len(),
        "exported {}",
        EXPORT_FILENAME
    );
    Ok(Some(ExportArtifact {
        filename: EXPORT_FILENAME,
        png,
    }))
}
