//! Caption glyphs from the Spleen 12×24 bitmap font.

use spleen_font::{FONT_12X24, PSF2Font};

pub const GLYPH_WIDTH: u32 = 12;
pub const GLYPH_HEIGHT: u32 = 24;

/// Rasterize a line of text into a row-major on/off bitmap of
/// `text.chars().count() * GLYPH_WIDTH` by `GLYPH_HEIGHT` pixels.
///
/// Characters missing from the font are drawn as a box outline.
pub fn rasterize_line(text: &str) -> (u32, Vec<bool>) {
    let chars: Vec<char> = text.chars().collect();
    let width = chars.len() as u32 * GLYPH_WIDTH;
    let mut bitmap = vec![false; (width * GLYPH_HEIGHT) as usize];

    let Ok(mut font) = PSF2Font::new(FONT_12X24) else {
        return (width, bitmap);
    };

    for (i, ch) in chars.iter().enumerate() {
        let origin_x = i as u32 * GLYPH_WIDTH;
        let utf8 = ch.to_string();

        match font.glyph_for_utf8(utf8.as_bytes()) {
            Some(glyph) => {
                for (row_y, row) in glyph.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        let (x, y) = (origin_x + col_x as u32, row_y as u32);
                        if on && col_x < GLYPH_WIDTH as usize && y < GLYPH_HEIGHT {
                            bitmap[(y * width + x) as usize] = true;
                        }
                    }
                }
            }
            None => draw_box(&mut bitmap, width, origin_x),
        }
    }

    (width, bitmap)
}

fn draw_box(bitmap: &mut [bool], stride: u32, origin_x: u32) {
    for x in origin_x..origin_x + GLYPH_WIDTH {
        bitmap[x as usize] = true;
        bitmap[((GLYPH_HEIGHT - 1) * stride + x) as usize] = true;
    }
    for y in 0..GLYPH_HEIGHT {
        bitmap[(y * stride + origin_x) as usize] = true;
        bitmap[(y * stride + origin_x + GLYPH_WIDTH - 1) as usize] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_dimensions() {
        let (width, bitmap) = rasterize_line("Visit Us");
        assert_eq!(width, 8 * GLYPH_WIDTH);
        assert_eq!(bitmap.len(), (width * GLYPH_HEIGHT) as usize);
        assert!(bitmap.iter().any(|&on| on));
    }

    #[test]
    fn test_space_is_blank() {
        let (_, bitmap) = rasterize_line(" ");
        assert!(bitmap.iter().all(|&on| !on));
    }
}
