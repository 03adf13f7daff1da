//! Built-in 5x7 bitmap font
//!
//! Each glyph is eight rows of bits, bit 0 being the leftmost column. Glyphs
//! occupy the top seven rows and the left five columns of a 6x8 cell; the
//! spare column and row give letter and line spacing.

use super::text::{Font, FontRasterizer, GlyphImage};
use crate::error::TextError;

/// Horizontal advance of one character cell, in font pixels
pub const GLYPH_WIDTH: u32 = 6;
/// Height of one character cell, in font pixels
pub const GLYPH_HEIGHT: u32 = 8;
/// Rows above the baseline
pub const GLYPH_ASCENT: u32 = 7;

const FIRST_CHAR: u32 = 0x20;

/// Look up the glyph for a printable ASCII character
pub fn get_glyph(ch: char) -> Option<&'static [u8; 8]> {
    let index = u32::from(ch).checked_sub(FIRST_CHAR)?;
    FONT.get(index as usize)
}

/// Glyph for `ch`, or `?` when the font has none
fn glyph_or_fallback(ch: char) -> &'static [u8; 8] {
    get_glyph(ch).unwrap_or(&FONT[('?' as u32 - FIRST_CHAR) as usize])
}

/// The font compiled into the crate. Scales the 5x7 design by
/// [`Font::scale`]; bold repeats every lit pixel one pixel to the right.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFont;

impl FontRasterizer for BuiltinFont {
    fn rasterize(&self, text: &str, font: Font) -> Result<GlyphImage, TextError> {
        let scale = font.scale();
        let width = self.string_width(text, font);
        let height = self.height(font);
        let mut image = GlyphImage::blank(width, height, self.ascent(font));

        let advance = GLYPH_WIDTH * scale;
        for (i, ch) in text.chars().enumerate() {
            let left = i as u32 * advance;
            for (row, &bits) in glyph_or_fallback(ch).iter().enumerate() {
                for col in 0..8u32 {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            let x = left + col * scale + sx;
                            let y = row as u32 * scale + sy;
                            image.set(x, y, u8::MAX);
                            if font.bold {
                                image.set(x + 1, y, u8::MAX);
                            }
                        }
                    }
                }
            }
        }
        Ok(image)
    }

    fn string_width(&self, text: &str, font: Font) -> u32 {
        let chars = text.chars().count() as u32;
        if chars == 0 {
            return 0;
        }
        chars * GLYPH_WIDTH * font.scale() + u32::from(font.bold)
    }

    fn ascent(&self, font: Font) -> u32 {
        GLYPH_ASCENT * font.scale()
    }

    fn height(&self, font: Font) -> u32 {
        GLYPH_HEIGHT * font.scale()
    }
}

#[rustfmt::skip]
static FONT: [[u8; 8]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // space
    [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04, 0x00], // '!'
    [0x0A, 0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00], // '"'
    [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A, 0x00], // '#'
    [0x04, 0x1E, 0x05, 0x0E, 0x14, 0x0F, 0x04, 0x00], // '$'
    [0x03, 0x13, 0x08, 0x04, 0x02, 0x19, 0x18, 0x00], // '%'
    [0x06, 0x09, 0x05, 0x02, 0x15, 0x09, 0x16, 0x00], // '&'
    [0x04, 0x04, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00], // '\''
    [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08, 0x00], // '('
    [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02, 0x00], // ')'
    [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00, 0x00], // '*'
    [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00, 0x00], // '+'
    [0x00, 0x00, 0x00, 0x00, 0x06, 0x04, 0x02, 0x00], // ','
    [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00, 0x00], // '-'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x06, 0x00], // '.'
    [0x00, 0x10, 0x08, 0x04, 0x02, 0x01, 0x00, 0x00], // '/'
    [0x0E, 0x11, 0x19, 0x15, 0x13, 0x11, 0x0E, 0x00], // '0'
    [0x04, 0x06, 0x04, 0x04, 0x04, 0x04, 0x0E, 0x00], // '1'
    [0x0E, 0x11, 0x10, 0x08, 0x04, 0x02, 0x1F, 0x00], // '2'
    [0x1F, 0x08, 0x04, 0x08, 0x10, 0x11, 0x0E, 0x00], // '3'
    [0x08, 0x0C, 0x0A, 0x09, 0x1F, 0x08, 0x08, 0x00], // '4'
    [0x1F, 0x01, 0x0F, 0x10, 0x10, 0x11, 0x0E, 0x00], // '5'
    [0x0C, 0x02, 0x01, 0x0F, 0x11, 0x11, 0x0E, 0x00], // '6'
    [0x1F, 0x10, 0x08, 0x04, 0x02, 0x02, 0x02, 0x00], // '7'
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E, 0x00], // '8'
    [0x0E, 0x11, 0x11, 0x1E, 0x10, 0x08, 0x06, 0x00], // '9'
    [0x00, 0x06, 0x06, 0x00, 0x06, 0x06, 0x00, 0x00], // ':'
    [0x00, 0x06, 0x06, 0x00, 0x06, 0x04, 0x02, 0x00], // ';'
    [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08, 0x00], // '<'
    [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00, 0x00], // '='
    [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02, 0x00], // '>'
    [0x0E, 0x11, 0x10, 0x08, 0x04, 0x00, 0x04, 0x00], // '?'
    [0x0E, 0x11, 0x10, 0x16, 0x15, 0x15, 0x0E, 0x00], // '@'
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11, 0x00], // 'A'
    [0x0F, 0x11, 0x11, 0x0F, 0x11, 0x11, 0x0F, 0x00], // 'B'
    [0x0E, 0x11, 0x01, 0x01, 0x01, 0x11, 0x0E, 0x00], // 'C'
    [0x07, 0x09, 0x11, 0x11, 0x11, 0x09, 0x07, 0x00], // 'D'
    [0x1F, 0x01, 0x01, 0x0F, 0x01, 0x01, 0x1F, 0x00], // 'E'
    [0x1F, 0x01, 0x01, 0x0F, 0x01, 0x01, 0x01, 0x00], // 'F'
    [0x0E, 0x11, 0x01, 0x1D, 0x11, 0x11, 0x1E, 0x00], // 'G'
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11, 0x00], // 'H'
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E, 0x00], // 'I'
    [0x1C, 0x08, 0x08, 0x08, 0x08, 0x09, 0x06, 0x00], // 'J'
    [0x11, 0x09, 0x05, 0x03, 0x05, 0x09, 0x11, 0x00], // 'K'
    [0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x1F, 0x00], // 'L'
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11, 0x00], // 'M'
    [0x11, 0x11, 0x13, 0x15, 0x19, 0x11, 0x11, 0x00], // 'N'
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E, 0x00], // 'O'
    [0x0F, 0x11, 0x11, 0x0F, 0x01, 0x01, 0x01, 0x00], // 'P'
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x09, 0x16, 0x00], // 'Q'
    [0x0F, 0x11, 0x11, 0x0F, 0x05, 0x09, 0x11, 0x00], // 'R'
    [0x1E, 0x01, 0x01, 0x0E, 0x10, 0x10, 0x0F, 0x00], // 'S'
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x00], // 'T'
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E, 0x00], // 'U'
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04, 0x00], // 'V'
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A, 0x00], // 'W'
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11, 0x00], // 'X'
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x00], // 'Y'
    [0x1F, 0x10, 0x08, 0x04, 0x02, 0x01, 0x1F, 0x00], // 'Z'
    [0x0E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0E, 0x00], // '['
    [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00, 0x00], // '\\'
    [0x0E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x0E, 0x00], // ']'
    [0x04, 0x0A, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00], // '^'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F, 0x00], // '_'
    [0x02, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00], // '`'
    [0x00, 0x00, 0x0E, 0x10, 0x1E, 0x11, 0x1E, 0x00], // 'a'
    [0x01, 0x01, 0x0D, 0x13, 0x11, 0x11, 0x0F, 0x00], // 'b'
    [0x00, 0x00, 0x0E, 0x01, 0x01, 0x11, 0x0E, 0x00], // 'c'
    [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x1E, 0x00], // 'd'
    [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x01, 0x0E, 0x00], // 'e'
    [0x0C, 0x12, 0x02, 0x07, 0x02, 0x02, 0x02, 0x00], // 'f'
    [0x00, 0x1E, 0x11, 0x11, 0x1E, 0x10, 0x0E, 0x00], // 'g'
    [0x01, 0x01, 0x0D, 0x13, 0x11, 0x11, 0x11, 0x00], // 'h'
    [0x04, 0x00, 0x06, 0x04, 0x04, 0x04, 0x0E, 0x00], // 'i'
    [0x08, 0x00, 0x0C, 0x08, 0x08, 0x09, 0x06, 0x00], // 'j'
    [0x01, 0x01, 0x09, 0x05, 0x03, 0x05, 0x09, 0x00], // 'k'
    [0x06, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E, 0x00], // 'l'
    [0x00, 0x00, 0x0B, 0x15, 0x15, 0x11, 0x11, 0x00], // 'm'
    [0x00, 0x00, 0x0D, 0x13, 0x11, 0x11, 0x11, 0x00], // 'n'
    [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E, 0x00], // 'o'
    [0x00, 0x00, 0x0F, 0x11, 0x0F, 0x01, 0x01, 0x00], // 'p'
    [0x00, 0x00, 0x16, 0x19, 0x1E, 0x10, 0x10, 0x00], // 'q'
    [0x00, 0x00, 0x0D, 0x13, 0x01, 0x01, 0x01, 0x00], // 'r'
    [0x00, 0x00, 0x0E, 0x01, 0x0E, 0x10, 0x0F, 0x00], // 's'
    [0x02, 0x02, 0x07, 0x02, 0x02, 0x12, 0x0C, 0x00], // 't'
    [0x00, 0x00, 0x11, 0x11, 0x11, 0x19, 0x16, 0x00], // 'u'
    [0x00, 0x00, 0x11, 0x11, 0x11, 0x0A, 0x04, 0x00], // 'v'
    [0x00, 0x00, 0x11, 0x11, 0x15, 0x15, 0x0A, 0x00], // 'w'
    [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x00], // 'x'
    [0x00, 0x00, 0x11, 0x11, 0x1E, 0x10, 0x0E, 0x00], // 'y'
    [0x00, 0x00, 0x1F, 0x08, 0x04, 0x02, 0x1F, 0x00], // 'z'
    [0x08, 0x04, 0x04, 0x02, 0x04, 0x04, 0x08, 0x00], // '{'
    [0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x00], // '|'
    [0x02, 0x04, 0x04, 0x08, 0x04, 0x04, 0x02, 0x00], // '}'
    [0x00, 0x00, 0x02, 0x15, 0x08, 0x00, 0x00, 0x00], // '~'
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_lookup() {
        assert!(get_glyph(' ').is_some_and(|g| g.iter().all(|&row| row == 0)));
        assert_eq!(get_glyph('I'), Some(&[0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E, 0x00]));
        assert!(get_glyph('~').is_some());
        assert!(get_glyph('\u{7f}').is_none());
        assert!(get_glyph('\n').is_none());
        assert_eq!(glyph_or_fallback('é'), glyph_or_fallback('?'));
    }

    #[test]
    fn test_every_glyph_fits_cell() {
        for glyph in &FONT {
            assert_eq!(glyph[7], 0);
            assert!(glyph.iter().all(|&row| row < 1 << 5));
        }
    }

    #[test]
    fn test_metrics() {
        let f = BuiltinFont;
        let small = Font::new(8, false);
        let big = Font::new(16, true);
        assert_eq!(f.string_width("", small), 0);
        assert_eq!(f.string_width("abc", small), 18);
        assert_eq!(f.string_width("abc", big), 37);
        assert_eq!(f.ascent(big), 14);
        assert_eq!(f.height(small), 8);
    }

    #[test]
    fn test_rasterize_letter() {
        let image = BuiltinFont.rasterize("T", Font::new(8, false)).unwrap();
        assert_eq!((image.width, image.height, image.ascent), (6, 8, 7));
        // Top bar of the T
        for x in 0..5 {
            assert_eq!(image.alpha_at(x, 0), 255);
        }
        assert_eq!(image.alpha_at(5, 0), 0);
        assert_eq!(image.alpha_at(2, 6), 255);
        assert_eq!(image.alpha_at(1, 6), 0);
    }

    #[test]
    fn test_rasterize_bold_scaled() {
        let image = BuiltinFont.rasterize("|", Font::new(16, true)).unwrap();
        assert_eq!(image.width, 13);
        // Stem at columns 4..=5 widened by one
        for x in 4..=6 {
            assert_eq!(image.alpha_at(x, 3), 255, "x = {}", x);
        }
        assert_eq!(image.alpha_at(3, 3), 0);
        assert_eq!(image.alpha_at(7, 3), 0);
    }
}
