//! Bitmap text
//!
//! Strings are rasterized once per (string, font) through a [`FontRasterizer`],
//! thresholded into a one-bit [`TextBitmap`] and cached. Drawing blits the
//! cached bitmap through the depth test.

use std::collections::HashMap;
use std::sync::Arc;

use super::font::BuiltinFont;
use super::Visibility;
use crate::display::PixelBuffer;
use crate::error::TextError;

/// Alpha at or above which a rasterized pixel counts as lit
const ALPHA_THRESHOLD: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Font {
    /// Nominal pixel size; the built-in font scales by whole multiples of 8
    pub size: u16,
    pub bold: bool,
}

impl Font {
    pub const fn new(size: u16, bold: bool) -> Self {
        Self { size, bold }
    }

    /// Whole-pixel magnification of the 8-pixel built-in design
    pub fn scale(&self) -> u32 {
        u32::from(self.size / 8).max(1)
    }

    /// Same face at `factor` times the size, for supersampled buffers
    #[must_use]
    pub fn scaled(self, factor: u16) -> Self {
        Self {
            size: self.size.saturating_mul(factor),
            ..self
        }
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new(8, false)
    }
}

/// Eight-bit coverage image of a rendered string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphImage {
    pub width: u32,
    pub height: u32,
    /// Rows above the baseline
    pub ascent: u32,
    alpha: Vec<u8>,
}

impl GlyphImage {
    pub fn blank(width: u32, height: u32, ascent: u32) -> Self {
        Self {
            width,
            height,
            ascent,
            alpha: vec![0; (width * height) as usize],
        }
    }

    /// Set coverage at (x, y); ignored outside the image
    pub fn set(&mut self, x: u32, y: u32, alpha: u8) {
        if x < self.width && y < self.height {
            self.alpha[(y * self.width + x) as usize] = alpha;
        }
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x < self.width && y < self.height {
            self.alpha[(y * self.width + x) as usize]
        } else {
            0
        }
    }
}

/// Host text rasterizer. Anything that can turn a string into coverage
/// can back the glyph cache.
pub trait FontRasterizer: Send {
    fn rasterize(&self, text: &str, font: Font) -> Result<GlyphImage, TextError>;

    /// Advance width of `text` in pixels
    fn string_width(&self, text: &str, font: Font) -> u32;

    fn ascent(&self, font: Font) -> u32;

    /// Full line height
    fn height(&self, font: Font) -> u32;
}

/// One bit per pixel, row-major, packed into 32-bit words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBitmap {
    width: u32,
    height: u32,
    ascent: u32,
    words: Vec<u32>,
}

impl TextBitmap {
    /// All-off bitmap of the given size
    pub fn blank(width: u32, height: u32, ascent: u32) -> Self {
        let bits = (width * height) as usize;
        Self {
            width,
            height,
            ascent,
            words: vec![0; bits.div_ceil(32)],
        }
    }

    /// Threshold a coverage image
    pub fn from_image(image: &GlyphImage) -> Self {
        let mut bitmap = Self::blank(image.width, image.height, image.ascent);
        for (i, &a) in image.alpha.iter().enumerate() {
            if a >= ALPHA_THRESHOLD {
                bitmap.words[i / 32] |= 1 << (i % 32);
            }
        }
        bitmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn ascent(&self) -> u32 {
        self.ascent
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    #[inline]
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let i = (y * self.width + x) as usize;
        self.words[i / 32] & (1 << (i % 32)) != 0
    }

    pub fn lit_count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }
}

/// Cache of text bitmaps keyed by font then string
pub struct GlyphCache {
    rasterizer: Box<dyn FontRasterizer>,
    entries: HashMap<Font, HashMap<String, Arc<TextBitmap>>>,
}

impl std::fmt::Debug for GlyphCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl GlyphCache {
    /// Cache backed by the built-in bitmap font
    pub fn new() -> Self {
        Self::with_rasterizer(Box::new(BuiltinFont))
    }

    pub fn with_rasterizer(rasterizer: Box<dyn FontRasterizer>) -> Self {
        Self {
            rasterizer,
            entries: HashMap::new(),
        }
    }

    /// Bitmap for `text` in `font`, rasterizing on first use.
    ///
    /// A rasterizer failure is logged and cached as a blank bitmap of the
    /// string's metrics, so the label simply does not appear.
    pub fn bitmap(&mut self, text: &str, font: Font) -> Arc<TextBitmap> {
        let strings = self.entries.entry(font).or_default();
        if let Some(bitmap) = strings.get(text) {
            return Arc::clone(bitmap);
        }
        let bitmap = match self.rasterizer.rasterize(text, font) {
            Ok(image) => TextBitmap::from_image(&image),
            Err(e) => {
                log::warn!("{}; drawing blank", e);
                TextBitmap::blank(
                    self.rasterizer.string_width(text, font),
                    self.rasterizer.height(font),
                    self.rasterizer.ascent(font),
                )
            }
        };
        let bitmap = Arc::new(bitmap);
        strings.insert(text.to_owned(), Arc::clone(&bitmap));
        bitmap
    }

    pub fn string_width(&self, text: &str, font: Font) -> u32 {
        self.rasterizer.string_width(text, font)
    }

    pub fn ascent(&self, font: Font) -> u32 {
        self.rasterizer.ascent(font)
    }

    pub fn height(&self, font: Font) -> u32 {
        self.rasterizer.height(font)
    }

    /// Number of cached bitmaps
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn flush(&mut self) {
        let count = self.len();
        self.entries.clear();
        log::debug!("flushed {} text bitmaps", count);
    }
}

impl Default for GlyphCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Blit `bitmap` with its baseline at `y` and left edge at `x`, all at depth
/// `z`. With a `background`, unlit bitmap pixels are painted too.
pub fn draw_text(
    buf: &mut PixelBuffer,
    bitmap: &TextBitmap,
    x: i32,
    y: i32,
    z: i32,
    argb: u32,
    background: Option<u32>,
) {
    if bitmap.width == 0 || bitmap.height == 0 {
        return;
    }
    let top = y - bitmap.ascent as i32;
    let path = Visibility::of_box(
        x,
        top,
        x + bitmap.width as i32 - 1,
        top + bitmap.height as i32 - 1,
        buf.width(),
        buf.height(),
    );
    if path == Visibility::Offscreen {
        return;
    }
    for row in 0..bitmap.height {
        let py = top + row as i32;
        for col in 0..bitmap.width {
            let color = if bitmap.is_set(col, row) {
                argb
            } else if let Some(bg) = background {
                bg
            } else {
                continue;
            };
            let px = x + col as i32;
            if path == Visibility::Clipped {
                buf.plot(px, py, z, color);
            } else {
                buf.plot_in_bounds(px, py, z, color);
            }
        }
    }
}
