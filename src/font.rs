//! Fixed-width bitmap fonts used to draw placeholder labels
//!
//! Uses the Spleen bitmap font family. Any other pre-rasterized font can be
//! plugged in by implementing [`BitmapFont`].

use anyhow::{anyhow, Result};
use spleen_font::{PSF2Font, FONT_12X24, FONT_6X12, FONT_8X16};

/// Bounding box of a glyph run, relative to the baseline origin of the first glyph.
///
/// `min_y` is negative for glyphs that rise above the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TextBounds {
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }
}

/// A single rasterized glyph, row-major, `true` for ink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub width: u32,
    pub height: u32,
    pub bits: Vec<bool>,
}

impl Glyph {
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[(y * self.width + x) as usize]
    }
}

/// Metrics and glyph source for a fixed-width bitmap font
pub trait BitmapFont {
    /// Horizontal advance of every character
    fn advance(&self) -> u32;

    /// Pixels above the baseline
    fn ascent(&self) -> u32;

    /// Pixels below the baseline
    fn descent(&self) -> u32;

    /// Standard line height
    fn line_height(&self) -> u32 {
        self.ascent() + self.descent()
    }

    /// Rasterize a character. The glyph's top row sits `ascent` pixels above the baseline.
    fn glyph(&self, ch: char) -> Option<Glyph>;

    /// Measure a single line of text
    fn bound_string(&self, text: &str) -> TextBounds {
        let chars = text.chars().count() as i32;
        if chars == 0 {
            return TextBounds::default();
        }

        TextBounds {
            min_x: 0,
            min_y: -(self.ascent() as i32),
            max_x: chars * self.advance() as i32,
            max_y: self.descent() as i32,
        }
    }
}

/// Available sizes of the built-in Spleen font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpleenSize {
    /// 6x12 cells
    #[default]
    Small,
    /// 8x16 cells
    Medium,
    /// 12x24 cells
    Large,
}

impl SpleenSize {
    fn data(self) -> &'static [u8] {
        match self {
            SpleenSize::Small => FONT_6X12,
            SpleenSize::Medium => FONT_8X16,
            SpleenSize::Large => FONT_12X24,
        }
    }

    /// Cell width, cell height and descent below the baseline
    fn cell(self) -> (u32, u32, u32) {
        match self {
            SpleenSize::Small => (6, 12, 2),
            SpleenSize::Medium => (8, 16, 3),
            SpleenSize::Large => (12, 24, 5),
        }
    }
}

/// Characters rasterized when a [`SpleenFont`] is loaded
const GLYPH_RANGE: std::ops::RangeInclusive<char> = ' '..='~';

/// Spleen bitmap font of a fixed size, with printable ASCII pre-rasterized
#[derive(Debug, Clone)]
pub struct SpleenFont {
    size: SpleenSize,
    glyphs: Vec<Option<Glyph>>,
}

impl SpleenFont {
    pub fn new(size: SpleenSize) -> Result<Self> {
        let mut spleen = PSF2Font::new(size.data())
            .map_err(|e| anyhow!("Failed to load Spleen {:?} font: {:?}", size, e))?;
        let (width, height, _) = size.cell();

        let glyphs = GLYPH_RANGE
            .map(|ch| {
                let utf8 = ch.to_string();
                let rows = spleen.glyph_for_utf8(utf8.as_bytes())?;

                let mut bits = vec![false; (width * height) as usize];
                for (row_y, row) in rows.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if row_y < height as usize && col_x < width as usize {
                            bits[row_y * width as usize + col_x] = on;
                        }
                    }
                }

                Some(Glyph {
                    width,
                    height,
                    bits,
                })
            })
            .collect();

        Ok(Self { size, glyphs })
    }

    pub fn size(&self) -> SpleenSize {
        self.size
    }
}

impl BitmapFont for SpleenFont {
    fn advance(&self) -> u32 {
        self.size.cell().0
    }

    fn ascent(&self) -> u32 {
        let (_, height, descent) = self.size.cell();
        height - descent
    }

    fn descent(&self) -> u32 {
        self.size.cell().2
    }

    fn glyph(&self, ch: char) -> Option<Glyph> {
        if !GLYPH_RANGE.contains(&ch) {
            return None;
        }
        let index = ch as usize - *GLYPH_RANGE.start() as usize;
        self.glyphs.get(index)?.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spleen_metrics() {
        for (size, advance, line_height) in [
            (SpleenSize::Small, 6, 12),
            (SpleenSize::Medium, 8, 16),
            (SpleenSize::Large, 12, 24),
        ] {
            let font = SpleenFont::new(size).unwrap();
            assert_eq!(font.advance(), advance);
            assert_eq!(font.line_height(), line_height);
            assert_eq!(font.ascent() + font.descent(), line_height);
        }
    }

    #[test]
    fn test_bound_string_is_fixed_width() {
        let font = SpleenFont::new(SpleenSize::Small).unwrap();
        let bounds = font.bound_string("640 x 480");

        assert_eq!(bounds.min_x, 0);
        assert_eq!(bounds.width(), 9 * 6);
        assert_eq!(bounds.height(), 12);
        assert_eq!(bounds.min_y, -10);
    }

    #[test]
    fn test_bound_string_empty() {
        let font = SpleenFont::new(SpleenSize::Medium).unwrap();
        let bounds = font.bound_string("");
        assert_eq!(bounds.width(), 0);
        assert_eq!(bounds.height(), 0);
    }

    #[test]
    fn test_label_characters_have_ink() {
        let font = SpleenFont::new(SpleenSize::Small).unwrap();
        for ch in "0123456789x".chars() {
            let glyph = font.glyph(ch).unwrap_or_else(|| panic!("missing glyph {ch:?}"));
            assert_eq!((glyph.width, glyph.height), (6, 12));
            assert!(glyph.bits.iter().any(|&on| on), "glyph {ch:?} is blank");
        }

        let space = font.glyph(' ').unwrap();
        assert!(space.bits.iter().all(|&on| !on));
    }

    #[test]
    fn test_glyphs_are_cached_per_font() {
        let font = SpleenFont::new(SpleenSize::Medium).unwrap();
        assert_eq!(font.glyphs.len(), 95);

        let first = font.glyph('8').unwrap();
        assert_eq!((first.width, first.height), (8, 16));
        assert_eq!(font.glyph('8'), Some(first));
        assert!(font.glyph('~').is_some());

        // Only printable ASCII is loaded
        assert_eq!(font.glyph('é'), None);
        assert_eq!(font.glyph('\n'), None);
    }

    #[test]
    fn test_glyph_is_set_out_of_range() {
        let glyph = Glyph {
            width: 2,
            height: 1,
            bits: vec![true, false],
        };
        assert!(glyph.is_set(0, 0));
        assert!(!glyph.is_set(1, 0));
        assert!(!glyph.is_set(2, 0));
        assert!(!glyph.is_set(0, 1));
    }
}
