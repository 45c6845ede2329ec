//! Font-free glyph source.

use holdgate_core::{Glyph, GlyphSource};

/// Solid rectangles for printable ASCII except space, nothing else.
///
/// Every glyph is `width` x `height` with full coverage, sits on the baseline
/// and advances by `width + 2` pixels. Space advances without drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGlyphs {
    width: usize,
    height: usize,
}

impl BlockGlyphs {
    /// Blocks of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl Default for BlockGlyphs {
    fn default() -> Self {
        Self::new(6, 10)
    }
}

impl GlyphSource for BlockGlyphs {
    fn glyph(&self, ch: char) -> Option<Glyph> {
        if !ch.is_ascii_graphic() && ch != ' ' {
            return None;
        }

        let advance_x = ((self.width + 2) as i64) << 6;
        if ch == ' ' {
            return Some(Glyph {
                coverage: Vec::new(),
                width: 0,
                rows: 0,
                pitch: 0,
                left: 0,
                top: 0,
                advance_x,
            });
        }

        Some(Glyph {
            coverage: vec![0xFF; self.width * self.height],
            width: self.width,
            rows: self.height,
            pitch: self.width,
            left: 0,
            top: self.height as i32,
            advance_x,
        })
    }
}
