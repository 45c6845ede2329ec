//! Font-backed glyph source.

use std::path::Path;

use fontdue::{Font, FontSettings};
use holdgate_core::{Glyph, GlyphSource};

use crate::error::FontError;

/// Scalable font rasterized at a fixed pixel size.
pub struct FontGlyphs {
    font: Font,
    px: f32,
}

impl FontGlyphs {
    /// Parse font data (TrueType or OpenType) for rasterization at `px`.
    ///
    /// # Errors
    ///
    /// Returns `FontError::Parse` if the data is not a usable font.
    pub fn from_bytes(data: &[u8], px: f32) -> Result<Self, FontError> {
        let settings = FontSettings { scale: px, ..FontSettings::default() };
        let font = Font::from_bytes(data, settings).map_err(FontError::Parse)?;
        Ok(Self { font, px })
    }

    /// Read and parse a font file.
    ///
    /// # Errors
    ///
    /// - `FontError::Io` if the file cannot be read
    /// - `FontError::Parse` if it is not a usable font
    pub fn load(path: &Path, px: f32) -> Result<Self, FontError> {
        let data = std::fs::read(path)
            .map_err(|source| FontError::Io { path: path.to_path_buf(), source })?;
        Self::from_bytes(&data, px)
    }

    /// Load a font, degrading to no glyphs when it is unavailable.
    ///
    /// The failure is logged once here; the rasterizer then skips every
    /// character silently.
    pub fn load_or_warn(path: &Path, px: f32) -> Option<Self> {
        match Self::load(path, px) {
            Ok(font) => {
                tracing::debug!(path = %path.display(), px, "status font loaded");
                Some(font)
            },
            Err(e) => {
                tracing::warn!(error = %e, "status text disabled");
                None
            },
        }
    }
}

impl std::fmt::Debug for FontGlyphs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontGlyphs")
            .field("glyphs", &self.font.glyph_count())
            .field("px", &self.px)
            .finish()
    }
}

impl GlyphSource for FontGlyphs {
    fn glyph(&self, ch: char) -> Option<Glyph> {
        // Index 0 is the font's "missing glyph" box
        if self.font.lookup_glyph_index(ch) == 0 {
            return None;
        }

        let (metrics, coverage) = self.font.rasterize(ch, self.px);
        Some(Glyph {
            coverage,
            width: metrics.width,
            rows: metrics.height,
            pitch: metrics.width,
            left: metrics.xmin,
            top: metrics.ymin + metrics.height as i32,
            advance_x: (metrics.advance_width * 64.0) as i64,
        })
    }
}
