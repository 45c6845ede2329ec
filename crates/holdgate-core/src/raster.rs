//! Status text rasterization.
//!
//! Draws one line of text into a BGRA frame that the host submits to the
//! client display as a full-frame bitmap. Glyph shapes come from a
//! [`GlyphSource`]; the rasterizer only places and composites them.
//!
//! # Pixel format
//!
//! Covered pixels get the coverage value in B, G and R (grayscale text) and an
//! alpha byte of `0x00`. Uncovered pixels stay zero. This matches what the
//! proxy's display surface expects for the pre-session screen.

use crate::{config::ScreenSize, error::RenderError};

/// Horizontal pen origin in pixels.
pub const PEN_ORIGIN_X: i32 = 100;

/// Bytes per BGRA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// One rasterized character.
///
/// Produced transiently by a [`GlyphSource`] and consumed immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    /// Coverage bitmap, `rows` rows of `pitch` bytes
    pub coverage: Vec<u8>,
    /// Covered columns per row
    pub width: usize,
    /// Number of rows
    pub rows: usize,
    /// Bytes between the starts of consecutive rows
    pub pitch: usize,
    /// Offset from the pen to the bitmap's left edge
    pub left: i32,
    /// Offset from the baseline up to the bitmap's top edge
    pub top: i32,
    /// Pen advance in 26.6 fixed point
    pub advance_x: i64,
}

impl Glyph {
    /// Pen advance in whole pixels, truncated.
    pub fn advance_px(&self) -> i64 {
        self.advance_x >> 6
    }
}

/// Supplier of glyph bitmaps.
pub trait GlyphSource {
    /// Rasterize `ch`. `None` when the source has no glyph for it.
    fn glyph(&self, ch: char) -> Option<Glyph>;
}

impl<G: GlyphSource + ?Sized> GlyphSource for &G {
    fn glyph(&self, ch: char) -> Option<Glyph> {
        (**self).glyph(ch)
    }
}

/// An absent source has no glyphs, so every character is skipped.
impl<G: GlyphSource> GlyphSource for Option<G> {
    fn glyph(&self, ch: char) -> Option<Glyph> {
        self.as_ref().and_then(|source| source.glyph(ch))
    }
}

/// Full-frame bitmap in the layout the host display call takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceBitmap<'a> {
    /// Left edge of the updated rectangle
    pub x0: u32,
    /// Top edge of the updated rectangle
    pub y0: u32,
    /// Right edge (exclusive)
    pub x1: u32,
    /// Bottom edge (exclusive)
    pub y1: u32,
    /// Always 32
    pub bits_per_pixel: u32,
    /// Bitmap width in pixels
    pub width: u32,
    /// Bitmap height in pixels
    pub height: u32,
    /// BGRA pixel data, `width * height * 4` bytes
    pub data: &'a [u8],
}

/// BGRA pixel buffer for one status frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    /// Allocate a zeroed frame.
    ///
    /// # Errors
    ///
    /// - `RenderError::Oversized` if the byte length overflows `usize`
    /// - `RenderError::Allocation` if the allocator refuses the buffer
    pub fn try_new(size: ScreenSize) -> Result<Self, RenderError> {
        let ScreenSize { width, height } = size;
        let bytes = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
            .ok_or(RenderError::Oversized { width, height })?;

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(bytes).map_err(|_| RenderError::Allocation { bytes })?;
        pixels.resize(bytes, 0);

        Ok(Self { width, height, pixels })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw BGRA bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// BGRA value at `(x, y)`. `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = self.pixels.get(offset..offset + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// View the whole frame as a submit-ready bitmap.
    pub fn as_bitmap(&self) -> SurfaceBitmap<'_> {
        SurfaceBitmap {
            x0: 0,
            y0: 0,
            x1: self.width,
            y1: self.height,
            bits_per_pixel: 32,
            width: self.width,
            height: self.height,
            data: &self.pixels,
        }
    }

    fn put_gray(&mut self, x: i64, y: i64, gray: u8) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        if let Some(px) = self.pixels.get_mut(offset..offset + BYTES_PER_PIXEL) {
            px.copy_from_slice(&[gray, gray, gray, 0x00]);
        }
    }
}

/// Draw `text` on a single line starting at `(100, height / 2)`.
///
/// Characters the source cannot rasterize are skipped and do not move the
/// pen. Pixels that fall outside the frame are clipped individually; the pen
/// itself is never clamped, so long text simply runs off the right edge.
pub fn render_text<G: GlyphSource + ?Sized>(frame: &mut FrameBuffer, glyphs: &G, text: &str) {
    let mut pen_x = i64::from(PEN_ORIGIN_X);
    let pen_y = i64::from(frame.height / 2);

    for ch in text.chars() {
        let Some(glyph) = glyphs.glyph(ch) else {
            tracing::trace!(?ch, "no glyph, skipping");
            continue;
        };

        for row in 0..glyph.rows {
            let y = pen_y - i64::from(glyph.top) + row as i64;
            for col in 0..glyph.width {
                let Some(&gray) = glyph.coverage.get(row * glyph.pitch + col) else {
                    continue;
                };
                let x = pen_x + i64::from(glyph.left) + col as i64;
                frame.put_gray(x, y, gray);
            }
        }

        pen_x += glyph.advance_px();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Solid 2x3 box for every ASCII letter, nothing else.
    struct Boxes;

    impl GlyphSource for Boxes {
        fn glyph(&self, ch: char) -> Option<Glyph> {
            ch.is_ascii_alphabetic().then(|| Glyph {
                coverage: vec![0xAA; 6],
                width: 2,
                rows: 3,
                pitch: 2,
                left: 1,
                top: 3,
                advance_x: 10 << 6,
            })
        }
    }

    fn screen(width: u32, height: u32) -> ScreenSize {
        ScreenSize { width, height }
    }

    #[test]
    fn composites_grayscale_with_zero_alpha() {
        let mut frame = FrameBuffer::try_new(screen(200, 20)).unwrap();
        render_text(&mut frame, &Boxes, "a");

        // Pen (100, 10): box spans x 101..103, y 7..10
        assert_eq!(frame.pixel(101, 7), Some([0xAA, 0xAA, 0xAA, 0x00]));
        assert_eq!(frame.pixel(102, 9), Some([0xAA, 0xAA, 0xAA, 0x00]));
        assert_eq!(frame.pixel(100, 7), Some([0, 0, 0, 0]));
        assert_eq!(frame.pixel(101, 10), Some([0, 0, 0, 0]));
    }

    #[test]
    fn missing_glyph_does_not_advance_pen() {
        let mut with_gap = FrameBuffer::try_new(screen(200, 20)).unwrap();
        render_text(&mut with_gap, &Boxes, "a1b");

        let mut without_gap = FrameBuffer::try_new(screen(200, 20)).unwrap();
        render_text(&mut without_gap, &Boxes, "ab");

        assert_eq!(with_gap, without_gap);
        // Second box sits one advance (10 px) right of the first
        assert_eq!(with_gap.pixel(111, 7), Some([0xAA, 0xAA, 0xAA, 0x00]));
    }

    #[test]
    fn clips_glyphs_off_screen() {
        // Pen starts at x = 100, past the right edge of a 50 px frame
        let mut frame = FrameBuffer::try_new(screen(50, 4)).unwrap();
        render_text(&mut frame, &Boxes, "abc");
        assert!(frame.pixels().iter().all(|&b| b == 0));

        // Glyph partly above the top edge: height 2 puts pen_y at 1, top rows clip
        let mut frame = FrameBuffer::try_new(screen(120, 2)).unwrap();
        render_text(&mut frame, &Boxes, "a");
        assert_eq!(frame.pixel(101, 0), Some([0xAA, 0xAA, 0xAA, 0x00]));
        assert_eq!(frame.pixel(101, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn absent_source_draws_nothing() {
        let mut frame = FrameBuffer::try_new(screen(200, 20)).unwrap();
        render_text(&mut frame, &None::<Boxes>, "abc");
        assert!(frame.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn bitmap_covers_whole_frame() {
        let frame = FrameBuffer::try_new(screen(8, 4)).unwrap();
        let bitmap = frame.as_bitmap();
        assert_eq!((bitmap.x0, bitmap.y0, bitmap.x1, bitmap.y1), (0, 0, 8, 4));
        assert_eq!(bitmap.bits_per_pixel, 32);
        assert_eq!(bitmap.data.len(), 8 * 4 * 4);
    }

    #[test]
    fn advance_truncates_fixed_point() {
        let glyph = Glyph {
            coverage: vec![],
            width: 0,
            rows: 0,
            pitch: 0,
            left: 0,
            top: 0,
            advance_x: (7 << 6) + 63,
        };
        assert_eq!(glyph.advance_px(), 7);
    }
}
