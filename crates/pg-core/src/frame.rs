use crate::color::luma_bt601;
use crate::error::CoreError;

/// Buffer de pixels décodé. Immuable une fois partagé entre workers.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel.
///
/// # Example
/// ```
/// use pg_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer transparent aux dimensions données.
    ///
    /// # Example
    /// ```
    /// use pg_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(100, 50);
    /// assert_eq!(fb.width, 100);
    /// assert_eq!(fb.height, 50);
    /// assert_eq!(fb.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Crée un buffer rempli d'une couleur unie.
    ///
    /// # Example
    /// ```
    /// use pg_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(2, 2, [255, 0, 0, 255]);
    /// assert_eq!(fb.pixel(1, 1), [255, 0, 0, 255]);
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut fb = Self::new(width, height);
        for px in fb.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        fb
    }

    /// Wrap a raw RGBA buffer, checking it matches the dimensions.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if either side is zero or the
    /// buffer length is not `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize * 4 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// `true` si le buffer n'a aucun pixel ou des dimensions incohérentes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0
            || self.height == 0
            || self.data.len() != self.width as usize * self.height as usize * 4
    }

    #[inline(always)]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Accès au pixel (x, y) → [r, g, b, a]. Hors bornes → transparent.
    ///
    /// # Example
    /// ```
    /// use pg_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(10, 10);
    /// assert_eq!(fb.pixel(0, 0), [0, 0, 0, 0]);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let idx = self.index(x, y);
        match self.data.get(idx..idx + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0, 0, 0, 0],
        }
    }

    /// Écrit un pixel. Hors bornes → ignoré.
    #[inline(always)]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        if let Some(px) = self.data.get_mut(idx..idx + 4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Luma BT.601 du pixel (x, y).
    ///
    /// # Example
    /// ```
    /// use pg_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(1, 1, [255, 255, 255, 255]);
    /// assert_eq!(fb.luminance(0, 0), 255);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn luminance(&self, x: u32, y: u32) -> u32 {
        let [r, g, b, _] = self.pixel(x, y);
        luma_bt601(r, g, b)
    }
}

/// Coverage bitmap of a single glyph cell, one byte per pixel (0 = paper, 255 = ink).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphBitmap {
    /// Cell width.
    pub width: u32,
    /// Cell height.
    pub height: u32,
    /// Row-major coverage.
    pub coverage: Vec<u8>,
}

impl GlyphBitmap {
    /// Blank cell.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            coverage: vec![0u8; width as usize * height as usize],
        }
    }

    /// Paint coverage at a signed position, keeping the max. Outside → clipped.
    #[inline(always)]
    pub fn paint(&mut self, x: i32, y: i32, value: u8) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        if let Some(slot) = self.coverage.get_mut(idx) {
            *slot = (*slot).max(value);
        }
    }

    /// Coverage at (x, y), 0 outside.
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.coverage
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .unwrap_or(0)
    }

    /// `true` if no pixel carries ink.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.coverage.iter().all(|&v| v == 0)
    }

    /// Opaque RGBA rendering: `ink` blended over `paper` by coverage.
    ///
    /// # Example
    /// ```
    /// use pg_core::frame::GlyphBitmap;
    /// let mut g = GlyphBitmap::new(2, 1);
    /// g.paint(1, 0, 255);
    /// let fb = g.to_frame([255, 255, 255], [0, 0, 0]);
    /// assert_eq!(fb.pixel(0, 0), [0, 0, 0, 255]);
    /// assert_eq!(fb.pixel(1, 0), [255, 255, 255, 255]);
    /// ```
    #[must_use]
    pub fn to_frame(&self, ink: [u8; 3], paper: [u8; 3]) -> FrameBuffer {
        let mut fb = FrameBuffer::new(self.width, self.height);
        for (px, &cov) in fb.data.chunks_exact_mut(4).zip(&self.coverage) {
            let [r, g, b] = blend(ink, paper, cov);
            px.copy_from_slice(&[r, g, b, 255]);
        }
        fb
    }
}

/// `ink * a + paper * (1 - a)` per channel, with `a = coverage / 255`.
#[inline(always)]
#[must_use]
pub fn blend(ink: [u8; 3], paper: [u8; 3], coverage: u8) -> [u8; 3] {
    let a = u32::from(coverage);
    let mix = |i: u8, p: u8| ((u32::from(i) * a + u32::from(p) * (255 - a) + 127) / 255) as u8;
    [mix(ink[0], paper[0]), mix(ink[1], paper[1]), mix(ink[2], paper[2])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_rejects_short_buffers() {
        assert!(FrameBuffer::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(FrameBuffer::from_rgba(0, 2, Vec::new()).is_err());
        assert!(FrameBuffer::from_rgba(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn set_pixel_out_of_bounds_is_ignored() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.set_pixel(5, 5, [1, 2, 3, 4]);
        fb.set_pixel(1, 0, [1, 2, 3, 4]);
        assert_eq!(fb.pixel(1, 0), [1, 2, 3, 4]);
        assert_eq!(fb.pixel(5, 5), [0, 0, 0, 0]);
    }

    #[test]
    fn glyph_paint_clips_and_keeps_max() {
        let mut g = GlyphBitmap::new(3, 3);
        g.paint(-1, 0, 200);
        g.paint(3, 3, 200);
        g.paint(1, 1, 100);
        g.paint(1, 1, 50);
        assert_eq!(g.get(1, 1), 100);
        assert_eq!(g.coverage.iter().filter(|&&v| v > 0).count(), 1);
    }

    #[test]
    fn blend_half_coverage_is_midpoint() {
        assert_eq!(blend([255, 255, 255], [0, 0, 0], 128), [128, 128, 128]);
        assert_eq!(blend([10, 20, 30], [200, 200, 200], 0), [200, 200, 200]);
    }
}
