use std::collections::HashMap;
use std::sync::Arc;

use pg_core::frame::FrameBuffer;

/// Read-only base raster plus a sparse per-pixel override layer.
///
/// Lookups consult the override first, then the base. The base is shared
/// (`Arc`) and never written; each composite owns only its overrides.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use pg_core::frame::FrameBuffer;
/// use pg_source::overlay::OverlayFrame;
///
/// let base = Arc::new(FrameBuffer::filled(2, 1, [10, 10, 10, 255]));
/// let mut layer = OverlayFrame::new(Arc::clone(&base));
/// layer.set(1, 0, [200, 0, 0, 255]);
/// assert_eq!(layer.pixel(0, 0), [10, 10, 10, 255]);
/// assert_eq!(layer.pixel(1, 0), [200, 0, 0, 255]);
/// assert_eq!(base.pixel(1, 0), [10, 10, 10, 255]);
/// ```
#[derive(Clone, Debug)]
pub struct OverlayFrame {
    base: Arc<FrameBuffer>,
    overrides: HashMap<(u32, u32), [u8; 4]>,
}

impl OverlayFrame {
    #[must_use]
    pub fn new(base: Arc<FrameBuffer>) -> Self {
        Self {
            base,
            overrides: HashMap::new(),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.base.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.base.height
    }

    /// Override one pixel. Out of bounds is ignored.
    pub fn set(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x < self.base.width && y < self.base.height {
            self.overrides.insert((x, y), rgba);
        }
    }

    /// Effective pixel: override if present, base otherwise.
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        match self.overrides.get(&(x, y)) {
            Some(px) => *px,
            None => self.base.pixel(x, y),
        }
    }

    /// Number of overridden pixels.
    #[must_use]
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    /// Dense frame with every override applied.
    #[must_use]
    pub fn flatten(&self) -> FrameBuffer {
        let mut out = (*self.base).clone();
        for (&(x, y), &px) in &self.overrides {
            out.set_pixel(x, y, px);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_applies_overrides_only() {
        let base = Arc::new(FrameBuffer::filled(3, 3, [1, 1, 1, 255]));
        let mut layer = OverlayFrame::new(Arc::clone(&base));
        layer.set(0, 0, [9, 9, 9, 255]);
        layer.set(2, 2, [8, 8, 8, 255]);
        layer.set(5, 5, [7, 7, 7, 255]);
        assert_eq!(layer.override_count(), 2);
        assert_eq!((layer.width(), layer.height()), (3, 3));

        let flat = layer.flatten();
        assert_eq!(flat.pixel(0, 0), [9, 9, 9, 255]);
        assert_eq!(flat.pixel(1, 1), [1, 1, 1, 255]);
        assert_eq!(flat.pixel(2, 2), [8, 8, 8, 255]);
        assert_eq!(*base, FrameBuffer::filled(3, 3, [1, 1, 1, 255]));
    }

    #[test]
    fn later_override_wins() {
        let mut layer = OverlayFrame::new(Arc::new(FrameBuffer::new(1, 1)));
        layer.set(0, 0, [1, 0, 0, 255]);
        layer.set(0, 0, [2, 0, 0, 255]);
        assert_eq!(layer.pixel(0, 0), [2, 0, 0, 255]);
    }
}
