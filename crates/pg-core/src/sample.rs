use crate::color::{is_light, luma_bt601};
use crate::error::CoreError;
use crate::frame::FrameBuffer;

/// One decoded pixel with its derived brightness data.
///
/// Produced in bulk by [`sample_frame`], never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelSample {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Raw RGBA value.
    pub color: [u8; 4],
    /// BT.601 luma, [0, 255].
    pub luminance_weight: u32,
    /// Perceived as light (HSP model).
    pub is_light: bool,
    /// Complement of `is_light`.
    pub is_dark: bool,
}

impl PixelSample {
    /// Derive a sample from a pixel value.
    ///
    /// # Example
    /// ```
    /// use pg_core::sample::PixelSample;
    /// let s = PixelSample::new(3, 4, [255, 255, 255, 255]);
    /// assert_eq!(s.luminance_weight, 255);
    /// assert!(s.is_light && !s.is_dark);
    /// ```
    #[must_use]
    pub fn new(x: u32, y: u32, color: [u8; 4]) -> Self {
        let [r, g, b, _] = color;
        let light = is_light(r, g, b);
        Self {
            x,
            y,
            color,
            luminance_weight: luma_bt601(r, g, b),
            is_light: light,
            is_dark: !light,
        }
    }
}

/// Walk a frame row-major (y outer, x inner) and produce one sample per pixel.
///
/// Row-major order is a contract: consumers detect row boundaries from runs
/// of equal `y` without knowing the width.
///
/// # Errors
/// Returns [`CoreError::InvalidDimensions`] for an empty or inconsistent frame.
///
/// # Example
/// ```
/// use pg_core::frame::FrameBuffer;
/// use pg_core::sample::sample_frame;
/// let samples = sample_frame(&FrameBuffer::new(3, 2)).unwrap();
/// assert_eq!(samples.len(), 6);
/// assert_eq!((samples[3].x, samples[3].y), (0, 1));
/// ```
pub fn sample_frame(frame: &FrameBuffer) -> Result<Vec<PixelSample>, CoreError> {
    if frame.is_empty() {
        return Err(CoreError::InvalidDimensions {
            width: frame.width,
            height: frame.height,
        });
    }
    let mut samples = Vec::with_capacity(frame.width as usize * frame.height as usize);
    for (i, px) in frame.data.chunks_exact(4).enumerate() {
        let x = (i % frame.width as usize) as u32;
        let y = (i / frame.width as usize) as u32;
        samples.push(PixelSample::new(x, y, [px[0], px[1], px[2], px[3]]));
    }
    Ok(samples)
}

/// Sum of the luminance weights of every sample.
#[must_use]
pub fn total_luminance(samples: &[PixelSample]) -> u64 {
    samples.iter().map(|s| u64::from(s.luminance_weight)).sum()
}
