use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use pg_core::error::CoreError;
use pg_core::frame::FrameBuffer;

/// Reusable RGBA resizer wrapping fast_image_resize.
///
/// Bilinear convolution; one instance per thread.
///
/// # Example
/// ```
/// use pg_core::frame::FrameBuffer;
/// use pg_source::resize::Resizer;
/// let mut r = Resizer::new();
/// let small = r.shrink(&FrameBuffer::new(200, 100), 85).unwrap();
/// assert_eq!((small.width, small.height), (30, 15));
/// ```
pub struct Resizer {
    inner: FirResizer,
    options: ResizeOptions,
    /// Owned copy of the source; fast_image_resize wants `&mut` on it.
    src_buf: Vec<u8>,
}

impl Resizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
            src_buf: Vec::new(),
        }
    }

    /// Resize `src` into `dst`; `dst`'s dimensions set the output size.
    ///
    /// # Errors
    /// Zero-sized frames or a failed resize.
    pub fn resize_into(&mut self, src: &FrameBuffer, dst: &mut FrameBuffer) -> Result<()> {
        if src.is_empty() || dst.is_empty() {
            return Err(CoreError::InvalidDimensions {
                width: dst.width,
                height: dst.height,
            }
            .into());
        }
        if src.width == dst.width && src.height == dst.height {
            dst.data.copy_from_slice(&src.data);
            return Ok(());
        }

        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);

        let src_image =
            Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8x4)
                .context("Invalid source dimensions")?;
        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data, PixelType::U8x4)
                .context("Invalid destination dimensions")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Resize failed")?;
        Ok(())
    }

    /// New frame of the given size.
    ///
    /// # Errors
    /// See [`Resizer::resize_into`].
    pub fn resize(&mut self, src: &FrameBuffer, width: u32, height: u32) -> Result<FrameBuffer> {
        let mut dst = FrameBuffer::new(width, height);
        self.resize_into(src, &mut dst)?;
        Ok(dst)
    }

    /// New frame with `percent` percent removed from each side.
    ///
    /// # Errors
    /// See [`Resizer::resize_into`].
    pub fn shrink(&mut self, src: &FrameBuffer, percent: u32) -> Result<FrameBuffer> {
        let (w, h) = shrunk_dimensions(src.width, src.height, percent);
        self.resize(src, w, h)
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Dimensions after removing `percent` percent of each side
/// (`w - percent * w / 100`, integer), never below 1.
#[must_use]
pub fn shrunk_dimensions(width: u32, height: u32, percent: u32) -> (u32, u32) {
    let p = u64::from(percent.min(100));
    let cut = |side: u32| {
        let side = u64::from(side);
        (side - p * side / 100).max(1) as u32
    };
    (cut(width), cut(height))
}

/// One-shot [`Resizer::shrink`].
///
/// # Errors
/// See [`Resizer::resize_into`].
pub fn shrink_by_percent(src: &FrameBuffer, percent: u32) -> Result<FrameBuffer> {
    Resizer::new().shrink(src, percent)
}
