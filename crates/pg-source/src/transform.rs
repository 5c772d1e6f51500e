use anyhow::Result;
use pg_core::frame::FrameBuffer;
use rayon::prelude::*;

use crate::resize::Resizer;

/// Blend `frame` over opaque white using a constant mask `alpha`.
///
/// The result is fully opaque.
///
/// # Example
/// ```
/// use pg_core::frame::FrameBuffer;
/// use pg_source::transform::transparency;
/// let out = transparency(&FrameBuffer::filled(1, 1, [0, 0, 0, 255]), 0);
/// assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);
/// ```
#[must_use]
pub fn transparency(frame: &FrameBuffer, alpha: u8) -> FrameBuffer {
    let mut out = FrameBuffer::new(frame.width, frame.height);
    let mask = u32::from(alpha);
    for (dst, src) in out.data.chunks_exact_mut(4).zip(frame.data.chunks_exact(4)) {
        let a = u32::from(src[3]) * mask / 255;
        let mix = |c: u8| ((u32::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        dst.copy_from_slice(&[mix(src[0]), mix(src[1]), mix(src[2]), 255]);
    }
    out
}

/// Offset that centres a `w × h` rectangle inside `frame`.
#[inline]
fn centred_origin(frame: &FrameBuffer, w: u32, h: u32) -> (i64, i64) {
    (
        i64::from(frame.width / 2) - i64::from(w / 2),
        i64::from(frame.height / 2) - i64::from(h / 2),
    )
}

/// Copy `src` into `dst` at `origin`, replacing pixels. Clipped.
pub fn copy_at(dst: &mut FrameBuffer, src: &FrameBuffer, origin: (i64, i64)) {
    for y in 0..src.height {
        let ty = origin.1 + i64::from(y);
        if ty < 0 || ty >= i64::from(dst.height) {
            continue;
        }
        for x in 0..src.width {
            let tx = origin.0 + i64::from(x);
            if tx < 0 || tx >= i64::from(dst.width) {
                continue;
            }
            dst.set_pixel(tx as u32, ty as u32, src.pixel(x, y));
        }
    }
}

/// Composite `src` over `dst` at `origin` (straight alpha, Porter-Duff over). Clipped.
pub fn composite_over(dst: &mut FrameBuffer, src: &FrameBuffer, origin: (i64, i64)) {
    for y in 0..src.height {
        let ty = origin.1 + i64::from(y);
        if ty < 0 || ty >= i64::from(dst.height) {
            continue;
        }
        for x in 0..src.width {
            let tx = origin.0 + i64::from(x);
            if tx < 0 || tx >= i64::from(dst.width) {
                continue;
            }
            let s = src.pixel(x, y);
            if s[3] == 0 {
                continue;
            }
            let (tx, ty) = (tx as u32, ty as u32);
            let d = dst.pixel(tx, ty);
            dst.set_pixel(tx, ty, over(s, d));
        }
    }
}

#[inline]
fn over(s: [u8; 4], d: [u8; 4]) -> [u8; 4] {
    let sa = u32::from(s[3]);
    if sa == 255 {
        return s;
    }
    let da = u32::from(d[3]) * (255 - sa) / 255;
    let out_a = sa + da;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }
    let mix = |sc: u8, dc: u8| ((u32::from(sc) * sa + u32::from(dc) * da) / out_a) as u8;
    [mix(s[0], d[0]), mix(s[1], d[1]), mix(s[2], d[2]), out_a as u8]
}

/// Rotate `frame` by `degrees` around its centre.
///
/// The output is the rotated bounding box; uncovered corners are transparent.
/// Sampling is nearest-neighbour on the inverse mapping.
#[must_use]
pub fn rotate(frame: &FrameBuffer, degrees: f64) -> FrameBuffer {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (w, h) = (f64::from(frame.width), f64::from(frame.height));
    // Trim float noise so right angles do not grow the box by a pixel.
    let side = |v: f64| (v - 1e-9).ceil().max(1.0) as u32;
    let out_w = side(w * cos.abs() + h * sin.abs());
    let out_h = side(w * sin.abs() + h * cos.abs());
    let mut out = FrameBuffer::new(out_w, out_h);
    let (ocx, ocy) = (f64::from(out_w) / 2.0, f64::from(out_h) / 2.0);
    let (icx, icy) = (w / 2.0, h / 2.0);

    for (i, px) in out.data.chunks_exact_mut(4).enumerate() {
        let x = (i % out_w as usize) as f64 + 0.5 - ocx;
        let y = (i / out_w as usize) as f64 + 0.5 - ocy;
        let sx = (cos * x + sin * y + icx).floor();
        let sy = (-sin * x + cos * y + icy).floor();
        if sx < 0.0 || sy < 0.0 || sx >= w || sy >= h {
            continue;
        }
        px.copy_from_slice(&frame.pixel(sx as u32, sy as u32));
    }
    out
}

/// Rotate `overlay` by `degrees` and composite it centred over a copy of `base`.
#[must_use]
pub fn rotate_onto(base: &FrameBuffer, overlay: &FrameBuffer, degrees: f64) -> FrameBuffer {
    let rotated = rotate(overlay, degrees);
    let mut out = base.clone();
    let origin = centred_origin(&out, rotated.width, rotated.height);
    composite_over(&mut out, &rotated, origin);
    out
}

/// Copies of `frame` shrunk by 1, 1+step, 1+2·step, … percent (< 100).
///
/// Resized in parallel; the result is ordered from largest to smallest.
///
/// # Errors
/// Propagates resize failures.
pub fn shrunk_series(frame: &FrameBuffer, step: u32) -> Result<Vec<FrameBuffer>> {
    let step = step.max(1) as usize;
    let percents: Vec<u32> = (1..100u32).step_by(step).collect();
    log::debug!("{} copies réduites (pas {step}%)", percents.len());
    percents
        .par_iter()
        .map_init(Resizer::new, |resizer, &p| resizer.shrink(frame, p))
        .collect()
}

/// "Infinite" tile: nested shrunk copies drawn centred over the base,
/// from largest to smallest.
///
/// # Errors
/// Propagates resize failures.
pub fn tile(frame: &FrameBuffer, step: u32) -> Result<FrameBuffer> {
    let copies = shrunk_series(frame, step)?;
    let mut out = frame.clone();
    for copy in &copies {
        let origin = centred_origin(&out, copy.width, copy.height);
        copy_at(&mut out, copy, origin);
    }
    Ok(out)
}

/// Spiral: shrunk copies (step `angle` percent), the i-th rotated by
/// `i + angle` degrees and composited over the accumulated image.
///
/// # Errors
/// Propagates resize failures.
pub fn spiral(frame: &FrameBuffer, angle: u32) -> Result<FrameBuffer> {
    let copies = shrunk_series(frame, angle)?;
    let mut out = frame.clone();
    for (i, copy) in copies.iter().enumerate() {
        out = rotate_onto(&out, copy, f64::from(i as u32 + angle));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparency_full_alpha_keeps_opaque_source() {
        let src = FrameBuffer::filled(2, 2, [40, 80, 120, 255]);
        assert_eq!(transparency(&src, 255), src);
    }

    #[test]
    fn transparency_half_alpha_lightens() {
        let out = transparency(&FrameBuffer::filled(1, 1, [0, 0, 0, 255]), 128);
        let [r, g, b, a] = out.pixel(0, 0);
        assert_eq!(a, 255);
        assert!(r == g && g == b && (120..=135).contains(&r));
    }

    #[test]
    fn rotate_zero_is_identity() {
        let mut src = FrameBuffer::new(4, 3);
        src.set_pixel(0, 0, [255, 0, 0, 255]);
        src.set_pixel(3, 2, [0, 255, 0, 255]);
        assert_eq!(rotate(&src, 0.0), src);
    }

    #[test]
    fn rotate_quarter_swaps_sides() {
        let out = rotate(&FrameBuffer::filled(6, 2, [1, 2, 3, 255]), 90.0);
        assert_eq!((out.width, out.height), (2, 6));
        assert_eq!(out.pixel(1, 3), [1, 2, 3, 255]);
    }

    #[test]
    fn rotate_onto_keeps_base_size() {
        let base = FrameBuffer::filled(20, 20, [0, 0, 0, 255]);
        let overlay = FrameBuffer::filled(8, 8, [255, 255, 255, 255]);
        let out = rotate_onto(&base, &overlay, 45.0);
        assert_eq!((out.width, out.height), (20, 20));
        assert_eq!(out.pixel(10, 10), [255, 255, 255, 255]);
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn shrunk_series_orders_largest_first() {
        let copies = shrunk_series(&FrameBuffer::new(100, 100), 25).unwrap();
        let widths: Vec<u32> = copies.iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![99, 74, 49, 24]);
    }

    #[test]
    fn tile_draws_smallest_copy_in_the_centre() {
        let mut src = FrameBuffer::filled(50, 50, [200, 200, 200, 255]);
        src.set_pixel(0, 0, [255, 0, 0, 255]);
        let out = tile(&src, 10).unwrap();
        assert_eq!((out.width, out.height), (50, 50));
        assert_eq!(out.pixel(25, 25)[3], 255);
    }

    #[test]
    fn spiral_keeps_dimensions() {
        let out = spiral(&FrameBuffer::filled(30, 20, [10, 20, 30, 255]), 20).unwrap();
        assert_eq!((out.width, out.height), (30, 20));
    }

    #[test]
    fn composite_over_transparent_source_is_noop() {
        let mut dst = FrameBuffer::filled(2, 2, [5, 5, 5, 255]);
        composite_over(&mut dst, &FrameBuffer::new(2, 2), (0, 0));
        assert_eq!(dst, FrameBuffer::filled(2, 2, [5, 5, 5, 255]));
    }
}
