use std::sync::Arc;

use pg_core::color::gray_bt709;
use pg_core::frame::FrameBuffer;
use pg_core::traits::Recolor;
use pg_source::overlay::OverlayFrame;
use rayon::prelude::*;

/// Shift one channel by the tint factor: a zero channel saturates to 255,
/// any other value is lowered by `factor` (floored at 0).
#[inline(always)]
#[must_use]
pub fn tint_channel(c: u8, factor: u8) -> u8 {
    if c == 0 { 255 } else { c.saturating_sub(factor) }
}

/// Tint a whole pixel. Alpha is kept.
#[inline(always)]
#[must_use]
pub fn tint_pixel([r, g, b, a]: [u8; 4], factor: u8) -> [u8; 4] {
    [
        tint_channel(r, factor),
        tint_channel(g, factor),
        tint_channel(b, factor),
        a,
    ]
}

/// BT.709 gray, opaque. Ignores the factor.
#[derive(Clone, Copy, Debug, Default)]
pub struct Grayscale;

impl Recolor for Grayscale {
    fn apply(&self, input: &FrameBuffer, _factor: u8) -> FrameBuffer {
        let mut out = input.clone();
        out.data.par_chunks_exact_mut(4).for_each(|px| {
            let v = gray_bt709(px[0], px[1], px[2]);
            px.copy_from_slice(&[v, v, v, 255]);
        });
        out
    }

    fn name(&self) -> &'static str {
        "grayscale"
    }
}

/// RGB channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

/// Drops one channel and tints the pixel, on the `(x + y) % 2 == 0`
/// checkerboard only. Other pixels are untouched.
///
/// The checkerboard is written to an [`OverlayFrame`] over the shared input.
#[derive(Clone, Copy, Debug)]
pub struct ChannelTint {
    pub channel: Channel,
}

impl ChannelTint {
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

impl Recolor for ChannelTint {
    fn apply(&self, input: &FrameBuffer, factor: u8) -> FrameBuffer {
        let mut layer = OverlayFrame::new(Arc::new(input.clone()));
        let dropped = self.channel.index();
        for y in 0..layer.height() {
            for x in (y % 2..layer.width()).step_by(2) {
                let mut px = layer.pixel(x, y);
                px[dropped] = 0;
                layer.set(x, y, tint_pixel(px, factor));
            }
        }
        log::trace!("{}: {} pixels modifiés", self.name(), layer.override_count());
        layer.flatten()
    }

    fn name(&self) -> &'static str {
        match self.channel {
            Channel::Red => "tint_red",
            Channel::Green => "tint_green",
            Channel::Blue => "tint_blue",
        }
    }
}

/// Tints every pixel without dropping a channel.
#[derive(Clone, Copy, Debug, Default)]
pub struct TintComposite;

impl Recolor for TintComposite {
    fn apply(&self, input: &FrameBuffer, factor: u8) -> FrameBuffer {
        let mut out = input.clone();
        out.data.par_chunks_exact_mut(4).for_each(|px| {
            let tinted = tint_pixel([px[0], px[1], px[2], px[3]], factor);
            px.copy_from_slice(&tinted);
        });
        out
    }

    fn name(&self) -> &'static str {
        "tint_composite"
    }
}

/// Filter registered under `name` (the value of [`Recolor::name`]).
#[must_use]
pub fn recolor_by_name(name: &str) -> Option<Box<dyn Recolor>> {
    match name {
        "grayscale" => Some(Box::new(Grayscale)),
        "tint_red" => Some(Box::new(ChannelTint::new(Channel::Red))),
        "tint_green" => Some(Box::new(ChannelTint::new(Channel::Green))),
        "tint_blue" => Some(Box::new(ChannelTint::new(Channel::Blue))),
        "tint_composite" => Some(Box::new(TintComposite)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tint_channel_rules() {
        assert_eq!(tint_channel(0, 40), 255);
        assert_eq!(tint_channel(100, 40), 60);
        assert_eq!(tint_channel(30, 40), 0);
        assert_eq!(tint_channel(200, 0), 200);
    }

    #[test]
    fn grayscale_is_gray_and_opaque() {
        let out = Grayscale.apply(&FrameBuffer::filled(2, 2, [200, 10, 50, 90]), 0);
        let [r, g, b, a] = out.pixel(1, 1);
        assert!(r == g && g == b);
        assert_eq!(a, 255);
        assert_eq!(r, gray_bt709(200, 10, 50));
    }

    #[test]
    fn red_tint_only_on_checkerboard() {
        let input = FrameBuffer::filled(3, 2, [100, 100, 100, 255]);
        let out = ChannelTint::new(Channel::Red).apply(&input, 30);
        assert_eq!(out.pixel(0, 0), [255, 70, 70, 255]);
        assert_eq!(out.pixel(1, 0), [100, 100, 100, 255]);
        assert_eq!(out.pixel(1, 1), [255, 70, 70, 255]);
        assert_eq!(out.pixel(0, 1), [100, 100, 100, 255]);
        assert_eq!(input.pixel(0, 0), [100, 100, 100, 255]);
    }

    #[test]
    fn blue_tint_drops_blue() {
        let out = ChannelTint::new(Channel::Blue).apply(&FrameBuffer::filled(1, 1, [50, 60, 70, 128]), 10);
        assert_eq!(out.pixel(0, 0), [40, 50, 255, 128]);
    }

    #[test]
    fn composite_tints_every_pixel() {
        let out = TintComposite.apply(&FrameBuffer::filled(2, 1, [0, 20, 40, 255]), 20);
        assert_eq!(out.pixel(0, 0), [255, 0, 20, 255]);
        assert_eq!(out.pixel(1, 0), [255, 0, 20, 255]);
    }

    #[test]
    fn names_round_trip() {
        for name in ["grayscale", "tint_red", "tint_green", "tint_blue", "tint_composite"] {
            assert_eq!(recolor_by_name(name).map(|f| f.name()), Some(name));
        }
        assert!(recolor_by_name("sepia").is_none());
    }
}
