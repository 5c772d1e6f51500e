/// Seuil HSP au-delà duquel une couleur est perçue comme claire.
pub const LIGHTNESS_THRESHOLD: f64 = 130.0;

/// BT.601 luma in 16-bit fixed point, rounded. Range [0, 255].
///
/// # Example
/// ```
/// use pg_core::color::luma_bt601;
/// assert_eq!(luma_bt601(0, 0, 0), 0);
/// assert_eq!(luma_bt601(255, 255, 255), 255);
/// ```
#[inline(always)]
#[must_use]
pub fn luma_bt601(r: u8, g: u8, b: u8) -> u32 {
    (19595 * u32::from(r) + 38470 * u32::from(g) + 7471 * u32::from(b) + (1 << 15)) >> 16
}

/// Perceived brightness (HSP model): `sqrt(.299 r² + .587 g² + .114 b²)`.
#[must_use]
pub fn hsp_brightness(r: u8, g: u8, b: u8) -> f64 {
    let r = f64::from(r);
    let g = f64::from(g);
    let b = f64::from(b);
    (0.299 * r * r + 0.587 * g * g + 0.114 * b * b).sqrt()
}

/// Light/dark classification used by the byte grid. Alpha is ignored.
///
/// # Example
/// ```
/// use pg_core::color::is_light;
/// assert!(is_light(255, 255, 255));
/// assert!(!is_light(20, 20, 20));
/// ```
#[must_use]
pub fn is_light(r: u8, g: u8, b: u8) -> bool {
    hsp_brightness(r, g, b) > LIGHTNESS_THRESHOLD
}

/// Gray level with BT.709 weights, rounded up.
///
/// # Example
/// ```
/// use pg_core::color::gray_bt709;
/// assert_eq!(gray_bt709(255, 255, 255), 255);
/// assert_eq!(gray_bt709(0, 0, 0), 0);
/// ```
#[must_use]
pub fn gray_bt709(r: u8, g: u8, b: u8) -> u8 {
    let avg = 0.2125 * f64::from(r) + 0.7154 * f64::from(g) + 0.0721 * f64::from(b);
    avg.ceil().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_weights_favour_green() {
        assert!(luma_bt601(0, 255, 0) > luma_bt601(255, 0, 0));
        assert!(luma_bt601(255, 0, 0) > luma_bt601(0, 0, 255));
        assert_eq!(luma_bt601(0, 255, 0), 150);
    }

    #[test]
    fn light_and_dark_split_near_mid_gray() {
        assert!(is_light(140, 140, 140));
        assert!(!is_light(120, 120, 120));
    }
}
