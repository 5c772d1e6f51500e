/// Image sources and geometric transforms for pixglyph
/// (decode, encode, resize, rotate, tile, sparse overrides).

pub mod image;
pub mod overlay;
pub mod resize;
pub mod transform;
