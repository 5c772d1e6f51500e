/// Configuration, types, and shared structures for pixglyph.
///
/// This crate contains the pixel sampler, the glyph weight table and its
/// persisted form, the character grid, and the configuration used across the
/// pixglyph workspace.

pub mod charset;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod grid;
pub mod sample;
pub mod table;
pub mod traits;

pub use charset::BucketLut;
pub use config::PixglyphConfig;
pub use error::CoreError;
pub use frame::{FrameBuffer, GlyphBitmap};
pub use grid::CharacterGrid;
pub use sample::PixelSample;
pub use table::{GlyphMetadata, GlyphWeightTable};
