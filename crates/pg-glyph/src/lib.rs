/// Glyph faces, glyph weight table construction, luminance mapping, and
/// character grid re-rasterization.

pub mod builder;
pub mod face;
pub mod mapper;
pub mod rasterizer;

pub use builder::GlyphWeightTableBuilder;
pub use face::{BitmapFace, TrueTypeFace};
pub use mapper::LuminanceMapper;
pub use rasterizer::GridRasterizer;
