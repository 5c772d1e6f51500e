/// Per-pixel recolor filters: grayscale and factor tints.

pub mod recolor;

pub use recolor::{Channel, ChannelTint, Grayscale, TintComposite, recolor_by_name};
