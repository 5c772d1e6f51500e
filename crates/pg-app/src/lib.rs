/// The `pixglyph` command surface: CLI, task pipeline and filter commands.

pub mod cli;
pub mod commands;
pub mod pipeline;
