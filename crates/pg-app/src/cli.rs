use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pg_core::charset::resolve_alphabet;
use pg_core::config::PixglyphConfig;

use crate::commands::FilterKind;

/// pixglyph: glyph-weight ASCII rendering and batch image filters.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Nombre de workers par filtre (remplace [pipeline] workers).
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

/// Alias and source image shared by every filter command.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Clé de nommage des sorties.
    #[arg(short, long)]
    pub alias: String,

    /// Image source (JPEG, PNG, BMP, GIF ; détectée par contenu).
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rasterize an alphabet and persist its glyph weight table.
    BuildGlyphTable {
        /// Alphabet, ou preset : upper, compact, standard (remplace [glyphs] alphabet).
        #[arg(long)]
        alphabet: Option<String>,
        /// Chemin de la table (remplace [paths] table_path).
        #[arg(long)]
        table: Option<PathBuf>,
    },
    /// Light/dark grid of 1 and 0, redrawn as an image.
    ByteGrid(SourceArgs),
    /// Glyph grid from the weight table, redrawn as an image.
    CharacterGrid {
        #[command(flatten)]
        source: SourceArgs,
        /// Table de glyphes (remplace [paths] table_path).
        #[arg(long)]
        table: Option<PathBuf>,
    },
    /// BT.709 grayscale.
    Grayscale(SourceArgs),
    /// Drop red on a checkerboard, then tint.
    TintRed(SourceArgs),
    /// Drop green on a checkerboard, then tint.
    TintGreen(SourceArgs),
    /// Drop blue on a checkerboard, then tint.
    TintBlue(SourceArgs),
    /// Tint every pixel.
    TintComposite(SourceArgs),
    /// Nested shrunk copies.
    Tile(SourceArgs),
    /// Nested shrunk copies, each rotated a little more.
    Spiral(SourceArgs),
    /// byte-grid, character-grid, grayscale and the four tints, in sequence.
    All {
        #[command(flatten)]
        source: SourceArgs,
        /// Table de glyphes (remplace [paths] table_path).
        #[arg(long)]
        table: Option<PathBuf>,
    },
}

impl Command {
    /// Filter and source of a single-filter command.
    #[must_use]
    pub fn filter(&self) -> Option<(FilterKind, &SourceArgs)> {
        let pair = match self {
            Self::ByteGrid(s) => (FilterKind::ByteGrid, s),
            Self::CharacterGrid { source, .. } => (FilterKind::CharacterGrid, source),
            Self::Grayscale(s) => (FilterKind::Grayscale, s),
            Self::TintRed(s) => (FilterKind::TintRed, s),
            Self::TintGreen(s) => (FilterKind::TintGreen, s),
            Self::TintBlue(s) => (FilterKind::TintBlue, s),
            Self::TintComposite(s) => (FilterKind::TintComposite, s),
            Self::Tile(s) => (FilterKind::Tile, s),
            Self::Spiral(s) => (FilterKind::Spiral, s),
            Self::BuildGlyphTable { .. } | Self::All { .. } => return None,
        };
        Some(pair)
    }
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut PixglyphConfig) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        match &self.command {
            Command::BuildGlyphTable { alphabet, table } => {
                if let Some(a) = alphabet {
                    config.alphabet = resolve_alphabet(a);
                }
                if let Some(t) = table {
                    config.table_path.clone_from(t);
                }
            }
            Command::CharacterGrid { table, .. } | Command::All { table, .. } => {
                if let Some(t) = table {
                    config.table_path.clone_from(t);
                }
            }
            _ => {}
        }
        config.clamp_all();
    }
}
