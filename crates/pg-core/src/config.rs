use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{ALPHABET_UPPER, resolve_alphabet};

/// Configuration complète d'une invocation.
///
/// Chargée depuis TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use pg_core::config::PixglyphConfig;
/// let config = PixglyphConfig::default();
/// assert_eq!(config.workers, 1);
/// assert_eq!((config.glyph_width, config.glyph_height), (10, 12));
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PixglyphConfig {
    // === Chemins ===
    /// Racine des sorties ; chaque alias a son sous-dossier.
    pub output_dir: PathBuf,
    /// Dossier des bitmaps de glyphes.
    pub glyph_dir: PathBuf,
    /// Table de glyphes persistée.
    pub table_path: PathBuf,

    // === Glyphes ===
    /// Alphabet de la table.
    pub alphabet: String,
    /// Largeur de cellule.
    pub glyph_width: u32,
    /// Hauteur de cellule.
    pub glyph_height: u32,
    /// Baseline origin inside the cell, x.
    pub baseline_x: i32,
    /// Baseline origin inside the cell, y.
    pub baseline_y: i32,
    /// Taille du pool de rasterisation.
    pub build_workers: usize,
    /// Police bitmap utilisée pour la table.
    pub face: FaceKind,
    /// Optional TrueType font; replaces `face` when set.
    pub font_path: Option<PathBuf>,
    /// Pixel size for the TrueType font.
    pub font_px: f32,

    // === Re-rasterisation des grilles ===
    /// Police utilisée pour redessiner les grilles de caractères.
    pub grid_face: FaceKind,
    /// Couleur de l'encre.
    pub ink: [u8; 3],
    /// Couleur du fond.
    pub paper: [u8; 3],

    // === Pipeline ===
    /// Nombre de workers actifs par filtre.
    pub workers: usize,
    /// Réduction (en %) appliquée avant la génération des grilles.
    pub grid_shrink_percent: u32,
    /// Alpha constant du pré-passage de transparence (grille de caractères).
    pub character_alpha: Option<u8>,
    /// Fixed tint factor. None = random per task.
    pub factor: Option<u8>,
    /// Pas (en %) des copies imbriquées du filtre tile.
    pub tile_step: u32,
    /// Angle de base (degrés) du filtre spiral.
    pub spiral_angle: u32,
}

/// Built-in Spleen bitmap faces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum FaceKind {
    /// 6×12.
    #[default]
    Spleen6x12,
    /// 8×16.
    Spleen8x16,
    /// 12×24.
    Spleen12x24,
}

impl Default for PixglyphConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("files/unpublished"),
            glyph_dir: PathBuf::from("files/unpublished/matrix"),
            table_path: PathBuf::from("files/unpublished/matrix/charts_weight.json"),
            alphabet: ALPHABET_UPPER.to_string(),
            glyph_width: 10,
            glyph_height: 12,
            baseline_x: 2,
            baseline_y: 10,
            build_workers: 4,
            face: FaceKind::Spleen6x12,
            font_path: None,
            font_px: 12.0,
            grid_face: FaceKind::Spleen8x16,
            ink: [255, 255, 255],
            paper: [0, 0, 0],
            workers: 1,
            grid_shrink_percent: 85,
            character_alpha: None,
            factor: None,
            tile_step: 5,
            spiral_angle: 5,
        }
    }
}

impl PixglyphConfig {
    /// Clamp every numeric field to its valid range.
    pub fn clamp_all(&mut self) {
        self.glyph_width = self.glyph_width.clamp(1, 256);
        self.glyph_height = self.glyph_height.clamp(1, 256);
        self.build_workers = self.build_workers.clamp(1, 64);
        self.font_px = self.font_px.clamp(4.0, 256.0);
        self.workers = self.workers.clamp(1, 32);
        self.grid_shrink_percent = self.grid_shrink_percent.min(99);
        self.tile_step = self.tile_step.clamp(1, 99);
        self.spiral_angle = self.spiral_angle.min(359);
    }
}

// === TOML file layout ===

#[derive(Deserialize)]
struct ConfigFile {
    paths: Option<PathsSection>,
    glyphs: Option<GlyphsSection>,
    render: Option<RenderSection>,
    pipeline: Option<PipelineSection>,
}

#[derive(Deserialize)]
struct PathsSection {
    output_dir: Option<PathBuf>,
    glyph_dir: Option<PathBuf>,
    table_path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct GlyphsSection {
    alphabet: Option<String>,
    glyph_width: Option<u32>,
    glyph_height: Option<u32>,
    baseline_x: Option<i32>,
    baseline_y: Option<i32>,
    build_workers: Option<usize>,
    face: Option<FaceKind>,
    font_path: Option<PathBuf>,
    font_px: Option<f32>,
}

#[derive(Deserialize)]
struct RenderSection {
    grid_face: Option<FaceKind>,
    ink: Option<[u8; 3]>,
    paper: Option<[u8; 3]>,
}

#[derive(Deserialize)]
struct PipelineSection {
    workers: Option<usize>,
    grid_shrink_percent: Option<u32>,
    character_alpha: Option<u8>,
    factor: Option<u8>,
    tile_step: Option<u32>,
    spiral_angle: Option<u32>,
}

/// Charge la configuration depuis un fichier TOML.
///
/// Missing keys keep their defaults.
///
/// # Errors
/// Retourne une erreur si le fichier est illisible ou si le TOML est invalide.
pub fn load_config(path: &Path) -> Result<PixglyphConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))
}

/// Parse TOML text over the defaults.
///
/// # Errors
/// Retourne une erreur si le TOML est invalide.
pub fn parse_config(content: &str) -> Result<PixglyphConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    let mut config = PixglyphConfig::default();

    if let Some(p) = file.paths {
        if let Some(v) = p.output_dir {
            config.output_dir = v;
        }
        if let Some(v) = p.glyph_dir {
            config.glyph_dir = v;
        }
        if let Some(v) = p.table_path {
            config.table_path = v;
        }
    }

    if let Some(g) = file.glyphs {
        if let Some(v) = g.alphabet {
            config.alphabet = resolve_alphabet(&v);
        }
        if let Some(v) = g.glyph_width {
            config.glyph_width = v;
        }
        if let Some(v) = g.glyph_height {
            config.glyph_height = v;
        }
        if let Some(v) = g.baseline_x {
            config.baseline_x = v;
        }
        if let Some(v) = g.baseline_y {
            config.baseline_y = v;
        }
        if let Some(v) = g.build_workers {
            config.build_workers = v;
        }
        if let Some(v) = g.face {
            config.face = v;
        }
        if g.font_path.is_some() {
            config.font_path = g.font_path;
        }
        if let Some(v) = g.font_px {
            config.font_px = v;
        }
    }

    if let Some(r) = file.render {
        if let Some(v) = r.grid_face {
            config.grid_face = v;
        }
        if let Some(v) = r.ink {
            config.ink = v;
        }
        if let Some(v) = r.paper {
            config.paper = v;
        }
    }

    if let Some(p) = file.pipeline {
        if let Some(v) = p.workers {
            config.workers = v;
        }
        if let Some(v) = p.grid_shrink_percent {
            config.grid_shrink_percent = v;
        }
        if p.character_alpha.is_some() {
            config.character_alpha = p.character_alpha;
        }
        if p.factor.is_some() {
            config.factor = p.factor;
        }
        if let Some(v) = p.tile_step {
            config.tile_step = v;
        }
        if let Some(v) = p.spiral_angle {
            config.spiral_angle = v;
        }
    }

    config.clamp_all();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), PixglyphConfig::default());
    }

    #[test]
    fn sections_override_and_clamp() {
        let config = parse_config(
            r#"
            [paths]
            output_dir = "out"

            [glyphs]
            alphabet = "AB"
            build_workers = 0
            face = "Spleen8x16"

            [pipeline]
            workers = 3
            tile_step = 500
            factor = 40
            "#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.alphabet, "AB");
        assert_eq!(config.build_workers, 1);
        assert_eq!(config.face, FaceKind::Spleen8x16);
        assert_eq!(config.workers, 3);
        assert_eq!(config.tile_step, 99);
        assert_eq!(config.factor, Some(40));
        assert_eq!(config.glyph_width, 10);
    }

    #[test]
    fn alphabet_preset_is_expanded() {
        let config = parse_config("[glyphs]\nalphabet = \"standard\"\n").unwrap();
        assert_eq!(config.alphabet, crate::charset::ALPHABET_STANDARD);
    }

    #[test]
    fn unknown_face_is_an_error() {
        assert!(parse_config("[glyphs]\nface = \"Comic\"\n").is_err());
    }
}
