use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Brightest value a single channel-weighted pixel can reach.
pub const MAX_PIXEL_LUMINANCE: u64 = 255;

/// Measured brightness of one rasterized alphabet character.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphMetadata {
    /// The character itself.
    pub character: char,
    /// Where its bitmap was written.
    #[serde(rename = "glyphFilePath")]
    pub glyph_image_path: PathBuf,
    /// `100 * sum(luminance) / maxLuminanceValue`.
    pub luminance_percentage: f32,
}

/// Luminance-sorted lookup table built once per alphabet and cell size.
///
/// Persisted as JSON with camelCase keys; unknown keys are ignored on load.
///
/// # Example
/// ```
/// use pg_core::table::{GlyphMetadata, GlyphWeightTable};
/// let entries = vec![
///     GlyphMetadata { character: 'A', glyph_image_path: "a.png".into(), luminance_percentage: 20.0 },
///     GlyphMetadata { character: 'B', glyph_image_path: "b.png".into(), luminance_percentage: 30.0 },
/// ];
/// let table = GlyphWeightTable::new("AB", 10, 12, entries);
/// assert_eq!(table.color_factor, 15300.0);
/// assert_eq!(table.entries[0].character, 'B');
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphWeightTable {
    /// Requested alphabet, as given.
    pub alphabet: String,
    /// `maxLuminanceValue / alphabet length`, integer-truncated.
    pub color_factor: f32,
    /// `255 * glyphWidth * glyphHeight`.
    pub max_luminance_value: u64,
    /// Cell width in pixels.
    pub glyph_width: u32,
    /// Cell height in pixels.
    pub glyph_height: u32,
    /// Sorted by `luminance_percentage`, descending.
    #[serde(default)]
    pub entries: Vec<GlyphMetadata>,
}

impl GlyphWeightTable {
    /// Assemble a table, computing the derived fields and sorting `entries`.
    ///
    /// The sort is stable: entries with equal percentages keep the order
    /// they were given in (alphabet order when built by the table builder).
    #[must_use]
    pub fn new(
        alphabet: &str,
        glyph_width: u32,
        glyph_height: u32,
        mut entries: Vec<GlyphMetadata>,
    ) -> Self {
        let max_luminance_value = Self::max_luminance_for(glyph_width, glyph_height);
        let alphabet_len = alphabet.chars().count().max(1) as u64;
        sort_by_luminance(&mut entries);
        Self {
            alphabet: alphabet.to_string(),
            color_factor: (max_luminance_value / alphabet_len) as f32,
            max_luminance_value,
            glyph_width,
            glyph_height,
            entries,
        }
    }

    /// Brightest total a `width × height` cell can reach.
    #[must_use]
    pub fn max_luminance_for(width: u32, height: u32) -> u64 {
        MAX_PIXEL_LUMINANCE * u64::from(width) * u64::from(height)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no glyph survived the build.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries are in non-increasing percentage order.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| w[0].luminance_percentage >= w[1].luminance_percentage)
    }

    /// Entry for a brightness bucket: bucket 0 is the dimmest glyph.
    #[must_use]
    pub fn entry_for_bucket(&self, bucket: usize) -> Option<&GlyphMetadata> {
        let last = self.entries.len().checked_sub(1)?;
        let idx = last.checked_sub(bucket)?;
        self.entries.get(idx)
    }

    /// Read a persisted table.
    ///
    /// # Errors
    /// Fails if the file is missing or malformed, if `entries` is empty
    /// ([`CoreError::EmptyTable`]), if the cell has a zero side, if an entry
    /// is a control character, or if `maxLuminanceValue` is zero.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {}", path.display()))?;
        let table: Self = serde_json::from_str(&content)
            .with_context(|| format!("Table de glyphes illisible : {}", path.display()))?;
        if table.entries.is_empty() {
            return Err(CoreError::EmptyTable {
                path: path.display().to_string(),
            }
            .into());
        }
        if table.glyph_width == 0 || table.glyph_height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: table.glyph_width,
                height: table.glyph_height,
            }
            .into());
        }
        if let Some(entry) = table.entries.iter().find(|e| e.character.is_control()) {
            return Err(CoreError::InvalidAlphabet(format!(
                "caractère de contrôle {:?} dans {}",
                entry.character,
                path.display()
            ))
            .into());
        }
        if table.max_luminance_value == 0 {
            return Err(CoreError::Config(format!(
                "maxLuminanceValue nul dans {}",
                path.display()
            ))
            .into());
        }
        Ok(table)
    }

    /// Persist the table as pretty JSON, atomically (temp file + rename).
    ///
    /// # Errors
    /// Fails if the directory cannot be created or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Impossible de créer {}", dir.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.write_all(b"\n")?;
        tmp.persist(path)
            .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
        Ok(())
    }
}

/// Stable sort, descending by percentage.
pub fn sort_by_luminance(entries: &mut [GlyphMetadata]) {
    entries.sort_by(|a, b| b.luminance_percentage.total_cmp(&a.luminance_percentage));
}
