use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Referenced file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// Unsupported file or data format.
    #[error("Format non supporté : {format}")]
    UnsupportedFormat {
        /// The format string that is unsupported.
        format: String,
    },

    /// Invalid width/height dimensions, or a pixel buffer that does not match them.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Alphabet empty or containing repeated characters.
    #[error("Alphabet invalide : {0}")]
    InvalidAlphabet(String),

    /// A persisted glyph table has no entries.
    #[error("Table de glyphes vide : {path}")]
    EmptyTable {
        /// Where the table was read from.
        path: String,
    },

    /// A luminance value falls outside the domain the table was calibrated for.
    ///
    /// Raised instead of clamping: the table and the image do not belong together.
    #[error(
        "Luminance {luminance} hors domaine : bucket {bucket} pour une table de {table_len} entrées"
    )]
    DomainMismatch {
        /// Per-pixel luminance weight that was mapped.
        luminance: u32,
        /// Computed bucket index.
        bucket: u64,
        /// Number of entries in the table.
        table_len: usize,
    },

    /// The glyph face has no bitmap for a character.
    #[error("Glyphe absent de la police : {ch:?}")]
    MissingGlyph {
        /// Character that could not be drawn.
        ch: char,
    },
}
