use crate::error::CoreError;
use crate::table::GlyphWeightTable;

/// Alphabet du premier prototype : majuscules latines.
pub const ALPHABET_UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// 10 caractères, compact, bon contraste.
pub const ALPHABET_COMPACT: &str = " .:-=+*#%@";

/// Rampe de Paul Bourke.
pub const ALPHABET_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Named alphabet presets accepted wherever an alphabet is configured.
///
/// None of the names is itself a valid alphabet (each repeats a letter),
/// so a preset name can never shadow a literal alphabet.
pub const ALPHABET_PRESETS: [(&str, &str); 3] = [
    ("upper", ALPHABET_UPPER),
    ("compact", ALPHABET_COMPACT),
    ("standard", ALPHABET_STANDARD),
];

/// Expand a preset name, or return the alphabet unchanged.
///
/// # Example
/// ```
/// use pg_core::charset::{ALPHABET_COMPACT, resolve_alphabet};
/// assert_eq!(resolve_alphabet("compact"), ALPHABET_COMPACT);
/// assert_eq!(resolve_alphabet("AB"), "AB");
/// ```
#[must_use]
pub fn resolve_alphabet(alphabet: &str) -> String {
    ALPHABET_PRESETS
        .iter()
        .find(|(name, _)| *name == alphabet)
        .map_or(alphabet, |&(_, chars)| chars)
        .to_string()
}

/// Reject empty alphabets, repeated characters and control characters
/// (a `\n` glyph would split grid rows).
///
/// # Errors
/// Returns [`CoreError::InvalidAlphabet`].
///
/// # Example
/// ```
/// use pg_core::charset::validate_alphabet;
/// assert!(validate_alphabet("AB").is_ok());
/// assert!(validate_alphabet("ABA").is_err());
/// assert!(validate_alphabet("").is_err());
/// assert!(validate_alphabet("\n#").is_err());
/// ```
pub fn validate_alphabet(alphabet: &str) -> Result<Vec<char>, CoreError> {
    let chars: Vec<char> = alphabet.chars().collect();
    if chars.is_empty() {
        return Err(CoreError::InvalidAlphabet("alphabet vide".into()));
    }
    for (i, ch) in chars.iter().enumerate() {
        if ch.is_control() {
            return Err(CoreError::InvalidAlphabet(format!("caractère de contrôle {ch:?}")));
        }
        if chars[..i].contains(ch) {
            return Err(CoreError::InvalidAlphabet(format!("caractère répété {ch:?}")));
        }
    }
    Ok(chars)
}

/// Bucket for a per-pixel luminance weight.
///
/// The weight is lifted to the cell domain (`weight * glyphWidth * glyphHeight`)
/// so it is comparable with `maxLuminanceValue`, then
/// `floor(cell_weight * (len - 1) / maxLuminanceValue)`.
///
/// # Errors
/// [`CoreError::DomainMismatch`] when the bucket is not below the table length,
/// [`CoreError::EmptyTable`] when the table has no entries.
pub fn bucket_index(weight: u32, table: &GlyphWeightTable) -> Result<usize, CoreError> {
    let len = table.entries.len();
    if len == 0 {
        return Err(CoreError::EmptyTable {
            path: "<mémoire>".into(),
        });
    }
    let max = table.max_luminance_value.max(1);
    let cell_weight =
        u64::from(weight) * u64::from(table.glyph_width) * u64::from(table.glyph_height);
    let bucket = cell_weight * (len as u64 - 1) / max;
    if bucket >= len as u64 {
        return Err(CoreError::DomainMismatch {
            luminance: weight,
            bucket,
            table_len: len,
        });
    }
    Ok(bucket as usize)
}

/// Lookup table mapping luminance [0..255] → glyph of a weight table.
///
/// Pre-computed once per table for O(1) per-pixel cost. Out-of-domain levels
/// are kept as `None` and reported only if a pixel actually hits them.
pub struct BucketLut {
    lut: [Option<char>; 256],
}

impl BucketLut {
    /// Build a LUT from a glyph weight table.
    ///
    /// # Errors
    /// [`CoreError::EmptyTable`] if the table has no entries.
    pub fn new(table: &GlyphWeightTable) -> Result<Self, CoreError> {
        if table.is_empty() {
            return Err(CoreError::EmptyTable {
                path: "<mémoire>".into(),
            });
        }
        let mut lut = [None; 256];
        for (level, slot) in lut.iter_mut().enumerate() {
            *slot = bucket_index(level as u32, table)
                .ok()
                .and_then(|bucket| table.entry_for_bucket(bucket))
                .map(|entry| entry.character);
        }
        Ok(Self { lut })
    }

    /// Glyph for a luminance level, `None` outside the table's domain.
    #[inline(always)]
    #[must_use]
    pub fn map(&self, luminance: u32) -> Option<char> {
        self.lut.get(luminance as usize).copied().flatten()
    }
}
