use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, point};
use anyhow::{Context, Result};
use pg_core::config::{FaceKind, PixglyphConfig};
use pg_core::error::CoreError;
use pg_core::frame::GlyphBitmap;
use pg_core::traits::GlyphFace;
use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};

/// Built-in Spleen bitmap face.
///
/// The PSF2 parser needs `&mut` for lookups, so a parser is created per
/// draw from the embedded static data; this keeps the face `Sync`.
#[derive(Clone, Copy, Debug)]
pub struct BitmapFace {
    kind: FaceKind,
}

impl BitmapFace {
    #[must_use]
    pub fn new(kind: FaceKind) -> Self {
        Self { kind }
    }

    fn data(self) -> &'static [u8] {
        match self.kind {
            FaceKind::Spleen6x12 => FONT_6X12,
            FaceKind::Spleen8x16 => FONT_8X16,
            FaceKind::Spleen12x24 => FONT_12X24,
        }
    }
}

impl GlyphFace for BitmapFace {
    fn draw(
        &self,
        ch: char,
        origin: (i32, i32),
        canvas: &mut GlyphBitmap,
    ) -> Result<(), CoreError> {
        let mut font = PSF2Font::new(self.data())
            .map_err(|_| CoreError::Config(format!("police {} illisible", self.name())))?;
        let mut utf8 = [0u8; 4];
        let glyph = font
            .glyph_for_utf8(ch.encode_utf8(&mut utf8).as_bytes())
            .ok_or(CoreError::MissingGlyph { ch })?;
        let top = origin.1 - self.ascent();
        for (row_y, row) in glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                if on {
                    canvas.paint(origin.0 + col_x as i32, top + row_y as i32, 255);
                }
            }
        }
        Ok(())
    }

    fn cell_size(&self) -> (u32, u32) {
        match self.kind {
            FaceKind::Spleen6x12 => (6, 12),
            FaceKind::Spleen8x16 => (8, 16),
            FaceKind::Spleen12x24 => (12, 24),
        }
    }

    fn ascent(&self) -> i32 {
        match self.kind {
            FaceKind::Spleen6x12 => 10,
            FaceKind::Spleen8x16 => 13,
            FaceKind::Spleen12x24 => 20,
        }
    }

    fn name(&self) -> &'static str {
        match self.kind {
            FaceKind::Spleen6x12 => "spleen-6x12",
            FaceKind::Spleen8x16 => "spleen-8x16",
            FaceKind::Spleen12x24 => "spleen-12x24",
        }
    }
}

/// TrueType/OpenType face rasterized with ab_glyph.
pub struct TrueTypeFace {
    font: FontVec,
    scale: PxScale,
    cell: (u32, u32),
    ascent: i32,
}

impl TrueTypeFace {
    /// Parse font bytes at a pixel size. The cell is the advance of `M` by
    /// the line height.
    ///
    /// # Errors
    /// Retourne une erreur si la police fournie est invalide.
    pub fn from_bytes(data: Vec<u8>, px: f32) -> Result<Self> {
        let font = FontVec::try_from_vec(data).context("Police TrueType invalide")?;
        let scale = PxScale::from(px);
        let units = font.height_unscaled();

        let v_advance = font.ascent_unscaled() - font.descent_unscaled() + font.line_gap_unscaled();
        let height = (v_advance * scale.y / units).ceil() as u32;
        let width = (font.h_advance_unscaled(font.glyph_id('M')) * scale.x / units).ceil() as u32;
        let ascent = (font.ascent_unscaled() * scale.y / units).round() as i32;

        Ok(Self {
            font,
            scale,
            cell: (width.max(1), height.max(1)),
            ascent,
        })
    }

    /// Load a font file.
    ///
    /// # Errors
    /// Missing file or invalid font.
    pub fn open(path: &Path, px: f32) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Impossible de lire la police {}", path.display()))?;
        Self::from_bytes(data, px)
    }
}

impl GlyphFace for TrueTypeFace {
    fn draw(
        &self,
        ch: char,
        origin: (i32, i32),
        canvas: &mut GlyphBitmap,
    ) -> Result<(), CoreError> {
        let gid = self.font.glyph_id(ch);
        // glyph_id 0 = .notdef ; seuls les blancs s'en passent.
        if ch.is_control() || (gid.0 == 0 && !ch.is_whitespace()) {
            return Err(CoreError::MissingGlyph { ch });
        }
        let glyph =
            gid.with_scale_and_position(self.scale, point(origin.0 as f32, origin.1 as f32));
        if let Some(outline) = self.font.outline_glyph(glyph) {
            let bounds = outline.px_bounds();
            outline.draw(|x, y, v| {
                let px = x as i32 + bounds.min.x as i32;
                let py = y as i32 + bounds.min.y as i32;
                canvas.paint(px, py, (v * 255.0).round() as u8);
            });
        }
        Ok(())
    }

    fn cell_size(&self) -> (u32, u32) {
        self.cell
    }

    fn ascent(&self) -> i32 {
        self.ascent
    }

    fn name(&self) -> &'static str {
        "truetype"
    }
}

/// Face used to build the glyph weight table: the TrueType font when
/// `font_path` is set, the configured Spleen face otherwise.
///
/// # Errors
/// Unreadable or invalid font file.
pub fn table_face(config: &PixglyphConfig) -> Result<Box<dyn GlyphFace>> {
    match &config.font_path {
        Some(path) => Ok(Box::new(TrueTypeFace::open(path, config.font_px)?)),
        None => Ok(Box::new(BitmapFace::new(config.face))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spleen_letters_carry_ink() {
        for kind in [FaceKind::Spleen6x12, FaceKind::Spleen8x16, FaceKind::Spleen12x24] {
            let face = BitmapFace::new(kind);
            let cell = face.render_cell('A').unwrap();
            assert_eq!((cell.width, cell.height), face.cell_size());
            assert!(!cell.is_blank(), "{} rendered a blank A", face.name());
        }
    }

    #[test]
    fn spleen_space_is_blank() {
        let cell = BitmapFace::new(FaceKind::Spleen6x12).render_cell(' ').unwrap();
        assert!(cell.is_blank());
    }

    #[test]
    fn wider_glyph_has_more_ink() {
        let face = BitmapFace::new(FaceKind::Spleen8x16);
        let ink = |ch| {
            face.render_cell(ch)
                .unwrap()
                .coverage
                .iter()
                .filter(|&&v| v > 0)
                .count()
        };
        assert!(ink('M') > ink('.'));
    }

    #[test]
    fn drawing_is_clipped_to_the_canvas() {
        let face = BitmapFace::new(FaceKind::Spleen12x24);
        let mut small = GlyphBitmap::new(4, 4);
        face.draw('W', (2, 10), &mut small).unwrap();
        assert_eq!(small.coverage.len(), 16);
    }

    #[test]
    fn invalid_truetype_bytes_fail() {
        assert!(TrueTypeFace::from_bytes(vec![0, 1, 2, 3], 12.0).is_err());
    }

    #[test]
    fn default_config_uses_spleen() {
        let face = table_face(&PixglyphConfig::default()).unwrap();
        assert_eq!(face.name(), "spleen-6x12");
    }
}
