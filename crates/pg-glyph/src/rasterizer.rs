use std::collections::HashMap;

use pg_core::error::CoreError;
use pg_core::frame::{FrameBuffer, GlyphBitmap, blend};
use pg_core::grid::CharacterGrid;
use pg_core::traits::GlyphFace;
use rayon::prelude::*;

/// Redraws a [`CharacterGrid`] as an image, one face cell per character.
///
/// Glyphs are rasterized once and cached; rendering runs one band of cell
/// rows per rayon task.
pub struct GridRasterizer {
    face: Box<dyn GlyphFace>,
    ink: [u8; 3],
    paper: [u8; 3],
    cell: (u32, u32),
    glyph_cache: HashMap<char, GlyphBitmap>,
    /// Used for characters the face cannot draw and for ragged rows.
    empty_glyph: GlyphBitmap,
}

impl GridRasterizer {
    #[must_use]
    pub fn new(face: Box<dyn GlyphFace>, ink: [u8; 3], paper: [u8; 3]) -> Self {
        let cell = face.cell_size();
        Self {
            face,
            ink,
            paper,
            cell,
            glyph_cache: HashMap::new(),
            empty_glyph: GlyphBitmap::new(cell.0, cell.1),
        }
    }

    /// Output size for a grid.
    #[must_use]
    pub fn target_dimensions(&self, grid: &CharacterGrid) -> (u32, u32) {
        (
            grid.width() as u32 * self.cell.0,
            grid.height() as u32 * self.cell.1,
        )
    }

    fn cache_chars(&mut self, chars: &[char]) {
        for &ch in chars {
            if self.glyph_cache.contains_key(&ch) {
                continue;
            }
            match self.face.render_cell(ch) {
                Ok(cell) => {
                    self.glyph_cache.insert(ch, cell);
                }
                Err(err) => {
                    log::warn!("{}: {err}, cellule vide", self.face.name());
                    self.glyph_cache.insert(ch, self.empty_glyph.clone());
                }
            }
        }
    }

    /// Render the grid. Rows shorter than the widest are padded with paper.
    ///
    /// # Errors
    /// [`CoreError::InvalidDimensions`] for an empty grid.
    pub fn render(&mut self, grid: &CharacterGrid) -> Result<FrameBuffer, CoreError> {
        let (width, height) = self.target_dimensions(grid);
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        self.cache_chars(&grid.distinct_chars());

        let mut fb = FrameBuffer::new(width, height);
        let (cw, ch) = (self.cell.0 as usize, self.cell.1 as usize);
        let stride = width as usize * 4;
        let band_size = stride * ch;
        let rows: Vec<&[char]> = grid.rows().collect();
        let (ink, paper) = (self.ink, self.paper);
        let cache = &self.glyph_cache;
        let empty = &self.empty_glyph;

        fb.data
            .par_chunks_exact_mut(band_size)
            .zip(rows.par_iter())
            .for_each(|(band, row)| {
                for gx in 0..grid.width() {
                    let glyph = row
                        .get(gx)
                        .and_then(|c| cache.get(c))
                        .unwrap_or(empty);
                    let x0 = gx * cw;
                    for cy in 0..ch {
                        let offset = cy * stride;
                        for cx in 0..cw {
                            let coverage = glyph.coverage[cy * cw + cx];
                            let [r, g, b] = blend(ink, paper, coverage);
                            let idx = offset + (x0 + cx) * 4;
                            band[idx..idx + 4].copy_from_slice(&[r, g, b, 255]);
                        }
                    }
                }
            });

        Ok(fb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::BitmapFace;
    use pg_core::config::FaceKind;

    fn rasterizer() -> GridRasterizer {
        GridRasterizer::new(
            Box::new(BitmapFace::new(FaceKind::Spleen6x12)),
            [255, 255, 255],
            [0, 0, 0],
        )
    }

    #[test]
    fn output_is_grid_times_cell() {
        let grid = CharacterGrid::parse("AB\nCD\nEF");
        let fb = rasterizer().render(&grid).unwrap();
        assert_eq!((fb.width, fb.height), (12, 36));
    }

    #[test]
    fn spaces_render_as_paper() {
        let grid = CharacterGrid::parse("  \n  ");
        let fb = rasterizer().render(&grid).unwrap();
        assert!(fb.data.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn ragged_rows_are_padded() {
        let grid = CharacterGrid::parse("AAA\nA");
        let fb = rasterizer().render(&grid).unwrap();
        assert_eq!((fb.width, fb.height), (18, 24));
        for y in 12..24 {
            for x in 6..18 {
                assert_eq!(fb.pixel(x, y), [0, 0, 0, 255]);
            }
        }
    }

    #[test]
    fn ink_appears_for_letters() {
        let fb = rasterizer().render(&CharacterGrid::parse("#")).unwrap();
        assert!(fb.data.chunks_exact(4).any(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert!(rasterizer().render(&CharacterGrid::parse("")).is_err());
    }
}
