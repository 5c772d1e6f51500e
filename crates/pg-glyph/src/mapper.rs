use std::path::Path;

use anyhow::Result;
use pg_core::charset::{BucketLut, bucket_index};
use pg_core::error::CoreError;
use pg_core::frame::FrameBuffer;
use pg_core::grid::CharacterGrid;
use pg_core::sample::{PixelSample, sample_frame};
use pg_core::table::GlyphWeightTable;

/// Byte grid alphabet: light pixels.
pub const BYTE_LIGHT: char = '1';
/// Byte grid alphabet: dark pixels.
pub const BYTE_DARK: char = '0';

/// Maps sampled pixels to glyphs of a persisted [`GlyphWeightTable`].
///
/// A pixel whose luminance falls outside the table's calibrated domain is a
/// fatal [`CoreError::DomainMismatch`]; it is never clamped.
pub struct LuminanceMapper {
    table: GlyphWeightTable,
    lut: BucketLut,
}

impl LuminanceMapper {
    /// # Errors
    /// [`CoreError::EmptyTable`] if the table has no entries.
    pub fn new(table: GlyphWeightTable) -> Result<Self, CoreError> {
        let lut = BucketLut::new(&table)?;
        Ok(Self { table, lut })
    }

    /// Load the table from disk.
    ///
    /// # Errors
    /// See [`GlyphWeightTable::load`].
    pub fn load(path: &Path) -> Result<Self> {
        let table = GlyphWeightTable::load(path)?;
        Ok(Self::new(table)?)
    }

    #[must_use]
    pub fn table(&self) -> &GlyphWeightTable {
        &self.table
    }

    /// Glyph for one luminance weight.
    ///
    /// # Errors
    /// [`CoreError::DomainMismatch`] when the bucket falls outside the table.
    #[inline]
    pub fn glyph_for(&self, luminance: u32) -> Result<char, CoreError> {
        if let Some(ch) = self.lut.map(luminance) {
            return Ok(ch);
        }
        let bucket = bucket_index(luminance, &self.table)?;
        self.table
            .entry_for_bucket(bucket)
            .map(|entry| entry.character)
            .ok_or(CoreError::DomainMismatch {
                luminance,
                bucket: bucket as u64,
                table_len: self.table.len(),
            })
    }

    /// One glyph per sample, a new row each time `y` changes.
    ///
    /// # Errors
    /// The first [`CoreError::DomainMismatch`] met.
    pub fn map_samples(&self, samples: &[PixelSample]) -> Result<CharacterGrid, CoreError> {
        CharacterGrid::try_from_samples(samples, |s| self.glyph_for(s.luminance_weight))
    }

    /// Sample `frame` and map it.
    ///
    /// # Errors
    /// Empty frame or domain mismatch.
    pub fn map_frame(&self, frame: &FrameBuffer) -> Result<CharacterGrid, CoreError> {
        self.map_samples(&sample_frame(frame)?)
    }
}

/// `1` for light pixels, `0` for dark ones.
///
/// # Errors
/// [`CoreError::InvalidDimensions`] for an empty frame.
pub fn byte_grid(frame: &FrameBuffer) -> Result<CharacterGrid, CoreError> {
    let samples = sample_frame(frame)?;
    Ok(CharacterGrid::from_samples(&samples, |s| {
        if s.is_light { BYTE_LIGHT } else { BYTE_DARK }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::BitmapFace;
    use crate::rasterizer::GridRasterizer;
    use pg_core::config::FaceKind;
    use pg_core::table::GlyphMetadata;

    fn table(percentages: &[f32]) -> GlyphWeightTable {
        let alphabet: String = (0..percentages.len())
            .map(|i| char::from(b'a' + i as u8))
            .collect();
        let entries = percentages
            .iter()
            .zip(alphabet.chars())
            .map(|(&p, ch)| GlyphMetadata {
                character: ch,
                glyph_image_path: format!("{ch}.png").into(),
                luminance_percentage: p,
            })
            .collect();
        GlyphWeightTable::new(&alphabet, 10, 12, entries)
    }

    #[test]
    fn black_square_maps_to_dimmest_entry() {
        let mapper = LuminanceMapper::new(table(&[90.0, 50.0, 10.0])).unwrap();
        let grid = mapper
            .map_frame(&FrameBuffer::filled(2, 2, [0, 0, 0, 255]))
            .unwrap();
        assert_eq!(grid.to_text(), "cc\ncc");
        let dimmest = mapper.table().entries.last().unwrap();
        assert_eq!(dimmest.luminance_percentage, 10.0);
        assert_eq!(dimmest.character, 'c');
    }

    #[test]
    fn white_maps_to_brightest_entry() {
        let mapper = LuminanceMapper::new(table(&[90.0, 50.0, 10.0])).unwrap();
        assert_eq!(mapper.glyph_for(255).unwrap(), 'a');
    }

    #[test]
    fn uniform_image_uses_one_glyph() {
        let mapper = LuminanceMapper::new(table(&[80.0, 60.0, 40.0, 20.0, 5.0])).unwrap();
        let grid = mapper
            .map_frame(&FrameBuffer::filled(7, 5, [120, 90, 200, 255]))
            .unwrap();
        assert_eq!(grid.distinct_chars().len(), 1);
        assert_eq!((grid.width(), grid.height()), (7, 5));
    }

    #[test]
    fn every_level_stays_in_range() {
        let mapper = LuminanceMapper::new(table(&[70.0, 40.0, 30.0, 1.0])).unwrap();
        for level in 0..=255 {
            assert!(mapper.glyph_for(level).is_ok(), "level {level}");
        }
    }

    #[test]
    fn foreign_calibration_is_fatal() {
        let mut t = table(&[90.0, 50.0, 10.0]);
        // Calibrated for a cell a tenth the size.
        t.max_luminance_value /= 10;
        let mapper = LuminanceMapper::new(t).unwrap();
        let err = mapper
            .map_frame(&FrameBuffer::filled(2, 2, [255, 255, 255, 255]))
            .unwrap_err();
        assert!(matches!(err, CoreError::DomainMismatch { table_len: 3, .. }));
    }

    #[test]
    fn rows_follow_image_rows() {
        let mut frame = FrameBuffer::filled(3, 2, [0, 0, 0, 255]);
        frame.set_pixel(2, 1, [255, 255, 255, 255]);
        let mapper = LuminanceMapper::new(table(&[90.0, 10.0])).unwrap();
        assert_eq!(mapper.map_frame(&frame).unwrap().to_text(), "bbb\nbba");
    }

    #[test]
    fn round_trip_keeps_dimensions() {
        let mut frame = FrameBuffer::new(9, 4);
        for (i, px) in frame.data.chunks_exact_mut(4).enumerate() {
            let v = (i * 7) as u8;
            px.copy_from_slice(&[v, v, v, 255]);
        }
        let mapper = LuminanceMapper::new(table(&[90.0, 60.0, 30.0, 0.0])).unwrap();
        let grid = mapper.map_frame(&frame).unwrap();
        let reparsed = CharacterGrid::parse(&grid.to_text());
        assert_eq!((reparsed.width(), reparsed.height()), (9, 4));

        let face = BitmapFace::new(FaceKind::Spleen6x12);
        let mut raster = GridRasterizer::new(Box::new(face), [255; 3], [0; 3]);
        let image = raster.render(&reparsed).unwrap();
        assert_eq!((image.width / 6, image.height / 12), (9, 4));
    }

    #[test]
    fn byte_grid_marks_light_pixels() {
        let mut frame = FrameBuffer::filled(2, 1, [0, 0, 0, 255]);
        frame.set_pixel(1, 0, [250, 250, 250, 255]);
        assert_eq!(byte_grid(&frame).unwrap().to_text(), "01");
    }
}
