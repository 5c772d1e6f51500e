use crate::error::CoreError;
use crate::frame::{FrameBuffer, GlyphBitmap};

/// Monospace face able to paint single characters into a coverage cell.
///
/// Implémenté par : `BitmapFace` (Spleen), `TrueTypeFace` (ab_glyph).
///
/// # Example
/// ```
/// use pg_core::error::CoreError;
/// use pg_core::frame::GlyphBitmap;
/// use pg_core::traits::GlyphFace;
///
/// struct Block;
/// impl GlyphFace for Block {
///     fn draw(&self, _ch: char, _origin: (i32, i32), canvas: &mut GlyphBitmap) -> Result<(), CoreError> {
///         canvas.paint(0, 0, 255);
///         Ok(())
///     }
///     fn cell_size(&self) -> (u32, u32) { (1, 1) }
///     fn ascent(&self) -> i32 { 1 }
///     fn name(&self) -> &'static str { "block" }
/// }
/// ```
pub trait GlyphFace: Send + Sync {
    /// Paint `ch` with its baseline-left point at `origin` (pixels, may be
    /// outside the canvas; painting is clipped).
    ///
    /// # Errors
    /// [`CoreError::MissingGlyph`] if the face has no glyph for `ch`.
    fn draw(&self, ch: char, origin: (i32, i32), canvas: &mut GlyphBitmap)
    -> Result<(), CoreError>;

    /// Natural cell size (advance × line height).
    fn cell_size(&self) -> (u32, u32);

    /// Distance from the top of the cell to the baseline.
    fn ascent(&self) -> i32;

    /// Nom lisible pour les logs.
    fn name(&self) -> &'static str;

    /// Render `ch` into a blank cell of the face's natural size.
    ///
    /// # Errors
    /// Propagates [`GlyphFace::draw`] errors.
    fn render_cell(&self, ch: char) -> Result<GlyphBitmap, CoreError> {
        let (w, h) = self.cell_size();
        let mut cell = GlyphBitmap::new(w, h);
        self.draw(ch, (0, self.ascent()), &mut cell)?;
        Ok(cell)
    }
}

/// Per-pixel recolor applied to a whole frame.
///
/// `factor` is the task's intensity knob; filters that ignore it say so.
pub trait Recolor: Send + Sync {
    /// Produce the recolored frame. The input is never mutated.
    fn apply(&self, input: &FrameBuffer, factor: u8) -> FrameBuffer;

    /// Nom utilisé pour nommer les fichiers de sortie.
    fn name(&self) -> &'static str;
}
