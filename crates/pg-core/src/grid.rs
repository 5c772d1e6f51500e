use crate::sample::PixelSample;

/// Text artifact: one glyph per pixel, one line per pixel row.
///
/// # Example
/// ```
/// use pg_core::grid::CharacterGrid;
/// let grid = CharacterGrid::parse("ab\ncd");
/// assert_eq!((grid.width(), grid.height()), (2, 2));
/// assert_eq!(grid.to_text(), "ab\ncd");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharacterGrid {
    rows: Vec<Vec<char>>,
}

impl CharacterGrid {
    /// Build a grid from row-major samples, starting a new row exactly when
    /// `y` changes.
    ///
    /// # Example
    /// ```
    /// use pg_core::frame::FrameBuffer;
    /// use pg_core::grid::CharacterGrid;
    /// use pg_core::sample::sample_frame;
    /// let samples = sample_frame(&FrameBuffer::new(3, 2)).unwrap();
    /// let grid = CharacterGrid::from_samples(&samples, |s| if s.is_light { '1' } else { '0' });
    /// assert_eq!(grid.to_text(), "000\n000");
    /// ```
    pub fn from_samples<F>(samples: &[PixelSample], mut glyph: F) -> Self
    where
        F: FnMut(&PixelSample) -> char,
    {
        let result: Result<Self, std::convert::Infallible> =
            Self::try_from_samples(samples, |s| Ok(glyph(s)));
        match result {
            Ok(grid) => grid,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`CharacterGrid::from_samples`]: stops at the first error.
    ///
    /// # Errors
    /// Propagates the first error returned by `glyph`.
    pub fn try_from_samples<F, E>(samples: &[PixelSample], mut glyph: F) -> Result<Self, E>
    where
        F: FnMut(&PixelSample) -> Result<char, E>,
    {
        let mut rows: Vec<Vec<char>> = Vec::new();
        let mut current_y = None;
        for sample in samples {
            let ch = glyph(sample)?;
            if current_y != Some(sample.y) {
                current_y = Some(sample.y);
                rows.push(Vec::new());
            }
            if let Some(row) = rows.last_mut() {
                row.push(ch);
            }
        }
        Ok(Self { rows })
    }

    /// Parse a grid back from its text form. A trailing newline is ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            rows: text.lines().map(|line| line.chars().collect()).collect(),
        }
    }

    /// Number of columns of the widest row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Rows as character slices.
    pub fn rows(&self) -> impl Iterator<Item = &[char]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Character at (column, row).
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<char> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Every distinct character, in first-seen order.
    #[must_use]
    pub fn distinct_chars(&self) -> Vec<char> {
        let mut seen = Vec::new();
        for &ch in self.rows.iter().flatten() {
            if !seen.contains(&ch) {
                seen.push(ch);
            }
        }
        seen
    }

    /// Rows joined with `\n`, no trailing newline.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.height() * (self.width() + 1));
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.extend(row.iter());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: u32, y: u32) -> PixelSample {
        PixelSample::new(x, y, [0, 0, 0, 255])
    }

    #[test]
    fn rows_break_on_y_change_only() {
        let samples = vec![sample(0, 0), sample(1, 0), sample(0, 1), sample(1, 1), sample(0, 2)];
        let mut n = 0u8;
        let grid = CharacterGrid::from_samples(&samples, |_| {
            n += 1;
            char::from(b'a' + n - 1)
        });
        assert_eq!(grid.to_text(), "ab\ncd\ne");
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 2);
    }

    #[test]
    fn try_from_samples_stops_at_first_error() {
        let samples = vec![sample(0, 0), sample(1, 0), sample(2, 0)];
        let res: Result<CharacterGrid, u32> =
            CharacterGrid::try_from_samples(&samples, |s| if s.x == 1 { Err(s.x) } else { Ok('#') });
        assert_eq!(res, Err(1));
    }

    #[test]
    fn parse_roundtrips_text() {
        let grid = CharacterGrid::parse("10\n01\n");
        assert_eq!(grid.to_text(), "10\n01");
        assert_eq!(grid.get(1, 0), Some('0'));
        assert_eq!(grid.distinct_chars(), vec!['1', '0']);
    }
}
