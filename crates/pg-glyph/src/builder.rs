use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use pg_core::charset::validate_alphabet;
use pg_core::config::PixglyphConfig;
use pg_core::error::CoreError;
use pg_core::frame::{FrameBuffer, GlyphBitmap};
use pg_core::sample::{sample_frame, total_luminance};
use pg_core::table::{GlyphMetadata, GlyphWeightTable};
use pg_core::traits::GlyphFace;
use pg_source::image::save_image;
use rayon::prelude::*;

/// Glyphs are measured as white ink on black paper.
const MEASURE_INK: [u8; 3] = [255, 255, 255];
const MEASURE_PAPER: [u8; 3] = [0, 0, 0];

/// File name of a persisted glyph bitmap, keyed by code point.
///
/// ```
/// use pg_glyph::builder::glyph_file_name;
/// assert_eq!(glyph_file_name('A'), "glyph_U+0041.png");
/// ```
#[must_use]
pub fn glyph_file_name(ch: char) -> String {
    format!("glyph_U+{:04X}.png", u32::from(ch))
}

/// Outcome of a table build.
#[derive(Debug)]
pub struct BuildReport {
    pub table: GlyphWeightTable,
    /// One line per dropped glyph or failed worker.
    pub diagnostics: Vec<String>,
    pub elapsed: Duration,
}

/// A rasterized glyph waiting to be measured.
struct Rasterized {
    index: usize,
    character: char,
    path: PathBuf,
    frame: FrameBuffer,
}

/// Builds a [`GlyphWeightTable`] from an alphabet.
///
/// Characters are rasterized by a fixed pool of `workers` threads pulling
/// from a shared queue. A glyph that fails to rasterize or persist, or
/// whose face panics, is dropped with a diagnostic; the build goes on.
pub struct GlyphWeightTableBuilder {
    face: Box<dyn GlyphFace>,
    alphabet: String,
    glyph_dir: PathBuf,
    cell: (u32, u32),
    baseline: (i32, i32),
    workers: usize,
}

impl GlyphWeightTableBuilder {
    #[must_use]
    pub fn new(face: Box<dyn GlyphFace>, config: &PixglyphConfig) -> Self {
        Self {
            face,
            alphabet: config.alphabet.clone(),
            glyph_dir: config.glyph_dir.clone(),
            cell: (config.glyph_width, config.glyph_height),
            baseline: (config.baseline_x, config.baseline_y),
            workers: config.build_workers.max(1),
        }
    }

    #[must_use]
    pub fn with_alphabet(mut self, alphabet: &str) -> Self {
        self.alphabet = alphabet.to_string();
        self
    }

    #[must_use]
    pub fn with_glyph_dir(mut self, dir: &Path) -> Self {
        self.glyph_dir = dir.to_path_buf();
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Rasterize, persist and measure every character, then sort.
    ///
    /// # Errors
    /// Invalid alphabet or cell size, or an unwritable glyph directory.
    /// Per-glyph failures are not errors; they end up in
    /// [`BuildReport::diagnostics`].
    pub fn build(&self) -> Result<BuildReport> {
        let start = Instant::now();
        let chars = validate_alphabet(&self.alphabet)?;
        let (w, h) = self.cell;
        if w == 0 || h == 0 {
            return Err(CoreError::InvalidDimensions {
                width: w,
                height: h,
            }
            .into());
        }
        std::fs::create_dir_all(&self.glyph_dir)
            .with_context(|| format!("Impossible de créer {}", self.glyph_dir.display()))?;

        log::info!(
            "Table de glyphes : {} caractères, cellule {w}x{h}, police {}, {} workers",
            chars.len(),
            self.face.name(),
            self.workers
        );

        let (mut rasterized, diagnostics) = self.rasterize_all(&chars);
        rasterized.sort_by_key(|r| r.index);

        let max = GlyphWeightTable::max_luminance_for(w, h);
        let entries: Vec<GlyphMetadata> = rasterized
            .into_par_iter()
            .map(|r| -> Result<GlyphMetadata, CoreError> {
                let samples = sample_frame(&r.frame)?;
                let total = total_luminance(&samples);
                Ok(GlyphMetadata {
                    character: r.character,
                    glyph_image_path: r.path,
                    luminance_percentage: (total as f64 * 100.0 / max as f64) as f32,
                })
            })
            .collect::<Result<_, _>>()?;

        let table = GlyphWeightTable::new(&self.alphabet, w, h, entries);
        let elapsed = start.elapsed();
        log::info!(
            "{} glyphes mesurés, {} écartés, {:.1}ms",
            table.len(),
            diagnostics.len(),
            elapsed.as_secs_f64() * 1000.0
        );
        Ok(BuildReport {
            table,
            diagnostics,
            elapsed,
        })
    }

    /// [`Self::build`], then write the table to `table_path`.
    ///
    /// # Errors
    /// Build errors, or an empty table (nothing rasterized), or write errors.
    pub fn build_and_save(&self, table_path: &Path) -> Result<BuildReport> {
        let report = self.build()?;
        if report.table.is_empty() {
            return Err(CoreError::EmptyTable {
                path: table_path.display().to_string(),
            }
            .into());
        }
        report.table.save(table_path)?;
        log::info!("Table écrite : {}", table_path.display());
        Ok(report)
    }

    /// Fan out over the pool. Diagnostics travel over a rendezvous channel
    /// drained here; the supervisor owns the last sender and drops it only
    /// after every worker has been joined.
    fn rasterize_all(&self, chars: &[char]) -> (Vec<Rasterized>, Vec<String>) {
        let (job_tx, job_rx) = flume::unbounded::<(usize, char)>();
        for job in chars.iter().copied().enumerate() {
            // Receiver is alive; cannot fail.
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let (result_tx, result_rx) = flume::unbounded::<Rasterized>();
        let (diag_tx, diag_rx) = flume::bounded::<String>(0);
        let mut diagnostics = Vec::new();

        thread::scope(|s| {
            let handles: Vec<_> = (1..=self.workers)
                .map(|id| {
                    let jobs = job_rx.clone();
                    let results = result_tx.clone();
                    let diag = diag_tx.clone();
                    s.spawn(move || self.worker(id, &jobs, &results, &diag))
                })
                .collect();
            drop(result_tx);

            s.spawn(move || {
                for (i, handle) in handles.into_iter().enumerate() {
                    if handle.join().is_err() {
                        let _ = diag_tx.send(format!("worker {} : panique hors rasterisation", i + 1));
                    }
                }
                drop(diag_tx);
            });

            for line in &diag_rx {
                log::warn!("{line}");
                diagnostics.push(line);
            }
        });

        (result_rx.try_iter().collect(), diagnostics)
    }

    fn worker(
        &self,
        id: usize,
        jobs: &flume::Receiver<(usize, char)>,
        results: &flume::Sender<Rasterized>,
        diag: &flume::Sender<String>,
    ) {
        for (index, character) in jobs {
            // Une panique de la police ne coûte que ce glyphe.
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.rasterize_one(character)));
            match outcome {
                Ok(Ok((path, frame))) => {
                    log::debug!("worker {id} : {character:?} → {}", path.display());
                    let _ = results.send(Rasterized {
                        index,
                        character,
                        path,
                        frame,
                    });
                }
                Ok(Err(err)) => {
                    let _ = diag.send(format!("worker {id} : glyphe {character:?} écarté : {err:#}"));
                }
                Err(_) => {
                    let _ = diag.send(format!("worker {id} : glyphe {character:?} écarté : panique"));
                }
            }
        }
    }

    fn rasterize_one(&self, ch: char) -> Result<(PathBuf, FrameBuffer)> {
        let mut canvas = GlyphBitmap::new(self.cell.0, self.cell.1);
        self.face.draw(ch, self.baseline, &mut canvas)?;
        let frame = canvas.to_frame(MEASURE_INK, MEASURE_PAPER);
        let path = self.glyph_dir.join(glyph_file_name(ch));
        save_image(&frame, &path)?;
        Ok((path, frame))
    }
}
