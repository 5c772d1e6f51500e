use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use pg_core::config::PixglyphConfig;
use pg_core::frame::FrameBuffer;
use pg_core::grid::CharacterGrid;
use pg_filter::recolor_by_name;
use pg_glyph::builder::BuildReport;
use pg_glyph::face::{BitmapFace, table_face};
use pg_glyph::mapper::{LuminanceMapper, byte_grid};
use pg_glyph::{GlyphWeightTableBuilder, GridRasterizer};
use pg_source::image::{format_for, load_image, save_image};
use pg_source::resize::shrink_by_percent;
use pg_source::transform::{spiral, tile, transparency};

use crate::cli::{Command, SourceArgs};
use crate::pipeline::{FilterTask, PipelineReport, TaskLog, TaskPipeline};

/// Every filter reachable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    ByteGrid,
    CharacterGrid,
    Grayscale,
    TintRed,
    TintGreen,
    TintBlue,
    TintComposite,
    Tile,
    Spiral,
}

impl FilterKind {
    /// Run by `all`, in order.
    pub const ALL_SEQUENCE: [Self; 7] = [
        Self::ByteGrid,
        Self::CharacterGrid,
        Self::Grayscale,
        Self::TintRed,
        Self::TintGreen,
        Self::TintBlue,
        Self::TintComposite,
    ];

    /// Name used in output files.
    #[must_use]
    pub fn flag(self) -> &'static str {
        match self {
            Self::ByteGrid => "byte",
            Self::CharacterGrid => "character",
            Self::Grayscale => "grayscale",
            Self::TintRed => "tint_red",
            Self::TintGreen => "tint_green",
            Self::TintBlue => "tint_blue",
            Self::TintComposite => "tint_composite",
            Self::Tile => "tile",
            Self::Spiral => "spiral",
        }
    }

    fn is_tint(self) -> bool {
        matches!(
            self,
            Self::TintRed | Self::TintGreen | Self::TintBlue | Self::TintComposite
        )
    }
}

/// `<output_dir>/<alias>/<alias>_<flag><ext>` for worker 1,
/// `<alias>_<flag>_<id><ext>` for the others.
///
/// ```
/// use std::path::Path;
/// use pg_app::commands::output_path;
/// let p = output_path(Path::new("out"), "cat", "grayscale", 1, ".jpg");
/// assert_eq!(p, Path::new("out/cat/cat_grayscale.jpg"));
/// let p = output_path(Path::new("out"), "cat", "grayscale", 3, ".jpg");
/// assert_eq!(p, Path::new("out/cat/cat_grayscale_3.jpg"));
/// ```
#[must_use]
pub fn output_path(output_dir: &Path, alias: &str, flag: &str, id: usize, ext: &str) -> PathBuf {
    let file = if id <= 1 {
        format!("{alias}_{flag}{ext}")
    } else {
        format!("{alias}_{flag}_{id}{ext}")
    };
    output_dir.join(alias).join(file)
}

/// Output extension: the source's own, `.png` for spiral or when the
/// source extension cannot be encoded.
fn output_ext(kind: FilterKind, source: &Path) -> String {
    if kind == FilterKind::Spiral {
        return ".png".into();
    }
    match format_for(source) {
        Ok(_) => source
            .extension()
            .and_then(|e| e.to_str())
            .map_or_else(|| ".png".into(), |e| format!(".{e}")),
        Err(_) => {
            log::warn!(
                "{} : extension non encodable, sortie en .png",
                source.display()
            );
            ".png".into()
        }
    }
}

fn tint_factor(config: &PixglyphConfig) -> u8 {
    config.factor.unwrap_or_else(|| fastrand::u8(..))
}

type Job = Box<dyn Fn(&FilterTask<FrameBuffer>, &TaskLog) -> Result<()> + Send + Sync>;

/// Byte or character grid: shrink, map to text, persist the text,
/// re-read and re-rasterize it, remove the text, encode.
fn grid_job(config: &PixglyphConfig, mapper: Option<Arc<LuminanceMapper>>) -> Job {
    let shrink = config.grid_shrink_percent;
    let grid_face = config.grid_face;
    let (ink, paper) = (config.ink, config.paper);
    Box::new(move |task: &FilterTask<FrameBuffer>, log: &TaskLog| {
        let t = Instant::now();
        let small = shrink_by_percent(&task.source, shrink)?;
        log.line(format_args!(
            "resize {}x{} → {}x{} en {:.1}ms",
            task.source.width,
            task.source.height,
            small.width,
            small.height,
            t.elapsed().as_secs_f64() * 1000.0
        ));

        let grid = match &mapper {
            Some(m) => m.map_frame(&small).context("grille de caractères")?,
            None => byte_grid(&small)?,
        };
        let txt = task.output_path.with_extension("txt");
        if let Some(dir) = txt.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&txt, grid.to_text())
            .with_context(|| format!("Impossible d'écrire {}", txt.display()))?;
        log.line(format_args!("grille {}x{} → {}", grid.width(), grid.height(), txt.display()));

        let text = std::fs::read_to_string(&txt)
            .with_context(|| format!("Impossible de relire {}", txt.display()))?;
        let mut raster = GridRasterizer::new(Box::new(BitmapFace::new(grid_face)), ink, paper);
        let image = raster.render(&CharacterGrid::parse(&text))?;
        std::fs::remove_file(&txt)?;
        save_image(&image, &task.output_path)
    })
}

fn recolor_job(kind: FilterKind) -> Result<Job> {
    let filter = recolor_by_name(kind.flag())
        .with_context(|| format!("filtre inconnu : {}", kind.flag()))?;
    let tinted = kind.is_tint();
    Ok(Box::new(move |task: &FilterTask<FrameBuffer>, log: &TaskLog| {
        if tinted {
            log.line(format_args!("factor {}", task.factor));
        }
        let out = filter.apply(&task.source, task.factor);
        save_image(&out, &task.output_path)
    }))
}

fn transform_job(kind: FilterKind, config: &PixglyphConfig) -> Job {
    let (step, angle) = (config.tile_step, config.spiral_angle);
    Box::new(move |task: &FilterTask<FrameBuffer>, _log: &TaskLog| {
        let out = if kind == FilterKind::Spiral {
            spiral(&task.source, angle)?
        } else {
            tile(&task.source, step)?
        };
        save_image(&out, &task.output_path)
    })
}

/// Run one filter over `source` through a [`TaskPipeline`] of
/// `config.workers` workers. `sink` receives every worker log line.
///
/// # Errors
/// Decode failure, missing glyph table (character grid), or a worker that
/// hit a table/domain mismatch. Other worker failures only show up in the
/// report.
pub fn run_filter(
    kind: FilterKind,
    alias: &str,
    source: &Path,
    config: &PixglyphConfig,
    sink: impl FnMut(&str),
) -> Result<PipelineReport> {
    let flag = kind.flag();
    log::info!("process {flag}");
    let start = Instant::now();

    let mapper = if kind == FilterKind::CharacterGrid {
        let m = LuminanceMapper::load(&config.table_path).with_context(|| {
            format!("Table de glyphes introuvable : {}", config.table_path.display())
        })?;
        Some(Arc::new(m))
    } else {
        None
    };

    let mut frame = load_image(source)
        .with_context(|| format!("decode-file {}", source.display()))?;
    if kind == FilterKind::CharacterGrid
        && let Some(alpha) = config.character_alpha
    {
        frame = transparency(&frame, alpha);
    }
    log::info!(
        "total open {:.1}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    let job = match kind {
        FilterKind::ByteGrid | FilterKind::CharacterGrid => grid_job(config, mapper),
        FilterKind::Tile | FilterKind::Spiral => transform_job(kind, config),
        _ => recolor_job(kind)?,
    };

    let pipeline = TaskPipeline::new(flag, config.workers)?;
    log::debug!("{flag} : {} workers", pipeline.workers());
    let ext = output_ext(kind, source);
    let source = Arc::new(frame);
    let tasks = pipeline.tasks(
        &source,
        |_| if kind.is_tint() { tint_factor(config) } else { 0 },
        |id| output_path(&config.output_dir, alias, flag, id, &ext),
    );

    let report = pipeline.run(tasks, job, sink)?;
    if report.has_fatal() {
        anyhow::bail!("{flag} : table de glyphes incompatible avec l'image");
    }
    Ok(report)
}

/// Build and persist the glyph weight table described by `config`.
///
/// # Errors
/// See [`GlyphWeightTableBuilder::build_and_save`].
pub fn build_glyph_table(config: &PixglyphConfig) -> Result<BuildReport> {
    let face = table_face(config)?;
    GlyphWeightTableBuilder::new(face, config).build_and_save(&config.table_path)
}

fn print_line(line: &str) {
    println!("\t{line}");
}

fn run_and_report(kind: FilterKind, args: &SourceArgs, config: &PixglyphConfig) -> Result<()> {
    let report = run_filter(kind, &args.alias, &args.file, config, print_line)?;
    println!(
        "{} : {}/{} ok, total {:.1}ms",
        kind.flag(),
        report.succeeded(),
        report.records.len(),
        report.elapsed.as_secs_f64() * 1000.0
    );
    Ok(())
}

/// Dispatch a parsed command.
///
/// # Errors
/// Any fatal error of the command.
pub fn execute(command: &Command, config: &PixglyphConfig) -> Result<()> {
    let start = Instant::now();
    match command {
        Command::BuildGlyphTable { .. } => {
            let report = build_glyph_table(config)?;
            for line in &report.diagnostics {
                print_line(line);
            }
            println!(
                "build-glyph-table : {} glyphes → {}, total {:.1}ms",
                report.table.len(),
                config.table_path.display(),
                report.elapsed.as_secs_f64() * 1000.0
            );
        }
        Command::All { source, .. } => {
            for kind in FilterKind::ALL_SEQUENCE {
                run_and_report(kind, source, config)?;
            }
            println!("all : total {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
        }
        other => {
            if let Some((kind, args)) = other.filter() {
                run_and_report(kind, args, config)?;
            }
        }
    }
    log::info!("terminé en {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pg_core::table::{GlyphMetadata, GlyphWeightTable};

    struct Fixture {
        dir: tempfile::TempDir,
        source: PathBuf,
        config: PixglyphConfig,
    }

    fn fixture(ext: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join(format!("src.{ext}"));
        let mut frame = FrameBuffer::new(40, 30);
        for (i, px) in frame.data.chunks_exact_mut(4).enumerate() {
            let v = (i % 40 * 6) as u8;
            px.copy_from_slice(&[v, 255 - v, v / 2, 255]);
        }
        save_image(&frame, &source).unwrap();
        let config = PixglyphConfig {
            output_dir: dir.path().join("out"),
            glyph_dir: dir.path().join("matrix"),
            table_path: dir.path().join("matrix/charts_weight.json"),
            alphabet: "AMW.".into(),
            ..PixglyphConfig::default()
        };
        Fixture {
            dir,
            source,
            config,
        }
    }

    fn files_in(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map(|rd| rd.filter_map(|e| e.ok().map(|e| e.path())).collect())
            .unwrap_or_default();
        files.sort();
        files
    }

    #[test]
    fn one_worker_writes_exactly_the_documented_file() {
        let f = fixture("jpg");
        let report = run_filter(FilterKind::Grayscale, "cat", &f.source, &f.config, |_| {}).unwrap();
        assert_eq!(report.succeeded(), 1);
        let files = files_in(&f.config.output_dir.join("cat"));
        assert_eq!(files, vec![f.config.output_dir.join("cat/cat_grayscale.jpg")]);
    }

    #[test]
    fn character_grid_leaves_no_text_behind() {
        let f = fixture("jpg");
        build_glyph_table(&f.config).unwrap();
        let mut lines = Vec::new();
        run_filter(FilterKind::CharacterGrid, "cat", &f.source, &f.config, |l| {
            lines.push(l.to_string());
        })
        .unwrap();
        let files = files_in(&f.config.output_dir.join("cat"));
        assert_eq!(files, vec![f.config.output_dir.join("cat/cat_character.jpg")]);
        assert!(lines.iter().any(|l| l.contains("grille 6x5")));

        let out = load_image(&files[0]).unwrap();
        assert_eq!((out.width, out.height), (6 * 8, 5 * 16));
    }

    #[test]
    fn byte_grid_with_two_workers_writes_two_files() {
        let f = fixture("png");
        let config = PixglyphConfig {
            workers: 2,
            ..f.config.clone()
        };
        let report = run_filter(FilterKind::ByteGrid, "dog", &f.source, &config, |_| {}).unwrap();
        assert_eq!(report.succeeded(), 2);
        let files = files_in(&config.output_dir.join("dog"));
        assert_eq!(
            files,
            vec![
                config.output_dir.join("dog/dog_byte.png"),
                config.output_dir.join("dog/dog_byte_2.png"),
            ]
        );
    }

    #[test]
    fn tint_logs_its_factor() {
        let f = fixture("png");
        let config = PixglyphConfig {
            factor: Some(42),
            ..f.config.clone()
        };
        let mut lines = Vec::new();
        run_filter(FilterKind::TintRed, "x", &f.source, &config, |l| {
            lines.push(l.to_string());
        })
        .unwrap();
        assert!(lines.contains(&"task 1 : factor 42".to_string()));
    }

    #[test]
    fn spiral_always_writes_png() {
        let f = fixture("jpg");
        run_filter(FilterKind::Spiral, "s", &f.source, &f.config, |_| {}).unwrap();
        assert!(f.config.output_dir.join("s/s_spiral.png").is_file());
    }

    #[test]
    fn tile_keeps_source_extension() {
        let f = fixture("png");
        run_filter(FilterKind::Tile, "t", &f.source, &f.config, |_| {}).unwrap();
        let out = load_image(&f.config.output_dir.join("t/t_tile.png")).unwrap();
        assert_eq!((out.width, out.height), (40, 30));
    }

    #[test]
    fn undecodable_source_is_fatal() {
        let f = fixture("png");
        let bogus = f.dir.path().join("bogus.jpg");
        std::fs::write(&bogus, b"not an image").unwrap();
        assert!(run_filter(FilterKind::Grayscale, "b", &bogus, &f.config, |_| {}).is_err());
        assert!(files_in(&f.config.output_dir.join("b")).is_empty());
    }

    #[test]
    fn missing_table_is_fatal() {
        let f = fixture("png");
        assert!(run_filter(FilterKind::CharacterGrid, "c", &f.source, &f.config, |_| {}).is_err());
    }

    #[test]
    fn mismatched_table_fails_after_drain() {
        let f = fixture("png");
        let entries = vec![
            GlyphMetadata {
                character: 'A',
                glyph_image_path: "a.png".into(),
                luminance_percentage: 40.0,
            },
            GlyphMetadata {
                character: 'B',
                glyph_image_path: "b.png".into(),
                luminance_percentage: 20.0,
            },
        ];
        let mut table = GlyphWeightTable::new("AB", 10, 12, entries);
        table.max_luminance_value = 1;
        table.save(&f.config.table_path).unwrap();

        let mut lines = Vec::new();
        let result = run_filter(FilterKind::CharacterGrid, "m", &f.source, &f.config, |l| {
            lines.push(l.to_string());
        });
        assert!(result.is_err());
        assert!(lines.iter().any(|l| l.contains("échec")));
        assert!(files_in(&f.config.output_dir.join("m")).is_empty());
    }
}
