use std::collections::HashSet;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;
use pg_core::error::CoreError;

/// One unit of work: a worker's view of the shared source.
#[derive(Debug)]
pub struct FilterTask<S> {
    /// Worker id, from 1.
    pub id: usize,
    /// Shared, never mutated after decode.
    pub source: Arc<S>,
    /// Intensity knob for tint filters.
    pub factor: u8,
    /// Distinct per task.
    pub output_path: PathBuf,
}

/// How a worker ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerOutcome {
    Succeeded,
    /// `fatal` marks a table/domain mismatch; the command must fail.
    Failed { fatal: bool },
}

#[derive(Clone, Debug)]
pub struct WorkerRecord {
    pub id: usize,
    pub outcome: WorkerOutcome,
    pub output_path: PathBuf,
}

/// Fan-in result of one pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    pub records: Vec<WorkerRecord>,
    pub elapsed: Duration,
}

impl PipelineReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == WorkerOutcome::Succeeded)
            .count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }

    #[must_use]
    pub fn has_fatal(&self) -> bool {
        self.records
            .iter()
            .any(|r| r.outcome == WorkerOutcome::Failed { fatal: true })
    }
}

/// Worker-side handle on the logging channel.
#[derive(Clone)]
pub struct TaskLog {
    id: usize,
    tx: flume::Sender<String>,
}

impl TaskLog {
    /// Send one progress line. Blocks until the caller takes it.
    pub fn line(&self, msg: impl Display) {
        let line = format!("task {} : {msg}", self.id);
        log::debug!("{line}");
        // Disconnection means the caller is gone; nothing left to report to.
        let _ = self.tx.send(line);
    }
}

/// `true` if the error chain holds a [`CoreError::DomainMismatch`].
#[must_use]
pub fn is_fatal(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<CoreError>(),
            Some(CoreError::DomainMismatch { .. })
        )
    })
}

/// Bounded fan-out/fan-in executor shared by every filter.
///
/// One named thread per task. Progress lines go through a rendezvous
/// channel; a supervisor thread joins every worker and only then releases
/// the last sender, so the caller's drain ends exactly when all work is
/// accounted for. A failed or panicked worker is recorded and logged; its
/// siblings keep running.
pub struct TaskPipeline {
    name: String,
    workers: usize,
}

impl TaskPipeline {
    /// # Errors
    /// Zero workers.
    pub fn new(name: &str, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(CoreError::Config("le pipeline exige au moins un worker".into()).into());
        }
        Ok(Self {
            name: name.to_string(),
            workers,
        })
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// One task per worker id `1..=workers`; `factor` and `path` are called
    /// per id.
    pub fn tasks<S>(
        &self,
        source: &Arc<S>,
        mut factor: impl FnMut(usize) -> u8,
        mut path: impl FnMut(usize) -> PathBuf,
    ) -> Vec<FilterTask<S>> {
        (1..=self.workers)
            .map(|id| FilterTask {
                id,
                source: Arc::clone(source),
                factor: factor(id),
                output_path: path(id),
            })
            .collect()
    }

    /// Run `job` once per task, feeding every log line to `sink` as it
    /// arrives. Returns once the log channel is closed and the supervisor
    /// has been joined.
    ///
    /// Job errors are not returned here; they are logged, recorded in the
    /// report, and classified with [`is_fatal`].
    ///
    /// # Errors
    /// Two tasks sharing an output path, an empty task list, or a
    /// supervisor panic.
    pub fn run<S, F>(
        &self,
        tasks: Vec<FilterTask<S>>,
        job: F,
        mut sink: impl FnMut(&str),
    ) -> Result<PipelineReport>
    where
        S: Send + Sync + 'static,
        F: Fn(&FilterTask<S>, &TaskLog) -> Result<()> + Send + Sync + 'static,
    {
        if tasks.is_empty() {
            return Err(CoreError::Config(format!("{} : aucune tâche", self.name)).into());
        }
        let mut seen = HashSet::new();
        for task in &tasks {
            if !seen.insert(task.output_path.clone()) {
                return Err(CoreError::Config(format!(
                    "{} : sortie partagée par plusieurs tâches : {}",
                    self.name,
                    task.output_path.display()
                ))
                .into());
            }
        }

        let start = Instant::now();
        let job = Arc::new(job);
        let (log_tx, log_rx) = flume::bounded::<String>(0);

        let mut spawned: Vec<(usize, PathBuf, std::io::Result<JoinHandle<WorkerOutcome>>)> =
            Vec::with_capacity(tasks.len());
        for task in tasks {
            let (id, path) = (task.id, task.output_path.clone());
            let job = Arc::clone(&job);
            let log = TaskLog {
                id,
                tx: log_tx.clone(),
            };
            let handle = thread::Builder::new()
                .name(format!("pg-worker-{id}"))
                .spawn(move || run_worker(&task, &*job, &log));
            spawned.push((id, path, handle));
        }

        let name = self.name.clone();
        let supervisor = thread::Builder::new()
            .name("pg-supervisor".into())
            .spawn(move || {
                let mut records = Vec::with_capacity(spawned.len());
                for (id, output_path, handle) in spawned {
                    let outcome = match handle {
                        Ok(h) => h.join().unwrap_or_else(|_| {
                            let _ = log_tx.send(format!("task {id} : panique"));
                            WorkerOutcome::Failed { fatal: false }
                        }),
                        Err(e) => {
                            let _ = log_tx.send(format!("task {id} : thread non lancé : {e}"));
                            WorkerOutcome::Failed { fatal: false }
                        }
                    };
                    records.push(WorkerRecord {
                        id,
                        outcome,
                        output_path,
                    });
                }
                log::debug!("{name} : tous les workers ont rendu la main");
                drop(log_tx);
                records
            })?;

        for line in &log_rx {
            sink(&line);
        }

        let records = supervisor
            .join()
            .map_err(|_| anyhow::anyhow!("{} : superviseur en panique", self.name))?;
        let report = PipelineReport {
            records,
            elapsed: start.elapsed(),
        };
        log::info!(
            "{} : {} ok, {} en échec, {:.1}ms",
            self.name,
            report.succeeded(),
            report.failed(),
            report.elapsed.as_secs_f64() * 1000.0
        );
        Ok(report)
    }
}

fn run_worker<S, F>(task: &FilterTask<S>, job: &F, log: &TaskLog) -> WorkerOutcome
where
    F: Fn(&FilterTask<S>, &TaskLog) -> Result<()>,
{
    let start = Instant::now();
    match job(task, log) {
        Ok(()) => {
            log.line(format_args!(
                "terminé en {:.1}ms → {}",
                start.elapsed().as_secs_f64() * 1000.0,
                task.output_path.display()
            ));
            WorkerOutcome::Succeeded
        }
        Err(err) => {
            let fatal = is_fatal(&err);
            log.line(format_args!("échec : {err:#}"));
            WorkerOutcome::Failed { fatal }
        }
    }
}
