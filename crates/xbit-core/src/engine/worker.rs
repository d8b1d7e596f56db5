use super::aggregator::ResultAggregator;
use super::config::{QueueErrorPolicy, ScanConfig};
use super::error::EngineError;
use super::pipeline::PointPipeline;
use super::progress::{Progress, ProgressReporter};
use super::queue::{PointQueue, QueueError};
use crate::core::point::ParameterPoint;
use crate::core::tools::{ToolContext, ToolLog};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

/// Everything a single worker owns exclusively: its scratch directory, its log and its result
/// file. Workers never touch each other's files.
#[derive(Debug)]
pub struct WorkerContext {
    index: usize,
    workdir: PathBuf,
    log: ToolLog,
    output_path: PathBuf,
}

impl WorkerContext {
    /// Creates the scratch directory and opens the log of worker `index`.
    pub fn prepare(index: usize, config: &ScanConfig) -> Result<Self, EngineError> {
        let workdir = config.worker_dir(index);
        fs::create_dir_all(&workdir).map_err(|e| EngineError::WorkerSetup {
            worker: index,
            what: "working directory",
            path: workdir.clone(),
            source: e,
        })?;

        let log_path = config.worker_log_path(index);
        let log = ToolLog::open(&log_path).map_err(|e| EngineError::WorkerSetup {
            worker: index,
            what: "log file",
            path: log_path,
            source: e,
        })?;

        // Records are appended for the lifetime of one run; a new run starts from empty files.
        let output_path = config.worker_output_path(index);
        fs::File::create(&output_path).map_err(|e| EngineError::WorkerSetup {
            worker: index,
            what: "output file",
            path: output_path.clone(),
            source: e,
        })?;

        debug!(worker = index, workdir = %workdir.display(), "Worker directory prepared.");
        Ok(Self {
            index,
            workdir,
            log,
            output_path,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn log(&self) -> &ToolLog {
        &self.log
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn tool_context<'a>(&'a self, point: &'a ParameterPoint) -> ToolContext<'a> {
        ToolContext {
            point,
            workdir: &self.workdir,
            log: &self.log,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReport {
    pub index: usize,
    pub processed: usize,
    /// The queue error that made the worker give up, if it did not stop on an empty queue.
    pub aborted: Option<QueueError>,
}

/// Pops points until the queue is exhausted, pushing each through the pipeline and recording
/// its outcome.
#[instrument(skip_all, name = "worker", fields(index = worker.index()))]
pub fn drain(
    queue: &dyn PointQueue,
    pipeline: &PointPipeline<'_>,
    worker: &WorkerContext,
    aggregator: &ResultAggregator,
    reporter: &ProgressReporter,
    total: usize,
) -> WorkerReport {
    let policy = pipeline.config().queue_error_policy;
    let mut processed = 0;
    let mut consecutive_failures = 0;
    let mut aborted = None;

    loop {
        if worker.index() == 0 {
            reporter.report(Progress::QueueSize {
                remaining: queue.remaining(),
                total,
            });
        }

        match queue.pop() {
            Ok(point) => {
                consecutive_failures = 0;
                reporter.report(Progress::PointStarted {
                    worker: worker.index(),
                    point: point.clone(),
                });
                let outcome = pipeline.process(point, worker);
                aggregator.record(outcome);
                processed += 1;
            }
            Err(QueueError::Empty) => break,
            Err(err) => match policy {
                QueueErrorPolicy::Abort => {
                    error!(error = %err, "Unexpected queue error; worker stops.");
                    aborted = Some(err);
                    break;
                }
                QueueErrorPolicy::Retry { max_attempts } => {
                    consecutive_failures += 1;
                    if consecutive_failures > max_attempts {
                        error!(
                            error = %err,
                            attempts = consecutive_failures,
                            "Queue still failing after retries; worker stops."
                        );
                        aborted = Some(err);
                        break;
                    }
                    warn!(
                        error = %err,
                        attempt = consecutive_failures,
                        "Unexpected queue error; recovering and retrying."
                    );
                    queue.recover();
                }
            },
        }
    }

    if worker.index() == 0 {
        reporter.report(Progress::QueueSize {
            remaining: queue.remaining(),
            total,
        });
    }
    info!(processed, "Worker finished.");

    WorkerReport {
        index: worker.index(),
        processed,
        aborted,
    }
}
