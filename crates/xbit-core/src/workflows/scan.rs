use crate::core::point::ParameterPoint;
use crate::engine::aggregator::{ResultAggregator, RunHistory};
use crate::engine::config::ScanConfig;
use crate::engine::error::EngineError;
use crate::engine::pipeline::{Collaborators, PointPipeline};
use crate::engine::pool::WorkerPool;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::queue::{PointQueue, WorkQueue};
use crate::engine::worker::{WorkerContext, WorkerReport};
use std::fs;
use tracing::{info, instrument, warn};

/// Counts for one executed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub enqueued: usize,
    pub valid: usize,
    pub invalid: usize,
    pub dropped: usize,
    /// Points still queued after every worker stopped; non-zero only if workers gave up on an
    /// unexpected queue error.
    pub unprocessed: usize,
    pub workers: Vec<WorkerReport>,
}

impl BatchSummary {
    pub fn is_complete(&self) -> bool {
        self.unprocessed == 0
    }
}

/// Executes batches of points for one scan.
#[derive(Debug)]
pub struct Runner {
    config: ScanConfig,
    collaborators: Collaborators,
    pool: WorkerPool,
    history: RunHistory,
}

impl Runner {
    /// Prepares the output directory and one working directory and log per worker. Failing to
    /// create any of them aborts the run.
    #[instrument(skip_all, name = "runner_setup", fields(scan = %config.name))]
    pub fn new(config: ScanConfig, collaborators: Collaborators) -> Result<Self, EngineError> {
        fs::create_dir_all(&config.output_dir).map_err(|e| EngineError::OutputSetup {
            path: config.output_dir.clone(),
            source: e,
        })?;

        let workers = (0..config.cores)
            .map(|index| WorkerContext::prepare(index, &config))
            .collect::<Result<Vec<_>, _>>()?;
        let pool = WorkerPool::new(workers)?;

        info!(
            scan_type = %config.scan_type,
            cores = config.cores,
            record_mode = ?config.record_mode,
            secondary_tools = collaborators.secondary.len(),
            "Scan runner initialised."
        );
        Ok(Self {
            config,
            collaborators,
            pool,
            history: RunHistory::new(),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn history(&self) -> &RunHistory {
        &self.history
    }

    pub fn into_history(self) -> RunHistory {
        self.history
    }

    /// Runs `points` to completion and merges the results into the run history.
    #[instrument(skip_all, name = "scan_batch", fields(points = points.len()))]
    pub fn run_batch(
        &mut self,
        points: Vec<ParameterPoint>,
        reporter: &ProgressReporter,
    ) -> Result<BatchSummary, EngineError> {
        let enqueued = points.len();
        let batch = self.history.batches + 1;
        reporter.report(Progress::BatchStarted {
            batch,
            points: enqueued,
            workers: self.pool.len(),
        });

        let mut queue = WorkQueue::new();
        queue.enqueue(points);

        let pipeline = PointPipeline::new(&self.config, &self.collaborators);
        let aggregator = ResultAggregator::new();
        let workers = self
            .pool
            .run(&queue, &pipeline, &aggregator, reporter, enqueued);

        let unprocessed = queue.remaining();
        if unprocessed > 0 {
            warn!(
                unprocessed,
                "Workers stopped before the queue was exhausted; remaining points were not run."
            );
        }

        let results = aggregator.into_results();
        if results.processed() + unprocessed != enqueued {
            return Err(EngineError::Internal(format!(
                "{} points enqueued but {} processed and {} left over",
                enqueued,
                results.processed(),
                unprocessed
            )));
        }

        let summary = BatchSummary {
            enqueued,
            valid: results.valid.len(),
            invalid: results.invalid.len(),
            dropped: results.dropped,
            unprocessed,
            workers,
        };
        self.history.merge(results);

        reporter.report(Progress::BatchFinished {
            batch,
            valid: summary.valid,
            invalid: summary.invalid,
            dropped: summary.dropped,
            unprocessed,
        });
        info!(
            batch,
            valid = summary.valid,
            invalid = summary.invalid,
            dropped = summary.dropped,
            "Batch finished."
        );

        Ok(summary)
    }
}
