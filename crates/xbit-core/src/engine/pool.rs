use super::aggregator::ResultAggregator;
use super::error::EngineError;
use super::pipeline::PointPipeline;
use super::progress::ProgressReporter;
use super::queue::PointQueue;
use super::worker::{WorkerContext, WorkerReport, drain};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Mutex;
use tracing::debug;

/// A fixed set of workers. With a single worker the queue is drained on the calling thread;
/// otherwise every worker gets its own thread in a dedicated pool.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<WorkerContext>,
    threads: Option<ThreadPool>,
}

impl WorkerPool {
    pub fn new(workers: Vec<WorkerContext>) -> Result<Self, EngineError> {
        if workers.is_empty() {
            return Err(EngineError::Internal(
                "a worker pool needs at least one worker".to_string(),
            ));
        }
        let threads = if workers.len() > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers.len())
                .thread_name(|i| format!("xbit-worker-{}", i))
                .build()
                .map_err(|e| EngineError::ThreadPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };
        Ok(Self { workers, threads })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn workers(&self) -> &[WorkerContext] {
        &self.workers
    }

    /// Runs every worker against `queue` and returns once all of them have stopped. Reports
    /// are ordered by worker index.
    pub fn run(
        &self,
        queue: &dyn PointQueue,
        pipeline: &PointPipeline<'_>,
        aggregator: &ResultAggregator,
        reporter: &ProgressReporter,
        total: usize,
    ) -> Vec<WorkerReport> {
        let Some(threads) = &self.threads else {
            debug!("Draining queue on the calling thread.");
            return self
                .workers
                .iter()
                .map(|worker| drain(queue, pipeline, worker, aggregator, reporter, total))
                .collect();
        };

        debug!(workers = self.workers.len(), "Draining queue in parallel.");
        let reports = Mutex::new(Vec::with_capacity(self.workers.len()));
        threads.scope(|scope| {
            for worker in &self.workers {
                let reports = &reports;
                scope.spawn(move |_| {
                    let report = drain(queue, pipeline, worker, aggregator, reporter, total);
                    match reports.lock() {
                        Ok(mut reports) => reports.push(report),
                        Err(poisoned) => poisoned.into_inner().push(report),
                    }
                });
            }
        });

        let mut reports = reports
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        reports.sort_by_key(|r| r.index);
        reports
    }
}
