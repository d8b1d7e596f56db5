use crate::core::point::ParameterPoint;

/// Events a running scan emits for display purposes. Nothing in the engine depends on
/// whether anyone listens.
#[derive(Debug, Clone)]
pub enum Progress {
    BatchStarted {
        batch: usize,
        points: usize,
        workers: usize,
    },
    /// Snapshot of the work queue, reported by worker 0 before every pop.
    QueueSize { remaining: usize, total: usize },
    PointStarted { worker: usize, point: ParameterPoint },
    BatchFinished {
        batch: usize,
        valid: usize,
        invalid: usize,
        dropped: usize,
        unprocessed: usize,
    },
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Fans progress events out to an optional callback shared by all workers.
#[derive(Default)]
pub struct ProgressReporter<'a>(Option<ProgressCallback<'a>>);

impl<'a> ProgressReporter<'a> {
    pub fn silent() -> Self {
        Self(None)
    }

    pub fn new(callback: ProgressCallback<'a>) -> Self {
        Self(Some(callback))
    }

    pub fn is_silent(&self) -> bool {
        self.0.is_none()
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(callback) = &self.0 {
            callback(event);
        }
    }
}

impl std::fmt::Debug for ProgressReporter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ProgressReporter")
            .field(&if self.is_silent() { "silent" } else { "callback" })
            .finish()
    }
}
