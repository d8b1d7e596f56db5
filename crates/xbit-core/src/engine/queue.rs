use crate::core::point::ParameterPoint;
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("The work queue is empty")]
    Empty,
    #[error("The work queue lock was poisoned by a panicking worker")]
    Poisoned,
}

/// Shared source of points for the workers of one batch.
///
/// `pop` removes and returns exactly one point; concurrent callers never receive the same
/// point twice. [`QueueError::Empty`] is the normal termination signal, every other error is
/// handled according to the configured
/// [`QueueErrorPolicy`](crate::engine::config::QueueErrorPolicy).
pub trait PointQueue: Send + Sync {
    fn pop(&self) -> Result<ParameterPoint, QueueError>;

    fn remaining(&self) -> usize;

    /// Attempts to bring the queue back into a usable state after a non-empty error.
    fn recover(&self) {}
}

/// A FIFO of points behind a mutex. Points enqueued before the workers start are popped in
/// insertion order.
#[derive(Debug, Default)]
pub struct WorkQueue {
    points: Mutex<VecDeque<ParameterPoint>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, points: impl IntoIterator<Item = ParameterPoint>) {
        let queue = self
            .points
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        queue.extend(points);
    }

    pub fn len(&self) -> usize {
        self.remaining()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

impl FromIterator<ParameterPoint> for WorkQueue {
    fn from_iter<I: IntoIterator<Item = ParameterPoint>>(iter: I) -> Self {
        Self {
            points: Mutex::new(iter.into_iter().collect()),
        }
    }
}

impl PointQueue for WorkQueue {
    fn pop(&self) -> Result<ParameterPoint, QueueError> {
        let mut queue = self.points.lock().map_err(|_| QueueError::Poisoned)?;
        queue.pop_front().ok_or(QueueError::Empty)
    }

    fn remaining(&self) -> usize {
        match self.points.lock() {
            Ok(queue) => queue.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// A `VecDeque` is never left half-updated by `pop_front`/`extend`, so the data behind a
    /// poisoned lock is still consistent and the flag can simply be cleared.
    fn recover(&self) {
        self.points.clear_poison();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn points(n: usize) -> Vec<ParameterPoint> {
        (0..n).map(|i| ParameterPoint::new(vec![i as f64])).collect()
    }

    #[test]
    fn pop_returns_points_in_insertion_order() {
        let mut queue = WorkQueue::new();
        queue.enqueue(points(3));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().unwrap().values(), &[0.0]);
        assert_eq!(queue.pop().unwrap().values(), &[1.0]);
        assert_eq!(queue.pop().unwrap().values(), &[2.0]);
        assert_eq!(queue.pop(), Err(QueueError::Empty));
        assert!(queue.is_empty());
    }

    #[test]
    fn concurrent_pops_hand_out_each_point_once() {
        let queue: Arc<WorkQueue> = Arc::new(points(1000).into_iter().collect());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    let mut taken = Vec::new();
                    while let Ok(point) = queue.pop() {
                        taken.push(point);
                    }
                    taken
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let mut total = 0;
        for handle in handles {
            for point in handle.join().unwrap() {
                total += 1;
                assert!(seen.insert(point));
            }
        }
        assert_eq!(total, 1000);
        assert_eq!(queue.remaining(), 0);
    }

    #[test]
    fn poisoned_queue_reports_error_until_recovered() {
        let queue: WorkQueue = points(2).into_iter().collect();
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = queue.points.lock().unwrap();
                    panic!("worker died while holding the queue");
                })
                .join();
        });

        assert_eq!(queue.pop(), Err(QueueError::Poisoned));
        assert_eq!(queue.remaining(), 2);

        queue.recover();
        assert_eq!(queue.pop().unwrap().values(), &[0.0]);
    }
}
