use super::pipeline::Outcome;
use crate::core::point::ParameterPoint;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A valid point together with the observables extracted from its spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    pub point: ParameterPoint,
    pub observables: Vec<f64>,
}

/// Shared, append-only sink for the outcomes of one batch.
///
/// Arrival order reflects worker scheduling and is not deterministic; only the multisets are.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    all_data: Mutex<Vec<DataRecord>>,
    valid: Mutex<Vec<ParameterPoint>>,
    invalid: Mutex<Vec<ParameterPoint>>,
    dropped: AtomicUsize,
}

fn push<T>(sink: &Mutex<Vec<T>>, item: T) {
    // Appends cannot leave a Vec inconsistent, so a poisoned sink keeps accepting results.
    match sink.lock() {
        Ok(mut items) => items.push(item),
        Err(poisoned) => poisoned.into_inner().push(item),
    }
}

fn take<T>(sink: Mutex<Vec<T>>) -> Vec<T> {
    sink.into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: Outcome) {
        match outcome {
            Outcome::Valid { point, observables } => {
                if let Some(observables) = observables {
                    push(
                        &self.all_data,
                        DataRecord {
                            point: point.clone(),
                            observables,
                        },
                    );
                }
                push(&self.valid, point);
            }
            Outcome::Invalid(point) => push(&self.invalid, point),
            Outcome::Dropped(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn into_results(self) -> BatchResults {
        BatchResults {
            all_data: take(self.all_data),
            valid: take(self.valid),
            invalid: take(self.invalid),
            dropped: self.dropped.into_inner(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResults {
    pub all_data: Vec<DataRecord>,
    pub valid: Vec<ParameterPoint>,
    pub invalid: Vec<ParameterPoint>,
    pub dropped: usize,
}

impl BatchResults {
    /// Number of points that reached a terminal outcome.
    pub fn processed(&self) -> usize {
        self.valid.len() + self.invalid.len() + self.dropped
    }
}

/// Results accumulated over every batch of a run. Later batches are appended, never
/// replacing earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunHistory {
    pub all_data: Vec<DataRecord>,
    pub valid: Vec<ParameterPoint>,
    pub invalid: Vec<ParameterPoint>,
    pub dropped: usize,
    pub batches: usize,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, batch: BatchResults) {
        self.all_data.extend(batch.all_data);
        self.valid.extend(batch.valid);
        self.invalid.extend(batch.invalid);
        self.dropped += batch.dropped;
        self.batches += 1;
    }
}
