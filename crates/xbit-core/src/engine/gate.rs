use super::config::EarlyStopConfig;
use crate::core::io::slha::SpectrumParser;
use crate::core::likelihood::Likelihood;
use crate::core::observables::ObservableSet;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Pass,
    Drop { likelihood: f64 },
}

/// Cheap likelihood check on the primary output, deciding whether a point is worth the
/// secondary tools.
///
/// Observables missing from the spectrum are replaced by their means, and an unreadable
/// spectrum is scored with all means. A point is only ever dropped because its likelihood is
/// strictly below the threshold.
pub struct EarlyStopGate<'a> {
    threshold: f64,
    observables: &'a ObservableSet,
    parser: &'a dyn SpectrumParser,
    likelihood: &'a dyn Likelihood,
}

impl<'a> EarlyStopGate<'a> {
    pub fn new(
        config: EarlyStopConfig,
        observables: &'a ObservableSet,
        parser: &'a dyn SpectrumParser,
        likelihood: &'a dyn Likelihood,
    ) -> Self {
        Self {
            threshold: config.threshold,
            observables,
            parser,
            likelihood,
        }
    }

    pub fn check(&self, spectrum: &Path) -> GateDecision {
        if !spectrum.exists() {
            // Nothing to score; the missing output is classified downstream.
            return GateDecision::Pass;
        }

        let values = match self.parser.read(spectrum) {
            Ok(parsed) => self.observables.project_or_mean(&parsed),
            Err(e) => {
                warn!(
                    error = %e,
                    "Spectrum unreadable for likelihood check; scoring with observable means."
                );
                self.observables.means()
            }
        };

        let likelihood = self.likelihood.evaluate(&values);
        debug!(likelihood, threshold = self.threshold, "Early-stop likelihood evaluated.");
        if likelihood < self.threshold {
            GateDecision::Drop { likelihood }
        } else {
            GateDecision::Pass
        }
    }
}
