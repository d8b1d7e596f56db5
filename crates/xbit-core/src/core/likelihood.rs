use crate::core::observables::ObservableSet;

/// Scores an observable vector with a single scalar; larger is better.
pub trait Likelihood: Send + Sync {
    fn evaluate(&self, values: &[f64]) -> f64;
}

impl<F> Likelihood for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn evaluate(&self, values: &[f64]) -> f64 {
        self(values)
    }
}

/// Product of unnormalised Gaussians, one per observable that declares a variance.
///
/// Each factor is `exp(-(x - mean)^2 / (2 variance))`, so the likelihood is `1` when every
/// constrained observable sits on its mean. Observables without a variance do not contribute.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianLikelihood {
    terms: Vec<Option<(f64, f64)>>,
}

impl GaussianLikelihood {
    pub fn from_observables(observables: &ObservableSet) -> Self {
        Self {
            terms: observables
                .iter()
                .map(|o| o.variance.filter(|v| *v > 0.0).map(|v| (o.mean, v)))
                .collect(),
        }
    }
}

impl Likelihood for GaussianLikelihood {
    fn evaluate(&self, values: &[f64]) -> f64 {
        let chi2_half: f64 = self
            .terms
            .iter()
            .zip(values)
            .filter_map(|(term, &x)| term.map(|(mean, var)| (x - mean).powi(2) / (2.0 * var)))
            .sum();
        (-chi2_half).exp()
    }
}
