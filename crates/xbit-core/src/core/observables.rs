use crate::core::io::slha::{EntryKey, LookupError, Spectrum};

/// A scalar extracted from simulation output through a composite `(block, key)` lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Observable {
    pub name: String,
    pub block: String,
    pub key: EntryKey,
    /// Expected value; also the fallback used when the observable is missing from a spectrum
    /// that is only inspected by the early-stop gate.
    pub mean: f64,
    pub variance: Option<f64>,
}

impl Observable {
    pub fn new(name: &str, block: &str, key: impl Into<EntryKey>, mean: f64) -> Self {
        Self {
            name: name.to_string(),
            block: block.to_string(),
            key: key.into(),
            mean,
            variance: None,
        }
    }

    pub fn with_variance(mut self, variance: f64) -> Self {
        self.variance = Some(variance);
        self
    }

    pub fn lookup(&self, spectrum: &Spectrum) -> Result<f64, LookupError> {
        spectrum.value(&self.block, &self.key)
    }
}

/// The ordered observable vector of a scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservableSet {
    observables: Vec<Observable>,
}

impl ObservableSet {
    pub fn new(observables: Vec<Observable>) -> Self {
        Self { observables }
    }

    pub fn len(&self) -> usize {
        self.observables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observable> {
        self.observables.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.observables.iter().map(|o| o.name.as_str()).collect()
    }

    /// Projects a spectrum onto the observable vector, failing on the first missing value.
    pub fn project(&self, spectrum: &Spectrum) -> Result<Vec<f64>, LookupError> {
        self.observables.iter().map(|o| o.lookup(spectrum)).collect()
    }

    /// Projects a spectrum onto the observable vector, substituting the mean of every
    /// observable that cannot be found.
    pub fn project_or_mean(&self, spectrum: &Spectrum) -> Vec<f64> {
        self.observables
            .iter()
            .map(|o| o.lookup(spectrum).unwrap_or(o.mean))
            .collect()
    }

    pub fn means(&self) -> Vec<f64> {
        self.observables.iter().map(|o| o.mean).collect()
    }
}

impl FromIterator<Observable> for ObservableSet {
    fn from_iter<T: IntoIterator<Item = Observable>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
