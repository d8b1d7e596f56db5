use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The scan variants a run can be configured with.
///
/// The set is closed: every variant is known at compile time and resolved by name through a
/// static table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanType {
    Grid,
    Random,
    Mls,
    Mls1,
    Mcmc,
    McmcNn,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown scan type '{name}' (expected one of: {known})")]
pub struct ScanTypeError {
    pub name: String,
    pub known: String,
}

static SCAN_TYPES: Map<&'static str, ScanType> = phf_map! {
    "Grid" => ScanType::Grid,
    "Random" => ScanType::Random,
    "MLS" => ScanType::Mls,
    "MLS1" => ScanType::Mls1,
    "MCMC" => ScanType::Mcmc,
    "MCMC_NN" => ScanType::McmcNn,
};

impl ScanType {
    pub const ALL: [ScanType; 6] = [
        ScanType::Grid,
        ScanType::Random,
        ScanType::Mls,
        ScanType::Mls1,
        ScanType::Mcmc,
        ScanType::McmcNn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScanType::Grid => "Grid",
            ScanType::Random => "Random",
            ScanType::Mls => "MLS",
            ScanType::Mls1 => "MLS1",
            ScanType::Mcmc => "MCMC",
            ScanType::McmcNn => "MCMC_NN",
        }
    }

    /// Whether the scan strategy consumes the observable vector of every valid point. Such
    /// scans need the spectrum projected even when the full output is recorded, and a point
    /// whose observables cannot be extracted counts as invalid.
    pub fn requires_structured_results(self) -> bool {
        matches!(
            self,
            ScanType::Mls | ScanType::Mls1 | ScanType::Mcmc | ScanType::McmcNn
        )
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScanType {
    type Err = ScanTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SCAN_TYPES.get(s.trim()).copied().ok_or_else(|| ScanTypeError {
            name: s.to_string(),
            known: ScanType::ALL
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}
