use super::scan_type::ScanType;
use crate::core::observables::ObservableSet;
use crate::core::tools::ToolSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Base name of the per-worker result files inside the output directory; the worker index is
/// appended.
pub const OUTPUT_FILE_STEM: &str = "SpectrumFiles";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

/// How the result of a point that produced output is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordMode {
    /// One line per point: the parameter values followed by the observable vector.
    Compact,
    /// The raw simulation output followed by a sentinel line.
    #[default]
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarlyStopConfig {
    /// Points whose likelihood falls strictly below this value skip the secondary tools.
    pub threshold: f64,
}

/// What a worker does when popping from the queue fails for a reason other than exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueErrorPolicy {
    /// Stop the worker; the remaining points stay in the queue and are reported as
    /// unprocessed.
    #[default]
    Abort,
    /// Recover the queue and try again, giving up after `max_attempts` consecutive failures.
    Retry { max_attempts: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub name: String,
    pub scan_type: ScanType,
    pub cores: usize,
    pub record_mode: RecordMode,
    pub early_stop: Option<EarlyStopConfig>,
    pub queue_error_policy: QueueErrorPolicy,
    /// Parent of the per-worker scratch directories.
    pub temp_dir: PathBuf,
    pub output_dir: PathBuf,
    pub primary: ToolSettings,
    pub observables: ObservableSet,
}

impl ScanConfig {
    pub fn worker_dir(&self, index: usize) -> PathBuf {
        self.temp_dir.join(format!("id{}", index))
    }

    pub fn worker_log_path(&self, index: usize) -> PathBuf {
        self.worker_dir(index).join(format!("id{}.log", index))
    }

    pub fn worker_output_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("{}{}", OUTPUT_FILE_STEM, index))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Whether a point that produced output has to be parsed into observables.
    pub fn needs_projection(&self) -> bool {
        self.record_mode == RecordMode::Compact || self.scan_type.requires_structured_results()
    }
}

#[derive(Default)]
pub struct ScanConfigBuilder {
    name: Option<String>,
    scan_type: Option<ScanType>,
    cores: Option<usize>,
    record_mode: Option<RecordMode>,
    early_stop: Option<EarlyStopConfig>,
    queue_error_policy: Option<QueueErrorPolicy>,
    temp_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    primary: Option<ToolSettings>,
    observables: Option<ObservableSet>,
}

impl ScanConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn scan_type(mut self, scan_type: ScanType) -> Self {
        self.scan_type = Some(scan_type);
        self
    }
    pub fn cores(mut self, cores: usize) -> Self {
        self.cores = Some(cores);
        self
    }
    pub fn record_mode(mut self, mode: RecordMode) -> Self {
        self.record_mode = Some(mode);
        self
    }
    pub fn early_stop(mut self, early_stop: Option<EarlyStopConfig>) -> Self {
        self.early_stop = early_stop;
        self
    }
    pub fn queue_error_policy(mut self, policy: QueueErrorPolicy) -> Self {
        self.queue_error_policy = Some(policy);
        self
    }
    pub fn temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(path.into());
        self
    }
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }
    pub fn primary(mut self, settings: ToolSettings) -> Self {
        self.primary = Some(settings);
        self
    }
    pub fn observables(mut self, observables: ObservableSet) -> Self {
        self.observables = Some(observables);
        self
    }

    pub fn build(self) -> Result<ScanConfig, ConfigError> {
        let cores = self.cores.unwrap_or(1);
        if cores == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "cores",
                reason: "at least one worker is required".to_string(),
            });
        }
        if let Some(EarlyStopConfig { threshold }) = self.early_stop {
            if !threshold.is_finite() {
                return Err(ConfigError::InvalidValue {
                    parameter: "early_stop.threshold",
                    reason: format!("{} is not a finite number", threshold),
                });
            }
        }
        if let Some(QueueErrorPolicy::Retry { max_attempts: 0 }) = self.queue_error_policy {
            return Err(ConfigError::InvalidValue {
                parameter: "queue_error_policy.max_attempts",
                reason: "a retry policy needs at least one attempt".to_string(),
            });
        }

        Ok(ScanConfig {
            name: self.name.unwrap_or_else(|| "scan".to_string()),
            scan_type: self
                .scan_type
                .ok_or(ConfigError::MissingParameter("scan_type"))?,
            cores,
            record_mode: self.record_mode.unwrap_or_default(),
            early_stop: self.early_stop,
            queue_error_policy: self.queue_error_policy.unwrap_or_default(),
            temp_dir: self
                .temp_dir
                .ok_or(ConfigError::MissingParameter("temp_dir"))?,
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            primary: self.primary.ok_or(ConfigError::MissingParameter("primary"))?,
            observables: self.observables.unwrap_or_default(),
        })
    }
}
