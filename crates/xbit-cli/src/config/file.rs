use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use xbit::core::io::slha::EntryKey;
use xbit::core::observables::Observable;
use xbit::core::tools::ToolSettings;
use xbit::engine::config::RecordMode;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub setup: Option<FileSetupConfig>,
    pub primary: Option<FileToolConfig>,
    #[serde(default)]
    pub tools: Vec<FileToolConfig>,
    #[serde(default)]
    pub observables: Vec<FileObservableConfig>,
    #[serde(default)]
    pub variables: Vec<FileVariableConfig>,
    pub input: Option<FileInputConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSetupConfig {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub scan_type: Option<String>,
    pub cores: Option<usize>,
    pub points: Option<usize>,
    pub iterations: Option<usize>,
    pub record: Option<RecordMode>,
    pub seed: Option<u64>,
    pub temp_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub early_stop: Option<FileEarlyStopConfig>,
    pub queue_errors: Option<FileQueueErrorsConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct FileEarlyStopConfig {
    pub threshold: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileQueuePolicy {
    Abort,
    Retry,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileQueueErrorsConfig {
    pub policy: Option<FileQueuePolicy>,
    pub max_attempts: Option<usize>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileToolConfig {
    pub name: String,
    pub path: PathBuf,
    pub binary: String,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub args: Option<Vec<String>>,
}

impl From<FileToolConfig> for ToolSettings {
    fn from(f: FileToolConfig) -> Self {
        let mut settings = ToolSettings::new(&f.name, f.path, &f.binary);
        if let Some(input) = f.input {
            settings = settings.with_input(input);
        }
        if let Some(output) = f.output {
            settings = settings.with_output(output);
        }
        if let Some(args) = f.args {
            settings = settings.with_args(args);
        }
        settings
    }
}

/// An SLHA entry index: `key = 25` or `key = [1, 2]`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FileEntryKey {
    Single(i64),
    Composite(Vec<i64>),
}

impl From<FileEntryKey> for EntryKey {
    fn from(k: FileEntryKey) -> Self {
        match k {
            FileEntryKey::Single(index) => EntryKey::from(index),
            FileEntryKey::Composite(indices) => EntryKey::from(indices),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileObservableConfig {
    pub name: String,
    pub block: String,
    pub key: FileEntryKey,
    pub mean: f64,
    pub variance: Option<f64>,
}

impl From<FileObservableConfig> for Observable {
    fn from(f: FileObservableConfig) -> Self {
        let observable = Observable::new(&f.name, &f.block, f.key, f.mean);
        match f.variance {
            Some(variance) => observable.with_variance(variance),
            None => observable,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileVariableConfig {
    pub name: String,
    pub range: [f64; 2],
    pub steps: Option<usize>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileInputConfig {
    pub template: PathBuf,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading scan file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::Parse {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scan_file_deserializes() {
        let config: FileConfig = toml::from_str(
            r#"
            [setup]
            name = "demo"
            type = "MCMC"
            cores = 4
            record = "compact"
            [setup.early-stop]
            threshold = 0.01
            [setup.queue-errors]
            policy = "retry"
            max-attempts = 5

            [primary]
            name = "SPheno"
            path = "/opt/spheno/bin"
            binary = "SPheno"
            input = "LesHouches.in"
            output = "SPheno.spc"

            [[tools]]
            name = "HiggsBounds"
            path = "/opt/hb"
            binary = "HiggsBounds"
            args = ["LandH", "SLHA", "3", "1", "{workdir}/"]

            [[observables]]
            name = "mh"
            block = "MASS"
            key = 25
            mean = 125.1
            variance = 4.0

            [[observables]]
            name = "ZH11"
            block = "SCALARMIX"
            key = [1, 1]
            mean = 0.0

            [[variables]]
            name = "m0"
            range = [100.0, 1000.0]

            [input]
            template = "LesHouches.in.template"
            "#,
        )
        .unwrap();

        let setup = config.setup.unwrap();
        assert_eq!(setup.scan_type.as_deref(), Some("MCMC"));
        assert_eq!(setup.record, Some(RecordMode::Compact));
        assert_eq!(setup.early_stop.unwrap().threshold, Some(0.01));
        assert_eq!(setup.queue_errors.unwrap().policy, Some(FileQueuePolicy::Retry));
        assert_eq!(config.tools.len(), 1);
        assert_eq!(config.observables[1].key, FileEntryKey::Composite(vec![1, 1]));

        let settings: ToolSettings = config.primary.unwrap().into();
        assert_eq!(settings.output, PathBuf::from("SPheno.spc"));
        assert_eq!(settings.args, vec!["{input}".to_string()]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<FileConfig, _> = toml::from_str(
            r#"
            [setup]
            threads = 3
            "#,
        );
        assert!(result.is_err());
    }
}
