use std::path::PathBuf;
use xbit::core::tools::ToolSettings;
use xbit::engine::config::ScanConfig;

/// A scan variable and the interval the built-in sampler draws it from.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
    /// Number of grid nodes along this variable for grid scans.
    pub steps: usize,
}

pub struct AppConfig {
    pub scan: ScanConfig,
    pub secondary_tools: Vec<ToolSettings>,
    pub input_template: PathBuf,
    pub variables: Vec<VariableRange>,
    pub points_per_iteration: usize,
    pub iterations: usize,
    pub seed: Option<u64>,
    pub points_file: Option<PathBuf>,
    pub clean: bool,
}

impl AppConfig {
    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }
}
