use std::path::PathBuf;
use xbit::engine::config::RecordMode;

pub struct DefaultsConfig {
    pub name: String,
    pub scan_type: String,
    pub cores: usize,
    pub points: usize,
    pub iterations: usize,
    pub record_mode: RecordMode,
    pub temp_root: PathBuf,
    pub output_root: PathBuf,
    pub grid_steps: usize,
    pub retry_attempts: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            name: "scan".to_string(),
            scan_type: "Random".to_string(),
            cores: 1,
            points: 100,
            iterations: 1,
            record_mode: RecordMode::Full,
            temp_root: PathBuf::from("Temp"),
            output_root: PathBuf::from("Output"),
            grid_steps: 10,
            retry_attempts: 3,
        }
    }
}
