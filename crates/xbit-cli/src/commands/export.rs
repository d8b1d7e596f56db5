use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::info;
use xbit::core::point::ParameterPoint;
use xbit::engine::aggregator::RunHistory;

pub const VALID_FILE: &str = "valid_points.csv";
pub const INVALID_FILE: &str = "invalid_points.csv";
pub const DATA_FILE: &str = "all_data.csv";

/// Writes the accumulated run history as CSV tables into `dir` and returns the files written.
/// The observable table is only written when the scan collected structured results.
pub fn export_history(
    history: &RunHistory,
    variables: &[String],
    observables: &[&str],
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for (name, points) in [(VALID_FILE, &history.valid), (INVALID_FILE, &history.invalid)] {
        let path = dir.join(name);
        write_points(&path, variables, points)?;
        written.push(path);
    }

    if !history.all_data.is_empty() {
        let path = dir.join(DATA_FILE);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(
            variables
                .iter()
                .map(String::as_str)
                .chain(observables.iter().copied()),
        )?;
        for record in &history.all_data {
            writer.write_record(
                record
                    .point
                    .values()
                    .iter()
                    .chain(&record.observables)
                    .map(|v| v.to_string()),
            )?;
        }
        writer.flush()?;
        written.push(path);
    }

    info!(files = written.len(), dir = ?dir, "Run history exported.");
    Ok(written)
}

fn write_points(path: &Path, variables: &[String], points: &[ParameterPoint]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(variables)?;
    for point in points {
        writer.write_record(point.values().iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
