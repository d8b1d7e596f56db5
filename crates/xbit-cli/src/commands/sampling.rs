use crate::config::models::VariableRange;
use crate::error::{CliError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use xbit::core::point::ParameterPoint;

/// Produces the points handed to the engine, one batch per iteration.
pub enum PointSource {
    /// A finite list, consumed front to back; used for point files and grids.
    Fixed(VecDeque<ParameterPoint>),
    /// Fresh points drawn uniformly from the variable ranges for every batch.
    Uniform {
        ranges: Vec<VariableRange>,
        rng: StdRng,
    },
}

impl PointSource {
    pub fn uniform(ranges: Vec<VariableRange>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        PointSource::Uniform { ranges, rng }
    }

    /// Cartesian product of `steps` evenly spaced nodes per variable, first variable slowest.
    pub fn grid(ranges: &[VariableRange]) -> Self {
        let mut points: Vec<Vec<f64>> = vec![Vec::with_capacity(ranges.len())];
        for range in ranges {
            let nodes = grid_nodes(range);
            points = points
                .into_iter()
                .flat_map(|prefix| {
                    nodes.iter().map(move |&x| {
                        let mut next = prefix.clone();
                        next.push(x);
                        next
                    })
                })
                .collect();
        }
        info!(points = points.len(), "Grid generated.");
        PointSource::Fixed(points.into_iter().map(ParameterPoint::new).collect())
    }

    /// Reads one point per line: whitespace-separated numbers, `#` starts a comment.
    pub fn from_file(path: &Path, dimension: usize) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let parse_error = |line: usize, message: String| CliError::Parse {
            path: path.to_path_buf(),
            source: anyhow::anyhow!("line {}: {}", line, message),
        };

        let mut points = VecDeque::new();
        for (index, line) in content.lines().enumerate() {
            let data = line.split('#').next().unwrap_or("").trim();
            if data.is_empty() {
                continue;
            }
            let values = data
                .split_whitespace()
                .map(|token| {
                    token
                        .parse::<f64>()
                        .map_err(|_| parse_error(index + 1, format!("'{}' is not a number", token)))
                })
                .collect::<Result<Vec<_>>>()?;
            if values.len() != dimension {
                return Err(parse_error(
                    index + 1,
                    format!("expected {} values, found {}", dimension, values.len()),
                ));
            }
            points.push_back(ParameterPoint::new(values));
        }
        debug!(points = points.len(), path = ?path, "Points loaded from file.");
        Ok(PointSource::Fixed(points))
    }

    /// Points still to come from a finite source; `None` for a sampler that never runs dry.
    pub fn remaining(&self) -> Option<usize> {
        match self {
            PointSource::Fixed(points) => Some(points.len()),
            PointSource::Uniform { .. } => None,
        }
    }

    /// Returns up to `size` points; an empty batch means the source is exhausted.
    pub fn next_batch(&mut self, size: usize) -> Vec<ParameterPoint> {
        match self {
            PointSource::Fixed(points) => {
                let take = size.min(points.len());
                points.drain(..take).collect()
            }
            PointSource::Uniform { ranges, rng } => (0..size)
                .map(|_| {
                    ParameterPoint::new(
                        ranges
                            .iter()
                            .map(|r| {
                                if r.min < r.max {
                                    rng.gen_range(r.min..r.max)
                                } else {
                                    r.min
                                }
                            })
                            .collect::<Vec<_>>(),
                    )
                })
                .collect(),
        }
    }
}

fn grid_nodes(range: &VariableRange) -> Vec<f64> {
    if range.steps <= 1 {
        return vec![range.min];
    }
    let step = (range.max - range.min) / (range.steps - 1) as f64;
    (0..range.steps)
        .map(|i| range.min + step * i as f64)
        .collect()
}
