use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Integer index path addressing one entry inside a spectrum block, e.g. `[25]` in `MASS`
/// or `[1, 1]` in a mixing-matrix block. Entries without indices use the empty key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EntryKey(Vec<i64>);

impl EntryKey {
    pub fn new(indices: impl Into<Vec<i64>>) -> Self {
        Self(indices.into())
    }

    pub fn indices(&self) -> &[i64] {
        &self.0
    }
}

impl From<i64> for EntryKey {
    fn from(index: i64) -> Self {
        Self(vec![index])
    }
}

impl From<Vec<i64>> for EntryKey {
    fn from(indices: Vec<i64>) -> Self {
        Self(indices)
    }
}

impl<const N: usize> From<[i64; N]> for EntryKey {
    fn from(indices: [i64; N]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self.0.iter().map(i64::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Block '{block}' not present in spectrum")]
    MissingBlock { block: String },
    #[error("Entry {key} not present in block '{block}'")]
    MissingEntry { block: String, key: EntryKey },
}

#[derive(Debug, Error)]
pub enum SpectrumError {
    #[error("File I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// A parsed spectrum: numeric entries grouped by (case-insensitive) block name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    blocks: HashMap<String, HashMap<EntryKey, f64>>,
}

impl Spectrum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, block: &str, key: impl Into<EntryKey>, value: f64) {
        self.blocks
            .entry(block.to_ascii_uppercase())
            .or_default()
            .insert(key.into(), value);
    }

    pub fn has_block(&self, block: &str) -> bool {
        self.blocks.contains_key(&block.to_ascii_uppercase())
    }

    /// Looks up a single value by its composite key.
    pub fn value(&self, block: &str, key: &EntryKey) -> Result<f64, LookupError> {
        let entries = self
            .blocks
            .get(&block.to_ascii_uppercase())
            .ok_or_else(|| LookupError::MissingBlock {
                block: block.to_string(),
            })?;
        entries
            .get(key)
            .copied()
            .ok_or_else(|| LookupError::MissingEntry {
                block: block.to_string(),
                key: key.clone(),
            })
    }
}

/// Reads the structured output artifact of an external tool.
pub trait SpectrumParser: Send + Sync {
    fn read(&self, path: &Path) -> Result<Spectrum, SpectrumError>;
}

/// Parser for SUSY Les Houches Accord files.
///
/// `DECAY <pdg> <width>` headers are stored as entry `[pdg]` of the `WIDTH` block; the
/// branching-ratio lines that follow them are skipped. Entries whose value is not numeric
/// (e.g. program names in `SPINFO`) are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlhaParser;

impl SlhaParser {
    pub fn parse(reader: impl BufRead) -> Result<Spectrum, SpectrumError> {
        let mut spectrum = Spectrum::new();
        let mut current_block: Option<String> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line_num = line_num + 1;
            let line = line_res.map_err(|e| SpectrumError::Parse {
                line: line_num,
                message: e.to_string(),
            })?;
            let content = line.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            let tokens: Vec<&str> = content.split_whitespace().collect();
            match tokens[0].to_ascii_uppercase().as_str() {
                "BLOCK" => {
                    let name = tokens.get(1).ok_or_else(|| SpectrumError::Parse {
                        line: line_num,
                        message: "BLOCK statement without a name".to_string(),
                    })?;
                    current_block = Some(name.to_ascii_uppercase());
                }
                "DECAY" => {
                    let (Some(pdg), Some(width)) = (tokens.get(1), tokens.get(2)) else {
                        return Err(SpectrumError::Parse {
                            line: line_num,
                            message: "DECAY statement requires a PDG code and a width"
                                .to_string(),
                        });
                    };
                    let pdg: i64 = pdg.parse().map_err(|_| SpectrumError::Parse {
                        line: line_num,
                        message: format!("Invalid PDG code '{}'", pdg),
                    })?;
                    let width = parse_number(width).ok_or_else(|| SpectrumError::Parse {
                        line: line_num,
                        message: format!("Invalid decay width '{}'", width),
                    })?;
                    spectrum.insert("WIDTH", pdg, width);
                    current_block = None;
                }
                _ => {
                    if let Some(block) = &current_block {
                        if let Some((key, value)) = parse_entry(&tokens) {
                            spectrum.insert(block, key, value);
                        }
                    }
                }
            }
        }

        Ok(spectrum)
    }

    pub fn parse_str(content: &str) -> Result<Spectrum, SpectrumError> {
        Self::parse(content.as_bytes())
    }
}

impl SpectrumParser for SlhaParser {
    fn read(&self, path: &Path) -> Result<Spectrum, SpectrumError> {
        let file = File::open(path).map_err(|e| SpectrumError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(BufReader::new(file))
    }
}

fn is_index(token: &str) -> bool {
    token.parse::<i64>().is_ok()
}

fn parse_number(token: &str) -> Option<f64> {
    token.replace(['D', 'd'], "E").parse().ok()
}

/// Splits a data line into leading integer indices and the value that follows them. A line
/// made only of integers uses its last token as the value.
fn parse_entry(tokens: &[&str]) -> Option<(EntryKey, f64)> {
    let value_pos = tokens
        .iter()
        .position(|t| !is_index(t))
        .unwrap_or(tokens.len() - 1);
    let value = parse_number(tokens[value_pos])?;
    let indices = tokens[..value_pos]
        .iter()
        .map(|t| t.parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    Some((EntryKey::new(indices), value))
}
