use crate::core::point::{ParameterPoint, format_value};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("File I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Point has {got} coordinates but the input template expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("Template placeholder '{{{{{0}}}}}' does not name a scan variable")]
    UnknownPlaceholder(String),
    #[error("Unterminated placeholder in input template")]
    UnterminatedPlaceholder,
}

/// Renders the input file of the primary tool for one parameter point.
pub trait InputWriter: Send + Sync {
    fn write(&self, point: &ParameterPoint, destination: &Path) -> Result<(), InputError>;
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Variable(usize),
}

/// Input writer based on a plain-text template (typically a Les Houches input file) in which
/// every `{{name}}` placeholder is replaced by the coordinate of the variable `name`.
#[derive(Debug, Clone)]
pub struct TemplateInputWriter {
    segments: Vec<Segment>,
    dimension: usize,
}

impl TemplateInputWriter {
    /// Compiles `template` against the ordered list of scan variables. Placeholders naming an
    /// unknown variable are rejected here rather than when the first point is written.
    pub fn new(template: &str, variables: &[String]) -> Result<Self, InputError> {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after_open = &rest[start + 2..];
            let end = after_open
                .find("}}")
                .ok_or(InputError::UnterminatedPlaceholder)?;
            let name = after_open[..end].trim();
            let index = variables
                .iter()
                .position(|v| v == name)
                .ok_or_else(|| InputError::UnknownPlaceholder(name.to_string()))?;
            segments.push(Segment::Variable(index));
            rest = &after_open[end + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self {
            segments,
            dimension: variables.len(),
        })
    }

    pub fn from_path(path: &Path, variables: &[String]) -> Result<Self, InputError> {
        let template = fs::read_to_string(path).map_err(|e| InputError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::new(&template, variables)
    }

    /// Indices of the variables that never appear in the template.
    pub fn unused_variables(&self) -> Vec<usize> {
        let used: HashSet<usize> = self
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Variable(i) => Some(*i),
                Segment::Text(_) => None,
            })
            .collect();
        (0..self.dimension).filter(|i| !used.contains(i)).collect()
    }

    pub fn render(&self, point: &ParameterPoint) -> Result<String, InputError> {
        if point.len() != self.dimension {
            return Err(InputError::DimensionMismatch {
                expected: self.dimension,
                got: point.len(),
            });
        }
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Variable(i) => out.push_str(&format_value(point.values()[*i])),
            }
        }
        Ok(out)
    }
}

impl InputWriter for TemplateInputWriter {
    fn write(&self, point: &ParameterPoint, destination: &Path) -> Result<(), InputError> {
        let content = self.render(point)?;
        fs::write(destination, content).map_err(|e| InputError::Io {
            path: destination.to_path_buf(),
            source: e,
        })
    }
}
