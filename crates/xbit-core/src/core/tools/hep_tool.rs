use super::runner::{ToolContext, ToolError, ToolInvocation, ToolRunner};
use super::settings::ToolSettings;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// A post-processing step run against the spectrum of a point that produced output.
///
/// The set of secondary tools is open: anything implementing this trait can be chained after
/// the primary tool.
pub trait SecondaryTool: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, spectrum: &Path, context: ToolContext<'_>) -> Result<(), ToolError>;
}

/// A named external program (HiggsBounds, micrOMEGAs, Vevacious, ...) driven through a
/// [`ToolRunner`].
#[derive(Clone)]
pub struct HepTool {
    settings: ToolSettings,
    runner: Arc<dyn ToolRunner>,
}

impl HepTool {
    pub fn new(settings: ToolSettings, runner: Arc<dyn ToolRunner>) -> Self {
        info!(tool = %settings.name, "Tool initialised.");
        Self { settings, runner }
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// Removes the output a previous point left behind in the shared worker directory. Tools
    /// that write into their input or into the spectrum itself keep their file.
    fn clear_stale_output(&self, spectrum: &Path, workdir: &Path) -> Result<(), ToolError> {
        let output = self.settings.output_path(workdir);
        if output == self.settings.input_path(workdir) || output == spectrum {
            return Ok(());
        }
        match fs::remove_file(&output) {
            Ok(()) => {
                debug!(
                    tool = %self.settings.name,
                    path = %output.display(),
                    "Removed stale tool output."
                );
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ToolError::Failed {
                tool: self.settings.name.clone(),
                message: format!("cannot remove stale output {}: {}", output.display(), e),
            }),
        }
    }
}

impl SecondaryTool for HepTool {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn run(&self, spectrum: &Path, context: ToolContext<'_>) -> Result<(), ToolError> {
        info!(tool = %self.settings.name, "Running tool.");
        self.clear_stale_output(spectrum, context.workdir)?;
        self.runner.run(&ToolInvocation {
            settings: &self.settings,
            spectrum,
            context,
        })
    }
}

impl std::fmt::Debug for HepTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HepTool")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
