use super::log::ToolLog;
use super::settings::ToolSettings;
use crate::core::point::ParameterPoint;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to launch '{program}': {source}", program = program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write to the worker log: {0}")]
    Log(#[source] io::Error),
    #[error("Tool '{tool}' failed: {message}")]
    Failed { tool: String, message: String },
}

/// The per-worker state an external program runs against.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub point: &'a ParameterPoint,
    pub workdir: &'a Path,
    pub log: &'a ToolLog,
}

/// One concrete call of a tool.
#[derive(Debug, Clone, Copy)]
pub struct ToolInvocation<'a> {
    pub settings: &'a ToolSettings,
    /// The spectrum file the invocation works on; for the primary tool this is the file it is
    /// expected to produce.
    pub spectrum: &'a Path,
    pub context: ToolContext<'a>,
}

impl ToolInvocation<'_> {
    pub fn input_path(&self) -> PathBuf {
        self.settings.input_path(self.context.workdir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.settings.output_path(self.context.workdir)
    }
}

/// Runs an external program synchronously.
///
/// Implementations must return `Ok(())` for an ordinary non-zero exit; errors are reserved for
/// failures to run the program at all.
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation<'_>) -> Result<(), ToolError>;
}

/// Launches `<path>/<binary> <args...>` as a child process inside the worker directory and
/// redirects both output streams into the worker log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalCommand;

impl ToolRunner for ExternalCommand {
    fn run(&self, invocation: &ToolInvocation<'_>) -> Result<(), ToolError> {
        let settings = invocation.settings;
        let context = invocation.context;
        let program = settings.program();
        let args = settings.expand_args(context.workdir, invocation.spectrum);

        context
            .log
            .command_line(&program, &args)
            .map_err(ToolError::Log)?;
        debug!(tool = %settings.name, program = %program.display(), "Launching external tool.");

        let status = Command::new(&program)
            .args(&args)
            .current_dir(context.workdir)
            .stdin(Stdio::null())
            .stdout(context.log.stdio().map_err(ToolError::Log)?)
            .stderr(context.log.stdio().map_err(ToolError::Log)?)
            .status()
            .map_err(|e| ToolError::Spawn {
                program: program.clone(),
                source: e,
            })?;

        if !status.success() {
            warn!(tool = %settings.name, %status, "External tool exited unsuccessfully.");
            context
                .log
                .line(&format!("{} exited with {}", settings.name, status))
                .map_err(ToolError::Log)?;
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn shell(script: &str) -> ToolSettings {
        ToolSettings::new("sh", "/bin", "sh").with_args(vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn output_of_child_process_lands_in_worker_log() {
        let dir = tempdir().unwrap();
        let log = ToolLog::open(&dir.path().join("id0.log")).unwrap();
        let point = ParameterPoint::new(vec![1.0]);
        let settings = shell("echo spectrum > {output}; echo done");
        let spectrum = settings.output_path(dir.path());

        ExternalCommand
            .run(&ToolInvocation {
                settings: &settings,
                spectrum: &spectrum,
                context: ToolContext {
                    point: &point,
                    workdir: dir.path(),
                    log: &log,
                },
            })
            .unwrap();

        assert_eq!(std::fs::read_to_string(&spectrum).unwrap(), "spectrum\n");
        let log_content = std::fs::read_to_string(log.path()).unwrap();
        assert!(log_content.starts_with("$ /bin/sh -c echo spectrum"));
        assert!(log_content.contains("done\n"));
    }

    #[test]
    fn non_zero_exit_is_not_an_error() {
        let dir = tempdir().unwrap();
        let log = ToolLog::open(&dir.path().join("id0.log")).unwrap();
        let point = ParameterPoint::new(vec![1.0]);
        let settings = shell("exit 3");
        let spectrum = settings.output_path(dir.path());

        let result = ExternalCommand.run(&ToolInvocation {
            settings: &settings,
            spectrum: &spectrum,
            context: ToolContext {
                point: &point,
                workdir: dir.path(),
                log: &log,
            },
        });

        assert!(result.is_ok());
        assert!(!spectrum.exists());
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let dir = tempdir().unwrap();
        let log = ToolLog::open(&dir.path().join("id0.log")).unwrap();
        let point = ParameterPoint::new(vec![1.0]);
        let settings = ToolSettings::new("ghost", dir.path(), "does-not-exist");
        let spectrum = settings.output_path(dir.path());

        let err = ExternalCommand
            .run(&ToolInvocation {
                settings: &settings,
                spectrum: &spectrum,
                context: ToolContext {
                    point: &point,
                    workdir: dir.path(),
                    log: &log,
                },
            })
            .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
