use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Append-only log file owned by a single worker.
///
/// Besides free-form lines it hands out [`Stdio`] handles, so the raw output of external
/// programs lands in the same file as the command lines that produced it.
#[derive(Debug)]
pub struct ToolLog {
    path: PathBuf,
    file: File,
}

impl ToolLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line(&self, message: &str) -> io::Result<()> {
        let mut file = &self.file;
        writeln!(file, "{}", message)
    }

    pub fn command_line(&self, program: &Path, args: &[String]) -> io::Result<()> {
        let mut rendered = program.to_string_lossy().into_owned();
        for arg in args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        self.line(&format!("$ {}", rendered))
    }

    /// A handle for redirecting a child process stream into this log.
    pub fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::from(self.file.try_clone()?))
    }
}
