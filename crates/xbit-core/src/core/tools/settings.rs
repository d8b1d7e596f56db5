use std::path::{Path, PathBuf};

/// Read-only description of one external program.
///
/// `input` and `output` are file names resolved against the working directory of the worker
/// that runs the tool, so every worker reads and writes its own copies.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub name: String,
    /// Directory holding the executable.
    pub path: PathBuf,
    pub binary: String,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Argument templates. Supported placeholders: `{input}`, `{output}`, `{spectrum}` and
    /// `{workdir}`.
    pub args: Vec<String>,
}

impl ToolSettings {
    pub fn new(name: &str, path: impl Into<PathBuf>, binary: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            binary: binary.to_string(),
            input: PathBuf::from(format!("{}.in", name)),
            output: PathBuf::from(format!("{}.out", name)),
            args: vec!["{input}".to_string()],
        }
    }

    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn program(&self) -> PathBuf {
        self.path.join(&self.binary)
    }

    pub fn input_path(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.input)
    }

    pub fn output_path(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.output)
    }

    /// Expands the argument templates for one invocation.
    pub fn expand_args(&self, workdir: &Path, spectrum: &Path) -> Vec<String> {
        let input = self.input_path(workdir);
        let output = self.output_path(workdir);
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input.to_string_lossy())
                    .replace("{output}", &output.to_string_lossy())
                    .replace("{spectrum}", &spectrum.to_string_lossy())
                    .replace("{workdir}", &workdir.to_string_lossy())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_derive_file_names_from_tool_name() {
        let settings = ToolSettings::new("SPheno", "/opt/spheno/bin", "SPheno");
        assert_eq!(settings.input, PathBuf::from("SPheno.in"));
        assert_eq!(settings.output, PathBuf::from("SPheno.out"));
        assert_eq!(settings.program(), PathBuf::from("/opt/spheno/bin/SPheno"));
    }

    #[test]
    fn paths_resolve_against_working_directory() {
        let settings = ToolSettings::new("SPheno", "/opt", "SPheno")
            .with_input("LesHouches.in")
            .with_output("SPheno.spc");
        let workdir = Path::new("/tmp/scan/id3");
        assert_eq!(
            settings.input_path(workdir),
            PathBuf::from("/tmp/scan/id3/LesHouches.in")
        );
        assert_eq!(
            settings.output_path(workdir),
            PathBuf::from("/tmp/scan/id3/SPheno.spc")
        );
    }

    #[test]
    fn argument_placeholders_are_expanded() {
        let settings = ToolSettings::new("HB", "/opt", "HiggsBounds").with_args(vec![
            "LandH".to_string(),
            "SLHA".to_string(),
            "{spectrum}".to_string(),
            "--out={output}".to_string(),
            "{workdir}/".to_string(),
        ]);
        let args = settings.expand_args(Path::new("/w"), Path::new("/w/SPheno.spc"));
        assert_eq!(
            args,
            vec!["LandH", "SLHA", "/w/SPheno.spc", "--out=/w/HB.out", "/w/"]
        );
    }
}
