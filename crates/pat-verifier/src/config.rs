//! Verifier process configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default PAT console executable.
pub const DEFAULT_EXECUTABLE: &str = "PAT3.Console.exe";

/// Default timeout per model, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// How to invoke the model checker.
///
/// The command line is `[launcher] executable args...`, where `{model}` and
/// `{report}` in `args` are replaced by absolute paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub executable: PathBuf,
    /// Runtime host for the executable (`mono` for the PAT console).
    pub launcher: Option<String>,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        VerifierConfig {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            launcher: Some("mono".to_string()),
            args: ["-csp", "-v", "{model}", "{report}"]
                .iter()
                .map(|a| a.to_string())
                .collect(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl VerifierConfig {
    /// Defaults with the executable taken from `PAT_CONSOLE_PATH`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os("PAT_CONSOLE_PATH").filter(|p| !p.is_empty()) {
            config.executable = PathBuf::from(path);
        }
        config
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = path.into();
        self
    }

    pub fn with_launcher(mut self, launcher: Option<&str>) -> Self {
        self.launcher = launcher.map(str::to_string);
        self
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Report file the checker writes for `model`: `<model>.log`.
    pub fn report_path(model: &Path) -> PathBuf {
        let mut name = model.as_os_str().to_os_string();
        name.push(".log");
        PathBuf::from(name)
    }

    /// Program and arguments for one run.
    pub fn command_line(&self, model: &Path, report: &Path) -> (String, Vec<String>) {
        let model = model.display().to_string();
        let report = report.display().to_string();
        let substituted = self
            .args
            .iter()
            .map(|arg| arg.replace("{model}", &model).replace("{report}", &report));

        match &self.launcher {
            Some(launcher) => {
                let mut args = vec![self.executable.display().to_string()];
                args.extend(substituted);
                (launcher.clone(), args)
            }
            None => (self.executable.display().to_string(), substituted.collect()),
        }
    }
}
