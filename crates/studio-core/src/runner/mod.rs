//! Invocation of the external drift-diffusion executable.

use crate::domain::{CoreResult, StudioError};
use crate::session::StudioPaths;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const SIMULATION_EXECUTABLE: &str = "simss";

/// Runs the simulation executable with its working directory pinned to the
/// installation folder, passing the parameter file path as the single
/// argument. The call blocks until the subprocess exits; no timeout or
/// retry semantics apply.
#[derive(Debug, Clone)]
pub struct SimulationRunner {
    executable: PathBuf,
    working_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub console: String,
}

impl SimulationRunner {
    pub fn new(executable: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            working_dir: working_dir.into(),
        }
    }

    pub fn for_paths(paths: &StudioPaths) -> Self {
        Self::new(paths.simss_dir.join(SIMULATION_EXECUTABLE), &paths.simss_dir)
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn run(&self, parameter_file: &Path) -> CoreResult<RunOutput> {
        // The subprocess runs in the installation folder, so both the
        // executable and the parameter path must stay valid from there.
        let executable = absolute_path(&self.executable)?;
        let parameter_file = absolute_path(parameter_file)?;

        let output = Command::new(&executable)
            .arg(&parameter_file)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|source| {
                StudioError::filesystem(
                    "IO.SIMSS_SPAWN",
                    format!(
                        "failed to launch simulation executable '{}': {}",
                        executable.display(),
                        source
                    ),
                )
            })?;

        let console = console_text(&output.stdout, &output.stderr);
        match output.status.code() {
            Some(0) => Ok(RunOutput { console }),
            Some(code) => Err(StudioError::simulation(
                "RUN.SIMSS_EXIT",
                format!("simss exited with code {}\n{}", code, console),
            )),
            None => Err(StudioError::simulation(
                "RUN.SIMSS_SIGNAL",
                format!("simss terminated by signal\n{}", console),
            )),
        }
    }
}

fn absolute_path(path: &Path) -> CoreResult<PathBuf> {
    std::path::absolute(path).map_err(|source| {
        StudioError::filesystem(
            "IO.PATH_RESOLVE",
            format!("failed to resolve path '{}': {}", path.display(), source),
        )
    })
}

fn console_text(stdout: &[u8], stderr: &[u8]) -> String {
    let mut console = String::from_utf8_lossy(stdout).into_owned();
    if !stderr.is_empty() {
        if !console.is_empty() && !console.ends_with('\n') {
            console.push('\n');
        }
        console.push_str(&String::from_utf8_lossy(stderr));
    }
    console
}

#[cfg(test)]
mod tests {
    use super::{SIMULATION_EXECUTABLE, SimulationRunner, console_text};
    use crate::domain::StudioErrorCategory;
    use crate::session::StudioPaths;
    use tempfile::TempDir;

    #[test]
    fn runner_for_paths_targets_the_installed_executable() {
        let paths = StudioPaths::new("SIMsalabim/SimSS", "Simulations");
        let runner = SimulationRunner::for_paths(&paths);
        assert!(runner.executable().ends_with(SIMULATION_EXECUTABLE));
    }

    #[test]
    fn missing_executable_surfaces_a_filesystem_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let runner = SimulationRunner::new(temp.path().join("simss"), temp.path());
        let parameter_file = temp.path().join("device_parameters_1.txt");
        std::fs::write(&parameter_file, "").expect("parameter file should be written");

        let error = runner
            .run(&parameter_file)
            .expect_err("spawn should fail without an executable");
        assert_eq!(error.category(), StudioErrorCategory::Filesystem);
        assert_eq!(error.code(), "IO.SIMSS_SPAWN");
    }

    #[test]
    fn console_text_appends_stderr_after_stdout() {
        let combined = console_text(b"Voc: 0.8\n", b"warning: slow convergence\n");
        assert_eq!(combined, "Voc: 0.8\nwarning: slow convergence\n");

        let stdout_only = console_text(b"Voc: 0.8\n", b"");
        assert_eq!(stdout_only, "Voc: 0.8\n");
    }
}
