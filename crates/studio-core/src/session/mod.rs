//! Per-session isolation of parameter files, outputs, and archives.
//!
//! A session is identified by a token minted from UTC wall-clock time at
//! microsecond resolution. Two sessions minted within the same microsecond
//! would collide; this is an accepted, documented risk at the interactive
//! load this tool is built for, not a correctness guarantee.

use crate::collect::{self, RunReport};
use crate::document::{Entry, ParameterDocument, SectionKind};
use crate::domain::{CoreResult, StudioError};
use crate::runner::SimulationRunner;
use crate::serialization::write_text_artifact_atomic;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Shared default template next to the simulation executable.
pub const DEFAULT_PARAMETER_FILE: &str = "device_parameters.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn mint() -> CoreResult<Self> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|source| {
                StudioError::internal(
                    "SYS.SESSION_CLOCK",
                    format!("failed to read system time for session id minting: {}", source),
                )
            })?;
        Ok(Self(elapsed.as_micros() as u64))
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Explicit filesystem layout threaded through calls instead of ambient
/// process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioPaths {
    pub simss_dir: PathBuf,
    pub simulations_dir: PathBuf,
}

impl StudioPaths {
    pub fn new(simss_dir: impl Into<PathBuf>, simulations_dir: impl Into<PathBuf>) -> Self {
        Self {
            simss_dir: simss_dir.into(),
            simulations_dir: simulations_dir.into(),
        }
    }

    pub fn default_parameter_file(&self) -> PathBuf {
        self.simss_dir.join(DEFAULT_PARAMETER_FILE)
    }

    pub fn session_dir(&self, id: SessionId) -> PathBuf {
        self.simulations_dir.join(id.to_string())
    }

    pub fn session_parameter_file(&self, id: SessionId) -> PathBuf {
        self.session_dir(id)
            .join(format!("device_parameters_{}.txt", id))
    }

    pub fn archive_file(&self, id: SessionId) -> PathBuf {
        self.simulations_dir
            .join(format!("simulation_results_{}.zip", id))
    }
}

/// Where a session stands, derived purely from what exists on disk: the
/// session parameter file marks a save, the result archive marks a
/// completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    ParametersSaved,
    SimulationRun,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    paths: StudioPaths,
}

impl Session {
    pub fn new(id: SessionId, paths: StudioPaths) -> Self {
        Self { id, paths }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn paths(&self) -> &StudioPaths {
        &self.paths
    }

    pub fn state(&self) -> SessionState {
        if self.paths.archive_file(self.id).is_file() {
            SessionState::SimulationRun
        } else if self.paths.session_parameter_file(self.id).is_file() {
            SessionState::ParametersSaved
        } else {
            SessionState::NotStarted
        }
    }

    /// The session-specific parameter file when one was saved before, the
    /// shared default template otherwise.
    pub fn resolve_parameter_file(&self) -> PathBuf {
        let session_file = self.paths.session_parameter_file(self.id);
        if session_file.is_file() {
            session_file
        } else {
            self.paths.default_parameter_file()
        }
    }

    pub fn load_document(&self) -> CoreResult<ParameterDocument> {
        let path = self.resolve_parameter_file();
        let source = fs::read_to_string(&path).map_err(|source| {
            StudioError::filesystem(
                "IO.PARAMETER_READ",
                format!("failed to read parameter file '{}': {}", path.display(), source),
            )
        })?;
        ParameterDocument::parse(&source)
    }

    /// Injects the session id into output-file names, clears outputs from a
    /// previous run, and rewrites the whole session parameter file.
    pub fn save_parameters(&self, document: &mut ParameterDocument) -> CoreResult<PathBuf> {
        inject_session_id(document, self.id);
        let text = document.to_text();

        let session_dir = self.paths.session_dir(self.id);
        fs::create_dir_all(&session_dir).map_err(|source| {
            StudioError::filesystem(
                "IO.SESSION_DIR",
                format!(
                    "failed to create session directory '{}': {}",
                    session_dir.display(),
                    source
                ),
            )
        })?;

        remove_session_files(&session_dir, self.id)?;

        let path = self.paths.session_parameter_file(self.id);
        write_text_artifact_atomic(&path, &text).map_err(|source| {
            StudioError::filesystem(
                "IO.PARAMETER_WRITE",
                format!("failed to write parameter file '{}': {}", path.display(), source),
            )
        })?;
        Ok(path)
    }

    /// Reloads the shared default template and saves it as this session's
    /// parameter file.
    pub fn reset_to_defaults(&self) -> CoreResult<ParameterDocument> {
        let path = self.paths.default_parameter_file();
        let source = fs::read_to_string(&path).map_err(|source| {
            StudioError::filesystem(
                "IO.PARAMETER_READ",
                format!(
                    "failed to read default parameter file '{}': {}",
                    path.display(),
                    source
                ),
            )
        })?;
        let mut document = ParameterDocument::parse(&source)?;
        self.save_parameters(&mut document)?;
        Ok(document)
    }

    /// Runs the external executable against the saved parameter file and
    /// collects the produced outputs. Blocks until the subprocess exits.
    pub fn run_simulation(&self, runner: &SimulationRunner) -> CoreResult<RunReport> {
        let parameter_file = self.paths.session_parameter_file(self.id);
        if !parameter_file.is_file() {
            return Err(StudioError::not_found(
                "SESSION.PARAMETERS",
                format!(
                    "device parameters have not been saved for session {}; save them before running",
                    self.id
                ),
            ));
        }

        let output = runner.run(&parameter_file)?;
        let collected = collect::collect(self.id, &self.paths, &output.console)?;

        // The experimental-JV association only survives solar-cell runs;
        // the uploaded file itself stays in place for later runs.
        let experimental_jv = if collected.metrics.is_some() {
            self.load_document()
                .ok()
                .and_then(|document| document.value("ExpJV").ok().map(str::to_string))
        } else {
            None
        };

        Ok(RunReport {
            session: self.id.to_string(),
            metrics: collected.metrics,
            archive: collected.archive_path,
            experimental_jv,
            console: output.console,
        })
    }
}

/// Rewrites output-file parameter values in the User interface section so
/// every produced file embeds the session id at the source.
fn inject_session_id(document: &mut ParameterDocument, id: SessionId) {
    let id_text = id.to_string();
    for entry in &mut document.section_mut(SectionKind::UserInterface).entries {
        let Entry::Parameter { value, .. } = entry else {
            continue;
        };
        if value.contains(".dat") && !value.contains(&id_text) {
            let stem = value.split(".dat").next().unwrap_or_default();
            *value = format!("{}_{}.dat", stem, id_text);
        } else if value == "log.txt" {
            *value = format!("log_{}.txt", id_text);
        }
    }
}

fn remove_session_files(session_dir: &Path, id: SessionId) -> CoreResult<()> {
    let id_text = id.to_string();
    let entries = fs::read_dir(session_dir).map_err(|source| {
        StudioError::filesystem(
            "IO.SESSION_DIR",
            format!(
                "failed to list session directory '{}': {}",
                session_dir.display(),
                source
            ),
        )
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| {
            StudioError::filesystem(
                "IO.SESSION_DIR",
                format!(
                    "failed to list session directory '{}': {}",
                    session_dir.display(),
                    source
                ),
            )
        })?;
        let name = entry.file_name();
        if name.to_string_lossy().contains(&id_text) && entry.path().is_file() {
            fs::remove_file(entry.path()).map_err(|source| {
                StudioError::filesystem(
                    "IO.STALE_OUTPUT",
                    format!(
                        "failed to remove stale output '{}': {}",
                        entry.path().display(),
                        source
                    ),
                )
            })?;
        }
    }
    Ok(())
}
