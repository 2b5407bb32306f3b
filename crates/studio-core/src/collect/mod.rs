//! Post-run result collection: metric extraction, relocation of
//! session-owned output files, and archiving.

mod metrics;

pub use metrics::{SolarCellMetrics, extract_metrics};

use crate::domain::{CoreResult, StudioError};
use crate::session::{SessionId, StudioPaths};
use globset::{Glob, GlobMatcher};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CollectedRun {
    pub metrics: Option<SolarCellMetrics>,
    pub archive_path: PathBuf,
}

/// Serialisable summary of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub session: String,
    pub metrics: Option<SolarCellMetrics>,
    pub archive: PathBuf,
    pub experimental_jv: Option<String>,
    pub console: String,
}

/// Gathers everything a successful run produced: parses the console for
/// solar-cell metrics, moves session-owned files out of the shared working
/// directory, and archives the session folder.
pub fn collect(id: SessionId, paths: &StudioPaths, console: &str) -> CoreResult<CollectedRun> {
    let metrics = extract_metrics(console);

    let session_dir = paths.session_dir(id);
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

    relocate_outputs(id, &paths.simss_dir, &session_dir)?;
    if let Some(metrics) = &metrics {
        write_metrics_table(id, &session_dir, metrics)?;
    }
    let archive_path = archive_session(id, &session_dir, &paths.simulations_dir)?;

    Ok(CollectedRun {
        metrics,
        archive_path,
    })
}

/// Moves every file in the shared working directory whose name embeds the
/// session id into the session directory, replacing stale copies. Files of
/// other sessions and shared defaults are left untouched.
pub fn relocate_outputs(id: SessionId, from: &Path, to: &Path) -> CoreResult<usize> {
    let matcher = session_artifact_matcher(id)?;
    let entries = fs::read_dir(from).map_err(|source| {
        StudioError::filesystem(
            "IO.WORKING_DIR",
            format!("failed to list working directory '{}': {}", from.display(), source),
        )
    })?;

    let mut moved = 0;
    for entry in entries {
        let entry = entry.map_err(|source| {
            StudioError::filesystem(
                "IO.WORKING_DIR",
                format!("failed to list working directory '{}': {}", from.display(), source),
            )
        })?;
        let path = entry.path();
        if !path.is_file() || !matcher.is_match(Path::new(&entry.file_name())) {
            continue;
        }

        let destination = to.join(entry.file_name());
        if destination.is_file() {
            fs::remove_file(&destination).map_err(|source| {
                StudioError::filesystem(
                    "IO.STALE_OUTPUT",
                    format!(
                        "failed to remove stale output '{}': {}",
                        destination.display(),
                        source
                    ),
                )
            })?;
        }
        move_file(&path, &destination)?;
        moved += 1;
    }
    Ok(moved)
}

/// The metrics table goes into the session folder as JSON so the archive
/// carries the figures of merit alongside the raw output files.
fn write_metrics_table(
    id: SessionId,
    session_dir: &Path,
    metrics: &SolarCellMetrics,
) -> CoreResult<()> {
    let path = session_dir.join(format!("scpars_{}.json", id));
    let rendered = serde_json::to_string_pretty(metrics).map_err(|source| {
        StudioError::internal(
            "SYS.METRICS_JSON",
            format!("failed to serialize the solar-cell metrics table: {}", source),
        )
    })?;
    crate::serialization::write_text_artifact(&path, &rendered).map_err(|source| {
        StudioError::filesystem(
            "IO.METRICS_WRITE",
            format!("failed to write metrics table '{}': {}", path.display(), source),
        )
    })
}

fn session_artifact_matcher(id: SessionId) -> CoreResult<GlobMatcher> {
    Glob::new(&format!("*{}*", id))
        .map(|glob| glob.compile_matcher())
        .map_err(|source| {
            StudioError::internal(
                "SYS.ARTIFACT_GLOB",
                format!("failed to compile session artifact pattern: {}", source),
            )
        })
}

fn move_file(from: &Path, to: &Path) -> CoreResult<()> {
    // Rename where possible; fall back to copy + remove across filesystems.
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)
        .and_then(|_| fs::remove_file(from))
        .map_err(|source| {
            StudioError::filesystem(
                "IO.OUTPUT_MOVE",
                format!(
                    "failed to move output '{}' to '{}': {}",
                    from.display(),
                    to.display(),
                    source
                ),
            )
        })?;
    Ok(())
}

/// Zips the whole session directory into the top-level simulations folder,
/// replacing any archive a previous run left behind. The archive is staged
/// under a temporary name and renamed into place.
pub fn archive_session(
    id: SessionId,
    session_dir: &Path,
    simulations_dir: &Path,
) -> CoreResult<PathBuf> {
    let archive_path = simulations_dir.join(format!("simulation_results_{}.zip", id));
    let staging_path = simulations_dir.join(format!("simulation_results_{}.zip.partial", id));

    let archive_error = |source: &dyn std::fmt::Display| {
        StudioError::filesystem(
            "IO.ARCHIVE_WRITE",
            format!(
                "failed to build archive '{}': {}",
                archive_path.display(),
                source
            ),
        )
    };

    let file = fs::File::create(&staging_path).map_err(|source| archive_error(&source))?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    let mut names: Vec<String> = Vec::new();
    let entries = fs::read_dir(session_dir).map_err(|source| archive_error(&source))?;
    for entry in entries {
        let entry = entry.map_err(|source| archive_error(&source))?;
        if entry.path().is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    for name in &names {
        writer
            .start_file(name.as_str(), options)
            .map_err(|source| archive_error(&source))?;
        let mut reader =
            fs::File::open(session_dir.join(name)).map_err(|source| archive_error(&source))?;
        io::copy(&mut reader, &mut writer).map_err(|source| archive_error(&source))?;
    }
    writer.finish().map_err(|source| archive_error(&source))?;

    if archive_path.is_file() {
        fs::remove_file(&archive_path).map_err(|source| {
            StudioError::filesystem(
                "IO.ARCHIVE_MOVE",
                format!(
                    "failed to remove stale archive '{}': {}",
                    archive_path.display(),
                    source
                ),
            )
        })?;
    }
    fs::rename(&staging_path, &archive_path).map_err(|source| {
        StudioError::filesystem(
            "IO.ARCHIVE_MOVE",
            format!(
                "failed to move archive into '{}': {}",
                archive_path.display(),
                source
            ),
        )
    })?;

    Ok(archive_path)
}
