use std::fs;
use std::io;
use std::path::Path;

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}

/// Writes to a sibling staging file and renames it into place, so a reader
/// never observes a partially written artifact.
pub fn write_text_artifact_atomic(path: &Path, content: &str) -> io::Result<()> {
    let Some(file_name) = path.file_name() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path '{}' has no file name", path.display()),
        ));
    };
    let mut staging_name = file_name.to_os_string();
    staging_name.push(".partial");
    let staging = path.with_file_name(staging_name);

    fs::write(&staging, normalize_text_artifact(content))?;
    fs::rename(&staging, path)
}
