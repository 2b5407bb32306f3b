//! Validation and staging of user-supplied experimental JV curves.

use crate::domain::{CoreResult, StudioError};
use crate::serialization::write_text_artifact;
use crate::session::StudioPaths;
use std::path::PathBuf;

pub const MAX_FILENAME_LENGTH: usize = 50;

const FORBIDDEN_CHARACTERS: [char; 5] = ['=', '+', '@', '\t', '\r'];

/// Runs the three independent checks (forbidden characters, line pattern,
/// filename length) and concatenates every failure message instead of
/// stopping at the first. Returns the sanitized filename on success.
pub fn validate_experimental_jv(filename: &str, data: &str) -> CoreResult<String> {
    let mut messages = Vec::new();

    if data.contains(&FORBIDDEN_CHARACTERS[..]) {
        messages.push("Illegal characters used.".to_string());
    }

    if data.lines().skip(1).any(|line| !is_jv_data_line(line)) {
        messages.push("File content does not meet the required pattern.".to_string());
    }

    let sanitized = sanitize_filename(filename);
    if sanitized.chars().count() > MAX_FILENAME_LENGTH {
        messages.push(format!(
            "Filename is too long. Max {} characters.",
            MAX_FILENAME_LENGTH
        ));
    }

    if messages.is_empty() {
        Ok(sanitized)
    } else {
        Err(StudioError::upload_validation(
            "UPLOAD.EXPERIMENTAL_JV",
            messages.join(" "),
        ))
    }
}

/// Validates the upload and writes it into the executable's installation
/// folder, where the simulator resolves the `ExpJV` parameter by bare
/// filename.
pub fn store_experimental_jv(
    paths: &StudioPaths,
    filename: &str,
    data: &str,
) -> CoreResult<PathBuf> {
    let sanitized = validate_experimental_jv(filename, data)?;
    let target = paths.simss_dir.join(&sanitized);
    write_text_artifact(&target, data).map_err(|source| {
        StudioError::filesystem(
            "IO.UPLOAD_WRITE",
            format!(
                "failed to store experimental JV file '{}': {}",
                target.display(),
                source
            ),
        )
    })?;
    Ok(target)
}

/// Every data line after the header must be exactly two plain numbers
/// separated by whitespace. No exponents, no extra columns.
fn is_jv_data_line(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(voltage), Some(current), None) => {
            is_plain_number(voltage) && is_plain_number(current)
        }
        _ => false,
    }
}

fn is_plain_number(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() {
        return false;
    }
    let mut seen_point = false;
    let mut seen_digit = false;
    for character in digits.chars() {
        match character {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return false,
        }
    }
    seen_digit
}

/// Keeps ASCII alphanumerics, dot, dash, and underscore; everything else is
/// replaced. Leading dots are stripped so uploads cannot hide as dotfiles.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || matches!(character, '.' | '-' | '_') {
                character
            } else {
                '_'
            }
        })
        .collect();
    sanitized.trim_start_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::{sanitize_filename, store_experimental_jv, validate_experimental_jv};
    use crate::domain::StudioErrorCategory;
    use crate::session::StudioPaths;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn well_formed_upload_passes_all_checks() {
        let sanitized = validate_experimental_jv("measured jv.txt", "header\n1.0 2.0\n-0.5 3.25")
            .expect("upload should validate");
        assert_eq!(sanitized, "measured_jv.txt");
    }

    #[test]
    fn comma_separated_values_fail_the_pattern_check() {
        let error = validate_experimental_jv("jv.txt", "header\n1.0,2.0")
            .expect_err("pattern check should fail");
        assert_eq!(error.category(), StudioErrorCategory::UploadValidation);
        assert!(error.message().contains("required pattern"));
        assert!(!error.message().contains("Illegal characters"));
    }

    #[test]
    fn failure_messages_concatenate_instead_of_short_circuiting() {
        let long_name = format!("{}.txt", "x".repeat(51));
        let error = validate_experimental_jv(&long_name, "header\n1.0 = 2.0")
            .expect_err("two checks should fail");

        assert!(error.message().contains("Illegal characters"));
        assert!(error.message().contains("required pattern"));
        assert!(error.message().contains("too long"));
    }

    #[test]
    fn filename_over_fifty_characters_is_rejected() {
        let long_name = format!("{}.txt", "x".repeat(47));
        assert_eq!(long_name.len(), 51);
        let error = validate_experimental_jv(&long_name, "header\n1.0 2.0")
            .expect_err("length check should fail");
        assert!(error.message().contains("too long"));
    }

    #[test]
    fn exponents_and_extra_columns_are_rejected() {
        assert!(validate_experimental_jv("jv.txt", "header\n1.0e-3 2.0").is_err());
        assert!(validate_experimental_jv("jv.txt", "header\n1.0 2.0 3.0").is_err());
        assert!(validate_experimental_jv("jv.txt", "header\n\n1.0 2.0").is_err());
    }

    #[test]
    fn sanitizer_replaces_path_separators_and_hidden_prefixes() {
        assert_eq!(sanitize_filename("../etc/passwd"), "_etc_passwd");
        assert_eq!(sanitize_filename(".hidden.txt"), "hidden.txt");
        assert_eq!(sanitize_filename("jv curve (1).txt"), "jv_curve__1_.txt");
    }

    #[test]
    fn stored_upload_lands_in_the_executable_folder() {
        let temp = TempDir::new().expect("tempdir should be created");
        let paths = StudioPaths::new(temp.path().join("SimSS"), temp.path().join("Simulations"));
        fs::create_dir_all(&paths.simss_dir).expect("simss dir should be created");

        let stored = store_experimental_jv(&paths, "measured.txt", "V J\n0.0 0.0\n0.1 -1.5")
            .expect("upload should be stored");
        assert_eq!(stored, paths.simss_dir.join("measured.txt"));
        let content = fs::read_to_string(&stored).expect("upload should be readable");
        assert!(content.starts_with("V J\n"));
    }
}
