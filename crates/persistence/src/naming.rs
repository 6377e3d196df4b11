//! Output path resolution.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use contracts::{ContractError, FileFormat};
use observability::warnings;

/// Timestamp used for default names and collision suffixes
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Output file chosen for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutput {
    pub path: PathBuf,
    pub format: FileFormat,
    /// The requested path, when it was taken and a new name was chosen
    pub renamed_from: Option<PathBuf>,
}

pub fn timestamp_name(now: &DateTime<Local>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Pick the output file for a new session
///
/// No request means `<timestamp>.csv` in the working directory. An existing
/// file is never overwritten: a `_<timestamp>` suffix is added to the stem,
/// then `_<n>` counters until the name is free. The extension is checked
/// before touching the filesystem.
pub fn resolve_output_path(
    requested: Option<&Path>,
    now: &DateTime<Local>,
) -> Result<ResolvedOutput, ContractError> {
    let stamp = timestamp_name(now);
    let path = match requested {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(format!("{stamp}.csv")),
    };
    let format = FileFormat::from_path(&path)?;

    if !path.exists() {
        return Ok(ResolvedOutput {
            path,
            format,
            renamed_from: None,
        });
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut candidate = path.with_file_name(format!("{stem}_{stamp}.{ext}"));
    let mut n = 1u32;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{stem}_{stamp}_{n}.{ext}"));
        n += 1;
    }

    warnings::resource(
        "start",
        format!(
            "{} already exists; recording to {} instead",
            path.display(),
            candidate.display()
        ),
    );

    Ok(ResolvedOutput {
        path: candidate,
        format,
        renamed_from: Some(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::tempdir;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_default_name() {
        let out = resolve_output_path(None, &fixed_now()).unwrap();
        assert_eq!(out.path, PathBuf::from("2024-03-09_14-05-07.csv"));
        assert_eq!(out.format, FileFormat::Csv);
    }

    #[test]
    fn test_collision_adds_timestamp_then_counter() {
        let dir = tempdir().unwrap();
        let requested = dir.path().join("subject01.csv");
        fs::write(&requested, "x").unwrap();

        let out = resolve_output_path(Some(&requested), &fixed_now()).unwrap();
        assert_eq!(
            out.path,
            dir.path().join("subject01_2024-03-09_14-05-07.csv")
        );
        assert_eq!(out.renamed_from.as_deref(), Some(requested.as_path()));

        fs::write(&out.path, "x").unwrap();
        let out = resolve_output_path(Some(&requested), &fixed_now()).unwrap();
        assert_eq!(
            out.path,
            dir.path().join("subject01_2024-03-09_14-05-07_1.csv")
        );
    }

    #[test]
    fn test_unsupported_extension_fails_first() {
        let dir = tempdir().unwrap();
        let requested = dir.path().join("subject01.xlsx");
        assert!(matches!(
            resolve_output_path(Some(&requested), &fixed_now()),
            Err(ContractError::UnsupportedFormat { .. })
        ));
        assert!(!requested.exists());
    }

    #[test]
    fn test_table_extensions() {
        let dir = tempdir().unwrap();
        for name in ["a.db", "b.sqlite"] {
            let out = resolve_output_path(Some(&dir.path().join(name)), &fixed_now()).unwrap();
            assert_eq!(out.format, FileFormat::Table);
        }
    }
}
