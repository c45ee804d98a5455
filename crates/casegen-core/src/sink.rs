//! JSON sink for case corpora
//!
//! A corpus is one pretty-printed JSON array. Writes go to a sibling file
//! named after the target plus `.tmp` and are renamed into place, so the
//! target either holds the previous content or the complete new array.

use crate::error::SinkError;
use crate::record::CaseRecord;
use std::fs;
use std::path::{Path, PathBuf};

/// Write `cases` to `path`, creating parent directories
///
/// # Errors
/// Directory creation, encoding, write or rename failure
pub fn write_cases(path: impl AsRef<Path>, cases: &[CaseRecord]) -> Result<(), SinkError> {
    let path = path.as_ref();
    let json = serde_json::to_vec_pretty(cases).map_err(|e| SinkError::json_error(path, e))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SinkError::io_error(parent, e))?;
    }
    let tmp = temp_path(path);
    let written = fs::write(&tmp, &json)
        .map_err(|e| SinkError::io_error(&tmp, e))
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| SinkError::io_error(path, e)));
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    tracing::info!(path = %path.display(), records = cases.len(), bytes = json.len(), "corpus written");
    Ok(())
}

/// `cases.json` -> `cases.json.tmp`
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Read a corpus written by [`write_cases`]
///
/// # Errors
/// Unreadable file or malformed JSON
pub fn read_cases(path: impl AsRef<Path>) -> Result<Vec<CaseRecord>, SinkError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| SinkError::io_error(path, e))?;
    let cases: Vec<CaseRecord> =
        serde_json::from_slice(&bytes).map_err(|e| SinkError::json_error(path, e))?;
    tracing::debug!(path = %path.display(), records = cases.len(), "corpus read");
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_corpus_is_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.json");
        write_cases(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        assert!(read_cases(&path).unwrap().is_empty());
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app").join("data").join("cases.json");
        write_cases(&path, &[]).unwrap();
        assert!(path.exists());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn tmp_named_output_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.tmp");
        write_cases(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        assert_eq!(temp_path(&path), dir.path().join("cases.tmp.tmp"));
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();

        let err = write_cases(&path, &[]).unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
        assert!(!temp_path(&path).exists());
        assert!(path.join("occupied").exists());
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = read_cases(&path).unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn malformed_json_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"case_id\": 1}").unwrap();
        assert!(matches!(read_cases(&path), Err(SinkError::Json { .. })));
    }
}
