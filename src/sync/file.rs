//! JSONL file reading.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::sync::types::{SyncError, SyncResult};

/// Read every non-blank line of a JSONL file, paired with its 1-based
/// line number.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist or cannot be read
/// - Any line is not valid JSON for `T`
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> SyncResult<Vec<(usize, T)>> {
    if !path.exists() {
        return Err(SyncError::FileNotFound(path.display().to_string()));
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        let record = serde_json::from_str(&line).map_err(|e| SyncError::InvalidRecord {
            line: idx + 1,
            message: e.to_string(),
        })?;
        records.push((idx + 1, record));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize)]
    struct Row {
        n: i32,
    }

    fn write_file(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("catalog.jsonl");
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_jsonl_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "{\"n\":1}\n\n{\"n\":2}\n");

        let rows: Vec<(usize, Row)> = read_jsonl(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[1].0, rows[1].1.n), (3, 2));
    }

    #[test]
    fn test_read_jsonl_reports_line_number() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "{\"n\":1}\n{bad}\n");

        let err = read_jsonl::<Row>(&path).unwrap_err();
        assert!(matches!(err, SyncError::InvalidRecord { line: 2, .. }));
    }

    #[test]
    fn test_file_not_found() {
        let err = read_jsonl::<Row>(Path::new("/nonexistent/catalog.jsonl")).unwrap_err();
        assert!(matches!(err, SyncError::FileNotFound(_)));
    }
}
