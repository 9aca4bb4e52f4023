//! Attachment of the benchmark run's own metadata to a summary.
//!
//! A suite run leaves two descriptors next to each log file: the command
//! descriptor (`command.json`, or `test.json` from older runs) and fio's
//! `--output=json` result (`output.json`). Both are attached to the envelope
//! as opaque JSON.

use crate::results::LogSummary;
use anyhow::{Context, Result};
use sha1::{Digest, Sha1};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Names the command descriptor may have, in preference order.
const COMMAND_FILES: [&str; 2] = ["command.json", "test.json"];

/// fio's JSON result file name.
const OUTPUT_FILE: &str = "output.json";

/// Attach the descriptors found in the log file's directory to `summary`.
///
/// Only non-empty files are attached. When both command descriptor names
/// exist, `command.json` wins. A file that exists but fails to parse is an
/// error: a summary with silently missing metadata is worse than a skipped
/// file.
pub fn attach_metadata(log_path: &Path, summary: &mut LogSummary) -> Result<()> {
    let dir = log_path.parent().unwrap_or_else(|| Path::new("."));

    for name in COMMAND_FILES {
        let path = dir.join(name);
        if file_has_content(&path) {
            summary.fio_command = load_json(&path)?;
            debug!("attached command descriptor '{}'", path.display());
            break;
        }
    }

    let path = dir.join(OUTPUT_FILE);
    if file_has_content(&path) {
        summary.fio_data = load_fio_output(&path)?;
        debug!("attached fio result '{}'", path.display());
    }

    Ok(())
}

fn file_has_content(path: &Path) -> bool {
    fs::metadata(path).map(|md| md.len() > 0).unwrap_or(false)
}

fn load_json(path: &Path) -> Result<serde_json::Value> {
    let bytes =
        fs::read(path).with_context(|| format!("could not read file '{}'", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("could not parse JSON in '{}'", path.display()))
}

/// Load fio's JSON output, tolerating the non-JSON preamble fio writes when
/// its terse output and JSON output share a file. Decoding starts at the
/// first `{` that follows a newline, or at the top when there is none.
fn load_fio_output(path: &Path) -> Result<serde_json::Value> {
    let bytes =
        fs::read(path).with_context(|| format!("could not read file '{}'", path.display()))?;
    let offset = bytes
        .windows(2)
        .position(|pair| pair == b"\n{")
        .unwrap_or(0);
    serde_json::from_slice(&bytes[offset..])
        .with_context(|| format!("could not parse JSON in '{}'", path.display()))
}

/// Hex SHA-1 digest of a file's contents, streamed so multi-gigabyte logs
/// never land in memory. Summary output files are named by this digest.
pub fn sha1_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)
        .with_context(|| format!("could not open '{}' for hashing", path.display()))?;
    let mut hasher = Sha1::new();
    std::io::copy(&mut file, &mut hasher)
        .with_context(|| format!("could not hash '{}'", path.display()))?;

    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sha1_known_digest() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"abc").unwrap();
        assert_eq!(
            sha1_file(f.path()).unwrap(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_output_json_with_header_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OUTPUT_FILE);
        fs::write(&path, "fio-3.36\nsome terse noise\n{\"jobs\": []}\n").unwrap();
        let value = load_fio_output(&path).unwrap();
        assert!(value.get("jobs").is_some());
    }

    #[test]
    fn test_output_json_without_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OUTPUT_FILE);
        fs::write(&path, "{\"jobs\": [1, 2]}\n").unwrap();
        let value = load_fio_output(&path).unwrap();
        assert_eq!(value["jobs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_command_json_preferred_over_test_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("command.json"), "{\"name\": \"new\"}").unwrap();
        fs::write(dir.path().join("test.json"), "{\"name\": \"old\"}").unwrap();

        let mut smry = LogSummary::default();
        attach_metadata(&dir.path().join("lat_lat.log"), &mut smry).unwrap();
        assert_eq!(smry.fio_command["name"], "new");
    }

    #[test]
    fn test_empty_metadata_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("command.json"), "").unwrap();
        fs::write(dir.path().join(OUTPUT_FILE), "").unwrap();

        let mut smry = LogSummary::default();
        attach_metadata(&dir.path().join("lat_lat.log"), &mut smry).unwrap();
        assert!(smry.fio_command.is_null());
        assert!(smry.fio_data.is_null());
    }

    #[test]
    fn test_missing_metadata_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let mut smry = LogSummary::default();
        attach_metadata(&dir.path().join("lat_lat.log"), &mut smry).unwrap();
        assert!(smry.fio_command.is_null());
        assert!(smry.fio_data.is_null());
    }
}
