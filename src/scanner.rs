//! Suite tree scanner: find every fio log under a directory and summarize
//! each one into a JSON envelope named by the source file's SHA-1.
//!
//! Every failure here is scoped to a single log file. A malformed log is
//! reported and the scan moves on; one broken run never loses the rest of a
//! suite.

use crate::metadata::{attach_metadata, sha1_file};
use crate::record::load_fio_log;
use crate::results::{LogSummary, LogType};
use crate::summarize::summarize;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Below this size a log cannot hold a meaningful number of records and the
/// inventory skips it outright.
pub const MIN_LOG_BYTES: u64 = 100;

/// Suite scans use a higher floor: a few hundred samples still summarize,
/// but the binned output is useless noise on the dashboards.
pub const MIN_SUITE_LOG_BYTES: u64 = 5_000;

/// Classify a file name as one of the fio log types.
///
/// Accepts `<base>.log` and the numbered form `<base>.N.log` fio emits when
/// a job writes per-thread logs.
pub fn log_type_of(file_name: &str) -> Option<LogType> {
    let rest = file_name.strip_suffix(".log")?;
    let base = match rest.rsplit_once('.') {
        Some((head, tail)) if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) => head,
        _ => rest,
    };
    LogType::from_base(base)
}

/// Walk a suite tree and collect the log files worth summarizing, sorted by
/// path so repeated scans process files in the same order.
pub fn inventory_log_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry
            .with_context(|| format!("could not inventory files in '{}'", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if log_type_of(&entry.file_name().to_string_lossy()).is_none() {
            continue;
        }
        let size = entry
            .metadata()
            .with_context(|| format!("could not stat '{}'", entry.path().display()))?
            .len();
        if size < MIN_LOG_BYTES {
            continue;
        }
        out.push(entry.into_path());
    }

    out.sort();
    Ok(out)
}

/// Load, summarize and annotate a single log file.
///
/// Returns `None` for a file that produced no records (missing or truncated
/// to nothing); the caller decides whether that is worth reporting further.
pub fn summarize_log_file(path: &Path, bins: usize) -> Result<Option<LogSummary>> {
    let mut records = load_fio_log(path)?;
    if records.is_empty() {
        warn!("no records in '{}', skipping summary", path.display());
        return Ok(None);
    }

    let mut smry = summarize(&mut records, bins);
    smry.name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    smry.path = path.display().to_string();
    if let Some(log_type) = log_type_of(&smry.name) {
        smry.log_type = log_type.as_str().to_string();
    }
    attach_metadata(path, &mut smry)?;
    Ok(Some(smry))
}

/// Scan `root` and write one summary per qualifying log into `out_dir`.
///
/// Output files are named `<hex sha1 of the log>-<log_type>.json`. Per-file
/// failures are logged and skipped; the scan itself only fails if the output
/// directory cannot be used.
pub fn summarize_all(root: &Path, out_dir: &Path, bins: usize) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("could not create output directory '{}'", out_dir.display()))?;
    if !out_dir.is_dir() {
        bail!("'{}' must be a directory", out_dir.display());
    }

    let files = inventory_log_files(root)?;
    info!("found {} log files under '{}'", files.len(), root.display());

    let mut written = 0usize;
    for file in &files {
        let size = fs::metadata(file).map(|md| md.len()).unwrap_or(0);
        if size < MIN_SUITE_LOG_BYTES {
            info!("skipping '{}': only {} bytes", file.display(), size);
            continue;
        }

        match summarize_into(file, out_dir, bins) {
            Ok(true) => written += 1,
            Ok(false) => {}
            Err(e) => error!("failed to summarize '{}': {:#}", file.display(), e),
        }
    }

    info!("wrote {} summaries to '{}'", written, out_dir.display());
    Ok(())
}

fn summarize_into(file: &Path, out_dir: &Path, bins: usize) -> Result<bool> {
    let Some(smry) = summarize_log_file(file, bins)? else {
        return Ok(false);
    };

    let digest = sha1_file(file)?;
    let out_path = out_dir.join(format!("{}-{}.json", digest, smry.log_type));
    smry.write_json_file(&out_path)?;
    info!("'{}' -> '{}'", file.display(), out_path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_type_of_plain_names() {
        assert_eq!(log_type_of("bw_bw.log"), Some(LogType::Bw));
        assert_eq!(log_type_of("lat_lat.log"), Some(LogType::Lat));
        assert_eq!(log_type_of("lat_slat.log"), Some(LogType::Slat));
        assert_eq!(log_type_of("lat_clat.log"), Some(LogType::Clat));
        assert_eq!(log_type_of("iops_iops.log"), Some(LogType::Iops));
    }

    #[test]
    fn test_log_type_of_numbered_names() {
        assert_eq!(log_type_of("bw_bw.1.log"), Some(LogType::Bw));
        assert_eq!(log_type_of("iops_iops.12.log"), Some(LogType::Iops));
    }

    #[test]
    fn test_log_type_of_rejects_other_files() {
        assert_eq!(log_type_of("diskstats.csv"), None);
        assert_eq!(log_type_of("output.json"), None);
        assert_eq!(log_type_of("lat_lat.x.log"), None);
        assert_eq!(log_type_of("lat_lat"), None);
        assert_eq!(log_type_of("my_lat_lat.log"), None);
    }
}
