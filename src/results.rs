//! The summary envelope written for each log file, and its output paths.
//!
//! Field names and their order are contractual: the JSON these produce is
//! consumed by the graphing frontend, which addresses `summary`,
//! `percentiles` and the twelve `*_bin` series by name.

use crate::bucket::BucketSummary;
use crate::percentile::PercentileMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Which fio log a file holds, derived from its base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    /// Bandwidth samples (`bw_bw.log`)
    Bw,
    /// Total latency (`lat_lat.log`)
    Lat,
    /// Submission latency (`lat_slat.log`)
    Slat,
    /// Completion latency (`lat_clat.log`)
    Clat,
    /// IOPS samples (`iops_iops.log`)
    Iops,
}

impl LogType {
    /// Map a log file base name (without `.log` or a `.N` suffix) to its type.
    pub fn from_base(base: &str) -> Option<Self> {
        match base {
            "bw_bw" => Some(LogType::Bw),
            "lat_lat" => Some(LogType::Lat),
            "lat_slat" => Some(LogType::Slat),
            "lat_clat" => Some(LogType::Clat),
            "iops_iops" => Some(LogType::Iops),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Bw => "bw",
            LogType::Lat => "lat",
            LogType::Slat => "slat",
            LogType::Clat => "clat",
            LogType::Iops => "iops",
        }
    }
}

impl std::fmt::Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything known about one summarized log file.
///
/// `fio_command` and `fio_data` are carried opaquely: the tool records what
/// the benchmark run wrote next to the log without interpreting it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSummary {
    /// Base name of the log file (e.g. `lat_lat.log`).
    pub name: String,
    /// Full path of the file that was read.
    pub path: String,
    /// Log type tag (`bw`, `lat`, `slat`, `clat`, `iops`).
    pub log_type: String,
    /// The command descriptor written beside the log, if any.
    pub fio_command: serde_json::Value,
    /// fio's own `--output=json` result, if any.
    pub fio_data: serde_json::Value,
    /// Global statistics over every record.
    pub summary: BucketSummary,
    /// Top-level percentile map: 1..99 plus 99.9, 99.99, 99.999.
    pub percentiles: PercentileMap,
    /// Full-range binned series, then per I/O direction.
    pub bin: Vec<BucketSummary>,
    pub read_bin: Vec<BucketSummary>,
    pub write_bin: Vec<BucketSummary>,
    pub trim_bin: Vec<BucketSummary>,
    /// Sub-P1 tail series: records whose values sort below the 1st
    /// percentile, binned at full resolution.
    pub p1_bin: Vec<BucketSummary>,
    pub p1_read_bin: Vec<BucketSummary>,
    pub p1_write_bin: Vec<BucketSummary>,
    pub p1_trim_bin: Vec<BucketSummary>,
    /// Super-P99 tail series: records from the 99th percentile up.
    pub p99_bin: Vec<BucketSummary>,
    pub p99_read_bin: Vec<BucketSummary>,
    pub p99_write_bin: Vec<BucketSummary>,
    pub p99_trim_bin: Vec<BucketSummary>,
}

impl LogSummary {
    /// Encode the envelope as a newline-terminated JSON document.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut buf = serde_json::to_vec(self).context("failed to encode summary data as JSON")?;
        buf.push(b'\n');
        Ok(buf)
    }

    /// Write the envelope to `path`.
    ///
    /// The document goes to a temporary file in the target directory first
    /// and is renamed into place, so a crash mid-write never leaves a
    /// partial envelope behind.
    pub fn write_json_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("could not create temp file in '{}'", dir.display()))?;
        tmp.write_all(&json)
            .and_then(|_| tmp.flush())
            .with_context(|| format!("could not write summary for '{}'", path.display()))?;
        tmp.persist(path)
            .with_context(|| format!("could not move summary into '{}'", path.display()))?;

        debug!("wrote {} bytes to '{}'", json.len(), path.display());
        Ok(())
    }

    /// Print the human-readable summary block to stdout.
    pub fn print_human(&self) {
        let s = &self.summary;
        println!("Min:                {}", s.min);
        println!("Max:                {}", s.max);
        println!("Count:              {}", s.count);
        println!("Sum:                {}", s.sum);
        println!("Average:            {}", s.average);
        println!("Standard Deviation: {}", s.stdev);
        println!("Begin Timestamp:    {}", s.min_ts);
        println!("End Timestamp:      {}", s.max_ts);
        println!("Elapsed Time:       {}", s.elapsed);
        println!();

        let p = |key: f64| self.percentiles.get(key).map_or(0, |rec| rec.value);
        println!(
            "P1:    {:8} P5:     {:8} P10:     {:8}",
            p(1.0),
            p(5.0),
            p(10.0)
        );
        println!(
            "P25:   {:8} P50:    {:8} P75:     {:8}",
            p(25.0),
            p(50.0),
            p(75.0)
        );
        println!(
            "P90:   {:8} P95:    {:8} P99:     {:8}",
            p(90.0),
            p(95.0),
            p(99.0)
        );
        println!(
            "P99.9: {:8} P99.99: {:8} P99.999: {:8}",
            p(99.9),
            p(99.99),
            p(99.999)
        );

        print_bin_row("All Binned Data", &self.bin);
        print_bin_row("Read Binned Data", &self.read_bin);
        print_bin_row("Write Binned Data", &self.write_bin);
        print_bin_row("Trim Binned Data", &self.trim_bin);
    }
}

fn print_bin_row(label: &str, bin: &[BucketSummary]) {
    print!("\n{}[{:4}]: ", label, bin.len());
    for bkt in bin {
        print!("{:7.3} ", bkt.average);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_type_from_base() {
        assert_eq!(LogType::from_base("bw_bw"), Some(LogType::Bw));
        assert_eq!(LogType::from_base("lat_lat"), Some(LogType::Lat));
        assert_eq!(LogType::from_base("lat_slat"), Some(LogType::Slat));
        assert_eq!(LogType::from_base("lat_clat"), Some(LogType::Clat));
        assert_eq!(LogType::from_base("iops_iops"), Some(LogType::Iops));
        assert_eq!(LogType::from_base("diskstats"), None);
    }

    #[test]
    fn test_to_json_is_newline_terminated() {
        let smry = LogSummary::default();
        let json = smry.to_json().unwrap();
        assert_eq!(json.last(), Some(&b'\n'));
        assert_eq!(json.iter().filter(|&&b| b == b'\n').count(), 1);
    }

    #[test]
    fn test_envelope_field_names() {
        let smry = LogSummary::default();
        let json = String::from_utf8(smry.to_json().unwrap()).unwrap();
        for field in [
            "\"name\"",
            "\"path\"",
            "\"log_type\"",
            "\"fio_command\"",
            "\"fio_data\"",
            "\"summary\"",
            "\"percentiles\"",
            "\"bin\"",
            "\"read_bin\"",
            "\"write_bin\"",
            "\"trim_bin\"",
            "\"p1_bin\"",
            "\"p1_read_bin\"",
            "\"p1_write_bin\"",
            "\"p1_trim_bin\"",
            "\"p99_bin\"",
            "\"p99_read_bin\"",
            "\"p99_write_bin\"",
            "\"p99_trim_bin\"",
        ] {
            assert!(json.contains(field), "missing field {}", field);
        }
    }

    #[test]
    fn test_write_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc-lat.json");
        let smry = LogSummary {
            name: "lat_lat.log".into(),
            log_type: "lat".into(),
            ..LogSummary::default()
        };
        smry.write_json_file(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, smry.to_json().unwrap());
    }
}
