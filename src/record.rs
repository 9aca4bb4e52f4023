//! Log record model and the fio log loader.
//!
//! fio writes one line per I/O operation with four decimal integer fields
//! separated by `", "` (comma, space): time offset in milliseconds, value
//! (latency in usec, or bandwidth/IOPS in device units), I/O direction, and
//! block size. On fast devices a single run produces tens of millions of
//! lines, so records are kept at 16 bytes and loaded in one buffered pass.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// I/O direction as encoded in the third log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Read = 0,
    Write = 1,
    Trim = 2,
}

impl Direction {
    /// Decode the direction tag from a log field value.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Direction::Read),
            1 => Some(Direction::Write),
            2 => Some(Direction::Trim),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Read => write!(f, "read"),
            Direction::Write => write!(f, "write"),
            Direction::Trim => write!(f, "trim"),
        }
    }
}

/// One row of a fio log. This is where most of the memory goes.
///
/// `idx` is the record's position in the loaded sequence. The sequence is
/// value-sorted in place while computing percentiles, so `idx` is the only
/// way back to time order after that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord {
    /// Time offset from the beginning of the fio run, in milliseconds.
    pub time: u32,
    /// Measured value: latency in microseconds, or bandwidth/IOPS units.
    pub value: u32,
    /// I/O direction for this operation.
    pub ddir: Direction,
    /// Block size of the operation.
    pub bsz: u16,
    /// Original position in the loaded sequence.
    pub idx: u32,
}

/// Log lines are reported against this interval in debug output.
const PROGRESS_LINES: u64 = 10_000;

/// Load a fio log file into a record sequence in file (= time) order.
///
/// Lines that split into fewer than four fields, or whose first two fields
/// are empty, are skipped silently; fio truncates the final line when a run
/// is interrupted. A field that fails integer parsing is a fatal error naming
/// the file and 1-based line number. An unreadable file is downgraded to a
/// warning and yields an empty sequence so a scan can continue past it.
pub fn load_fio_log(path: &Path) -> Result<Vec<LogRecord>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("could not open '{}' for read: {}", path.display(), e);
            return Ok(Vec::new());
        }
    };

    let started = Instant::now();
    let mut reader = BufReader::new(file);
    let mut records: Vec<LogRecord> = Vec::new();
    let mut line = String::new();
    let mut lno: u64 = 0;

    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .with_context(|| format!("read from file '{}' failed", path.display()))?;
        if n == 0 {
            break;
        }
        lno += 1;

        if lno % PROGRESS_LINES == 0 {
            debug!("'{}': {} lines read", path.display(), lno);
        }

        // fio always uses ", " instead of "," as far as I can tell
        let mut fields = line.trim_end().splitn(4, ", ");
        let (Some(f_time), Some(f_value), Some(f_ddir), Some(f_bsz)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            // probably a partial record at the end of the file
            continue;
        };
        if f_time.is_empty() || f_value.is_empty() {
            continue;
        }

        let time = parse_field(f_time, 0, path, lno)?;
        let value = parse_field(f_value, 1, path, lno)?;
        let ddir_tag: u8 = parse_field(f_ddir, 2, path, lno)?;
        let bsz: u16 = parse_field(f_bsz, 3, path, lno)?;

        let Some(ddir) = Direction::from_tag(ddir_tag) else {
            bail!(
                "unknown direction tag {} in file '{}' at line {}",
                ddir_tag,
                path.display(),
                lno
            );
        };

        records.push(LogRecord {
            time,
            value,
            ddir,
            bsz,
            idx: records.len() as u32,
        });
    }

    debug!(
        "'{}': {} rows in {:?}",
        path.display(),
        crate::utils::format_count(records.len()),
        started.elapsed()
    );

    Ok(records)
}

fn parse_field<T>(raw: &str, field: usize, path: &Path, lno: u64) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw.parse::<T>() {
        Ok(v) => Ok(v),
        Err(e) => bail!(
            "parsing field {} failed in file '{}' at line {}: {}",
            field,
            path.display(),
            lno,
            e
        ),
    }
}
