//! Bucketing: collapse runs of consecutive records into summary statistics.
//!
//! A binned series is a fixed-length array of [`BucketSummary`] entries, each
//! produced from `width` consecutive input records. [`BucketAccumulator`] is
//! the one-pass reducer that drives this: records stream in one at a time,
//! and every time the scratch buffer fills a summary is written to the next
//! output slot. The scratch buffer is allocated once and reused for every
//! bucket, so the hot loop does no per-record heap work.

use crate::percentile::{percentiles, PercentileMap};
use crate::record::LogRecord;
use serde::{Deserialize, Serialize};

/// Number of records that collapse into one bucket of a binned series.
///
/// Always the floor of `available / bins`; leftover records are dropped by
/// the accumulator rather than forming a short final bucket, because a short
/// bucket has a count-skewed summary that shows up as a cliff at the end of
/// every downstream graph. Returns 0 when there are fewer records than bins,
/// which leaves the series empty.
pub fn bucket_width(bins: usize, available: usize) -> usize {
    if available < bins {
        return 0;
    }
    available / bins
}

/// Summary statistics over one bucket of records (or over a whole log).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub min: u32,
    pub max: u32,
    pub sum: u64,
    pub count: u64,
    pub median: u64,
    pub stdev: f64,
    pub average: f64,
    pub min_ts: u32,
    pub max_ts: u32,
    pub elapsed: u32,
    pub percentiles: PercentileMap,
}

impl BucketSummary {
    /// Summarize a non-empty slice of records.
    ///
    /// Sorts the slice by value in place; callers that still need the
    /// original order must pass a copy. `min_ts`/`max_ts` are found by
    /// scanning the records rather than taken from the slice endpoints —
    /// the slice may come from a value-sorted region where endpoints mean
    /// nothing.
    pub fn from_records(records: &mut [LogRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let count = records.len() as u64;
        let mut sum: u64 = 0;
        let mut min_ts = u32::MAX;
        let mut max_ts: u32 = 0;
        for rec in records.iter() {
            sum += rec.value as u64;
            if rec.time < min_ts {
                min_ts = rec.time;
            }
            if rec.time > max_ts {
                max_ts = rec.time;
            }
        }
        let average = sum as f64 / count as f64;

        let mut dsum = 0.0;
        for rec in records.iter() {
            let delta = rec.value as f64 - average;
            dsum += delta * delta;
        }
        // population variance: the bucket is the whole population
        let stdev = (dsum / count as f64).sqrt();

        records.sort_unstable_by_key(|rec| rec.value);
        let median = records[(records.len() - 1) / 2].value as u64;

        BucketSummary {
            min: records[0].value,
            max: records[records.len() - 1].value,
            sum,
            count,
            median,
            stdev,
            average,
            min_ts,
            max_ts,
            elapsed: max_ts - min_ts,
            percentiles: percentiles(records),
        }
    }
}

/// One-pass stateful reducer that fills a binned series.
///
/// Feed it every record of the source sequence in order (for a
/// direction-filtered series, only the matching records, but always with the
/// record's index in the full source). When `width` records have
/// accumulated, one summary is written to the next output slot and the
/// scratch resets. Records past the last full bucket are dropped, never
/// summarized short.
pub struct BucketAccumulator {
    width: usize,
    scratch: Vec<LogRecord>,
    cursor: usize,
    out_idx: usize,
}

impl BucketAccumulator {
    pub fn new(width: usize) -> Self {
        BucketAccumulator {
            width,
            scratch: Vec::with_capacity(width),
            cursor: 0,
            out_idx: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Scratch slot the next record lands in. Always below `width`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Output slot the next completed bucket is written to.
    pub fn out_idx(&self) -> usize {
        self.out_idx
    }

    /// Consume the record at `records[i]`, flushing a summary into `series`
    /// when the current bucket completes.
    ///
    /// A zero `width` means there were fewer records than bins; every call
    /// is then a no-op and the series stays empty. With `max_i` the index of
    /// the last record belonging to a full bucket, records beyond `max_i`
    /// are dropped. The flush summarizes only the filled scratch prefix, so
    /// an end-of-data bucket that completes early stays correct.
    pub fn update(&mut self, records: &[LogRecord], i: usize, series: &mut [BucketSummary]) {
        if self.width == 0 || records.is_empty() {
            return;
        }

        let n = records.len();
        // signed: when the source is shorter than one bucket, max_i is -1
        // and every record is dropped
        let max_i = (n - (n % self.width)) as isize - 1;
        let pos = i as isize;

        if pos <= max_i {
            self.store(records[i]);
        }

        if self.cursor < self.width - 1 && pos < max_i {
            self.cursor += 1;
        } else if pos > max_i {
            // leftover record beyond the last full bucket: dropped
        } else {
            let filled = self.cursor + 1;
            debug_assert!(self.out_idx < series.len(), "binned series overflow");
            series[self.out_idx] = BucketSummary::from_records(&mut self.scratch[..filled]);
            self.cursor = 0;
            self.out_idx += 1;
        }
    }

    fn store(&mut self, rec: LogRecord) {
        if self.cursor < self.scratch.len() {
            self.scratch[self.cursor] = rec;
        } else {
            self.scratch.push(rec);
        }
    }
}
