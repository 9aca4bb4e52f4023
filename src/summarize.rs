//! Top-level summarization: one log's record sequence in, one envelope out.
//!
//! The sequence starts in time order. Global statistics and the full-range
//! binned series are computed first; the sequence is then sorted by value in
//! place to index percentiles, and the sub-P1 / super-P99 regions of the
//! sorted sequence are binned at full resolution so outliers survive the
//! compression. The ordering of those steps is load-bearing: nothing that
//! needs time order may run after the sort.

use crate::bucket::{bucket_width, BucketAccumulator, BucketSummary};
use crate::percentile::percentiles;
use crate::record::{Direction, LogRecord};
use crate::results::LogSummary;
use tracing::debug;

/// The four series produced by one binning pass: every record, then one
/// series per I/O direction.
pub struct DirectionBins {
    pub all: Vec<BucketSummary>,
    pub read: Vec<BucketSummary>,
    pub write: Vec<BucketSummary>,
    pub trim: Vec<BucketSummary>,
}

/// Collapse a record sequence into four fixed-length binned series.
///
/// Works on either a time-ordered or a value-ordered sequence; bucket
/// timestamps are scanned from record contents, so the result is valid
/// either way. Directions with fewer records than bins get a zero width and
/// their series stays all zero-valued summaries.
pub fn build_bins(records: &[LogRecord], bins: usize) -> DirectionBins {
    // one pass to count each direction of I/O
    let mut n_read = 0usize;
    let mut n_write = 0usize;
    let mut n_trim = 0usize;
    for rec in records {
        match rec.ddir {
            Direction::Read => n_read += 1,
            Direction::Write => n_write += 1,
            Direction::Trim => n_trim += 1,
        }
    }

    let mut all = vec![BucketSummary::default(); bins];
    let mut read = vec![BucketSummary::default(); bins];
    let mut write = vec![BucketSummary::default(); bins];
    let mut trim = vec![BucketSummary::default(); bins];

    let mut acc_all = BucketAccumulator::new(bucket_width(bins, records.len()));
    let mut acc_read = BucketAccumulator::new(bucket_width(bins, n_read));
    let mut acc_write = BucketAccumulator::new(bucket_width(bins, n_write));
    let mut acc_trim = BucketAccumulator::new(bucket_width(bins, n_trim));

    for (i, rec) in records.iter().enumerate() {
        // bounds check before every call: when width * bins < record count
        // the accumulator must not be pushed past the end of its series
        if in_bounds(&acc_all, bins) {
            acc_all.update(records, i, &mut all);
        }

        match rec.ddir {
            Direction::Read if in_bounds(&acc_read, bins) => {
                acc_read.update(records, i, &mut read);
            }
            Direction::Write if in_bounds(&acc_write, bins) => {
                acc_write.update(records, i, &mut write);
            }
            Direction::Trim if in_bounds(&acc_trim, bins) => {
                acc_trim.update(records, i, &mut trim);
            }
            _ => {}
        }
    }

    DirectionBins {
        all,
        read,
        write,
        trim,
    }
}

fn in_bounds(acc: &BucketAccumulator, bins: usize) -> bool {
    acc.cursor() < acc.width() * bins && acc.out_idx() < bins
}

/// Summarize a time-ordered record sequence into a full envelope.
///
/// Reorders `records` by value as a side effect. An empty sequence returns a
/// default envelope; callers scanning many files should skip empty inputs
/// before getting here.
pub fn summarize(records: &mut [LogRecord], bins: usize) -> LogSummary {
    let mut out = LogSummary::default();
    if records.is_empty() {
        return out;
    }

    let n = records.len();
    let bins = bins.min(n);

    let mut smry = BucketSummary {
        min: u32::MAX,
        min_ts: records[0].time,
        max_ts: records[n - 1].time,
        elapsed: records[n - 1].time.saturating_sub(records[0].time),
        ..BucketSummary::default()
    };

    // first pass: count, sum, min, max
    for rec in records.iter() {
        smry.count += 1;
        smry.sum += rec.value as u64;
        if rec.value > smry.max {
            smry.max = rec.value;
        }
        if rec.value < smry.min {
            smry.min = rec.value;
        }
    }
    smry.average = smry.sum as f64 / smry.count as f64;

    // second pass: stdev needs the average from the first
    let mut dsum = 0.0;
    for rec in records.iter() {
        let delta = rec.value as f64 - smry.average;
        dsum += delta * delta;
    }
    smry.stdev = (dsum / smry.count as f64).sqrt();

    // full-range series while the sequence is still in time order
    let full = build_bins(records, bins);

    // reorders the sequence by value: it is no longer in time order
    records.sort_unstable_by_key(|rec| rec.value);

    out.percentiles = percentiles(records);
    smry.median = records[(n - 1) / 2].value as u64;

    // bin the regions below P1 and from P99 up at full resolution; the
    // value-sorted slices are exactly what preserves the outlier shape
    let p1_idx = out.percentiles.get(1.0).map_or(0, |rec| rec.idx as usize);
    let p99_idx = out.percentiles.get(99.0).map_or(n, |rec| rec.idx as usize);
    debug!(
        "binned {} records: {} bins, P1 at {}, P99 at {}",
        n, bins, p1_idx, p99_idx
    );
    let sub_p1 = build_bins(&records[..p1_idx], bins);
    let super_p99 = build_bins(&records[p99_idx..], bins);

    out.summary = smry;
    out.bin = full.all;
    out.read_bin = full.read;
    out.write_bin = full.write;
    out.trim_bin = full.trim;
    out.p1_bin = sub_p1.all;
    out.p1_read_bin = sub_p1.read;
    out.p1_write_bin = sub_p1.write;
    out.p1_trim_bin = sub_p1.trim;
    out.p99_bin = super_p99.all;
    out.p99_read_bin = super_p99.read;
    out.p99_write_bin = super_p99.write;
    out.p99_trim_bin = super_p99.trim;
    out
}
