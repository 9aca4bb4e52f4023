//! Command-line interface for the summarizer.
//!
//! Two subcommands cover the two ways the tool is used: `summarize` for
//! poking at a single log by hand, and `summarize-all` for turning a whole
//! suite run into dashboard data.

use clap::{
    builder::styling::{AnsiColor, Styles},
    Parser, Subcommand,
};
use std::path::PathBuf;

/// Styles for the help message.
fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Yellow.on_default())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, styles = styles())]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase diagnostic log verbosity.
    ///
    /// Can be used multiple times: -v enables debug detail, -vv trace.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Silence informational output on stdout.
    ///
    /// Useful when piping the JSON envelope to another program.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Append detailed diagnostics to this file (rotated daily).
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize a single fio log and print the result to stdout
    Summarize {
        /// fio log file to load
        #[arg(long = "in", value_name = "FILE")]
        input: PathBuf,

        /// Number of buckets in each binned series
        #[arg(long, default_value_t = crate::defaults::HISTOGRAM_BINS)]
        hbkt: usize,

        /// Print the JSON envelope instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Scan a suite directory and write one JSON summary per log file
    SummarizeAll {
        /// Suite directory to scan for fio logs
        #[arg(long, value_name = "DIR")]
        path: PathBuf,

        /// Directory to write summaries into (created if missing)
        #[arg(long, value_name = "DIR")]
        out: PathBuf,

        /// Number of buckets in each binned series
        #[arg(long, default_value_t = crate::defaults::HISTOGRAM_BINS)]
        hbkt: usize,
    },
}
