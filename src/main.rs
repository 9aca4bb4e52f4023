//! Entry point: parse arguments, wire up logging, dispatch a subcommand.

use anyhow::Result;
use clap::Parser;
use fio_summarize::cli::{Args, Command};
use fio_summarize::{scanner, utils};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

mod logging;

fn main() -> Result<()> {
    let args = Args::parse();

    // The guard keeps the non-blocking file appender flushing until exit.
    let _log_guard = logging::init(args.verbose, args.quiet, args.log_file.as_deref())?;

    if let Some(path) = args.log_file.as_deref() {
        // the daily appender adds a date suffix; name the real file
        let today = chrono::Local::now().format("%Y-%m-%d");
        info!("detailed diagnostics appended to {}.{}", path, today);
    }

    match args.command {
        Command::Summarize { input, hbkt, json } => run_summarize(&input, hbkt, json),
        Command::SummarizeAll { path, out, hbkt } => {
            utils::validate_bins(hbkt)?;
            scanner::summarize_all(&path, &out, hbkt)
        }
    }
}

fn run_summarize(input: &Path, bins: usize, json: bool) -> Result<()> {
    utils::validate_bins(bins)?;

    let Some(smry) = scanner::summarize_log_file(input, bins)? else {
        warn!("'{}' produced no records, nothing to summarize", input.display());
        return Ok(());
    };

    if json {
        std::io::stdout().write_all(&smry.to_json()?)?;
    } else {
        smry.print_human();
    }
    Ok(())
}
