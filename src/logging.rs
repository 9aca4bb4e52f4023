//! Logging setup for the binary: a colorized, metadata-free stdout stream
//! for people, plus an optional rotating file for full diagnostics.

use anyhow::Result;
use colored::Colorize;
use std::fmt;
use std::path::Path;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Formats an event as just its message, colored by severity.
///
/// Timestamps, targets and level tags belong in the diagnostic file, not in
/// the output a person watches scroll by during a long scan.
pub struct LevelColorFormatter;

impl<S, N> FormatEvent<S, N> for LevelColorFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        // format_fields writes directly, so buffer the line to color it whole
        let mut line = String::new();
        let mut line_writer = Writer::new(&mut line);
        ctx.format_fields(line_writer.by_ref(), event)?;

        let colored = match *event.metadata().level() {
            Level::ERROR => line.red(),
            Level::WARN => line.yellow(),
            Level::INFO => line.normal(),
            Level::DEBUG => line.blue(),
            Level::TRACE => line.purple(),
        };

        writeln!(writer, "{}", colored)
    }
}

/// Initialize the tracing subscriber.
///
/// Returns the appender guard when file logging is active; it must stay
/// alive for the life of the program or buffered file output is lost.
pub fn init(verbose: u8, quiet: bool, log_file: Option<&str>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let (file_layer, guard) = match log_file {
        Some(path_str) => {
            let path = Path::new(path_str);
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("fio-summarize.log"));
            let appender = tracing_appender::rolling::daily(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(level)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_layer = if quiet {
        None
    } else {
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .event_format(LevelColorFormatter)
                .with_filter(level),
        )
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(guard)
}
