//! Stderr logging for the pipeline stages.
//!
//! Every line carries the time since the logger was installed, the level and
//! the stage that emitted it, with the `fieldgrid` crate prefix dropped:
//!
//! ```text
//!    1.204s  WARN pipeline: 3 field(s) extend past the 2048x2048 image
//!    1.388s  INFO report::sheet: sheet saved to _Dag_3_sample_2_/CellCountData.csv
//! ```

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

/// Filtering goes through `log::max_level`, so a later
/// [`init_with_level`] call can still change the verbosity.
struct StageLogger {
    started: Instant,
}

impl Log for StageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StageLogger> = OnceLock::new();

/// `fieldgrid_calib::calibrator` → `calib::calibrator`,
/// `fieldgrid::pipeline` → `pipeline`.
fn stage(target: &str) -> &str {
    target
        .strip_prefix("fieldgrid_")
        .or_else(|| target.strip_prefix("fieldgrid::"))
        .unwrap_or(target)
}

fn format_line(
    elapsed: Duration,
    level: Level,
    target: &str,
    message: impl fmt::Display,
) -> String {
    format!(
        "{:8.3}s {:>5} {}: {}",
        elapsed.as_secs_f64(),
        level,
        stage(target),
        message
    )
}

/// Install the stderr logger, or change its level if already installed.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let mut installed_now = false;
    let logger = LOGGER.get_or_init(|| {
        installed_now = true;
        StageLogger {
            started: Instant::now(),
        }
    });
    if installed_now {
        log::set_logger(logger)?;
    }
    log::set_max_level(level);
    Ok(())
}

/// Install a `tracing` subscriber with `log` records forwarded into it.
///
/// `RUST_LOG` wins over `default_level`. Span close events carry stage
/// timings.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, default_level: LevelFilter) {
    let _ = tracing_log::LogTracer::init();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string().to_ascii_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().flatten_event(true).finish())
    } else {
        tracing::subscriber::set_global_default(
            builder
                .with_timer(tracing_subscriber::fmt::time::Uptime::default())
                .finish(),
        )
    };
    if installed.is_err() {
        log::debug!("tracing subscriber already installed");
    }
}
