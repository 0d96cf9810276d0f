//! Per-run log file

use chrono::{DateTime, Local};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// An open run log. Events are recorded while this value is alive.
pub struct RunLog {
    /// Path of the log file
    pub path: PathBuf,
    _guard: DefaultGuard,
}

/// `csv_merger_<YYYYMMDD_HHMMSS>.log`
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("csv_merger_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Create the log file in `log_dir` and route tracing events to it.
///
/// `RUST_LOG` overrides the default `info` level.
pub fn init(log_dir: &Path) -> io::Result<RunLog> {
    let path = log_dir.join(log_file_name(Local::now()));
    let file = File::create(&path)?;

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(env).with(
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false),
    );

    Ok(RunLog {
        path,
        _guard: tracing::subscriber::set_default(subscriber),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_file_name() {
        let started = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(log_file_name(started), "csv_merger_20240305_140709.log");
    }
}
