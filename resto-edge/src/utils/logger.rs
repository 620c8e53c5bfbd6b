//! Logging Infrastructure
//!
//! Plain `fmt` subscriber, optionally writing to a daily rolling file.

use std::path::Path;

/// Initialize the logger at `info` on stderr
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional file output
///
/// `log_level` takes a tracing level name (`debug`, `info`, ...). File
/// output is only used when `log_dir` already exists.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level.parse().unwrap_or(tracing::Level::INFO))
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, "resto-edge");
            subscriber.with_ansi(false).with_writer(file_appender).init();
            return;
        }
    }

    subscriber.with_writer(std::io::stderr).init();
}
