//! provides logging helpers

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// When set, logs go to a daily rolling file at this path instead of stderr.
pub const LOG_PATH_ENV_VAR: &str = "UPS_TAINTER_LOG_PATH";

/// initiate the global tracing subscriber
///
/// The returned guard must be held for the lifetime of the process when
/// logging to a file, otherwise buffered lines are lost on exit.
pub fn init() -> Option<WorkerGuard> {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();

    let log_path = env::var(LOG_PATH_ENV_VAR).ok().filter(|p| !p.is_empty());

    match log_path.as_deref().and_then(file_appender) {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let fmt_layer = layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(env_filter);
            registry().with(fmt_layer).init();
            Some(guard)
        }
        None => {
            let fmt_layer = layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(env_filter);
            registry().with(fmt_layer).init();
            None
        }
    }
}

fn file_appender(log_path: &str) -> Option<RollingFileAppender> {
    let path = Path::new(log_path);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty())?;
    let file = path.file_name()?.to_str()?;

    match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file)
        .max_log_files(3)
        .build(dir)
    {
        Ok(appender) => Some(appender),
        Err(e) => {
            eprintln!("failed to create rolling file appender at {log_path}: {e}, logging to stderr");
            None
        }
    }
}
