//! `tracing` subscriber setup for both binaries.
//!
//! `RUST_LOG` always wins over the built-in default directive.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vaultzero={default_level},warn")))
}

/// Log to stderr.  Used by the vault CLI, where stdout carries output.
pub fn init_stderr(default_level: &str) {
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

/// Log to a file, appending.  Used by the native host, whose stdout is
/// the browser channel.
///
/// Returns the writer guard, which must be held until exit.  If the
/// file cannot be opened, logging stays off and `None` is returned.
pub fn init_file(path: &Path, default_level: &str) -> Option<WorkerGuard> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty())?;
    let file_name = path.file_name()?;
    std::fs::create_dir_all(dir).ok()?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy().as_ref())
        .build(dir)
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .ok()?;
    Some(guard)
}
