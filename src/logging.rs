//! Log collector setup shared by the fixture binaries.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

/// Install the global fmt collector.
///
/// With `log_path`, events go to a daily rolling file named after the path's file name,
/// otherwise to stdout.  Keep the returned guard alive until exit, dropping it flushes
/// pending events.
pub fn init(log_path: Option<&str>) -> WorkerGuard {
    let collector = tracing_subscriber::fmt();
    let (non_blocking, guard) = match log_path {
        Some(path) => {
            let path = Path::new(path);
            let dir_name = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            let file_name = path.file_name().unwrap_or_else(|| "fixture.log".as_ref());
            let file_appender = tracing_appender::rolling::daily(dir_name, file_name);
            tracing_appender::non_blocking(file_appender)
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };
    collector.with_writer(non_blocking).init();
    guard
}
