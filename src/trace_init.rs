use std::path::{Path, PathBuf};

/// File the JSON trace is appended to, under the host's log directory.
pub const TRACE_FILE_NAME: &str = "predict-trace.jsonl";

pub fn trace_file(log_dir: &Path) -> PathBuf {
    log_dir.join(TRACE_FILE_NAME)
}

#[cfg(feature = "trace")]
mod enabled {
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};

    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    use super::TRACE_FILE_NAME;

    const DEFAULT_FILTER: &str = "predict_engine=debug,predict_core=debug,predict_session=debug";

    static INSTALLED: AtomicBool = AtomicBool::new(false);

    pub fn init_tracing(log_dir: &Path) -> bool {
        if INSTALLED.swap(true, Ordering::SeqCst) {
            return false;
        }
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let appender = tracing_appender::rolling::never(log_dir, TRACE_FILE_NAME);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let installed = tracing_subscriber::fmt()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_env_filter(filter)
            .try_init()
            .is_ok();
        if installed {
            // The worker flushes on drop; sessions log until the host exits.
            std::mem::forget(guard);
            tracing::info!(log_dir = %log_dir.display(), "predict tracing started");
        }
        installed
    }
}

/// Install a JSON subscriber writing [`TRACE_FILE_NAME`] under `log_dir`,
/// filtered by `RUST_LOG` or debug for the predict crates.
///
/// Returns whether this call installed it: later calls, and hosts that
/// already set a global subscriber, leave the existing one in place.
#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: &Path) -> bool {
    enabled::init_tracing(log_dir)
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: &Path) -> bool {
    false
}
