use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

use crate::error::IngestionError;

use super::options::FileKind;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the file could not be ingested).
    Error,
    /// Critical error (storage backend or I/O failure).
    Critical,
}

/// Context about one file's ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Remote path of the file.
    pub path: String,
    /// Kind the file was dispatched as.
    pub kind: FileKind,
}

/// Minimal stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    pub rows: usize,
    pub columns: usize,
}

/// Observer interface for ingestion progress and outcomes.
///
/// All hooks default to no-ops, so implementors only override what they need.
pub trait IngestionObserver: Send + Sync {
    /// Called after a file has been downloaded and parsed.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when batch ingestion passes over a path with an unrecognised extension.
    fn on_skipped(&self, _path: &str) {}

    /// Called when ingesting a file fails.
    fn on_failure(
        &self,
        _ctx: &IngestionContext,
        _severity: IngestionSeverity,
        _error: &IngestionError,
    ) {
    }

    /// Called when an ingestion failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_skipped(&self, path: &str) {
        for o in &self.observers {
            o.on_skipped(path);
        }
    }

    fn on_failure(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Forwards ingestion events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        info!(
            path = %ctx.path,
            kind = ?ctx.kind,
            rows = stats.rows,
            columns = stats.columns,
            "ingested"
        );
    }

    fn on_skipped(&self, path: &str) {
        debug!(path, "skipped: unsupported extension");
    }

    fn on_failure(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        warn!(path = %ctx.path, kind = ?ctx.kind, ?severity, %error, "ingestion failed");
    }

    fn on_alert(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        error!(path = %ctx.path, kind = ?ctx.kind, ?severity, %error, "ingestion alert");
    }
}

/// Calls a closure with each successfully ingested path.
///
/// This is the simplest progress sink:
///
/// ```rust
/// use std::sync::Arc;
/// use archival_zone::ingestion::{IngestionOptions, ProgressCallback};
///
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(ProgressCallback::new(|path: &str| println!("{path}")))),
///     ..Default::default()
/// };
/// # let _ = opts;
/// ```
pub struct ProgressCallback<F> {
    callback: F,
}

impl<F> ProgressCallback<F>
where
    F: Fn(&str) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> fmt::Debug for ProgressCallback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressCallback").finish_non_exhaustive()
    }
}

impl<F> IngestionObserver for ProgressCallback<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn on_success(&self, ctx: &IngestionContext, _stats: IngestionStats) {
        (self.callback)(&ctx.path);
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{} {line}", chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"));
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append_line(&format!(
            "ok kind={:?} path={} rows={}",
            ctx.kind, ctx.path, stats.rows
        ));
    }

    fn on_skipped(&self, path: &str) {
        self.append_line(&format!("skip path={path}"));
    }

    fn on_failure(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        self.append_line(&format!(
            "fail severity={severity:?} kind={:?} path={} err={error}",
            ctx.kind, ctx.path
        ));
    }

    fn on_alert(
        &self,
        ctx: &IngestionContext,
        severity: IngestionSeverity,
        error: &IngestionError,
    ) {
        self.append_line(&format!(
            "ALERT severity={severity:?} kind={:?} path={} err={error}",
            ctx.kind, ctx.path
        ));
    }
}

/// Classify a failure for observer callbacks.
pub fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::RemoteUnavailable { .. } | IngestionError::Io(_) => {
            IngestionSeverity::Critical
        }
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        IngestionError::Excel(_)
        | IngestionError::MalformedIndex { .. }
        | IngestionError::SchemaMismatch { .. }
        | IngestionError::UnsupportedFormat { .. }
        | IngestionError::InvalidPattern(_)
        | IngestionError::Config { .. } => IngestionSeverity::Error,
    }
}
