//! Ingestion entrypoints.
//!
//! Every function takes the storage backend explicitly; there is no ambient client.
//!
//! - [`ingest_one`]: one path, one [`Table`]; unknown extensions are an error.
//! - [`ingest`]: a batch; unknown extensions are skipped, the first failure aborts the batch.
//! - [`ingest_collecting`]: a batch that keeps going past failures and reports them.
//! - [`ingest_parallel`]: like [`ingest`], fetching on a bounded worker pool.
//!
//! When an [`super::observability::IngestionObserver`] is configured, `on_success` fires once per
//! ingested file in input order, `on_skipped` for passed-over paths, and `on_failure`/`on_alert`
//! for failures.

use std::io::Read;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::debug;

use crate::error::{IngestionError, IngestionResult};
use crate::remote::RemoteStore;
use crate::types::Table;

use super::observability::{severity_for_error, IngestionContext, IngestionStats};
use super::options::{FileKind, FormatOptions, IngestionOptions};
use super::{csv, excel};

/// A table together with the path it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedFile {
    pub path: String,
    pub table: Table,
}

/// A path that could not be ingested.
#[derive(Debug)]
pub struct FailedFile {
    pub path: String,
    pub error: IngestionError,
}

/// Outcome of [`ingest_collecting`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successfully ingested files, in input order.
    pub ingested: Vec<IngestedFile>,
    /// Failed files, in input order.
    pub failed: Vec<FailedFile>,
    /// Paths skipped for an unrecognised extension, in input order.
    pub skipped: Vec<String>,
}

impl BatchReport {
    /// Drop the paths and keep only the tables.
    pub fn into_tables(self) -> Vec<Table> {
        self.ingested.into_iter().map(|f| f.table).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Download and parse a single file.
///
/// Unlike the batch functions, an unrecognised extension is reported as
/// [`IngestionError::UnsupportedFormat`].
///
/// ```rust
/// use archival_zone::ingestion::{ingest_one, IngestionOptions};
/// use archival_zone::remote::MemoryStore;
///
/// # fn main() -> Result<(), archival_zone::IngestionError> {
/// let store = MemoryStore::new().with_file(
///     "/wy20/stage.csv",
///     "ts,val\n2020-01-01 00:00:00,5\n2020-01-01 00:15:00,NAN\n",
/// );
/// let table = ingest_one(&store, "/wy20/stage.csv", &IngestionOptions::default())?;
/// assert_eq!(table.row_count(), 2);
///
/// let err = ingest_one(&store, "/wy20/notes.txt", &IngestionOptions::default()).unwrap_err();
/// assert_eq!(err.kind(), archival_zone::ErrorKind::UnsupportedFormat);
/// # Ok(())
/// # }
/// ```
pub fn ingest_one<S: RemoteStore + ?Sized>(
    store: &S,
    path: &str,
    options: &IngestionOptions,
) -> IngestionResult<Table> {
    let kind = FileKind::from_path(path);
    if kind == FileKind::Unknown {
        return Err(IngestionError::UnsupportedFormat {
            path: path.to_string(),
        });
    }
    let result = fetch_and_parse(store, path, kind, &options.format);
    report(options, path, kind, &result);
    result
}

/// Download and parse a batch of files, one table per recognised path, in input order.
///
/// Paths whose extension is not `.csv`, `.xlsx` or `.xls` are skipped without error. The first
/// file that fails (download, decode, or a malformed index) aborts the batch and its error is
/// returned; use [`ingest_collecting`] to keep going instead.
pub fn ingest<S: RemoteStore + ?Sized, P: AsRef<str>>(
    store: &S,
    paths: &[P],
    options: &IngestionOptions,
) -> IngestionResult<Vec<Table>> {
    let mut tables = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let kind = FileKind::from_path(path);
        if kind == FileKind::Unknown {
            skip(options, path);
            continue;
        }
        let result = fetch_and_parse(store, path, kind, &options.format);
        report(options, path, kind, &result);
        tables.push(result?);
    }
    Ok(tables)
}

/// Like [`ingest`], but failed files are collected instead of aborting the batch.
pub fn ingest_collecting<S: RemoteStore + ?Sized, P: AsRef<str>>(
    store: &S,
    paths: &[P],
    options: &IngestionOptions,
) -> BatchReport {
    let mut out = BatchReport::default();
    for path in paths {
        let path = path.as_ref();
        let kind = FileKind::from_path(path);
        if kind == FileKind::Unknown {
            skip(options, path);
            out.skipped.push(path.to_string());
            continue;
        }
        let result = fetch_and_parse(store, path, kind, &options.format);
        report(options, path, kind, &result);
        match result {
            Ok(table) => out.ingested.push(IngestedFile {
                path: path.to_string(),
                table,
            }),
            Err(error) => out.failed.push(FailedFile {
                path: path.to_string(),
                error,
            }),
        }
    }
    out
}

/// Like [`ingest`], but downloads and parses on a pool of `workers` threads.
///
/// Results are merged back in input order, observer callbacks fire in input order after all
/// fetches complete, and the error returned (if any) is the first one in input order.
pub fn ingest_parallel<S: RemoteStore + ?Sized, P: AsRef<str>>(
    store: &S,
    paths: &[P],
    options: &IngestionOptions,
    workers: usize,
) -> IngestionResult<Vec<Table>> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| IngestionError::Io(std::io::Error::other(e)))?;

    let jobs: Vec<(&str, FileKind)> = paths
        .iter()
        .map(|p| (p.as_ref(), FileKind::from_path(p.as_ref())))
        .collect();
    let format = &options.format;

    let results: Vec<Option<IngestionResult<Table>>> = pool.install(|| {
        jobs.par_iter()
            .map(|&(path, kind)| match kind {
                FileKind::Unknown => None,
                _ => Some(fetch_and_parse(store, path, kind, format)),
            })
            .collect()
    });

    let mut tables = Vec::new();
    for (&(path, kind), result) in jobs.iter().zip(results) {
        match result {
            None => skip(options, path),
            Some(result) => {
                report(options, path, kind, &result);
                tables.push(result?);
            }
        }
    }
    Ok(tables)
}

/// Fetch one file and parse it according to its kind.
///
/// The body is read in full before parsing, so a transfer that breaks partway through is
/// [`IngestionError::RemoteUnavailable`] whatever the file kind.
fn fetch_and_parse<S: RemoteStore + ?Sized>(
    store: &S,
    path: &str,
    kind: FileKind,
    format: &FormatOptions,
) -> IngestionResult<Table> {
    debug!(path, ?kind, "downloading");
    let bytes = download_all(store, path)?;
    let table = match (kind, kind.spreadsheet_kind()) {
        (FileKind::Csv, _) => csv::parse_delimited(bytes.as_slice(), &format.delimited()),
        (_, Some(sheet_kind)) => {
            excel::parse_spreadsheet(bytes, sheet_kind, &format.spreadsheet(sheet_kind))
        }
        _ => Err(IngestionError::UnsupportedFormat {
            path: path.to_string(),
        }),
    };
    table.map_err(|e| e.with_path(path))
}

fn download_all<S: RemoteStore + ?Sized>(store: &S, path: &str) -> IngestionResult<Vec<u8>> {
    let mut stream = store.download(path)?;
    let mut bytes = Vec::new();
    stream
        .read_to_end(&mut bytes)
        .map_err(|e| IngestionError::RemoteUnavailable {
            path: path.to_string(),
            message: e.to_string(),
        })?;
    Ok(bytes)
}

fn skip(options: &IngestionOptions, path: &str) {
    debug!(path, "skipping unsupported extension");
    if let Some(obs) = options.observer.as_ref() {
        obs.on_skipped(path);
    }
}

fn report(
    options: &IngestionOptions,
    path: &str,
    kind: FileKind,
    result: &IngestionResult<Table>,
) {
    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    let ctx = IngestionContext {
        path: path.to_string(),
        kind,
    };
    match result {
        Ok(table) => obs.on_success(
            &ctx,
            IngestionStats {
                rows: table.row_count(),
                columns: table.columns().len(),
            },
        ),
        Err(e) => {
            let sev = severity_for_error(e);
            obs.on_failure(&ctx, sev, e);
            if sev >= options.alert_at_or_above {
                obs.on_alert(&ctx, sev, e);
            }
        }
    }
}
