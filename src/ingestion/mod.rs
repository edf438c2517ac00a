//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest`] (from [`unified`]) which:
//!
//! - dispatches on the path's extension (`.csv`, `.xlsx`, `.xls`) and skips everything else
//! - downloads each file through a [`crate::remote::RemoteStore`] and parses it into a
//!   [`crate::types::Table`]
//! - optionally reports success/skip/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific parsers are also available under:
//! - [`csv`]
//! - [`excel`]

pub mod csv;
pub mod excel;
pub mod observability;
pub mod options;
pub mod unified;
pub mod values;

pub use observability::{
    severity_for_error, CompositeObserver, FileObserver, IngestionContext, IngestionObserver,
    IngestionSeverity, IngestionStats, ProgressCallback, TracingObserver,
};
pub use options::{
    DelimitedOptions, FileKind, FormatOptions, IngestionOptions, SheetSelector, SpreadsheetKind,
    SpreadsheetOptions,
};
pub use unified::{
    ingest, ingest_collecting, ingest_one, ingest_parallel, BatchReport, FailedFile, IngestedFile,
};
