use thiserror::Error;

/// Convenience result type for listing, filtering and ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned across the crate.
///
/// A single enum is shared by the remote backends, the pattern filter, the CSV/spreadsheet
/// parsers and configuration loading.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. a local file vanished mid-read).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Spreadsheet (`.xlsx` / `.xls`) decoding error.
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Delimited-text decoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Listing or download failed at the storage backend (network, auth, missing path).
    ///
    /// No retry is attempted by this crate.
    #[error("remote unavailable for '{path}': {message}")]
    RemoteUnavailable { path: String, message: String },

    /// A value in the index column could not be parsed as a timestamp.
    #[error("malformed index in '{path}' at row {row}: cannot parse timestamp (raw='{raw}')")]
    MalformedIndex { path: String, row: usize, raw: String },

    /// The path's extension is not one of `.csv`, `.xlsx`, `.xls`.
    #[error("unsupported format: {path}")]
    UnsupportedFormat { path: String },

    /// The file parsed, but does not have the expected shape (no header row, index column out of
    /// range, missing sheet, ...).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// The glob pattern handed to the filter is not valid.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    /// Configuration could not be loaded or is incomplete.
    #[error("config error: {message}")]
    Config { message: String },
}

/// Coarse classification of an [`IngestionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RemoteUnavailable,
    MalformedIndex,
    UnsupportedFormat,
    Parse,
    Config,
}

impl IngestionError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestionError::RemoteUnavailable { .. } => ErrorKind::RemoteUnavailable,
            IngestionError::MalformedIndex { .. } => ErrorKind::MalformedIndex,
            IngestionError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            IngestionError::Io(_)
            | IngestionError::Excel(_)
            | IngestionError::Csv(_)
            | IngestionError::SchemaMismatch { .. } => ErrorKind::Parse,
            IngestionError::InvalidPattern(_) | IngestionError::Config { .. } => ErrorKind::Config,
        }
    }

    /// Attach a file path to errors raised by the path-agnostic parsers.
    pub(crate) fn with_path(self, path: &str) -> Self {
        match self {
            IngestionError::MalformedIndex { row, raw, .. } => IngestionError::MalformedIndex {
                path: path.to_string(),
                row,
                raw,
            },
            IngestionError::SchemaMismatch { message } => IngestionError::SchemaMismatch {
                message: format!("{path}: {message}"),
            },
            other => other,
        }
    }
}
