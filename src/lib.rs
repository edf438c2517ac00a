//! `archival-zone` pulls hydrological time-series files (CSV, XLSX, XLS) out of a Dropbox
//! account, parses each one into a timestamp-indexed [`types::Table`], and runs a couple of sanity
//! checks on the result.
//!
//! The pipeline is:
//!
//! 1. [`remote::list_files`]: list every file under a folder, following pagination cursors.
//! 2. [`filter::filter_by_pattern`]: keep the paths whose filename matches a shell-style glob.
//! 3. [`ingestion::ingest`]: download each matching file and parse it into a [`types::Table`].
//! 4. [`diagnostics`]: [`diagnostics::time_zero_check`] and [`diagnostics::water_year_check`].
//!
//! ## What you can ingest
//!
//! **File formats (dispatched on the exact, case-sensitive extension):**
//!
//! - **CSV**: `.csv`, header in the first row, timestamp index in the first column
//! - **Excel 2007+**: `.xlsx`, second sheet unless overridden, index in the first column
//! - **Legacy Excel**: `.xls`, with caller-chosen sheet, index column and header-row skip
//!
//! Anything else is skipped by batch ingestion and rejected by [`ingestion::ingest_one`].
//!
//! Cells become typed [`types::Value`]s. Empty cells and the missing-value marker (`"NAN"` by
//! default) map to [`types::Value::Null`]. Every index cell must parse as a timestamp, otherwise
//! the file fails with [`IngestionError::MalformedIndex`].
//!
//! ## Quick example
//!
//! ```rust
//! use archival_zone::diagnostics::{time_zero_check, water_year_check, WaterYear};
//! use archival_zone::filter::filter_by_pattern;
//! use archival_zone::ingestion::{ingest, IngestionOptions};
//! use archival_zone::remote::{list_file_paths, MemoryStore};
//!
//! # fn main() -> Result<(), archival_zone::IngestionError> {
//! let store = MemoryStore::new()
//!     .with_file(
//!         "/QualityZone2/stage.csv",
//!         "ts,stage\n2019-10-01 00:00:00,1.2\n2019-10-01 00:15:00,NAN\n",
//!     )
//!     .with_file("/QualityZone2/notes.txt", "field notes");
//!
//! let paths = list_file_paths(&store, "/QualityZone2")?;
//! let csvs = filter_by_pattern(&paths, "*.csv")?;
//! let tables = ingest(&store, &csvs, &IngestionOptions::default())?;
//!
//! let report = time_zero_check(&tables[0]);
//! assert_eq!(report.misaligned_count, 1);
//!
//! let wy = WaterYear::from_two_digit(20).unwrap();
//! assert_eq!(water_year_check(&tables[0], wy).outside_count, 0);
//! # Ok(())
//! # }
//! ```
//!
//! Against the real service, use [`remote::DropboxClient`] (built from [`config::Config`]) in place
//! of the in-memory store.
//!
//! ## Modules
//!
//! - [`remote`]: storage backends and paginated listing
//! - [`filter`]: filename glob filtering
//! - [`ingestion`]: batch/single-file ingestion, format parsers and observers
//! - [`diagnostics`]: timestamp-alignment and water-year checks
//! - [`types`]: the in-memory table model
//! - [`config`]: TOML + environment settings for the command-line tool
//! - [`error`]: error types used across the crate

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod ingestion;
pub mod remote;
pub mod types;

pub use error::{ErrorKind, IngestionError, IngestionResult};
