//! File-kind dispatch and per-format options.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use super::observability::{IngestionObserver, IngestionSeverity};

/// Source file format, decided once from the path.
///
/// Matching is on the exact, case-sensitive suffix: `data.CSV` is [`FileKind::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Delimited text (`.csv`).
    Csv,
    /// Office Open XML workbook (`.xlsx`).
    Xlsx,
    /// Legacy BIFF workbook (`.xls`).
    Xls,
    /// Anything else; skipped by batch ingestion.
    Unknown,
}

impl FileKind {
    pub fn from_path(path: &str) -> Self {
        if path.ends_with(".csv") {
            Self::Csv
        } else if path.ends_with(".xlsx") {
            Self::Xlsx
        } else if path.ends_with(".xls") {
            Self::Xls
        } else {
            Self::Unknown
        }
    }

    /// The spreadsheet flavour, for workbook kinds.
    pub fn spreadsheet_kind(self) -> Option<SpreadsheetKind> {
        match self {
            Self::Xlsx => Some(SpreadsheetKind::Xlsx),
            Self::Xls => Some(SpreadsheetKind::Xls),
            Self::Csv | Self::Unknown => None,
        }
    }
}

/// Workbook container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetKind {
    Xlsx,
    Xls,
}

/// Which worksheet to read.
///
/// Deserializes from either an integer (position, 0-based) or a string (sheet name).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SheetSelector {
    /// 0-based position in workbook order.
    Index(usize),
    /// Sheet name.
    Name(String),
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// Caller-tunable parsing options for one ingestion call.
///
/// How each field applies depends on the file kind:
///
/// | kind    | sheet                      | index column     | header rows skipped |
/// |---------|----------------------------|------------------|---------------------|
/// | `.csv`  | n/a                        | 0                | 0                   |
/// | `.xlsx` | `sheet_selector` or second | 0                | 0                   |
/// | `.xls`  | `sheet_selector` or first  | `index_column`   | `header_row_skip`   |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub sheet_selector: Option<SheetSelector>,
    pub header_row_skip: usize,
    pub index_column: usize,
    /// Cell text treated as missing, in addition to empty cells.
    pub missing_marker: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            sheet_selector: None,
            header_row_skip: 0,
            index_column: 0,
            missing_marker: "NAN".to_string(),
        }
    }
}

/// Resolved options for [`super::csv::parse_delimited`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedOptions {
    pub index_column: usize,
    pub header_row_skip: usize,
    pub missing_marker: String,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        FormatOptions::default().delimited()
    }
}

/// Resolved options for [`super::excel::parse_spreadsheet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetOptions {
    pub sheet: SheetSelector,
    pub index_column: usize,
    pub header_row_skip: usize,
    pub missing_marker: String,
}

impl FormatOptions {
    /// Options used for `.csv` files.
    pub fn delimited(&self) -> DelimitedOptions {
        DelimitedOptions {
            index_column: 0,
            header_row_skip: 0,
            missing_marker: self.missing_marker.clone(),
        }
    }

    /// Options used for workbook files of the given kind.
    pub fn spreadsheet(&self, kind: SpreadsheetKind) -> SpreadsheetOptions {
        match kind {
            SpreadsheetKind::Xlsx => SpreadsheetOptions {
                sheet: self.sheet_selector.clone().unwrap_or(SheetSelector::Index(1)),
                index_column: 0,
                header_row_skip: 0,
                missing_marker: self.missing_marker.clone(),
            },
            SpreadsheetKind::Xls => SpreadsheetOptions {
                sheet: self.sheet_selector.clone().unwrap_or(SheetSelector::Index(0)),
                index_column: self.index_column,
                header_row_skip: self.header_row_skip,
                missing_marker: self.missing_marker.clone(),
            },
        }
    }
}

/// Options controlling an ingestion call.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    pub format: FormatOptions,
    /// Optional observer for progress and failures.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: FormatOptions::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FileKind, FormatOptions, SheetSelector, SpreadsheetKind};

    #[test]
    fn kind_is_case_sensitive() {
        assert_eq!(FileKind::from_path("/a/b.csv"), FileKind::Csv);
        assert_eq!(FileKind::from_path("/a/b.xlsx"), FileKind::Xlsx);
        assert_eq!(FileKind::from_path("/a/b.xls"), FileKind::Xls);
        assert_eq!(FileKind::from_path("/a/b.CSV"), FileKind::Unknown);
        assert_eq!(FileKind::from_path("/a/b.XLSX"), FileKind::Unknown);
        assert_eq!(FileKind::from_path("/a/b.csv.bak"), FileKind::Unknown);
        assert_eq!(FileKind::from_path("/a/b"), FileKind::Unknown);
    }

    #[test]
    fn xlsx_defaults_to_second_sheet_and_ignores_xls_layout() {
        let opts = FormatOptions {
            header_row_skip: 4,
            index_column: 2,
            ..Default::default()
        };
        let xlsx = opts.spreadsheet(SpreadsheetKind::Xlsx);
        assert_eq!(xlsx.sheet, SheetSelector::Index(1));
        assert_eq!(xlsx.index_column, 0);
        assert_eq!(xlsx.header_row_skip, 0);

        let xls = opts.spreadsheet(SpreadsheetKind::Xls);
        assert_eq!(xls.sheet, SheetSelector::Index(0));
        assert_eq!(xls.index_column, 2);
        assert_eq!(xls.header_row_skip, 4);
    }

    #[test]
    fn sheet_override_applies_to_both_workbook_kinds() {
        let opts = FormatOptions {
            sheet_selector: Some(SheetSelector::Name("15min".to_string())),
            ..Default::default()
        };
        for kind in [SpreadsheetKind::Xlsx, SpreadsheetKind::Xls] {
            assert_eq!(
                opts.spreadsheet(kind).sheet,
                SheetSelector::Name("15min".to_string())
            );
        }
    }

    #[test]
    fn csv_always_uses_first_column() {
        let opts = FormatOptions {
            index_column: 3,
            header_row_skip: 2,
            missing_marker: "-9999".to_string(),
            ..Default::default()
        };
        let d = opts.delimited();
        assert_eq!(d.index_column, 0);
        assert_eq!(d.header_row_skip, 0);
        assert_eq!(d.missing_marker, "-9999");
    }
}
