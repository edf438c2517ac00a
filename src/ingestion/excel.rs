//! Spreadsheet (`.xlsx` / `.xls`) parser.

use std::io::{Cursor, Read, Seek};

use calamine::{Data, Range, Reader, Xls, Xlsx};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Table, Value};

use super::options::{SheetSelector, SpreadsheetKind, SpreadsheetOptions};
use super::values::{excel_serial_to_datetime, parse_timestamp};

/// Parse an in-memory workbook into a [`Table`].
///
/// Behavior:
/// - Picks the sheet named or positioned by `options.sheet`
/// - Skips `header_row_skip` sheet rows, then takes the first non-empty row as the header
/// - The column at `index_column` (0 = column A) becomes the timestamp index
/// - Fully empty data rows are dropped; every other row must have a valid index timestamp
///
/// Date cells, ISO date strings, Excel serial numbers and text timestamps are all accepted in the
/// index column.
pub fn parse_spreadsheet(
    bytes: Vec<u8>,
    kind: SpreadsheetKind,
    options: &SpreadsheetOptions,
) -> IngestionResult<Table> {
    let cursor = Cursor::new(bytes);
    let range = match kind {
        SpreadsheetKind::Xlsx => {
            let mut workbook: Xlsx<_> = Xlsx::new(cursor).map_err(calamine::Error::from)?;
            select_range(&mut workbook, &options.sheet)?
        }
        SpreadsheetKind::Xls => {
            let mut workbook: Xls<_> = Xls::new(cursor).map_err(calamine::Error::from)?;
            select_range(&mut workbook, &options.sheet)?
        }
    };
    table_from_range(&range, options).map_err(|e| wrap_schema_err_with_sheet(&options.sheet, e))
}

fn select_range<RS, R>(workbook: &mut R, sheet: &SheetSelector) -> IngestionResult<Range<Data>>
where
    RS: Read + Seek,
    R: Reader<RS>,
    calamine::Error: From<R::Error>,
{
    match sheet {
        SheetSelector::Index(i) => match workbook.worksheet_range_at(*i) {
            Some(range) => Ok(range.map_err(calamine::Error::from)?),
            None => Err(IngestionError::SchemaMismatch {
                message: format!(
                    "sheet #{i} not found. sheets={:?}",
                    workbook.sheet_names()
                ),
            }),
        },
        SheetSelector::Name(name) => Ok(workbook
            .worksheet_range(name)
            .map_err(calamine::Error::from)?),
    }
}

fn wrap_schema_err_with_sheet(sheet: &SheetSelector, err: IngestionError) -> IngestionError {
    match err {
        IngestionError::SchemaMismatch { message } => IngestionError::SchemaMismatch {
            message: format!("sheet {sheet}: {message}"),
        },
        other => other,
    }
}

fn table_from_range(range: &Range<Data>, options: &SpreadsheetOptions) -> IngestionResult<Table> {
    let Some((end_row, end_col)) = range.end() else {
        return Err(IngestionError::SchemaMismatch {
            message: "sheet is empty (no header row found)".to_string(),
        });
    };
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let end_row = end_row as usize;
    let end_col = end_col as usize;
    let first_col = (start_col as usize).min(options.index_column);
    let last_row_to_scan = end_row.max(start_row as usize);

    let cell = |row: usize, col: usize| cell_at(range, row, col);
    let row_is_empty =
        |row: usize| (first_col..=end_col).all(|c| matches!(cell(row, c), Data::Empty));

    let header_row = (options.header_row_skip..=last_row_to_scan)
        .find(|&r| !row_is_empty(r))
        .ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!(
                "no non-empty header row after skipping {} rows",
                options.header_row_skip
            ),
        })?;

    let idx_col = options.index_column;
    if idx_col > end_col {
        return Err(IngestionError::SchemaMismatch {
            message: format!("index column {idx_col} out of range (last column is {end_col})"),
        });
    }

    let index_name =
        Some(cell_to_header_string(cell(header_row, idx_col))).filter(|h| !h.is_empty());
    let value_cols: Vec<usize> = (first_col..=end_col).filter(|&c| c != idx_col).collect();
    let columns: Vec<String> = value_cols
        .iter()
        .map(|&c| {
            let name = cell_to_header_string(cell(header_row, c));
            if name.is_empty() {
                format!("Unnamed: {c}")
            } else {
                name
            }
        })
        .collect();

    let mut index = Vec::new();
    let mut rows: Vec<Vec<Value>> = Vec::new();
    for r in (header_row + 1)..=end_row {
        if row_is_empty(r) {
            continue;
        }
        let idx_cell = cell(r, idx_col);
        // Report 1-based row number (Excel-like).
        let ts = cell_to_timestamp(idx_cell).ok_or_else(|| IngestionError::MalformedIndex {
            path: String::new(),
            row: r + 1,
            raw: cell_to_header_string(idx_cell),
        })?;
        let row = value_cols
            .iter()
            .map(|&c| convert_cell(cell(r, c), &options.missing_marker))
            .collect();
        index.push(ts);
        rows.push(row);
    }

    Ok(Table::new(index_name, columns, index, rows))
}

fn cell_at(range: &Range<Data>, row: usize, col: usize) -> &Data {
    range
        .get_value((row as u32, col as u32))
        .unwrap_or(&Data::Empty)
}

fn cell_to_timestamp(c: &Data) -> Option<chrono::NaiveDateTime> {
    match c {
        Data::DateTime(dt) => dt.as_datetime(),
        Data::DateTimeIso(s) | Data::String(s) => parse_timestamp(s),
        Data::Float(f) => excel_serial_to_datetime(*f),
        Data::Int(i) => excel_serial_to_datetime(*i as f64),
        Data::Bool(_) | Data::DurationIso(_) | Data::Error(_) | Data::Empty => None,
    }
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => ts.to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => "".to_string(),
    }
}

fn convert_cell(c: &Data, missing_marker: &str) -> Value {
    match c {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == missing_marker {
                Value::Null
            } else {
                Value::Utf8(s.to_string())
            }
        }
        Data::Float(f) if f.is_nan() => Value::Null,
        Data::Float(f) => Value::Float64(*f),
        Data::Int(i) => Value::Int64(*i),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => {
            Value::Utf8(cell_to_header_string(c))
        }
    }
}
