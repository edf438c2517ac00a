//! Delimited-text (CSV) parser.

use std::io::Read;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Table, Value};

use super::options::DelimitedOptions;
use super::values::{infer_text_value, parse_timestamp};

/// Parse CSV data into a [`Table`].
///
/// Rules:
///
/// - `header_row_skip` leading records are discarded; the next record is the header.
/// - The column at `index_column` becomes the timestamp index; every row must parse, otherwise
///   [`IngestionError::MalformedIndex`] is returned (with an empty path; the ingestor fills it in).
/// - Remaining cells are type-inferred; empty cells and `missing_marker` become [`Value::Null`].
/// - Short rows are padded with nulls, extra trailing cells are ignored.
///
/// ```rust
/// use archival_zone::ingestion::csv::parse_delimited;
/// use archival_zone::ingestion::DelimitedOptions;
/// use archival_zone::types::Value;
///
/// let input = "ts,val\n2020-01-01 00:00:00,5\n2020-01-01 00:15:00,NAN\n";
/// let table = parse_delimited(input.as_bytes(), &DelimitedOptions::default()).unwrap();
/// assert_eq!(table.row_count(), 2);
/// assert_eq!(table.value(1, "val"), Some(&Value::Null));
/// ```
pub fn parse_delimited<R: Read>(reader: R, options: &DelimitedOptions) -> IngestionResult<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = rdr.records();
    for _ in 0..options.header_row_skip {
        if records.next().transpose()?.is_none() {
            break;
        }
    }

    let header = records
        .next()
        .transpose()?
        .ok_or_else(|| IngestionError::SchemaMismatch {
            message: "file has no header row".to_string(),
        })?;
    let header: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_string()
        })
        .collect();

    let idx_col = options.index_column;
    if idx_col >= header.len() {
        return Err(IngestionError::SchemaMismatch {
            message: format!("index column {idx_col} out of range. headers={header:?}"),
        });
    }

    let index_name = Some(header[idx_col].clone()).filter(|h| !h.is_empty());
    let value_cols: Vec<usize> = (0..header.len()).filter(|&i| i != idx_col).collect();
    let columns: Vec<String> = value_cols.iter().map(|&i| header[i].clone()).collect();

    let mut index = Vec::new();
    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (row_idx0, result) in records.enumerate() {
        // 1-based line number: skipped rows + header + this row.
        let user_row = options.header_row_skip + row_idx0 + 2;
        let record = result?;

        let raw = record.get(idx_col).unwrap_or("");
        let ts = parse_timestamp(raw).ok_or_else(|| IngestionError::MalformedIndex {
            path: String::new(),
            row: user_row,
            raw: raw.to_string(),
        })?;

        let row: Vec<Value> = value_cols
            .iter()
            .map(|&i| infer_text_value(record.get(i).unwrap_or(""), &options.missing_marker))
            .collect();
        index.push(ts);
        rows.push(row);
    }

    Ok(Table::new(index_name, columns, index, rows))
}

#[cfg(test)]
mod tests {
    use super::parse_delimited;
    use crate::error::{ErrorKind, IngestionError};
    use crate::ingestion::DelimitedOptions;
    use crate::types::Value;

    #[test]
    fn header_and_index_columns() {
        let input =
            "\u{feff}TIMESTAMP,stage,flag\n2020-01-01 00:00:00,1.25,ok\n2020-01-01 00:15:00,,\n";
        let t = parse_delimited(input.as_bytes(), &DelimitedOptions::default()).unwrap();

        assert_eq!(t.index_name(), Some("TIMESTAMP"));
        assert_eq!(t.columns(), ["stage", "flag"]);
        assert_eq!(t.value(0, "stage"), Some(&Value::Float64(1.25)));
        assert_eq!(t.value(0, "flag"), Some(&Value::Utf8("ok".to_string())));
        assert_eq!(t.value(1, "stage"), Some(&Value::Null));
        assert_eq!(t.value(1, "flag"), Some(&Value::Null));
    }

    #[test]
    fn skips_metadata_rows_and_uses_other_index_column() {
        let input = "logger,CR1000\nunits,m\nid,ts,val\n7,2020-01-01 01:00:00,3\n";
        let opts = DelimitedOptions {
            index_column: 1,
            header_row_skip: 2,
            ..Default::default()
        };
        let t = parse_delimited(input.as_bytes(), &opts).unwrap();
        assert_eq!(t.index_name(), Some("ts"));
        assert_eq!(t.columns(), ["id", "val"]);
        assert_eq!(t.row(0).unwrap().values, &[Value::Int64(7), Value::Int64(3)]);
    }

    #[test]
    fn short_rows_are_padded() {
        let input = "ts,a,b\n2020-01-01 00:00:00,1\n";
        let t = parse_delimited(input.as_bytes(), &DelimitedOptions::default()).unwrap();
        assert_eq!(t.row(0).unwrap().values, &[Value::Int64(1), Value::Null]);
    }

    #[test]
    fn malformed_index_reports_row_and_raw() {
        let input = "ts,val\n2020-01-01 00:00:00,1\nnot a date,2\n";
        let err = parse_delimited(input.as_bytes(), &DelimitedOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedIndex);
        match err {
            IngestionError::MalformedIndex { row, raw, .. } => {
                assert_eq!(row, 3);
                assert_eq!(raw, "not a date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_index_value_is_malformed() {
        let input = "ts,val\n,1\n";
        let err = parse_delimited(input.as_bytes(), &DelimitedOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedIndex);
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = parse_delimited("".as_bytes(), &DelimitedOptions::default()).unwrap_err();
        assert!(err.to_string().contains("no header row"));
    }

    #[test]
    fn header_only_is_an_empty_table() {
        let t = parse_delimited("ts,val\n".as_bytes(), &DelimitedOptions::default()).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.columns(), ["val"]);
    }

    #[test]
    fn index_column_out_of_range() {
        let opts = DelimitedOptions {
            index_column: 5,
            ..Default::default()
        };
        let err = parse_delimited("ts,val\n".as_bytes(), &opts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("index column 5 out of range"));
    }
}
