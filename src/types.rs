//! Core data model types.
//!
//! Every ingested file becomes one [`Table`]: a timestamp index plus named columns of typed
//! [`Value`]s. Tables are immutable once built; transformations return new tables.

use chrono::NaiveDateTime;

/// A single cell value in a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value (empty cell or the configured missing-value marker, `"NAN"` by default).
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row<'a> {
    /// Parsed index timestamp.
    pub timestamp: NaiveDateTime,
    /// Cell values, in [`Table::columns`] order.
    pub values: &'a [Value],
}

/// In-memory time-indexed table.
///
/// Rows keep source order; the index is neither required to be sorted nor unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index_name: Option<String>,
    columns: Vec<String>,
    index: Vec<NaiveDateTime>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table from an index and row-major values.
    ///
    /// # Panics
    ///
    /// Panics if `index` and `rows` differ in length, or if any row's length differs from the
    /// number of columns.
    pub fn new(
        index_name: Option<String>,
        columns: Vec<String>,
        index: Vec<NaiveDateTime>,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        assert!(
            index.len() == rows.len(),
            "index length {} does not match row count {}",
            index.len(),
            rows.len()
        );
        for row in &rows {
            assert!(
                row.len() == columns.len(),
                "row length {} does not match column count {}",
                row.len(),
                columns.len()
            );
        }
        Self {
            index_name,
            columns,
            index,
            rows,
        }
    }

    /// Header text of the index column, if the source had one.
    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    /// Column names (excluding the index column).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the position of a column by name, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows in the table.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index timestamps in row order.
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// Row `i`, if in range.
    pub fn row(&self, i: usize) -> Option<Row<'_>> {
        Some(Row {
            timestamp: *self.index.get(i)?,
            values: self.rows.get(i)?.as_slice(),
        })
    }

    /// Iterate rows in table order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.index
            .iter()
            .zip(self.rows.iter())
            .map(|(ts, values)| Row {
                timestamp: *ts,
                values: values.as_slice(),
            })
    }

    /// Value at (`row`, `column`), looked up by column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)
    }

    /// Create a new table containing only rows that match `predicate`.
    ///
    /// The returned table keeps the original columns and index name.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Row<'_>) -> bool,
    {
        let mut index = Vec::new();
        let mut rows = Vec::new();
        for row in self.rows().filter(|r| predicate(r)) {
            index.push(row.timestamp);
            rows.push(row.values.to_vec());
        }
        Self {
            index_name: self.index_name.clone(),
            columns: self.columns.clone(),
            index,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Table, Value};
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn sample_table() -> Table {
        Table::new(
            Some("TIMESTAMP".to_string()),
            vec!["stage".to_string(), "flag".to_string()],
            vec![
                ts("2020-01-01 00:00:00"),
                ts("2020-01-01 00:15:00"),
                ts("2019-12-31 23:45:00"),
            ],
            vec![
                vec![Value::Float64(1.5), Value::Utf8("ok".to_string())],
                vec![Value::Null, Value::Utf8("gap".to_string())],
                vec![Value::Int64(2), Value::Bool(true)],
            ],
        )
    }

    #[test]
    fn lookups_by_column_name() {
        let t = sample_table();
        assert_eq!(t.column_index("stage"), Some(0));
        assert_eq!(t.column_index("missing"), None);
        assert_eq!(t.value(1, "flag"), Some(&Value::Utf8("gap".to_string())));
        assert_eq!(t.value(1, "stage"), Some(&Value::Null));
        assert_eq!(t.value(9, "stage"), None);
        assert_eq!(t.index_name(), Some("TIMESTAMP"));
    }

    #[test]
    fn rows_keep_source_order() {
        let t = sample_table();
        let stamps: Vec<_> = t.rows().map(|r| r.timestamp).collect();
        assert_eq!(stamps, t.timestamps());
        assert_eq!(t.row(2).unwrap().timestamp, ts("2019-12-31 23:45:00"));
        assert!(t.row(3).is_none());
    }

    #[test]
    fn filter_rows_returns_new_table() {
        let t = sample_table();
        let out = t.filter_rows(|r| r.values[0].as_f64().is_some());

        assert_eq!(out.row_count(), 2);
        assert_eq!(out.columns(), t.columns());
        assert_eq!(out.index_name(), Some("TIMESTAMP"));
        assert_eq!(
            out.timestamps(),
            &[ts("2020-01-01 00:00:00"), ts("2019-12-31 23:45:00")]
        );
        // Original unchanged
        assert_eq!(t.row_count(), 3);
    }

    #[test]
    fn filter_rows_can_return_empty_table() {
        let t = sample_table();
        let out = t.filter_rows(|_| false);
        assert!(out.is_empty());
        assert_eq!(out.columns(), t.columns());
    }

    #[test]
    #[should_panic(expected = "does not match column count")]
    fn new_rejects_ragged_rows() {
        let _ = Table::new(
            None,
            vec!["a".to_string()],
            vec![ts("2020-01-01 00:00:00")],
            vec![vec![Value::Null, Value::Null]],
        );
    }
}
