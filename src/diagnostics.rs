//! Sanity checks over an ingested [`Table`].
//!
//! Both checks are linear scans, never mutate the table, and return plain report values; printing
//! them is up to the caller (every report implements [`fmt::Display`]).

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::types::Table;

/// A hydrological water year: Oct 1 of the previous calendar year to Oct 1 of the named year.
///
/// Two-digit years are read as 20xx, so only water years 2000..=2099 are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaterYear {
    year: i32,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl WaterYear {
    /// Water year from its two-digit form, e.g. `20` for WY2020. Values above 99 are rejected.
    pub fn from_two_digit(wy: u8) -> Option<Self> {
        if wy > 99 {
            return None;
        }
        Self::from_calendar_year(2000 + i32::from(wy))
    }

    /// Water year ending in calendar year `year` (2000..=2099).
    pub fn from_calendar_year(year: i32) -> Option<Self> {
        if !(2000..=2099).contains(&year) {
            return None;
        }
        Some(Self {
            year,
            start: october_first(year - 1)?,
            end: october_first(year)?,
        })
    }

    /// Calendar year in which the water year ends.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Oct 1 00:00:00 of the previous calendar year.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Oct 1 00:00:00 of [`Self::year`].
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// `true` when `ts` lies outside the water year.
    ///
    /// Both boundary instants count as inside: a row at exactly `start` or exactly `end` is not
    /// flagged.
    pub fn is_outside(&self, ts: NaiveDateTime) -> bool {
        ts < self.start || ts > self.end
    }
}

impl fmt::Display for WaterYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WY{}", self.year)
    }
}

fn october_first(year: i32) -> Option<NaiveDateTime> {
    Some(NaiveDate::from_ymd_opt(year, 10, 1)?.and_time(NaiveTime::MIN))
}

/// Result of [`time_zero_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZeroReport {
    /// Rows whose timestamp is not on the hour.
    pub misaligned_count: usize,
    /// First such timestamp, in table order.
    pub first_example: Option<NaiveDateTime>,
}

impl TimeZeroReport {
    pub fn is_aligned(&self) -> bool {
        self.misaligned_count == 0
    }
}

impl fmt::Display for TimeZeroReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_example {
            None => write!(f, "all timestamps on the hour"),
            Some(first) => write!(
                f,
                "{} timestamp(s) not on the hour (first: {first})",
                self.misaligned_count
            ),
        }
    }
}

/// Count rows whose timestamp is not on the hour.
///
/// A timestamp is aligned when its display form (`YYYY-MM-DD HH:MM:SS[.fff]`) ends in `00:00`, so
/// any sub-second component makes it misaligned.
///
/// ```rust
/// use archival_zone::diagnostics::time_zero_check;
/// use archival_zone::ingestion::csv::parse_delimited;
/// use archival_zone::ingestion::DelimitedOptions;
///
/// let csv = "ts,v\n2020-01-01 00:00:00,1\n2020-01-01 00:15:00,2\n2020-01-01 01:00:00,3\n";
/// let table = parse_delimited(csv.as_bytes(), &DelimitedOptions::default()).unwrap();
/// let report = time_zero_check(&table);
/// assert_eq!(report.misaligned_count, 1);
/// assert_eq!(report.first_example.unwrap().to_string(), "2020-01-01 00:15:00");
/// ```
pub fn time_zero_check(table: &Table) -> TimeZeroReport {
    let mut report = TimeZeroReport {
        misaligned_count: 0,
        first_example: None,
    };
    for &ts in table.timestamps() {
        if !ts.to_string().ends_with("00:00") {
            report.misaligned_count += 1;
            report.first_example.get_or_insert(ts);
        }
    }
    report
}

/// Result of [`water_year_check`].
#[derive(Debug, Clone, PartialEq)]
pub struct WaterYearReport {
    pub water_year: WaterYear,
    pub outside_count: usize,
    /// The rows outside the water year, as a new table in source order.
    pub outside: Table,
}

impl fmt::Display for WaterYearReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} row(s) outside {} ({} .. {})",
            self.outside_count,
            self.water_year,
            self.water_year.start(),
            self.water_year.end()
        )
    }
}

/// Collect the rows whose timestamp falls outside `water_year`.
pub fn water_year_check(table: &Table, water_year: WaterYear) -> WaterYearReport {
    let outside = table.filter_rows(|row| water_year.is_outside(row.timestamp));
    WaterYearReport {
        water_year,
        outside_count: outside.row_count(),
        outside,
    }
}

/// Both checks for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticReport {
    pub time_zero: TimeZeroReport,
    /// Present when a water year was requested.
    pub water_year: Option<WaterYearReport>,
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "time zero: {}", self.time_zero)?;
        if let Some(wy) = &self.water_year {
            write!(f, "; water year: {wy}")?;
        }
        Ok(())
    }
}

/// Run [`time_zero_check`], and [`water_year_check`] when `water_year` is given.
pub fn run_diagnostics(table: &Table, water_year: Option<WaterYear>) -> DiagnosticReport {
    DiagnosticReport {
        time_zero: time_zero_check(table),
        water_year: water_year.map(|wy| water_year_check(table, wy)),
    }
}
