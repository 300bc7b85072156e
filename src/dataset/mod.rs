//! Height measurement table: loading, weekday derivation, summaries.
//!
//! The input is a fixed-schema CSV (`date,time_hours,height_cm`). Rows are
//! immutable once loaded and keep file order, though the model treats the
//! observations as exchangeable.

use crate::error::{EstaturaError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;
use std::path::Path;

/// The exact header the loader accepts.
pub const EXPECTED_HEADER: [&str; 3] = ["date", "time_hours", "height_cm"];

/// Fixed weekday order used for the categorical axis, Monday first.
pub const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Canonical label for a weekday.
#[must_use]
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Position of a weekday in [`WEEKDAY_ORDER`] (Monday = 0).
#[must_use]
pub fn weekday_index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

/// One height measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Calendar date of the measurement.
    pub date: NaiveDate,
    /// Hour of day in [0, 24); 0 means "no reliable time recorded".
    pub time_hours: f64,
    /// Measured height in centimeters.
    pub height_cm: f64,
}

impl Observation {
    /// Day of week derived from the date.
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// Whether a usable measurement time was recorded.
    #[must_use]
    pub fn has_reliable_time(&self) -> bool {
        self.time_hours != 0.0
    }
}

/// The loaded measurement table.
#[derive(Debug, Clone)]
pub struct HeightDataset {
    observations: Vec<Observation>,
}

impl HeightDataset {
    /// Load the table from a `date,time_hours,height_cm` CSV file.
    ///
    /// The header must match the expected schema exactly; every row must
    /// carry an ISO-8601 date, an hour value in [0, 24) and a finite
    /// height. Failures are typed with the offending line and column.
    ///
    /// # Errors
    ///
    /// [`EstaturaError::Io`] if the file is missing or unreadable,
    /// [`EstaturaError::SchemaMismatch`] on a wrong header,
    /// [`EstaturaError::CsvParse`] on a malformed row.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut reader = csv::Reader::from_path(path).map_err(|e| match e.into_kind() {
            csv::ErrorKind::Io(source) => EstaturaError::io(path, source),
            other => EstaturaError::Other(format!("failed to open CSV: {other:?}")),
        })?;

        let headers = reader
            .headers()
            .map_err(|e| EstaturaError::CsvParse {
                line: 1,
                column: "header".to_string(),
                message: e.to_string(),
            })?
            .clone();

        let found: Vec<&str> = headers.iter().collect();
        if found != EXPECTED_HEADER {
            return Err(EstaturaError::SchemaMismatch {
                expected: EXPECTED_HEADER.join(","),
                found: found.join(","),
            });
        }

        let mut observations = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let line = idx + 2; // 1-based, after the header
            let record = result.map_err(|e| EstaturaError::CsvParse {
                line,
                column: "row".to_string(),
                message: e.to_string(),
            })?;

            observations.push(parse_record(&record, line)?);
        }

        if observations.is_empty() {
            return Err(EstaturaError::empty_input("no data rows in CSV"));
        }

        Ok(Self { observations })
    }

    /// Build a dataset from already-parsed observations.
    ///
    /// # Errors
    ///
    /// Returns an error if `observations` is empty.
    pub fn from_observations(observations: Vec<Observation>) -> Result<Self> {
        if observations.is_empty() {
            return Err(EstaturaError::empty_input("observations"));
        }
        Ok(Self { observations })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// All rows in file order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Height column.
    #[must_use]
    pub fn heights(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.height_cm).collect()
    }

    /// Derived weekday column, one label per row.
    #[must_use]
    pub fn weekdays(&self) -> Vec<Weekday> {
        self.observations.iter().map(Observation::weekday).collect()
    }

    /// View excluding rows without a reliable measurement time
    /// (`time_hours == 0`).
    #[must_use]
    pub fn timed(&self) -> Vec<&Observation> {
        self.observations
            .iter()
            .filter(|o| o.has_reliable_time())
            .collect()
    }

    /// Descriptive summary of the height column.
    #[must_use]
    pub fn describe(&self) -> HeightSummary {
        let heights = self.heights();
        let n = heights.len();
        let mean = heights.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            heights.iter().map(|h| (h - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        let mut sorted = heights;
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        HeightSummary {
            n,
            mean,
            sd: variance.sqrt(),
            min: sorted[0],
            median,
            max: sorted[n - 1],
        }
    }
}

fn parse_record(record: &csv::StringRecord, line: usize) -> Result<Observation> {
    let field = |idx: usize, column: &str| -> Result<&str> {
        record.get(idx).ok_or_else(|| EstaturaError::CsvParse {
            line,
            column: column.to_string(),
            message: "missing field".to_string(),
        })
    };

    let date_str = field(0, "date")?;
    let date =
        NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
            EstaturaError::CsvParse {
                line,
                column: "date".to_string(),
                message: format!("'{date_str}' is not an ISO-8601 date: {e}"),
            }
        })?;

    let time_str = field(1, "time_hours")?;
    let time_hours: f64 = time_str.trim().parse().map_err(|_| EstaturaError::CsvParse {
        line,
        column: "time_hours".to_string(),
        message: format!("'{time_str}' is not a number"),
    })?;
    if !(0.0..24.0).contains(&time_hours) {
        return Err(EstaturaError::CsvParse {
            line,
            column: "time_hours".to_string(),
            message: format!("hour {time_hours} outside [0, 24)"),
        });
    }

    let height_str = field(2, "height_cm")?;
    let height_cm: f64 = height_str
        .trim()
        .parse()
        .map_err(|_| EstaturaError::CsvParse {
            line,
            column: "height_cm".to_string(),
            message: format!("'{height_str}' is not a number"),
        })?;
    if !height_cm.is_finite() {
        return Err(EstaturaError::CsvParse {
            line,
            column: "height_cm".to_string(),
            message: "height must be finite".to_string(),
        });
    }

    Ok(Observation {
        date,
        time_hours,
        height_cm,
    })
}

/// Descriptive statistics for the height column.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightSummary {
    /// Number of observations.
    pub n: usize,
    /// Mean height (cm).
    pub mean: f64,
    /// Sample standard deviation (cm).
    pub sd: f64,
    /// Minimum (cm).
    pub min: f64,
    /// Median (cm).
    pub median: f64,
    /// Maximum (cm).
    pub max: f64,
}

impl fmt::Display for HeightSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Height measurements:")?;
        writeln!(f, "  Observations: {}", self.n)?;
        writeln!(f, "  Mean:         {:.2} cm", self.mean)?;
        writeln!(f, "  Std Dev:      {:.2} cm", self.sd)?;
        writeln!(f, "  Min:          {:.1} cm", self.min)?;
        writeln!(f, "  Median:       {:.2} cm", self.median)?;
        write!(f, "  Max:          {:.1} cm", self.max)
    }
}

#[cfg(test)]
#[path = "dataset_tests.rs"]
mod tests;
