use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{AqiError, Result};
use crate::models::Measurement;
use crate::utils::constants::{
    COLUMN_DATE_TIME, COLUMN_MEASURAND, COLUMN_SITE_CODE, COLUMN_UNITS, COLUMN_VALUE,
    REQUIRED_COLUMNS,
};

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    site_code: usize,
    date_time: usize,
    measurand: usize,
    value: usize,
    units: usize,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| AqiError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            site_code: position(COLUMN_SITE_CODE)?,
            date_time: position(COLUMN_DATE_TIME)?,
            measurand: position(COLUMN_MEASURAND)?,
            value: position(COLUMN_VALUE)?,
            units: position(COLUMN_UNITS)?,
        })
    }
}

/// Reads long-format measurement tables from CSV
#[derive(Debug, Clone, Copy)]
pub struct MeasurementReader {
    delimiter: u8,
}

impl MeasurementReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn read_file(&self, path: &Path) -> Result<Vec<Measurement>> {
        let file = File::open(path)?;
        let measurements = self.read_from(file)?;
        info!(path = %path.display(), rows = measurements.len(), "Read measurements");
        Ok(measurements)
    }

    pub fn read_from<R: Read>(&self, source: R) -> Result<Vec<Measurement>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        let columns = Columns::from_headers(reader.headers()?)?;
        let mut measurements = Vec::new();
        let mut unreadable_values = 0usize;

        for (index, record) in reader.records().enumerate() {
            let record = record?;
            // Header is line 1
            let row = index + 2;

            let field = |i: usize| record.get(i).unwrap_or("");
            let date_time = parse_timestamp(field(columns.date_time), row)?;

            let raw_value = field(columns.value);
            let value = raw_value.parse::<f64>().unwrap_or_else(|_| {
                unreadable_values += 1;
                f64::NAN
            });

            measurements.push(Measurement::new(
                field(columns.site_code),
                date_time,
                field(columns.measurand),
                value,
                field(columns.units),
            ));
        }

        if unreadable_values > 0 {
            debug!(rows = unreadable_values, "Non-numeric values read as missing");
        }
        Ok(measurements)
    }

    /// Read several files concurrently on blocking tasks, keeping the input order
    pub async fn read_many(&self, paths: &[PathBuf]) -> Result<Vec<Measurement>> {
        let handles: Vec<_> = paths
            .iter()
            .cloned()
            .map(|path| {
                let reader = *self;
                tokio::task::spawn_blocking(move || reader.read_file(&path))
            })
            .collect();

        let mut measurements = Vec::new();
        for handle in handles {
            measurements.extend(handle.await??);
        }
        Ok(measurements)
    }

    pub fn required_columns() -> &'static [&'static str] {
        &REQUIRED_COLUMNS
    }
}

impl Default for MeasurementReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamps must carry an explicit offset; they are normalised to UTC
pub fn parse_timestamp(raw: &str, row: usize) -> Result<DateTime<Utc>> {
    let invalid = |message: &str| AqiError::InvalidTimestamp {
        value: raw.to_string(),
        row,
        message: message.to_string(),
    };

    if raw.is_empty() {
        return Err(invalid("empty timestamp"));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }
    if NAIVE_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(raw, format).is_ok())
    {
        return Err(invalid("timestamp has no UTC offset"));
    }
    Err(invalid("unrecognised timestamp format"))
}
