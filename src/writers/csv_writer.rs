use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::models::{Pollutant, WideRecord};

/// Writes result tables as CSV with a header row
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvResultWriter;

impl CsvResultWriter {
    pub fn new() -> Self {
        Self
    }

    /// Long summary, timeseries and compliance rows all serialise field by field
    pub fn write_rows<T: Serialize>(&self, rows: &[T], path: &Path) -> Result<()> {
        self.write_rows_to(rows, File::create(path)?)
    }

    pub fn write_rows_to<T: Serialize, W: Write>(&self, rows: &[T], sink: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(sink);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_wide(&self, records: &[WideRecord], pollutants: &[Pollutant], path: &Path) -> Result<()> {
        self.write_wide_to(records, pollutants, File::create(path)?)
    }

    /// `{prefix}_mean`, `{prefix}_index` and `{prefix}_category` per pollutant
    pub fn write_wide_to<W: Write>(
        &self,
        records: &[WideRecord],
        pollutants: &[Pollutant],
        sink: W,
    ) -> Result<()> {
        let mut writer = csv::Writer::from_writer(sink);

        let mut header = vec![
            "site_code".to_string(),
            "period_start".to_string(),
            "period_end".to_string(),
        ];
        for pollutant in pollutants {
            let prefix = pollutant.column_prefix();
            header.push(format!("{}_mean", prefix));
            header.push(format!("{}_index", prefix));
            header.push(format!("{}_category", prefix));
        }
        header.extend(
            ["overall_index", "overall_category", "dominant_pollutant"]
                .iter()
                .map(|s| s.to_string()),
        );
        writer.write_record(&header)?;

        for record in records {
            let mut row = vec![
                record.site_code.clone(),
                record.period_start.to_rfc3339(),
                record.period_end.to_rfc3339(),
            ];
            for pollutant in pollutants {
                match record.cells.get(pollutant) {
                    Some(cell) => {
                        row.push(optional(cell.mean_value));
                        row.push(optional(cell.index_value));
                        row.push(cell.category.clone().unwrap_or_default());
                    }
                    None => row.extend([String::new(), String::new(), String::new()]),
                }
            }
            row.push(optional(record.overall_index_value));
            row.push(record.overall_category.clone().unwrap_or_default());
            row.push(optional(record.dominant_pollutant));
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
