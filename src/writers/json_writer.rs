use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Writes any result table as a pretty-printed JSON array
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResultWriter {
    compact: bool,
}

impl JsonResultWriter {
    pub fn new() -> Self {
        Self { compact: false }
    }

    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn write_rows<T: Serialize>(&self, rows: &[T], path: &Path) -> Result<()> {
        let mut sink = BufWriter::new(File::create(path)?);
        self.write_rows_to(rows, &mut sink)?;
        sink.flush()?;
        Ok(())
    }

    pub fn write_rows_to<T: Serialize, W: Write>(&self, rows: &[T], sink: W) -> Result<()> {
        if self.compact {
            serde_json::to_writer(sink, rows)?;
        } else {
            serde_json::to_writer_pretty(sink, rows)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Pollutant, WideCell, WideRecord};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    #[test]
    fn test_wide_cells_are_keyed_by_pollutant() {
        let mut cells = BTreeMap::new();
        cells.insert(
            Pollutant::O3,
            WideCell {
                mean_value: Some(61.0),
                index_value: Some(2),
                category: Some("Low".to_string()),
            },
        );
        let record = WideRecord {
            site_code: "BL0".to_string(),
            period_start: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            period_end: Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
            cells,
            overall_index_value: Some(2),
            overall_category: Some("Low".to_string()),
            dominant_pollutant: Some(Pollutant::O3),
        };

        let mut buffer = Vec::new();
        JsonResultWriter::new()
            .with_compact(true)
            .write_rows_to(&[record], &mut buffer)
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(value[0]["cells"]["O3"]["index_value"], 2);
        assert_eq!(value[0]["dominant_pollutant"], "O3");
        assert_eq!(value[0]["period_start"], "2024-05-01T00:00:00Z");
    }
}
