use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::error::{AqiError, Result};
use crate::models::{ComplianceResult, LongRecord, TimeseriesRow};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(AqiError::Configuration(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Long summary layout, one row per site, period and pollutant
    pub fn write_long(&self, records: &[LongRecord], path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("site_code", DataType::Utf8, false),
            timestamp_field("period_start"),
            timestamp_field("period_end"),
            Field::new("pollutant", DataType::Utf8, false),
            Field::new("mean_value", DataType::Float64, true),
            Field::new("coverage_fraction", DataType::Float64, true),
            Field::new("index_value", DataType::UInt16, true),
            Field::new("category", DataType::Utf8, true),
            Field::new("standard_name", DataType::Utf8, false),
            Field::new("dominant_pollutant", DataType::Utf8, true),
            Field::new("unit", DataType::Utf8, true),
            Field::new("min", DataType::Float64, true),
            Field::new("p25", DataType::Float64, true),
            Field::new("median", DataType::Float64, true),
            Field::new("p75", DataType::Float64, true),
            Field::new("max", DataType::Float64, true),
            Field::new("status", DataType::Utf8, false),
            Field::new("reason", DataType::Utf8, true),
        ]));

        self.write_chunks(records, schema, path, |chunk| {
            vec![
                strings(chunk.iter().map(|r| Some(r.site_code.clone()))),
                timestamps(chunk.iter().map(|r| r.period_start)),
                timestamps(chunk.iter().map(|r| r.period_end)),
                strings(chunk.iter().map(|r| Some(r.pollutant.clone()))),
                floats(chunk.iter().map(|r| r.mean_value)),
                floats(chunk.iter().map(|r| r.coverage_fraction)),
                indices(chunk.iter().map(|r| r.index_value)),
                strings(chunk.iter().map(|r| r.category.clone())),
                strings(chunk.iter().map(|r| Some(r.standard_name.clone()))),
                strings(chunk.iter().map(|r| r.dominant_pollutant.clone())),
                strings(chunk.iter().map(|r| r.unit.clone())),
                floats(chunk.iter().map(|r| r.min)),
                floats(chunk.iter().map(|r| r.p25)),
                floats(chunk.iter().map(|r| r.median)),
                floats(chunk.iter().map(|r| r.p75)),
                floats(chunk.iter().map(|r| r.max)),
                strings(chunk.iter().map(|r| Some(r.status.to_string()))),
                strings(chunk.iter().map(|r| r.reason.clone())),
            ]
        })
    }

    pub fn write_timeseries(&self, rows: &[TimeseriesRow], path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("site_code", DataType::Utf8, false),
            timestamp_field("date_time"),
            Field::new("pollutant", DataType::Utf8, false),
            Field::new("window", DataType::Utf8, false),
            Field::new("hourly_value", DataType::Float64, true),
            Field::new("window_mean", DataType::Float64, true),
            Field::new("unit", DataType::Utf8, false),
            Field::new("coverage_fraction", DataType::Float64, false),
            Field::new("index_value", DataType::UInt16, true),
            Field::new("category", DataType::Utf8, true),
            Field::new("standard_name", DataType::Utf8, false),
            Field::new("status", DataType::Utf8, false),
            Field::new("reason", DataType::Utf8, true),
        ]));

        self.write_chunks(rows, schema, path, |chunk| {
            vec![
                strings(chunk.iter().map(|r| Some(r.site_code.clone()))),
                timestamps(chunk.iter().map(|r| r.date_time)),
                strings(chunk.iter().map(|r| Some(r.pollutant.to_string()))),
                strings(chunk.iter().map(|r| Some(r.window.clone()))),
                floats(chunk.iter().map(|r| r.hourly_value)),
                floats(chunk.iter().map(|r| r.window_mean)),
                strings(chunk.iter().map(|r| Some(r.unit.to_string()))),
                floats(chunk.iter().map(|r| Some(r.coverage_fraction))),
                indices(chunk.iter().map(|r| r.index_value)),
                strings(chunk.iter().map(|r| r.category.clone())),
                strings(chunk.iter().map(|r| Some(r.standard_name.clone()))),
                strings(chunk.iter().map(|r| Some(r.status.to_string()))),
                strings(chunk.iter().map(|r| r.reason.clone())),
            ]
        })
    }

    pub fn write_compliance(&self, results: &[ComplianceResult], path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("site_code", DataType::Utf8, false),
            Field::new("pollutant", DataType::Utf8, false),
            Field::new("target_name", DataType::Utf8, false),
            Field::new("averaging", DataType::Utf8, false),
            timestamp_field("period_start"),
            timestamp_field("period_end"),
            Field::new("guideline_value", DataType::Float64, false),
            Field::new("unit", DataType::Utf8, false),
            Field::new("mean_concentration", DataType::Float64, true),
            Field::new("coverage_fraction", DataType::Float64, false),
            Field::new("meets_guideline", DataType::Boolean, true),
            Field::new("exceedance_ratio", DataType::Float64, true),
            Field::new("highest_target_met", DataType::Utf8, true),
            Field::new("status", DataType::Utf8, false),
            Field::new("reason", DataType::Utf8, true),
            Field::new("message", DataType::Utf8, false),
        ]));

        self.write_chunks(results, schema, path, |chunk| {
            vec![
                strings(chunk.iter().map(|r| Some(r.site_code.clone()))),
                strings(chunk.iter().map(|r| Some(r.pollutant.to_string()))),
                strings(chunk.iter().map(|r| Some(r.target_name.to_string()))),
                strings(chunk.iter().map(|r| Some(r.averaging.to_string()))),
                timestamps(chunk.iter().map(|r| r.period_start)),
                timestamps(chunk.iter().map(|r| r.period_end)),
                floats(chunk.iter().map(|r| Some(r.guideline_value))),
                strings(chunk.iter().map(|r| Some(r.unit.to_string()))),
                floats(chunk.iter().map(|r| r.mean_concentration)),
                floats(chunk.iter().map(|r| Some(r.coverage_fraction))),
                Arc::new(BooleanArray::from(
                    chunk.iter().map(|r| r.meets_guideline).collect::<Vec<_>>(),
                )),
                floats(chunk.iter().map(|r| r.exceedance_ratio)),
                strings(chunk.iter().map(|r| r.highest_target_met.map(|t| t.to_string()))),
                strings(chunk.iter().map(|r| Some(r.status.to_string()))),
                strings(chunk.iter().map(|r| r.reason.clone())),
                strings(chunk.iter().map(|r| Some(r.message.clone()))),
            ]
        })
    }

    /// Write rows in row-group sized record batches
    fn write_chunks<T, F>(
        &self,
        rows: &[T],
        schema: Arc<Schema>,
        path: &Path,
        columns: F,
    ) -> Result<()>
    where
        F: Fn(&[T]) -> Vec<ArrayRef>,
    {
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        for chunk in rows.chunks(self.row_group_size.max(1)) {
            let batch = RecordBatch::try_new(schema.clone(), columns(chunk))?;
            writer.write(&batch)?;
        }
        writer.close()?;
        Ok(())
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_group_sizes: Vec<i64> = (0..metadata.num_row_groups())
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups: row_group_sizes.len() as i32,
            row_group_sizes,
            file_size: std::fs::metadata(path)?.len(),
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn timestamp_field(name: &str) -> Field {
    Field::new(
        name,
        DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
        false,
    )
}

fn timestamps(values: impl Iterator<Item = DateTime<Utc>>) -> ArrayRef {
    let millis: Vec<i64> = values.map(|t| t.timestamp_millis()).collect();
    Arc::new(TimestampMillisecondArray::from(millis).with_timezone("UTC"))
}

fn strings(values: impl Iterator<Item = Option<String>>) -> ArrayRef {
    Arc::new(StringArray::from(values.collect::<Vec<_>>()))
}

fn floats(values: impl Iterator<Item = Option<f64>>) -> ArrayRef {
    Arc::new(Float64Array::from(values.collect::<Vec<_>>()))
}

fn indices(values: impl Iterator<Item = Option<u16>>) -> ArrayRef {
    Arc::new(UInt16Array::from(values.collect::<Vec<_>>()))
}

pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet file: {} rows in {} row group(s), {:.2} MB, {:?} compression",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression
        )
    }
}
