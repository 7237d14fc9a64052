pub mod csv_writer;
pub mod json_writer;
pub mod parquet_writer;

use std::path::Path;

pub use csv_writer::CsvResultWriter;
pub use json_writer::JsonResultWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};

/// Output format chosen from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Csv,
    Json,
    Parquet,
}

impl OutputKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "csv" => Some(OutputKind::Csv),
            "json" => Some(OutputKind::Json),
            "parquet" | "pq" => Some(OutputKind::Parquet),
            _ => None,
        }
    }
}
