pub mod aggregate;
pub mod measurement;
pub mod pollutant;
pub mod results;

pub use aggregate::{AggregatedValue, Frequency, Period, SampleStats, Window};
pub use measurement::{validate_measurements, Measurement};
pub use pollutant::{Pollutant, Unit};
pub use results::{
    AqiResult, CellStatus, ComplianceResult, LongRecord, OverallAqiResult, SummaryTable,
    TimeseriesRow, WideCell, WideRecord, OVERALL_LABEL,
};
