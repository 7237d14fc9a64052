pub mod compliance_checker;
pub mod index_orchestrator;
pub mod interpolator;
pub mod nowcast;
pub mod parallel_processor;
pub mod temporal_aggregator;
pub mod unit_converter;

pub use compliance_checker::ComplianceChecker;
pub use index_orchestrator::IndexOrchestrator;
pub use interpolator::{BreakpointInterpolator, IndexReading};
pub use nowcast::{nowcast, NowCastCalculator};
pub use parallel_processor::ParallelProcessor;
pub use temporal_aggregator::{HourlySeries, TemporalAggregator};
pub use unit_converter::{ConvertedRows, UnitConverter};
