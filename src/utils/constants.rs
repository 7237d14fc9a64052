/// Input columns every measurement table must provide
pub const COLUMN_SITE_CODE: &str = "site_code";
pub const COLUMN_DATE_TIME: &str = "date_time";
pub const COLUMN_MEASURAND: &str = "measurand";
pub const COLUMN_VALUE: &str = "value";
pub const COLUMN_UNITS: &str = "units";
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COLUMN_SITE_CODE,
    COLUMN_DATE_TIME,
    COLUMN_MEASURAND,
    COLUMN_VALUE,
    COLUMN_UNITS,
];

/// Molar volume of an ideal gas in L/mol at 1 atm
pub const MOLAR_VOLUME_25C: f64 = 24.45;
pub const MOLAR_VOLUME_20C: f64 = 24.04;

/// Minimum share of expected hourly samples before an average is reported
pub const DEFAULT_MIN_COVERAGE: f64 = 0.75;

/// EPA NowCast
pub const NOWCAST_HOURS: usize = 12;
pub const NOWCAST_PARTICULATE_MIN_WEIGHT: f64 = 0.5;
pub const NOWCAST_RECENT_HOURS: usize = 3;
pub const NOWCAST_MIN_RECENT_VALID: usize = 2;

/// Processing defaults
pub const DEFAULT_STANDARD: &str = "UK_DAQI";
pub const DEFAULT_TARGET: &str = "AQG";
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const ENV_PREFIX: &str = "AQI";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
