use thiserror::Error;

pub type Result<T> = std::result::Result<T, AqiError>;

#[derive(Error, Debug)]
pub enum AqiError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown standard '{name}'. Available standards: {available}")]
    UnknownStandard { name: String, available: String },

    #[error("Unknown target '{name}'. Available targets: AQG, IT-1, IT-2, IT-3, IT-4")]
    UnknownTarget { name: String },

    #[error("Pollutant {pollutant} is not supported by {standard}")]
    UnsupportedPollutant { pollutant: String, standard: String },

    #[error("Invalid breakpoint table for {pollutant} in {standard}: {message}")]
    InvalidTable {
        standard: String,
        pollutant: String,
        message: String,
    },

    #[error("Data error: {0}")]
    Data(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid timestamp '{value}' at row {row}: {message}")]
    InvalidTimestamp {
        value: String,
        row: usize,
        message: String,
    },

    #[error("Cannot convert {pollutant} from {from} to {to}: {reason}")]
    Conversion {
        pollutant: String,
        from: String,
        to: String,
        reason: String,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl AqiError {
    /// Fatal setup problems: unknown names, unsupported pollutants, bad tables or settings
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AqiError::Configuration(_)
                | AqiError::UnknownStandard { .. }
                | AqiError::UnknownTarget { .. }
                | AqiError::UnsupportedPollutant { .. }
                | AqiError::InvalidTable { .. }
                | AqiError::Settings(_)
                | AqiError::Validation(_)
        )
    }

    /// Input table problems that abort the whole call
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            AqiError::Data(_) | AqiError::MissingColumn(_) | AqiError::InvalidTimestamp { .. }
        )
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self, AqiError::Conversion { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = AqiError::UnknownStandard {
            name: "NOPE".to_string(),
            available: "UK_DAQI".to_string(),
        };
        assert!(err.is_configuration());
        assert!(!err.is_data());

        let err = AqiError::MissingColumn("units".to_string());
        assert!(err.is_data());
        assert_eq!(err.to_string(), "Missing required column: units");

        let err = AqiError::Conversion {
            pollutant: "PM2.5".to_string(),
            from: "ppb".to_string(),
            to: "µg/m³".to_string(),
            reason: "no molecular weight".to_string(),
        };
        assert!(err.is_conversion());
        assert!(!err.is_configuration());
    }
}
