use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AqiError, Result};
use crate::models::{Pollutant, Unit};

/// One input row as handed over by an upstream collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Measurement {
    #[validate(length(min = 1))]
    pub site_code: String,
    pub date_time: DateTime<Utc>,
    pub measurand: String,
    pub value: f64,
    pub units: String,
}

impl Measurement {
    pub fn new(
        site_code: impl Into<String>,
        date_time: DateTime<Utc>,
        measurand: impl Into<String>,
        value: f64,
        units: impl Into<String>,
    ) -> Self {
        Self {
            site_code: site_code.into(),
            date_time,
            measurand: measurand.into(),
            value,
            units: units.into(),
        }
    }

    pub fn pollutant(&self) -> Option<Pollutant> {
        Pollutant::parse(&self.measurand)
    }

    pub fn unit(&self) -> Option<Unit> {
        Unit::parse(&self.units)
    }

    /// NaN and infinite values are kept as rows but never enter an average
    pub fn has_valid_value(&self) -> bool {
        self.value.is_finite()
    }
}

/// Check the shape of an input table before any computation starts
pub fn validate_measurements(measurements: &[Measurement]) -> Result<()> {
    for (row, measurement) in measurements.iter().enumerate() {
        if measurement.validate().is_err() {
            return Err(AqiError::Data(format!(
                "Row {} has an empty site_code",
                row + 1
            )));
        }
        if measurement.measurand.trim().is_empty() {
            return Err(AqiError::Data(format!(
                "Row {} has an empty measurand",
                row + 1
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(site: &str, value: f64) -> Measurement {
        Measurement::new(
            site,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            "no2",
            value,
            "ug/m3",
        )
    }

    #[test]
    fn test_measurement_resolution() {
        let m = sample("MY1", 41.0);
        assert_eq!(m.pollutant(), Some(Pollutant::No2));
        assert_eq!(m.unit(), Some(Unit::MicrogramsPerCubicMetre));
        assert!(m.has_valid_value());
        assert!(!sample("MY1", f64::NAN).has_valid_value());
    }

    #[test]
    fn test_validate_measurements() {
        assert!(validate_measurements(&[sample("MY1", 1.0)]).is_ok());

        let err = validate_measurements(&[sample("MY1", 1.0), sample("", 2.0)]).unwrap_err();
        assert!(err.is_data());
        assert!(err.to_string().contains("Row 2"));
    }
}
