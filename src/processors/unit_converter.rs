use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{AqiError, Result};
use crate::models::{Measurement, Pollutant, Unit};
use crate::utils::constants::MOLAR_VOLUME_25C;

/// Timestamped values for one site and pollutant, in the requested unit
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedRows {
    /// Missing values are NaN
    pub samples: Vec<(DateTime<Utc>, f64)>,
    /// Set when any row failed; every sample is then NaN so periods stay visible
    pub failure: Option<String>,
}

/// Converts concentrations between volumetric and mass units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    molar_volume: f64,
}

impl UnitConverter {
    pub fn new() -> Self {
        Self {
            molar_volume: MOLAR_VOLUME_25C,
        }
    }

    pub fn with_molar_volume(molar_volume: f64) -> Self {
        Self { molar_volume }
    }

    pub fn molar_volume(&self) -> f64 {
        self.molar_volume
    }

    pub fn convert(&self, value: f64, pollutant: Pollutant, from: Unit, to: Unit) -> Result<f64> {
        if from == to {
            return Ok(value);
        }

        // Same family needs no molecular weight
        if from.is_volumetric() == to.is_volumetric() {
            return Ok(to_base(value, from) / base_factor(to));
        }

        let molecular_weight =
            pollutant
                .molecular_weight()
                .ok_or_else(|| AqiError::Conversion {
                    pollutant: pollutant.to_string(),
                    from: from.to_string(),
                    to: to.to_string(),
                    reason: "no molecular weight is registered for this pollutant".to_string(),
                })?;

        let converted = if from.is_volumetric() {
            let ppb = to_base(value, from);
            let ugm3 = ppb * molecular_weight / self.molar_volume;
            ugm3 / base_factor(to)
        } else {
            let ugm3 = to_base(value, from);
            let ppb = ugm3 * self.molar_volume / molecular_weight;
            ppb / base_factor(to)
        };
        Ok(converted)
    }

    /// Convert from a raw unit label as found in input data
    pub fn convert_label(&self, value: f64, pollutant: Pollutant, from: &str, to: Unit) -> Result<f64> {
        let from_unit = Unit::parse(from).ok_or_else(|| AqiError::Conversion {
            pollutant: pollutant.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            reason: "unrecognised unit".to_string(),
        })?;
        self.convert(value, pollutant, from_unit, to)
    }

    /// Convert one site's rows for `pollutant` into `to`
    pub fn convert_rows(&self, pollutant: Pollutant, rows: &[&Measurement], to: Unit) -> ConvertedRows {
        let mut samples = Vec::with_capacity(rows.len());
        for row in rows {
            if !row.has_valid_value() {
                samples.push((row.date_time, f64::NAN));
                continue;
            }
            match self.convert_label(row.value, pollutant, &row.units, to) {
                Ok(value) => samples.push((row.date_time, value)),
                Err(e) => {
                    warn!(site = %row.site_code, pollutant = %pollutant, error = %e, "Unit conversion failed");
                    return ConvertedRows {
                        samples: rows.iter().map(|r| (r.date_time, f64::NAN)).collect(),
                        failure: Some(e.to_string()),
                    };
                }
            }
        }
        ConvertedRows {
            samples,
            failure: None,
        }
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::new()
    }
}

// ppb is the volumetric base, µg/m³ the mass base
fn base_factor(unit: Unit) -> f64 {
    match unit {
        Unit::PartsPerBillion | Unit::MicrogramsPerCubicMetre => 1.0,
        Unit::PartsPerMillion | Unit::MilligramsPerCubicMetre => 1000.0,
    }
}

fn to_base(value: f64, unit: Unit) -> f64 {
    value * base_factor(unit)
}
