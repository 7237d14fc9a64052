use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AqiError, Result};

/// Pollutants known to at least one registered standard.
///
/// Declaration order is the priority order used to break ties when two
/// pollutants produce the same index value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
    #[serde(rename = "O3")]
    O3,
    #[serde(rename = "NO2")]
    No2,
    #[serde(rename = "SO2")]
    So2,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "NH3")]
    Nh3,
    #[serde(rename = "Pb")]
    Pb,
}

impl Pollutant {
    pub const ALL: [Pollutant; 8] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::O3,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::Co,
        Pollutant::Nh3,
        Pollutant::Pb,
    ];

    /// Resolve a measurand name, accepting the common aliases used by monitoring networks
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase();
        match normalized.as_str() {
            "pm2.5" | "pm25" | "pm 2.5" | "pm2_5" | "fine particulate" => Some(Pollutant::Pm25),
            "pm10" | "pm 10" => Some(Pollutant::Pm10),
            "o3" | "ozone" => Some(Pollutant::O3),
            "no2" | "nitrogen dioxide" => Some(Pollutant::No2),
            "so2" | "sulphur dioxide" | "sulfur dioxide" => Some(Pollutant::So2),
            "co" | "carbon monoxide" => Some(Pollutant::Co),
            "nh3" | "ammonia" => Some(Pollutant::Nh3),
            "pb" | "lead" => Some(Pollutant::Pb),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::O3 => "O3",
            Pollutant::No2 => "NO2",
            Pollutant::So2 => "SO2",
            Pollutant::Co => "CO",
            Pollutant::Nh3 => "NH3",
            Pollutant::Pb => "Pb",
        }
    }

    /// Column prefix used by the wide output layout
    pub fn column_prefix(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::O3 => "o3",
            Pollutant::No2 => "no2",
            Pollutant::So2 => "so2",
            Pollutant::Co => "co",
            Pollutant::Nh3 => "nh3",
            Pollutant::Pb => "pb",
        }
    }

    /// Molecular weight in g/mol; particulates and lead have none
    pub fn molecular_weight(&self) -> Option<f64> {
        match self {
            Pollutant::No2 => Some(46.01),
            Pollutant::O3 => Some(48.00),
            Pollutant::So2 => Some(64.07),
            Pollutant::Co => Some(28.01),
            Pollutant::Nh3 => Some(17.03),
            Pollutant::Pm25 | Pollutant::Pm10 | Pollutant::Pb => None,
        }
    }

    pub fn is_particulate(&self) -> bool {
        matches!(self, Pollutant::Pm25 | Pollutant::Pm10)
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pollutant {
    type Err = AqiError;

    fn from_str(s: &str) -> Result<Self> {
        Pollutant::parse(s)
            .ok_or_else(|| AqiError::Configuration(format!("Unknown pollutant '{}'", s)))
    }
}

/// Concentration units accepted on input and used by breakpoint tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "µg/m³")]
    MicrogramsPerCubicMetre,
    #[serde(rename = "mg/m³")]
    MilligramsPerCubicMetre,
    #[serde(rename = "ppb")]
    PartsPerBillion,
    #[serde(rename = "ppm")]
    PartsPerMillion,
}

impl Unit {
    pub fn parse(unit: &str) -> Option<Self> {
        let normalized = unit.trim().to_lowercase();
        match normalized.as_str() {
            "ug/m3" | "ug/m³" | "µg/m³" | "µg/m3" | "μg/m³" | "μg/m3" | "ugm3" | "ug m-3" => {
                Some(Unit::MicrogramsPerCubicMetre)
            }
            "mg/m3" | "mg/m³" | "mgm3" | "mg m-3" => Some(Unit::MilligramsPerCubicMetre),
            "ppb" | "parts per billion" => Some(Unit::PartsPerBillion),
            "ppm" | "parts per million" => Some(Unit::PartsPerMillion),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::MicrogramsPerCubicMetre => "µg/m³",
            Unit::MilligramsPerCubicMetre => "mg/m³",
            Unit::PartsPerBillion => "ppb",
            Unit::PartsPerMillion => "ppm",
        }
    }

    pub fn is_volumetric(&self) -> bool {
        matches!(self, Unit::PartsPerBillion | Unit::PartsPerMillion)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pollutant_aliases() {
        assert_eq!(Pollutant::parse("pm25"), Some(Pollutant::Pm25));
        assert_eq!(Pollutant::parse("PM 2.5"), Some(Pollutant::Pm25));
        assert_eq!(Pollutant::parse("Fine Particulate"), Some(Pollutant::Pm25));
        assert_eq!(Pollutant::parse("Ozone"), Some(Pollutant::O3));
        assert_eq!(Pollutant::parse("sulfur dioxide"), Some(Pollutant::So2));
        assert_eq!(Pollutant::parse("Sulphur Dioxide"), Some(Pollutant::So2));
        assert_eq!(Pollutant::parse(" no2 "), Some(Pollutant::No2));
        assert_eq!(Pollutant::parse("benzene"), None);
    }

    #[test]
    fn test_priority_order() {
        assert!(Pollutant::Pm25 < Pollutant::Pm10);
        assert!(Pollutant::Pm10 < Pollutant::O3);
        assert!(Pollutant::O3 < Pollutant::No2);
        assert!(Pollutant::No2 < Pollutant::So2);
    }

    #[test]
    fn test_molecular_weights() {
        assert_eq!(Pollutant::No2.molecular_weight(), Some(46.01));
        assert_eq!(Pollutant::So2.molecular_weight(), Some(64.07));
        assert_eq!(Pollutant::Pm25.molecular_weight(), None);
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!(Unit::parse("ug/m3"), Some(Unit::MicrogramsPerCubicMetre));
        assert_eq!(Unit::parse("µg/m³"), Some(Unit::MicrogramsPerCubicMetre));
        assert_eq!(Unit::parse("PPB"), Some(Unit::PartsPerBillion));
        assert_eq!(Unit::parse("mg/m3"), Some(Unit::MilligramsPerCubicMetre));
        assert_eq!(Unit::parse("furlongs"), None);
        assert!(Unit::PartsPerMillion.is_volumetric());
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert!("PM10".parse::<Pollutant>().is_ok());
        let err = "XYZ".parse::<Pollutant>().unwrap_err();
        assert!(err.is_configuration());
    }
}
