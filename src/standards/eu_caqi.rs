//! Common Air Quality Index (CITEAIR), hourly grid, roadside and background variants.

use crate::error::Result;
use crate::models::{Pollutant, Unit, Window};
use crate::standards::{
    BreakpointTable, RoundingRule, ScaleKind, StandardBuilder, StandardDefinition,
};

pub const ROADSIDE_KEY: &str = "EU_CAQI_ROADSIDE";
pub const BACKGROUND_KEY: &str = "EU_CAQI_BACKGROUND";

const NO2: [(f64, f64); 6] = [
    (0.0, 40.0),
    (40.1, 90.0),
    (90.1, 120.0),
    (120.1, 230.0),
    (230.1, 340.0),
    (340.1, 1000.0),
];

const O3: [(f64, f64); 6] = [
    (0.0, 50.0),
    (50.1, 100.0),
    (100.1, 130.0),
    (130.1, 240.0),
    (240.1, 380.0),
    (380.1, 800.0),
];

const PM10: [(f64, f64); 6] = [
    (0.0, 20.0),
    (20.1, 40.0),
    (40.1, 50.0),
    (50.1, 100.0),
    (100.1, 150.0),
    (150.1, 1200.0),
];

const PM25: [(f64, f64); 6] = [
    (0.0, 10.0),
    (10.1, 20.0),
    (20.1, 25.0),
    (25.1, 50.0),
    (50.1, 75.0),
    (75.1, 800.0),
];

const SO2: [(f64, f64); 6] = [
    (0.0, 100.0),
    (100.1, 200.0),
    (200.1, 350.0),
    (350.1, 500.0),
    (500.1, 750.0),
    (750.1, 1250.0),
];

fn common(key: &'static str, name: &'static str) -> StandardBuilder {
    StandardDefinition::builder(key, name)
        .region("European Union")
        .url("https://www.airqualitynow.eu/about_indices_definition.php")
        .scale(ScaleKind::Numeric { min: 1, max: 6 })
        .rounding(RoundingRule::Round)
        .band("Good", 1, 1, "#50f0e6", "The air quality is good. Enjoy your usual outdoor activities.")
        .band("Fair", 2, 2, "#50ccaa", "Enjoy your usual outdoor activities.")
        .band(
            "Moderate",
            3,
            3,
            "#f0e641",
            "Sensitive groups should consider reducing intense outdoor activities if they experience symptoms.",
        )
        .band(
            "Poor",
            4,
            4,
            "#ff5050",
            "Everyone should consider reducing intense activities outdoors if experiencing symptoms.",
        )
        .band(
            "Very Poor",
            5,
            5,
            "#960032",
            "Everyone should reduce physical activities outdoors.",
        )
        .band(
            "Extremely Poor",
            6,
            6,
            "#7d2181",
            "Everyone should avoid physical activities outdoors.",
        )
        .pollutant(
            Pollutant::No2,
            Window::OneHour,
            Unit::MicrogramsPerCubicMetre,
            BreakpointTable::banded(&NO2, 1),
        )
        .pollutant(
            Pollutant::Pm25,
            Window::OneHour,
            Unit::MicrogramsPerCubicMetre,
            BreakpointTable::banded(&PM25, 1),
        )
        .pollutant(
            Pollutant::Pm10,
            Window::OneHour,
            Unit::MicrogramsPerCubicMetre,
            BreakpointTable::banded(&PM10, 1),
        )
}

pub fn roadside() -> Result<StandardDefinition> {
    common(ROADSIDE_KEY, "Common Air Quality Index (roadside)")
        .mandatory_group(&[Pollutant::No2])
        .mandatory_group(&[Pollutant::Pm25, Pollutant::Pm10])
        .build()
}

pub fn background() -> Result<StandardDefinition> {
    common(BACKGROUND_KEY, "Common Air Quality Index (background)")
        .pollutant(
            Pollutant::O3,
            Window::OneHour,
            Unit::MicrogramsPerCubicMetre,
            BreakpointTable::banded(&O3, 1),
        )
        .pollutant(
            Pollutant::So2,
            Window::OneHour,
            Unit::MicrogramsPerCubicMetre,
            BreakpointTable::banded(&SO2, 1),
        )
        .mandatory_group(&[Pollutant::No2])
        .mandatory_group(&[Pollutant::O3])
        .mandatory_group(&[Pollutant::Pm25, Pollutant::Pm10])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants() {
        let roadside = roadside().unwrap();
        let background = background().unwrap();

        assert_eq!(roadside.pollutants.len(), 3);
        assert_eq!(background.pollutants.len(), 5);
        assert!(!roadside.supports(Pollutant::O3));
        assert_eq!(roadside.mandatory.len(), 2);
        assert_eq!(background.mandatory.len(), 3);
        assert_eq!(background.category_for(6), Some("Extremely Poor"));
    }
}
