//! UK Daily Air Quality Index (DEFRA, COMEAP 2011 bandings).

use crate::error::Result;
use crate::models::{Pollutant, Unit, Window};
use crate::standards::{BreakpointTable, RoundingRule, ScaleKind, StandardDefinition};

pub const KEY: &str = "UK_DAQI";

const O3: [(f64, f64); 10] = [
    (0.0, 33.0),
    (34.0, 66.0),
    (67.0, 100.0),
    (101.0, 120.0),
    (121.0, 140.0),
    (141.0, 160.0),
    (161.0, 187.0),
    (188.0, 213.0),
    (214.0, 240.0),
    (241.0, f64::INFINITY),
];

const NO2: [(f64, f64); 10] = [
    (0.0, 67.0),
    (68.0, 134.0),
    (135.0, 200.0),
    (201.0, 267.0),
    (268.0, 334.0),
    (335.0, 400.0),
    (401.0, 467.0),
    (468.0, 534.0),
    (535.0, 600.0),
    (601.0, f64::INFINITY),
];

const SO2: [(f64, f64); 10] = [
    (0.0, 88.0),
    (89.0, 177.0),
    (178.0, 266.0),
    (267.0, 354.0),
    (355.0, 443.0),
    (444.0, 532.0),
    (533.0, 710.0),
    (711.0, 887.0),
    (888.0, 1064.0),
    (1065.0, f64::INFINITY),
];

const PM25: [(f64, f64); 10] = [
    (0.0, 11.0),
    (12.0, 23.0),
    (24.0, 35.0),
    (36.0, 41.0),
    (42.0, 47.0),
    (48.0, 53.0),
    (54.0, 58.0),
    (59.0, 64.0),
    (65.0, 70.0),
    (71.0, f64::INFINITY),
];

const PM10: [(f64, f64); 10] = [
    (0.0, 16.0),
    (17.0, 33.0),
    (34.0, 50.0),
    (51.0, 58.0),
    (59.0, 66.0),
    (67.0, 75.0),
    (76.0, 83.0),
    (84.0, 91.0),
    (92.0, 100.0),
    (101.0, f64::INFINITY),
];

pub fn definition() -> Result<StandardDefinition> {
    let ug = Unit::MicrogramsPerCubicMetre;

    StandardDefinition::builder(KEY, "UK Daily Air Quality Index")
        .region("United Kingdom")
        .url("https://uk-air.defra.gov.uk/air-pollution/daqi")
        .scale(ScaleKind::Numeric { min: 1, max: 10 })
        .rounding(RoundingRule::Round)
        .band(
            "Low",
            1,
            3,
            "#9cff9c",
            "Enjoy your usual outdoor activities.",
        )
        .band(
            "Moderate",
            4,
            6,
            "#ffff00",
            "Adults and children with lung or heart problems who experience symptoms should consider reducing strenuous physical activity outdoors.",
        )
        .band(
            "High",
            7,
            9,
            "#ff0000",
            "Anyone experiencing discomfort should consider reducing activity, particularly outdoors.",
        )
        .band(
            "Very High",
            10,
            10,
            "#ce30ff",
            "Reduce physical exertion, particularly outdoors, especially if you experience symptoms.",
        )
        .pollutant(Pollutant::O3, Window::EightHourRolling, ug, BreakpointTable::banded(&O3, 0))
        .pollutant(Pollutant::No2, Window::OneHour, ug, BreakpointTable::banded(&NO2, 0))
        // Published against 15-minute means; hourly input is the finest resolution available
        .pollutant(Pollutant::So2, Window::OneHour, ug, BreakpointTable::banded(&SO2, 0))
        .pollutant(
            Pollutant::Pm25,
            Window::TwentyFourHour,
            ug,
            BreakpointTable::banded(&PM25, 0),
        )
        .pollutant(
            Pollutant::Pm10,
            Window::TwentyFourHour,
            ug,
            BreakpointTable::banded(&PM10, 0),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_builds() {
        let daqi = definition().unwrap();
        assert_eq!(daqi.pollutants.len(), 5);
        assert_eq!(daqi.category_for(3), Some("Low"));
        assert_eq!(daqi.category_for(10), Some("Very High"));
        assert_eq!(daqi.rule(Pollutant::O3).unwrap().window, Window::EightHourRolling);
        assert!(daqi.rule(Pollutant::Co).is_err());
    }

    #[test]
    fn test_top_band_is_open_ended() {
        let daqi = definition().unwrap();
        let table = &daqi.rule(Pollutant::No2).unwrap().table;
        assert!(table.ceiling_concentration().is_infinite());
        assert_eq!(table.ceiling_index(), 10);
    }
}
