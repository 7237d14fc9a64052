//! India National Air Quality Index (CPCB 2014).

use crate::error::Result;
use crate::models::{Pollutant, Unit, Window};
use crate::standards::{BreakpointTable, RoundingRule, ScaleKind, StandardDefinition};

pub const KEY: &str = "INDIA_NAQI";

const SUB_INDEX: [(u16, u16); 6] = [(0, 50), (51, 100), (101, 200), (201, 300), (301, 400), (401, 500)];

const PM25: [(f64, f64); 6] = [
    (0.0, 30.0),
    (31.0, 60.0),
    (61.0, 90.0),
    (91.0, 120.0),
    (121.0, 250.0),
    (251.0, 500.0),
];

const PM10: [(f64, f64); 6] = [
    (0.0, 50.0),
    (51.0, 100.0),
    (101.0, 250.0),
    (251.0, 350.0),
    (351.0, 430.0),
    (431.0, 600.0),
];

const SO2: [(f64, f64); 6] = [
    (0.0, 40.0),
    (41.0, 80.0),
    (81.0, 380.0),
    (381.0, 800.0),
    (801.0, 1600.0),
    (1601.0, 2400.0),
];

const NO2: [(f64, f64); 6] = [
    (0.0, 40.0),
    (41.0, 80.0),
    (81.0, 180.0),
    (181.0, 280.0),
    (281.0, 400.0),
    (401.0, 600.0),
];

const CO: [(f64, f64); 6] = [
    (0.0, 1.0),
    (1.1, 2.0),
    (2.1, 10.0),
    (10.1, 17.0),
    (17.1, 34.0),
    (34.1, 50.0),
];

// 8-hour rows to 208 µg/m³, 1-hour rows above
const O3: [(f64, f64); 6] = [
    (0.0, 50.0),
    (51.0, 100.0),
    (101.0, 168.0),
    (169.0, 208.0),
    (209.0, 748.0),
    (749.0, 1000.0),
];

const NH3: [(f64, f64); 6] = [
    (0.0, 200.0),
    (201.0, 400.0),
    (401.0, 800.0),
    (801.0, 1200.0),
    (1201.0, 1800.0),
    (1801.0, 2400.0),
];

const PB: [(f64, f64); 6] = [
    (0.0, 0.5),
    (0.51, 1.0),
    (1.01, 2.0),
    (2.01, 3.0),
    (3.01, 3.5),
    (3.51, 5.0),
];

fn sub_index(ranges: &[(f64, f64); 6], decimals: u32) -> std::result::Result<BreakpointTable, String> {
    let rows: Vec<(f64, f64, u16, u16)> = ranges
        .iter()
        .zip(SUB_INDEX.iter())
        .map(|(&(low, high), &(index_low, index_high))| (low, high, index_low, index_high))
        .collect();
    BreakpointTable::from_rows(&rows, decimals)
}

pub fn definition() -> Result<StandardDefinition> {
    let ug = Unit::MicrogramsPerCubicMetre;

    StandardDefinition::builder(KEY, "India National Air Quality Index")
        .region("India")
        .url("https://cpcb.nic.in/National-Air-Quality-Index/")
        .scale(ScaleKind::Numeric { min: 0, max: 500 })
        .rounding(RoundingRule::Round)
        .band("Good", 0, 50, "#009865", "Minimal impact.")
        .band(
            "Satisfactory",
            51,
            100,
            "#98ce00",
            "Minor breathing discomfort to sensitive people.",
        )
        .band(
            "Moderately Polluted",
            101,
            200,
            "#fff200",
            "Breathing discomfort to people with lung disease, and discomfort to people with heart disease, children and older adults.",
        )
        .band(
            "Poor",
            201,
            300,
            "#f29c33",
            "Breathing discomfort to people on prolonged exposure, and discomfort to people with heart disease.",
        )
        .band(
            "Very Poor",
            301,
            400,
            "#e93f33",
            "Respiratory illness on prolonged exposure.",
        )
        .band(
            "Severe",
            401,
            500,
            "#af2d24",
            "Affects healthy people and seriously impacts those with existing diseases.",
        )
        .pollutant(Pollutant::Pm25, Window::TwentyFourHour, ug, sub_index(&PM25, 0))
        .pollutant(Pollutant::Pm10, Window::TwentyFourHour, ug, sub_index(&PM10, 0))
        .pollutant(Pollutant::So2, Window::TwentyFourHour, ug, sub_index(&SO2, 0))
        .pollutant(Pollutant::No2, Window::TwentyFourHour, ug, sub_index(&NO2, 0))
        .pollutant(
            Pollutant::Co,
            Window::EightHourRolling,
            Unit::MilligramsPerCubicMetre,
            sub_index(&CO, 1),
        )
        .pollutant(Pollutant::O3, Window::EightHourRolling, ug, sub_index(&O3, 0))
        .pollutant(Pollutant::Nh3, Window::TwentyFourHour, ug, sub_index(&NH3, 0))
        .pollutant(Pollutant::Pb, Window::TwentyFourHour, ug, sub_index(&PB, 2))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_builds() {
        let naqi = definition().unwrap();
        assert_eq!(naqi.pollutants.len(), 8);
        assert_eq!(naqi.category_for(150), Some("Moderately Polluted"));
        assert_eq!(naqi.rule(Pollutant::Pb).unwrap().table.decimals(), 2);
        assert_eq!(naqi.rule(Pollutant::Co).unwrap().unit, Unit::MilligramsPerCubicMetre);
    }
}
