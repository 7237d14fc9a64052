//! US EPA Air Quality Index (2024 PM2.5 revision).

use crate::error::Result;
use crate::models::{Pollutant, Unit, Window};
use crate::standards::{
    BreakpointTable, NowCastParams, RoundingRule, ScaleKind, StandardDefinition,
};

pub const KEY: &str = "US_EPA";

const PM25: [(f64, f64, u16, u16); 7] = [
    (0.0, 9.0, 0, 50),
    (9.1, 35.4, 51, 100),
    (35.5, 55.4, 101, 150),
    (55.5, 125.4, 151, 200),
    (125.5, 225.4, 201, 300),
    (225.5, 325.4, 301, 400),
    (325.5, 500.4, 401, 500),
];

const PM10: [(f64, f64, u16, u16); 7] = [
    (0.0, 54.0, 0, 50),
    (55.0, 154.0, 51, 100),
    (155.0, 254.0, 101, 150),
    (255.0, 354.0, 151, 200),
    (355.0, 424.0, 201, 300),
    (425.0, 504.0, 301, 400),
    (505.0, 604.0, 401, 500),
];

const O3_8H: [(f64, f64, u16, u16); 5] = [
    (0.0, 0.054, 0, 50),
    (0.055, 0.070, 51, 100),
    (0.071, 0.085, 101, 150),
    (0.086, 0.105, 151, 200),
    (0.106, 0.200, 201, 300),
];

/// Concentration from which the 1-hour ozone table is also consulted
pub const O3_1H_FROM_PPM: f64 = 0.125;

const O3_1H: [(f64, f64, u16, u16); 5] = [
    (0.125, 0.164, 101, 150),
    (0.165, 0.204, 151, 200),
    (0.205, 0.404, 201, 300),
    (0.405, 0.504, 301, 400),
    (0.505, 0.604, 401, 500),
];

const CO: [(f64, f64, u16, u16); 7] = [
    (0.0, 4.4, 0, 50),
    (4.5, 9.4, 51, 100),
    (9.5, 12.4, 101, 150),
    (12.5, 15.4, 151, 200),
    (15.5, 30.4, 201, 300),
    (30.5, 40.4, 301, 400),
    (40.5, 50.4, 401, 500),
];

// 1-hour rows up to 304 ppb, 24-hour rows above
const SO2: [(f64, f64, u16, u16); 7] = [
    (0.0, 35.0, 0, 50),
    (36.0, 75.0, 51, 100),
    (76.0, 185.0, 101, 150),
    (186.0, 304.0, 151, 200),
    (305.0, 604.0, 201, 300),
    (605.0, 804.0, 301, 400),
    (805.0, 1004.0, 401, 500),
];

const NO2: [(f64, f64, u16, u16); 7] = [
    (0.0, 53.0, 0, 50),
    (54.0, 100.0, 51, 100),
    (101.0, 360.0, 101, 150),
    (361.0, 649.0, 151, 200),
    (650.0, 1249.0, 201, 300),
    (1250.0, 1649.0, 301, 400),
    (1650.0, 2049.0, 401, 500),
];

pub fn definition() -> Result<StandardDefinition> {
    StandardDefinition::builder(KEY, "US EPA Air Quality Index")
        .region("United States")
        .url("https://www.airnow.gov/aqi/aqi-basics/")
        .scale(ScaleKind::Numeric { min: 0, max: 500 })
        .rounding(RoundingRule::Truncate)
        .band("Good", 0, 50, "#00e400", "Air quality is satisfactory, and air pollution poses little or no risk.")
        .band(
            "Moderate",
            51,
            100,
            "#ffff00",
            "Air quality is acceptable. However, there may be a risk for some people, particularly those who are unusually sensitive to air pollution.",
        )
        .band(
            "Unhealthy for Sensitive Groups",
            101,
            150,
            "#ff7e00",
            "Members of sensitive groups may experience health effects. The general public is less likely to be affected.",
        )
        .band(
            "Unhealthy",
            151,
            200,
            "#ff0000",
            "Some members of the general public may experience health effects; members of sensitive groups may experience more serious health effects.",
        )
        .band(
            "Very Unhealthy",
            201,
            300,
            "#8f3f97",
            "Health alert: The risk of health effects is increased for everyone.",
        )
        .band(
            "Hazardous",
            301,
            500,
            "#7e0023",
            "Health warning of emergency conditions: everyone is more likely to be affected.",
        )
        .nowcast_pollutant(
            Pollutant::Pm25,
            Window::TwentyFourHour,
            Unit::MicrogramsPerCubicMetre,
            BreakpointTable::from_rows(&PM25, 1),
            NowCastParams::particulate(),
        )
        .nowcast_pollutant(
            Pollutant::Pm10,
            Window::TwentyFourHour,
            Unit::MicrogramsPerCubicMetre,
            BreakpointTable::from_rows(&PM10, 0),
            NowCastParams::particulate(),
        )
        .nowcast_pollutant(
            Pollutant::O3,
            Window::EightHourRolling,
            Unit::PartsPerMillion,
            BreakpointTable::from_rows(&O3_8H, 3),
            NowCastParams::ozone(),
        )
        .alternate(
            Pollutant::O3,
            Window::OneHour,
            BreakpointTable::upper_range(&O3_1H, 3),
            Some(O3_1H_FROM_PPM),
        )
        .pollutant(
            Pollutant::Co,
            Window::EightHourRolling,
            Unit::PartsPerMillion,
            BreakpointTable::from_rows(&CO, 1),
        )
        .pollutant(
            Pollutant::So2,
            Window::OneHour,
            Unit::PartsPerBillion,
            BreakpointTable::from_rows(&SO2, 0),
        )
        .pollutant(
            Pollutant::No2,
            Window::OneHour,
            Unit::PartsPerBillion,
            BreakpointTable::from_rows(&NO2, 0),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_builds() {
        let epa = definition().unwrap();
        assert_eq!(epa.pollutants.len(), 6);
        assert_eq!(epa.rounding, RoundingRule::Truncate);
        assert_eq!(epa.rule(Pollutant::O3).unwrap().unit, Unit::PartsPerMillion);
        assert_eq!(epa.rule(Pollutant::Pm25).unwrap().table.decimals(), 1);
        assert_eq!(epa.category_for(101), Some("Unhealthy for Sensitive Groups"));
    }

    #[test]
    fn test_nowcast_capability() {
        let epa = definition().unwrap();
        let pm = epa.rule(Pollutant::Pm25).unwrap().nowcast.unwrap();
        assert_eq!(pm.min_weight, Some(0.5));
        let o3 = epa.rule(Pollutant::O3).unwrap().nowcast.unwrap();
        assert_eq!(o3.min_weight, None);
        assert!(epa.rule(Pollutant::No2).unwrap().nowcast.is_none());
    }

    #[test]
    fn test_ozone_has_hourly_table() {
        let epa = definition().unwrap();
        let o3 = epa.rule(Pollutant::O3).unwrap();
        assert_eq!(o3.window, Window::EightHourRolling);
        assert_eq!(o3.table.ceiling_index(), 300);

        let hourly = o3.table_for(Window::OneHour).unwrap();
        assert!(hourly.is_upper_range());
        assert_eq!(hourly.rows()[0].conc_low, 0.125);
        assert_eq!(hourly.ceiling_index(), 500);
        assert!(epa.rule(Pollutant::Pm25).unwrap().alternates.is_empty());
    }
}
