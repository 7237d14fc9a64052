//! China Air Quality Index (HJ 633-2012).
//!
//! The published IAQI tables are continuous: each row ends where the next begins.
//! SO2, NO2, CO and O3 also have 1-hour tables, read when an hourly window is requested.

use crate::error::Result;
use crate::models::{Pollutant, Unit, Window};
use crate::standards::{BreakpointTable, RoundingRule, ScaleKind, StandardDefinition};

pub const KEY: &str = "CHINA";

const IAQI: [u16; 8] = [0, 50, 100, 150, 200, 300, 400, 500];

const SO2_24H: [f64; 8] = [0.0, 50.0, 150.0, 475.0, 800.0, 1600.0, 2100.0, 2620.0];
const NO2_24H: [f64; 8] = [0.0, 40.0, 80.0, 180.0, 280.0, 565.0, 750.0, 940.0];
const PM10_24H: [f64; 8] = [0.0, 50.0, 150.0, 250.0, 350.0, 420.0, 500.0, 600.0];
const PM25_24H: [f64; 8] = [0.0, 35.0, 75.0, 115.0, 150.0, 250.0, 350.0, 500.0];
const CO_24H: [f64; 8] = [0.0, 2.0, 4.0, 14.0, 24.0, 36.0, 48.0, 60.0];
// Published to IAQI 300; higher ozone levels are read from the 1-hour table
const O3_8H: [f64; 6] = [0.0, 100.0, 160.0, 215.0, 265.0, 800.0];

// 1-hour SO2 stops at IAQI 200; above 800 µg/m³ the 24-hour table applies
const SO2_1H: [f64; 5] = [0.0, 150.0, 500.0, 650.0, 800.0];
const NO2_1H: [f64; 8] = [0.0, 100.0, 200.0, 700.0, 1200.0, 2340.0, 3090.0, 3840.0];
const CO_1H: [f64; 8] = [0.0, 5.0, 10.0, 35.0, 60.0, 90.0, 120.0, 150.0];
const O3_1H: [f64; 8] = [0.0, 160.0, 200.0, 300.0, 400.0, 800.0, 1000.0, 1200.0];

fn continuous(limits: &[f64], decimals: u32) -> std::result::Result<BreakpointTable, String> {
    let rows: Vec<(f64, f64, u16, u16)> = limits
        .windows(2)
        .zip(IAQI.windows(2))
        .map(|(conc, iaqi)| (conc[0], conc[1], iaqi[0], iaqi[1]))
        .collect();
    BreakpointTable::from_rows(&rows, decimals)
}

pub fn definition() -> Result<StandardDefinition> {
    let ug = Unit::MicrogramsPerCubicMetre;

    StandardDefinition::builder(KEY, "China Air Quality Index")
        .region("China")
        .url("https://www.mee.gov.cn/ywgz/fgbz/bz/bzwb/jcffbz/201203/t20120302_224166.shtml")
        .scale(ScaleKind::Numeric { min: 0, max: 500 })
        .rounding(RoundingRule::Round)
        .band("Excellent", 0, 50, "#00e400", "Air quality is satisfactory with little or no pollution.")
        .band(
            "Good",
            51,
            100,
            "#ffff00",
            "Air quality is acceptable; a very small number of unusually sensitive people may be affected.",
        )
        .band(
            "Lightly Polluted",
            101,
            150,
            "#ff7e00",
            "Sensitive people should reduce prolonged or heavy outdoor exertion.",
        )
        .band(
            "Moderately Polluted",
            151,
            200,
            "#ff0000",
            "Sensitive people should avoid prolonged outdoor exertion; others should reduce it.",
        )
        .band(
            "Heavily Polluted",
            201,
            300,
            "#99004c",
            "Sensitive people should stay indoors; everyone should reduce outdoor activity.",
        )
        .band(
            "Severely Polluted",
            301,
            500,
            "#7e0023",
            "Everyone should avoid outdoor activity.",
        )
        .pollutant(Pollutant::So2, Window::TwentyFourHour, ug, continuous(&SO2_24H, 0))
        .pollutant(Pollutant::No2, Window::TwentyFourHour, ug, continuous(&NO2_24H, 0))
        .pollutant(Pollutant::Pm10, Window::TwentyFourHour, ug, continuous(&PM10_24H, 0))
        .pollutant(Pollutant::Pm25, Window::TwentyFourHour, ug, continuous(&PM25_24H, 0))
        .pollutant(
            Pollutant::Co,
            Window::TwentyFourHour,
            Unit::MilligramsPerCubicMetre,
            continuous(&CO_24H, 1),
        )
        .pollutant(Pollutant::O3, Window::EightHourRolling, ug, continuous(&O3_8H, 0))
        .alternate(Pollutant::So2, Window::OneHour, continuous(&SO2_1H, 0), None)
        .alternate(Pollutant::No2, Window::OneHour, continuous(&NO2_1H, 0), None)
        .alternate(Pollutant::Co, Window::OneHour, continuous(&CO_1H, 1), None)
        .alternate(Pollutant::O3, Window::OneHour, continuous(&O3_1H, 0), None)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_continuous() {
        let china = definition().unwrap();
        for rule in china.pollutants.values() {
            assert!(rule.table.is_continuous());
            for alternate in &rule.alternates {
                assert!(alternate.table.is_continuous());
                assert!(alternate.applies_from.is_none());
            }
        }
        assert_eq!(china.rule(Pollutant::Pm25).unwrap().table.ceiling_index(), 500);
        assert_eq!(china.rule(Pollutant::O3).unwrap().table.ceiling_index(), 300);
    }

    #[test]
    fn test_hourly_tables() {
        let china = definition().unwrap();
        for pollutant in [Pollutant::So2, Pollutant::No2, Pollutant::Co, Pollutant::O3] {
            assert!(china.rule(pollutant).unwrap().table_for(Window::OneHour).is_some());
        }
        assert!(china.rule(Pollutant::Pm10).unwrap().table_for(Window::OneHour).is_none());

        let so2 = china.rule(Pollutant::So2).unwrap().table_for(Window::OneHour).unwrap();
        assert_eq!(so2.ceiling_concentration(), 800.0);
        assert_eq!(so2.ceiling_index(), 200);

        let o3 = china.rule(Pollutant::O3).unwrap().table_for(Window::OneHour).unwrap();
        assert_eq!(o3.ceiling_concentration(), 1200.0);
        assert_eq!(o3.ceiling_index(), 500);
    }

    #[test]
    fn test_pm25_rows() {
        let china = definition().unwrap();
        let rows = china.rule(Pollutant::Pm25).unwrap().table.rows();
        assert_eq!(rows.len(), 7);
        assert_eq!((rows[1].conc_low, rows[1].conc_high), (35.0, 75.0));
        assert_eq!((rows[1].index_low, rows[1].index_high), (50, 100));
    }
}
