//! WHO Global Air Quality Guidelines (2021): guideline values and interim targets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{AqiError, Result};
use crate::models::{Pollutant, Unit};
use crate::standards::{ScaleKind, StandardDefinition};

pub const KEY: &str = "WHO";

/// Guideline targets, ordered from least to most strict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TargetLevel {
    #[serde(rename = "IT-1")]
    It1,
    #[serde(rename = "IT-2")]
    It2,
    #[serde(rename = "IT-3")]
    It3,
    #[serde(rename = "IT-4")]
    It4,
    #[serde(rename = "AQG")]
    Aqg,
}

impl TargetLevel {
    pub const ALL: [TargetLevel; 5] = [
        TargetLevel::It1,
        TargetLevel::It2,
        TargetLevel::It3,
        TargetLevel::It4,
        TargetLevel::Aqg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetLevel::It1 => "IT-1",
            TargetLevel::It2 => "IT-2",
            TargetLevel::It3 => "IT-3",
            TargetLevel::It4 => "IT-4",
            TargetLevel::Aqg => "AQG",
        }
    }
}

impl fmt::Display for TargetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetLevel {
    type Err = AqiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().replace('_', "-").as_str() {
            "AQG" => Ok(TargetLevel::Aqg),
            "IT-1" | "IT1" => Ok(TargetLevel::It1),
            "IT-2" | "IT2" => Ok(TargetLevel::It2),
            "IT-3" | "IT3" => Ok(TargetLevel::It3),
            "IT-4" | "IT4" => Ok(TargetLevel::It4),
            _ => Err(AqiError::UnknownTarget {
                name: s.to_string(),
            }),
        }
    }
}

/// Averaging period a guideline value applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GuidelinePeriod {
    #[serde(rename = "annual")]
    Annual,
    #[serde(rename = "24h")]
    Daily,
    /// Daily maximum of the rolling 8-hour means
    #[serde(rename = "8h")]
    EightHour,
    #[serde(rename = "1h")]
    OneHour,
}

impl GuidelinePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuidelinePeriod::Annual => "annual",
            GuidelinePeriod::Daily => "24h",
            GuidelinePeriod::EightHour => "8h",
            GuidelinePeriod::OneHour => "1h",
        }
    }
}

impl fmt::Display for GuidelinePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuidelinePeriod {
    type Err = AqiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "annual" | "year" | "yearly" => Ok(GuidelinePeriod::Annual),
            "24h" | "24-hour" | "daily" | "day" => Ok(GuidelinePeriod::Daily),
            "8h" | "8-hour" => Ok(GuidelinePeriod::EightHour),
            "1h" | "1-hour" | "hourly" => Ok(GuidelinePeriod::OneHour),
            other => Err(AqiError::Configuration(format!(
                "Unknown averaging period '{}'. Expected one of: annual, 24h, 8h, 1h",
                other
            ))),
        }
    }
}

/// Outcome of comparing one mean against one guideline value
#[derive(Debug, Clone, PartialEq)]
pub struct GuidelineCheck {
    pub guideline_value: f64,
    pub meets_guideline: bool,
    pub exceedance_ratio: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuidelineSet {
    values: BTreeMap<(Pollutant, GuidelinePeriod), BTreeMap<TargetLevel, f64>>,
    units: BTreeMap<Pollutant, Unit>,
    defaults: BTreeMap<Pollutant, GuidelinePeriod>,
}

impl GuidelineSet {
    pub fn who_2021() -> Self {
        use GuidelinePeriod::*;
        use TargetLevel::*;

        let entries: [(Pollutant, GuidelinePeriod, &[(TargetLevel, f64)]); 12] = [
            (Pollutant::Pm25, Annual, &[(Aqg, 5.0), (It4, 10.0), (It3, 15.0), (It2, 25.0), (It1, 35.0)]),
            (Pollutant::Pm25, Daily, &[(Aqg, 15.0), (It4, 25.0), (It3, 37.5), (It2, 50.0), (It1, 75.0)]),
            (Pollutant::Pm10, Annual, &[(Aqg, 15.0), (It4, 20.0), (It3, 30.0), (It2, 50.0), (It1, 70.0)]),
            (Pollutant::Pm10, Daily, &[(Aqg, 45.0), (It4, 50.0), (It3, 75.0), (It2, 100.0), (It1, 150.0)]),
            (Pollutant::O3, EightHour, &[(Aqg, 100.0), (It2, 120.0), (It1, 160.0)]),
            (Pollutant::No2, Annual, &[(Aqg, 10.0), (It3, 20.0), (It2, 30.0), (It1, 40.0)]),
            (Pollutant::No2, Daily, &[(Aqg, 25.0), (It3, 50.0), (It2, 75.0), (It1, 120.0)]),
            (Pollutant::No2, OneHour, &[(Aqg, 200.0)]),
            (Pollutant::So2, Daily, &[(Aqg, 40.0), (It2, 50.0), (It1, 125.0)]),
            (Pollutant::Co, Daily, &[(Aqg, 4.0)]),
            (Pollutant::Co, EightHour, &[(Aqg, 10.0)]),
            (Pollutant::Co, OneHour, &[(Aqg, 35.0)]),
        ];

        let values = entries
            .iter()
            .map(|(pollutant, period, targets)| {
                ((*pollutant, *period), targets.iter().copied().collect())
            })
            .collect();

        let units = [
            (Pollutant::Pm25, Unit::MicrogramsPerCubicMetre),
            (Pollutant::Pm10, Unit::MicrogramsPerCubicMetre),
            (Pollutant::O3, Unit::MicrogramsPerCubicMetre),
            (Pollutant::No2, Unit::MicrogramsPerCubicMetre),
            (Pollutant::So2, Unit::MicrogramsPerCubicMetre),
            (Pollutant::Co, Unit::MilligramsPerCubicMetre),
        ]
        .into_iter()
        .collect();

        let defaults = [
            (Pollutant::Pm25, Annual),
            (Pollutant::Pm10, Annual),
            (Pollutant::O3, EightHour),
            (Pollutant::No2, Annual),
            (Pollutant::So2, Daily),
            (Pollutant::Co, Daily),
        ]
        .into_iter()
        .collect();

        Self {
            values,
            units,
            defaults,
        }
    }

    pub fn supports(&self, pollutant: Pollutant) -> bool {
        self.units.contains_key(&pollutant)
    }

    pub fn pollutants(&self) -> impl Iterator<Item = Pollutant> + '_ {
        self.units.keys().copied()
    }

    pub fn unit(&self, pollutant: Pollutant) -> Option<Unit> {
        self.units.get(&pollutant).copied()
    }

    pub fn default_period(&self, pollutant: Pollutant) -> Option<GuidelinePeriod> {
        self.defaults.get(&pollutant).copied()
    }

    pub fn periods(&self, pollutant: Pollutant) -> Vec<GuidelinePeriod> {
        self.values
            .keys()
            .filter(|(p, _)| *p == pollutant)
            .map(|(_, period)| *period)
            .collect()
    }

    pub fn value(
        &self,
        pollutant: Pollutant,
        period: GuidelinePeriod,
        target: TargetLevel,
    ) -> Option<f64> {
        self.values
            .get(&(pollutant, period))
            .and_then(|targets| targets.get(&target))
            .copied()
    }

    /// Targets published for a pollutant and period, least strict first
    pub fn targets(&self, pollutant: Pollutant, period: GuidelinePeriod) -> Vec<TargetLevel> {
        self.values
            .get(&(pollutant, period))
            .map(|targets| targets.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Strictest target a mean concentration satisfies
    pub fn highest_met_target(
        &self,
        pollutant: Pollutant,
        period: GuidelinePeriod,
        mean: f64,
    ) -> Option<TargetLevel> {
        self.values.get(&(pollutant, period)).and_then(|targets| {
            targets
                .iter()
                .rev()
                .find(|(_, value)| mean <= **value)
                .map(|(target, _)| *target)
        })
    }

    pub fn evaluate(
        &self,
        pollutant: Pollutant,
        period: GuidelinePeriod,
        target: TargetLevel,
        mean: f64,
    ) -> Option<GuidelineCheck> {
        let guideline_value = self.value(pollutant, period, target)?;
        let unit = self.unit(pollutant).unwrap_or(Unit::MicrogramsPerCubicMetre);
        let meets_guideline = mean <= guideline_value;
        let exceedance_ratio = mean / guideline_value;

        let message = if meets_guideline {
            format!(
                "{} concentration ({:.1} {}) meets WHO {} guideline ({} {}) for {} average.",
                pollutant, mean, unit, target, guideline_value, unit, period
            )
        } else {
            format!(
                "{} concentration ({:.1} {}) exceeds WHO {} guideline ({} {}) for {} average by {:.0}%.",
                pollutant,
                mean,
                unit,
                target,
                guideline_value,
                unit,
                period,
                (exceedance_ratio - 1.0) * 100.0
            )
        };

        Some(GuidelineCheck {
            guideline_value,
            meets_guideline,
            exceedance_ratio,
            message,
        })
    }
}

pub fn definition() -> Result<StandardDefinition> {
    StandardDefinition::builder(KEY, "WHO Air Quality Guidelines (2021)")
        .region("Global")
        .url("https://www.who.int/publications/i/item/9789240034228")
        .scale(ScaleKind::PassFail)
        .build()
}
