pub mod china;
pub mod eu_caqi;
pub mod india_naqi;
pub mod registry;
pub mod uk_daqi;
pub mod us_epa;
pub mod who;

pub use registry::StandardRegistry;
pub use who::{GuidelinePeriod, GuidelineSet, TargetLevel};

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{AqiError, Result};
use crate::models::{Pollutant, Unit, Window};
use crate::utils::constants::{
    DEFAULT_MIN_COVERAGE, NOWCAST_HOURS, NOWCAST_MIN_RECENT_VALID, NOWCAST_PARTICULATE_MIN_WEIGHT,
    NOWCAST_RECENT_HOURS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScaleKind {
    Numeric { min: u16, max: u16 },
    PassFail,
}

impl ScaleKind {
    pub fn describe(&self) -> String {
        match self {
            ScaleKind::Numeric { min, max } => format!("{}-{}", min, max),
            ScaleKind::PassFail => "pass/fail".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundingRule {
    /// Nearest value, with exact halves going away from zero (DEFRA publishes
    /// bands on whole values, so 100.5 lands in the band holding 101)
    Round,
    Truncate,
}

impl RoundingRule {
    /// Quantise a concentration to `decimals` places
    pub fn apply(&self, value: f64, decimals: u32) -> f64 {
        let factor = 10f64.powi(decimals as i32);
        let scaled = value * factor;
        let quantised = match self {
            RoundingRule::Round => scaled.round(),
            // Absorb representation error such as 35.4 * 10 = 353.99999999999994
            RoundingRule::Truncate => (scaled + 1e-9 * scaled.abs().max(1.0)).trunc(),
        };
        quantised / factor
    }
}

/// One published row: concentration range mapped onto an index range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Breakpoint {
    pub conc_low: f64,
    pub conc_high: f64,
    pub index_low: u16,
    pub index_high: u16,
}

/// Where a concentration falls relative to a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Row(usize),
    Below,
    Above,
}

/// Ordered breakpoint rows, quantised at `decimals` places.
///
/// Rows are either continuous (`conc_high[i] == conc_low[i + 1]`) or separated by
/// exactly one resolution step, so every quantised concentration falls in one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakpointTable {
    rows: Vec<Breakpoint>,
    decimals: u32,
    /// Upper-range tables start above zero and only cover high concentrations
    upper_range: bool,
}

impl BreakpointTable {
    pub fn new(rows: Vec<Breakpoint>, decimals: u32) -> std::result::Result<Self, String> {
        let table = Self {
            rows,
            decimals,
            upper_range: false,
        };
        table.check()?;
        Ok(table)
    }

    /// Rows for a table that only starts at its first `conc_low`
    pub fn upper_range(rows: &[(f64, f64, u16, u16)], decimals: u32) -> std::result::Result<Self, String> {
        let mut table = Self::from_rows_unchecked(rows, decimals);
        table.upper_range = true;
        table.check()?;
        Ok(table)
    }

    fn from_rows_unchecked(rows: &[(f64, f64, u16, u16)], decimals: u32) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|&(conc_low, conc_high, index_low, index_high)| Breakpoint {
                    conc_low,
                    conc_high,
                    index_low,
                    index_high,
                })
                .collect(),
            decimals,
            upper_range: false,
        }
    }

    /// Rows given as (conc_low, conc_high, index_low, index_high)
    pub fn from_rows(rows: &[(f64, f64, u16, u16)], decimals: u32) -> std::result::Result<Self, String> {
        let table = Self::from_rows_unchecked(rows, decimals);
        table.check()?;
        Ok(table)
    }

    /// Banded tables map each range onto a single index, numbered from 1
    pub fn banded(ranges: &[(f64, f64)], decimals: u32) -> std::result::Result<Self, String> {
        Self::new(
            ranges
                .iter()
                .enumerate()
                .map(|(i, &(conc_low, conc_high))| Breakpoint {
                    conc_low,
                    conc_high,
                    index_low: (i + 1) as u16,
                    index_high: (i + 1) as u16,
                })
                .collect(),
            decimals,
        )
    }

    fn check(&self) -> std::result::Result<(), String> {
        let first = self.rows.first().ok_or("table has no rows")?;
        if !self.upper_range && first.conc_low != 0.0 {
            return Err(format!("first row starts at {} instead of 0", first.conc_low));
        }

        let resolution = self.resolution();
        let tolerance = self.tolerance();
        for (i, row) in self.rows.iter().enumerate() {
            if row.conc_high < row.conc_low {
                return Err(format!("row {} has conc_high below conc_low", i));
            }
            if row.index_high < row.index_low {
                return Err(format!("row {} has index_high below index_low", i));
            }
            if let Some(next) = self.rows.get(i + 1) {
                let gap = next.conc_low - row.conc_high;
                if gap.abs() > tolerance && (gap - resolution).abs() > tolerance {
                    return Err(format!(
                        "gap of {} between rows {} and {} is neither 0 nor {}",
                        gap,
                        i,
                        i + 1,
                        resolution
                    ));
                }
                if next.index_low < row.index_high {
                    return Err(format!("index decreases between rows {} and {}", i, i + 1));
                }
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> &[Breakpoint] {
        &self.rows
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn resolution(&self) -> f64 {
        10f64.powi(-(self.decimals as i32))
    }

    fn tolerance(&self) -> f64 {
        self.resolution() * 1e-6
    }

    pub fn is_upper_range(&self) -> bool {
        self.upper_range
    }

    pub fn ceiling_concentration(&self) -> f64 {
        self.rows.last().map(|r| r.conc_high).unwrap_or(0.0)
    }

    pub fn ceiling_index(&self) -> u16 {
        self.rows.last().map(|r| r.index_high).unwrap_or(0)
    }

    pub fn floor_index(&self) -> u16 {
        self.rows.first().map(|r| r.index_low).unwrap_or(0)
    }

    pub fn is_continuous(&self) -> bool {
        self.rows
            .windows(2)
            .all(|pair| (pair[1].conc_low - pair[0].conc_high).abs() <= self.tolerance())
    }

    /// Find the row holding an already quantised concentration
    pub fn locate(&self, concentration: f64) -> Location {
        let tolerance = self.tolerance();
        let first = match self.rows.first() {
            Some(first) => first,
            None => return Location::Above,
        };
        if concentration < first.conc_low - tolerance {
            return Location::Below;
        }
        for (i, row) in self.rows.iter().enumerate() {
            if concentration <= row.conc_high + tolerance {
                // Inside the row, or in the sub-resolution gap just above the previous one
                return Location::Row(i);
            }
        }
        Location::Above
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBand {
    pub name: &'static str,
    pub index_low: u16,
    pub index_high: u16,
    pub colour: &'static str,
    pub health_message: &'static str,
}

/// EPA NowCast parameters attached to a pollutant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NowCastParams {
    pub window_hours: usize,
    pub min_weight: Option<f64>,
    pub recent_hours: usize,
    pub min_recent_valid: usize,
}

impl NowCastParams {
    pub fn particulate() -> Self {
        Self {
            window_hours: NOWCAST_HOURS,
            min_weight: Some(NOWCAST_PARTICULATE_MIN_WEIGHT),
            recent_hours: NOWCAST_RECENT_HOURS,
            min_recent_valid: NOWCAST_MIN_RECENT_VALID,
        }
    }

    pub fn ozone() -> Self {
        Self {
            min_weight: None,
            ..Self::particulate()
        }
    }
}

/// A second published table for the same pollutant on another averaging window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternateTable {
    pub window: Window,
    pub table: BreakpointTable,
    /// When set, the table is also consulted for any concentration at or above this
    /// value and the higher index is reported. Otherwise it is used only on request.
    pub applies_from: Option<f64>,
}

impl AlternateTable {
    /// Whether an already quantised concentration brings this table in automatically
    pub fn applies_to(&self, concentration: f64) -> bool {
        self.applies_from
            .is_some_and(|threshold| concentration >= threshold - self.table.resolution() * 1e-6)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantRule {
    pub table: BreakpointTable,
    pub window: Window,
    pub unit: Unit,
    pub nowcast: Option<NowCastParams>,
    pub alternates: Vec<AlternateTable>,
}

impl PollutantRule {
    /// Table published for `window`, if any
    pub fn table_for(&self, window: Window) -> Option<&BreakpointTable> {
        if window == self.window {
            return Some(&self.table);
        }
        self.alternates
            .iter()
            .find(|alternate| alternate.window == window)
            .map(|alternate| &alternate.table)
    }

    pub fn windows(&self) -> Vec<Window> {
        std::iter::once(self.window)
            .chain(self.alternates.iter().map(|a| a.window))
            .collect()
    }
}

/// Immutable description of one published index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardDefinition {
    pub key: &'static str,
    pub name: &'static str,
    pub region: &'static str,
    pub url: &'static str,
    pub scale: ScaleKind,
    pub rounding: RoundingRule,
    pub pollutants: BTreeMap<Pollutant, PollutantRule>,
    pub bands: Vec<CategoryBand>,
    /// Each group needs at least one pollutant with a valid index before an overall index exists
    pub mandatory: Vec<Vec<Pollutant>>,
    pub min_coverage: f64,
}

impl StandardDefinition {
    pub fn builder(key: &'static str, name: &'static str) -> StandardBuilder {
        StandardBuilder::new(key, name)
    }

    pub fn supports(&self, pollutant: Pollutant) -> bool {
        self.pollutants.contains_key(&pollutant)
    }

    pub fn rule(&self, pollutant: Pollutant) -> Result<&PollutantRule> {
        self.pollutants
            .get(&pollutant)
            .ok_or_else(|| AqiError::UnsupportedPollutant {
                pollutant: pollutant.to_string(),
                standard: self.key.to_string(),
            })
    }

    pub fn band_for(&self, index: u16) -> Option<&CategoryBand> {
        self.bands
            .iter()
            .find(|band| index >= band.index_low && index <= band.index_high)
    }

    pub fn category_for(&self, index: u16) -> Option<&'static str> {
        self.band_for(index).map(|band| band.name)
    }

    pub fn is_pass_fail(&self) -> bool {
        matches!(self.scale, ScaleKind::PassFail)
    }

    /// Describe each mandatory group that has no member in `present`
    pub fn unmet_mandatory_groups(&self, present: &BTreeSet<Pollutant>) -> Vec<String> {
        self.mandatory
            .iter()
            .filter(|group| !group.iter().any(|p| present.contains(p)))
            .map(|group| {
                group
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(" or ")
            })
            .collect()
    }

    pub fn with_min_coverage(mut self, min_coverage: f64) -> Self {
        self.min_coverage = min_coverage;
        self
    }
}

pub struct StandardBuilder {
    definition: StandardDefinition,
    error: Option<AqiError>,
}

impl StandardBuilder {
    fn new(key: &'static str, name: &'static str) -> Self {
        Self {
            definition: StandardDefinition {
                key,
                name,
                region: "",
                url: "",
                scale: ScaleKind::PassFail,
                rounding: RoundingRule::Round,
                pollutants: BTreeMap::new(),
                bands: Vec::new(),
                mandatory: Vec::new(),
                min_coverage: DEFAULT_MIN_COVERAGE,
            },
            error: None,
        }
    }

    pub fn region(mut self, region: &'static str) -> Self {
        self.definition.region = region;
        self
    }

    pub fn url(mut self, url: &'static str) -> Self {
        self.definition.url = url;
        self
    }

    pub fn scale(mut self, scale: ScaleKind) -> Self {
        self.definition.scale = scale;
        self
    }

    pub fn rounding(mut self, rounding: RoundingRule) -> Self {
        self.definition.rounding = rounding;
        self
    }

    pub fn band(
        mut self,
        name: &'static str,
        index_low: u16,
        index_high: u16,
        colour: &'static str,
        health_message: &'static str,
    ) -> Self {
        self.definition.bands.push(CategoryBand {
            name,
            index_low,
            index_high,
            colour,
            health_message,
        });
        self
    }

    pub fn mandatory_group(mut self, group: &[Pollutant]) -> Self {
        self.definition.mandatory.push(group.to_vec());
        self
    }

    pub fn pollutant(
        self,
        pollutant: Pollutant,
        window: Window,
        unit: Unit,
        table: std::result::Result<BreakpointTable, String>,
    ) -> Self {
        self.insert(pollutant, window, unit, table, None)
    }

    pub fn nowcast_pollutant(
        self,
        pollutant: Pollutant,
        window: Window,
        unit: Unit,
        table: std::result::Result<BreakpointTable, String>,
        nowcast: NowCastParams,
    ) -> Self {
        self.insert(pollutant, window, unit, table, Some(nowcast))
    }

    fn insert(
        mut self,
        pollutant: Pollutant,
        window: Window,
        unit: Unit,
        table: std::result::Result<BreakpointTable, String>,
        nowcast: Option<NowCastParams>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        match table {
            Ok(table) => {
                self.definition.pollutants.insert(
                    pollutant,
                    PollutantRule {
                        table,
                        window,
                        unit,
                        nowcast,
                        alternates: Vec::new(),
                    },
                );
            }
            Err(message) => {
                self.error = Some(AqiError::InvalidTable {
                    standard: self.definition.key.to_string(),
                    pollutant: pollutant.to_string(),
                    message,
                });
            }
        }
        self
    }

    /// Attach a table for another averaging window to an already defined pollutant
    pub fn alternate(
        mut self,
        pollutant: Pollutant,
        window: Window,
        table: std::result::Result<BreakpointTable, String>,
        applies_from: Option<f64>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        let key = self.definition.key;
        let invalid = |message: String| AqiError::InvalidTable {
            standard: key.to_string(),
            pollutant: pollutant.to_string(),
            message,
        };
        let table = match table {
            Ok(table) => table,
            Err(message) => {
                self.error = Some(invalid(message));
                return self;
            }
        };
        match self.definition.pollutants.get_mut(&pollutant) {
            Some(rule) if rule.table_for(window).is_some() => {
                self.error = Some(invalid(format!("{} table defined twice", window.label())));
            }
            Some(rule) => rule.alternates.push(AlternateTable {
                window,
                table,
                applies_from,
            }),
            None => {
                self.error = Some(invalid(format!(
                    "{} table given before the pollutant's main table",
                    window.label()
                )));
            }
        }
        self
    }

    pub fn build(self) -> Result<StandardDefinition> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let definition = self.definition;

        if let ScaleKind::Numeric { min, max } = definition.scale {
            for (pollutant, rule) in &definition.pollutants {
                let tables = std::iter::once(&rule.table).chain(rule.alternates.iter().map(|a| &a.table));
                for table in tables {
                    if table.floor_index() < min || table.ceiling_index() > max {
                        return Err(AqiError::InvalidTable {
                            standard: definition.key.to_string(),
                            pollutant: pollutant.to_string(),
                            message: format!("index range exceeds scale {}-{}", min, max),
                        });
                    }
                }
            }
            for index in min..=max {
                if definition.band_for(index).is_none() {
                    return Err(AqiError::Configuration(format!(
                        "{} has no category band for index {}",
                        definition.key, index
                    )));
                }
            }
        }

        for group in &definition.mandatory {
            if let Some(missing) = group.iter().find(|p| !definition.supports(**p)) {
                return Err(AqiError::Configuration(format!(
                    "{} requires {} but defines no table for it",
                    definition.key, missing
                )));
            }
        }

        Ok(definition)
    }
}
