use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::models::{AggregatedValue, Period, Pollutant, SampleStats, Unit};
use crate::standards::{GuidelinePeriod, TargetLevel};

/// Classification of a result cell. Everything except `Valid` carries a prose reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Valid,
    /// Above the highest breakpoint; reported at the ceiling index
    OffScale,
    /// Below the lowest breakpoint; clipped to the lowest band
    BelowRange,
    InsufficientCoverage,
    ConversionFailed,
    IncompletePollutantSet,
}

impl CellStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellStatus::Valid => "valid",
            CellStatus::OffScale => "off_scale",
            CellStatus::BelowRange => "below_range",
            CellStatus::InsufficientCoverage => "insufficient_coverage",
            CellStatus::ConversionFailed => "conversion_failed",
            CellStatus::IncompletePollutantSet => "incomplete_pollutant_set",
        }
    }

    /// True when the cell carries no usable value
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            CellStatus::InsufficientCoverage
                | CellStatus::ConversionFailed
                | CellStatus::IncompletePollutantSet
        )
    }
}

impl fmt::Display for CellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-pollutant index for one site and period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiResult {
    pub site_code: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub pollutant: Pollutant,
    pub mean_value: Option<f64>,
    pub unit: Unit,
    pub coverage_fraction: f64,
    pub stats: Option<SampleStats>,
    pub index_value: Option<u16>,
    pub category: Option<String>,
    pub standard_name: String,
    pub status: CellStatus,
    pub reason: Option<String>,
}

impl AqiResult {
    /// Start a result from an aggregate; interpolation fills in the index afterwards
    pub fn from_aggregate(aggregate: &AggregatedValue, unit: Unit, standard_name: &str) -> Self {
        Self {
            site_code: aggregate.site_code.clone(),
            period_start: aggregate.period_start,
            period_end: aggregate.period_end,
            pollutant: aggregate.pollutant,
            mean_value: aggregate.mean_value,
            unit,
            coverage_fraction: aggregate.coverage_fraction,
            stats: aggregate.stats,
            index_value: None,
            category: None,
            standard_name: standard_name.to_string(),
            status: CellStatus::Valid,
            reason: None,
        }
    }

    pub fn period(&self) -> Period {
        Period::new(self.period_start, self.period_end)
    }
}

/// Worst-pollutant summary for one site and period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAqiResult {
    pub site_code: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub overall_index_value: Option<u16>,
    pub overall_category: Option<String>,
    pub dominant_pollutant: Option<Pollutant>,
    pub standard_name: String,
    pub status: CellStatus,
    pub reason: Option<String>,
}

/// One row of the long layout. Overall rows use the pollutant label `overall`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    pub site_code: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub pollutant: String,
    pub mean_value: Option<f64>,
    pub coverage_fraction: Option<f64>,
    pub index_value: Option<u16>,
    pub category: Option<String>,
    pub standard_name: String,
    pub dominant_pollutant: Option<String>,
    pub unit: Option<String>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub median: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
    pub status: CellStatus,
    pub reason: Option<String>,
}

pub const OVERALL_LABEL: &str = "overall";

impl From<&AqiResult> for LongRecord {
    fn from(result: &AqiResult) -> Self {
        Self {
            site_code: result.site_code.clone(),
            period_start: result.period_start,
            period_end: result.period_end,
            pollutant: result.pollutant.to_string(),
            mean_value: result.mean_value,
            coverage_fraction: Some(result.coverage_fraction),
            index_value: result.index_value,
            category: result.category.clone(),
            standard_name: result.standard_name.clone(),
            dominant_pollutant: None,
            unit: Some(result.unit.to_string()),
            min: result.stats.map(|s| s.min),
            p25: result.stats.map(|s| s.p25),
            median: result.stats.map(|s| s.median),
            p75: result.stats.map(|s| s.p75),
            max: result.stats.map(|s| s.max),
            status: result.status,
            reason: result.reason.clone(),
        }
    }
}

impl From<&OverallAqiResult> for LongRecord {
    fn from(result: &OverallAqiResult) -> Self {
        Self {
            site_code: result.site_code.clone(),
            period_start: result.period_start,
            period_end: result.period_end,
            pollutant: OVERALL_LABEL.to_string(),
            mean_value: None,
            coverage_fraction: None,
            index_value: result.overall_index_value,
            category: result.overall_category.clone(),
            standard_name: result.standard_name.clone(),
            dominant_pollutant: result.dominant_pollutant.map(|p| p.to_string()),
            unit: None,
            min: None,
            p25: None,
            median: None,
            p75: None,
            max: None,
            status: result.status,
            reason: result.reason.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideCell {
    pub mean_value: Option<f64>,
    pub index_value: Option<u16>,
    pub category: Option<String>,
}

/// One row of the wide layout: all pollutants of a site and period side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRecord {
    pub site_code: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub cells: BTreeMap<Pollutant, WideCell>,
    pub overall_index_value: Option<u16>,
    pub overall_category: Option<String>,
    pub dominant_pollutant: Option<Pollutant>,
}

/// Result of a summary run, holding both layouts' source rows
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryTable {
    pub standard_name: String,
    pub overall_only: bool,
    pub pollutant_rows: Vec<AqiResult>,
    pub overall_rows: Vec<OverallAqiResult>,
}

impl SummaryTable {
    pub fn new(standard_name: &str, overall_only: bool) -> Self {
        Self {
            standard_name: standard_name.to_string(),
            overall_only,
            pollutant_rows: Vec::new(),
            overall_rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pollutant_rows.is_empty() && self.overall_rows.is_empty()
    }

    /// Append another table's rows and restore the canonical ordering
    pub fn extend(&mut self, other: SummaryTable) {
        self.pollutant_rows.extend(other.pollutant_rows);
        self.overall_rows.extend(other.overall_rows);
        self.sort();
    }

    pub fn sort(&mut self) {
        self.pollutant_rows.sort_by(|a, b| {
            a.site_code
                .cmp(&b.site_code)
                .then_with(|| a.period_start.cmp(&b.period_start))
                .then_with(|| a.pollutant.cmp(&b.pollutant))
        });
        self.overall_rows.sort_by(|a, b| {
            a.site_code
                .cmp(&b.site_code)
                .then_with(|| a.period_start.cmp(&b.period_start))
        });
    }

    /// Pollutants present in the table, in priority order
    pub fn pollutants(&self) -> Vec<Pollutant> {
        self.pollutant_rows
            .iter()
            .map(|r| r.pollutant)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One row per site, period and pollutant, followed by that period's overall row
    pub fn long_records(&self) -> Vec<LongRecord> {
        let mut keyed: Vec<((String, DateTime<Utc>, u8), LongRecord)> = Vec::new();

        if !self.overall_only {
            for row in &self.pollutant_rows {
                keyed.push((
                    (row.site_code.clone(), row.period_start, row.pollutant as u8),
                    LongRecord::from(row),
                ));
            }
        }
        for row in &self.overall_rows {
            keyed.push((
                (row.site_code.clone(), row.period_start, u8::MAX),
                LongRecord::from(row),
            ));
        }

        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.into_iter().map(|(_, record)| record).collect()
    }

    /// One row per site and period with pollutants pivoted into columns
    pub fn wide_records(&self) -> Vec<WideRecord> {
        let mut cells: BTreeMap<(String, DateTime<Utc>), BTreeMap<Pollutant, WideCell>> =
            BTreeMap::new();

        if !self.overall_only {
            for row in &self.pollutant_rows {
                cells
                    .entry((row.site_code.clone(), row.period_start))
                    .or_default()
                    .insert(
                        row.pollutant,
                        WideCell {
                            mean_value: row.mean_value,
                            index_value: row.index_value,
                            category: row.category.clone(),
                        },
                    );
            }
        }

        self.overall_rows
            .iter()
            .map(|overall| WideRecord {
                site_code: overall.site_code.clone(),
                period_start: overall.period_start,
                period_end: overall.period_end,
                cells: cells
                    .remove(&(overall.site_code.clone(), overall.period_start))
                    .unwrap_or_default(),
                overall_index_value: overall.overall_index_value,
                overall_category: overall.overall_category.clone(),
                dominant_pollutant: overall.dominant_pollutant,
            })
            .collect()
    }
}

/// Rolling-window (or NowCast) index for one site, pollutant and hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesRow {
    pub site_code: String,
    pub date_time: DateTime<Utc>,
    pub pollutant: Pollutant,
    pub window: String,
    pub hourly_value: Option<f64>,
    pub window_mean: Option<f64>,
    pub unit: Unit,
    pub coverage_fraction: f64,
    pub index_value: Option<u16>,
    pub category: Option<String>,
    pub standard_name: String,
    pub status: CellStatus,
    pub reason: Option<String>,
}

/// Guideline comparison for one site, pollutant and averaging period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub site_code: String,
    pub pollutant: Pollutant,
    pub target_name: TargetLevel,
    pub averaging: GuidelinePeriod,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub guideline_value: f64,
    pub unit: Unit,
    pub mean_concentration: Option<f64>,
    pub coverage_fraction: f64,
    pub meets_guideline: Option<bool>,
    pub exceedance_ratio: Option<f64>,
    pub highest_target_met: Option<TargetLevel>,
    pub status: CellStatus,
    pub reason: Option<String>,
    pub message: String,
}

impl ComplianceResult {
    pub fn period(&self) -> Period {
        Period::new(self.period_start, self.period_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn result(site: &str, hour: u32, pollutant: Pollutant, index: u16) -> AqiResult {
        AqiResult {
            site_code: site.to_string(),
            period_start: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            period_end: Utc.with_ymd_and_hms(2024, 1, 1, hour + 1, 0, 0).unwrap(),
            pollutant,
            mean_value: Some(index as f64 * 10.0),
            unit: Unit::MicrogramsPerCubicMetre,
            coverage_fraction: 1.0,
            stats: None,
            index_value: Some(index),
            category: Some("Low".to_string()),
            standard_name: "UK_DAQI".to_string(),
            status: CellStatus::Valid,
            reason: None,
        }
    }

    fn overall(site: &str, hour: u32, index: u16, dominant: Pollutant) -> OverallAqiResult {
        OverallAqiResult {
            site_code: site.to_string(),
            period_start: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            period_end: Utc.with_ymd_and_hms(2024, 1, 1, hour + 1, 0, 0).unwrap(),
            overall_index_value: Some(index),
            overall_category: Some("Low".to_string()),
            dominant_pollutant: Some(dominant),
            standard_name: "UK_DAQI".to_string(),
            status: CellStatus::Valid,
            reason: None,
        }
    }

    fn table(overall_only: bool) -> SummaryTable {
        let mut table = SummaryTable::new("UK_DAQI", overall_only);
        table.pollutant_rows = vec![
            result("B", 0, Pollutant::No2, 2),
            result("A", 0, Pollutant::No2, 1),
            result("A", 0, Pollutant::Pm25, 3),
        ];
        table.overall_rows = vec![
            overall("B", 0, 2, Pollutant::No2),
            overall("A", 0, 3, Pollutant::Pm25),
        ];
        table.sort();
        table
    }

    #[test]
    fn test_long_layout_ordering() {
        let records = table(false).long_records();
        let labels: Vec<(String, String)> = records
            .iter()
            .map(|r| (r.site_code.clone(), r.pollutant.clone()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("A".to_string(), "PM2.5".to_string()),
                ("A".to_string(), "NO2".to_string()),
                ("A".to_string(), "overall".to_string()),
                ("B".to_string(), "NO2".to_string()),
                ("B".to_string(), "overall".to_string()),
            ]
        );
        assert_eq!(records[2].dominant_pollutant.as_deref(), Some("PM2.5"));
    }

    #[test]
    fn test_overall_only_suppresses_breakdown() {
        let records = table(true).long_records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.pollutant == OVERALL_LABEL));
        assert!(table(true).wide_records().iter().all(|r| r.cells.is_empty()));
    }

    #[test]
    fn test_wide_layout_keeps_values() {
        let t = table(false);
        let wide = t.wide_records();
        assert_eq!(wide.len(), 2);

        let site_a = &wide[0];
        assert_eq!(site_a.site_code, "A");
        assert_eq!(site_a.cells[&Pollutant::Pm25].index_value, Some(3));
        assert_eq!(site_a.cells[&Pollutant::No2].mean_value, Some(10.0));
        assert_eq!(site_a.overall_index_value, Some(3));
        assert_eq!(t.pollutants(), vec![Pollutant::Pm25, Pollutant::No2]);
    }

    #[test]
    fn test_missing_statuses() {
        assert!(CellStatus::InsufficientCoverage.is_missing());
        assert!(!CellStatus::OffScale.is_missing());
        assert_eq!(CellStatus::ConversionFailed.to_string(), "conversion_failed");
    }
}
