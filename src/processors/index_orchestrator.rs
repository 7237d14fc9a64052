use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::error::{AqiError, Result};
use crate::models::aggregate::floor_hour;
use crate::models::{
    validate_measurements, AggregatedValue, AqiResult, CellStatus, Frequency, Measurement,
    OverallAqiResult, Period, Pollutant, SummaryTable, TimeseriesRow, Window,
};
use crate::processors::nowcast::NowCastCalculator;
use crate::processors::temporal_aggregator::HourlySeries;
use crate::processors::{BreakpointInterpolator, ConvertedRows, TemporalAggregator, UnitConverter};
use crate::standards::StandardDefinition;

type SiteSeries<'m> = BTreeMap<(String, Pollutant), Vec<&'m Measurement>>;

/// Index, category and status of one cell
struct Scored {
    index_value: Option<u16>,
    category: Option<String>,
    status: CellStatus,
    reason: Option<String>,
}

/// Drives aggregation and interpolation for one standard
pub struct IndexOrchestrator<'a> {
    standard: &'a StandardDefinition,
    converter: UnitConverter,
    aggregator: TemporalAggregator,
    interpolator: BreakpointInterpolator,
    window: Option<Window>,
}

impl<'a> IndexOrchestrator<'a> {
    pub fn new(standard: &'a StandardDefinition) -> Result<Self> {
        if standard.is_pass_fail() {
            return Err(AqiError::Configuration(format!(
                "{} is a pass/fail guideline standard; use the compliance check instead",
                standard.key
            )));
        }
        Ok(Self {
            standard,
            converter: UnitConverter::default(),
            aggregator: TemporalAggregator::new(standard.min_coverage),
            interpolator: BreakpointInterpolator::new(),
            window: None,
        })
    }

    pub fn with_converter(mut self, converter: UnitConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_min_coverage(mut self, min_coverage: f64) -> Self {
        self.aggregator = TemporalAggregator::new(min_coverage);
        self
    }

    /// Timeseries averaging window for pollutants that publish a table for it
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    pub fn standard(&self) -> &StandardDefinition {
        self.standard
    }

    /// Per-pollutant and overall index for every site and calendar period
    pub fn summarize(
        &self,
        measurements: &[Measurement],
        frequency: Frequency,
        overall_only: bool,
    ) -> Result<SummaryTable> {
        validate_measurements(measurements)?;
        let mut table = SummaryTable::new(self.standard.key, overall_only);
        let groups = self.group(measurements)?;

        let spans = if frequency == Frequency::All {
            site_spans(measurements)
        } else {
            BTreeMap::new()
        };

        for ((site_code, pollutant), rows) in &groups {
            let rule = self.standard.rule(*pollutant)?;
            let ConvertedRows { samples, failure } =
                self.converter.convert_rows(*pollutant, rows, rule.unit);
            let series = HourlySeries::from_samples(&samples);

            let aggregates = match spans.get(site_code.as_str()) {
                Some(span) => vec![self
                    .aggregator
                    .aggregate_within(site_code, *pollutant, &series, *span)],
                None => self.aggregator.aggregate_hourly(
                    site_code,
                    *pollutant,
                    &series,
                    Window::Calendar(frequency),
                )?,
            };
            self.warn_low_coverage(site_code, *pollutant, &aggregates);

            for aggregate in &aggregates {
                let mut result = AqiResult::from_aggregate(aggregate, rule.unit, self.standard.key);
                if failure.is_some() {
                    result.mean_value = None;
                    result.stats = None;
                }
                let scored = self.score(
                    *pollutant,
                    rule.window,
                    result.mean_value,
                    failure.as_deref(),
                    || coverage_reason(aggregate, self.aggregator.min_coverage()),
                )?;
                result.index_value = scored.index_value;
                result.category = scored.category;
                result.status = scored.status;
                result.reason = scored.reason;
                table.pollutant_rows.push(result);
            }
        }

        table.overall_rows = self.overall(&table.pollutant_rows);
        table.sort();
        debug!(
            standard = self.standard.key,
            rows = table.pollutant_rows.len(),
            periods = table.overall_rows.len(),
            "Summary complete"
        );
        Ok(table)
    }

    /// Hourly index along each site's series, using the standard's own averaging windows
    /// unless another window was requested and the pollutant has a table for it
    pub fn timeseries(
        &self,
        measurements: &[Measurement],
        use_nowcast: bool,
    ) -> Result<Vec<TimeseriesRow>> {
        validate_measurements(measurements)?;
        let groups = self.group(measurements)?;
        let mut rows = Vec::new();

        for ((site_code, pollutant), group) in &groups {
            let rule = self.standard.rule(*pollutant)?;
            let window = self
                .window
                .filter(|w| rule.table_for(*w).is_some())
                .unwrap_or(rule.window);
            let ConvertedRows { samples, failure } =
                self.converter.convert_rows(*pollutant, group, rule.unit);
            let series = HourlySeries::from_samples(&samples);

            let (window_label, windowed): (String, Vec<(DateTime<Utc>, Option<f64>, f64, String)>) =
                match rule.nowcast.filter(|_| use_nowcast && window == rule.window) {
                    Some(params) => {
                        let calculator = NowCastCalculator::new(params);
                        let values = calculator
                            .along(&series)
                            .into_iter()
                            .map(|(label, value, coverage)| {
                                let reason = format!(
                                    "NowCast needs {} valid hours among the {} most recent",
                                    params.min_recent_valid, params.recent_hours
                                );
                                (label, value, coverage, reason)
                            })
                            .collect();
                        ("nowcast".to_string(), values)
                    }
                    None => {
                        let aggregates =
                            self.aggregator
                                .aggregate_hourly(site_code, *pollutant, &series, window)?;
                        self.warn_low_coverage(site_code, *pollutant, &aggregates);
                        let values = aggregates
                            .iter()
                            .map(|a| {
                                (
                                    a.period_end,
                                    a.mean_value,
                                    a.coverage_fraction,
                                    coverage_reason(a, self.aggregator.min_coverage()),
                                )
                            })
                            .collect();
                        (window.label(), values)
                    }
                };

            for (label, mean, coverage, missing_reason) in windowed {
                let mean = if failure.is_some() { None } else { mean };
                let scored =
                    self.score(*pollutant, window, mean, failure.as_deref(), || missing_reason)?;
                rows.push(TimeseriesRow {
                    site_code: site_code.clone(),
                    date_time: label,
                    pollutant: *pollutant,
                    window: window_label.clone(),
                    hourly_value: if failure.is_some() {
                        None
                    } else {
                        series.mean_at(label)
                    },
                    window_mean: mean,
                    unit: rule.unit,
                    coverage_fraction: coverage,
                    index_value: scored.index_value,
                    category: scored.category,
                    standard_name: self.standard.key.to_string(),
                    status: scored.status,
                    reason: scored.reason,
                });
            }
        }

        Ok(rows)
    }

    /// Worst-pollutant index per site and period, gated on mandatory pollutants
    pub fn overall(&self, rows: &[AqiResult]) -> Vec<OverallAqiResult> {
        let mut periods: BTreeMap<(String, DateTime<Utc>), Vec<&AqiResult>> = BTreeMap::new();
        for row in rows {
            periods
                .entry((row.site_code.clone(), row.period_start))
                .or_default()
                .push(row);
        }

        periods
            .into_iter()
            .map(|((site_code, period_start), group)| {
                let period_end = group[0].period_end;
                let mut overall = OverallAqiResult {
                    site_code,
                    period_start,
                    period_end,
                    overall_index_value: None,
                    overall_category: None,
                    dominant_pollutant: None,
                    standard_name: self.standard.key.to_string(),
                    status: CellStatus::InsufficientCoverage,
                    reason: None,
                };

                let scored: Vec<(&AqiResult, u16)> = group
                    .iter()
                    .filter_map(|r| r.index_value.map(|index| (*r, index)))
                    .collect();
                if scored.is_empty() {
                    overall.reason = Some("no pollutant produced a valid index".to_string());
                    return overall;
                }

                let present: BTreeSet<Pollutant> = scored.iter().map(|(r, _)| r.pollutant).collect();
                let unmet = self.standard.unmet_mandatory_groups(&present);
                if !unmet.is_empty() {
                    warn!(
                        site = %overall.site_code,
                        period = %Period::new(period_start, period_end),
                        missing = %unmet.join(", "),
                        "Mandatory pollutants missing; overall index withheld"
                    );
                    overall.status = CellStatus::IncompletePollutantSet;
                    overall.reason = Some(format!(
                        "{} needs a valid index for {}",
                        self.standard.key,
                        unmet.join(" and ")
                    ));
                    return overall;
                }

                // Highest index wins; ties go to the higher-priority pollutant
                let (dominant, index) = scored
                    .iter()
                    .copied()
                    .fold(None, |best: Option<(&AqiResult, u16)>, candidate| match best {
                        Some(b) if b.1 > candidate.1 => Some(b),
                        Some(b) if b.1 == candidate.1 && b.0.pollutant < candidate.0.pollutant => {
                            Some(b)
                        }
                        _ => Some(candidate),
                    })
                    .unwrap_or(scored[0]);

                overall.overall_index_value = Some(index);
                overall.overall_category = self.standard.category_for(index).map(String::from);
                overall.dominant_pollutant = Some(dominant.pollutant);
                if dominant.status == CellStatus::OffScale {
                    overall.status = CellStatus::OffScale;
                    overall.reason = dominant.reason.clone();
                } else {
                    overall.status = CellStatus::Valid;
                }
                overall
            })
            .collect()
    }

    fn group<'m>(&self, measurements: &'m [Measurement]) -> Result<SiteSeries<'m>> {
        let mut groups: SiteSeries<'m> = BTreeMap::new();
        let mut unknown: BTreeSet<&str> = BTreeSet::new();
        let mut unsupported: BTreeSet<Pollutant> = BTreeSet::new();

        for measurement in measurements {
            match measurement.pollutant() {
                Some(pollutant) if self.standard.supports(pollutant) => groups
                    .entry((measurement.site_code.clone(), pollutant))
                    .or_default()
                    .push(measurement),
                Some(pollutant) => {
                    unsupported.insert(pollutant);
                }
                None => {
                    unknown.insert(measurement.measurand.as_str());
                }
            }
        }

        if !unknown.is_empty() {
            warn!(measurands = ?unknown, "Skipping unrecognised measurands");
        }
        if !unsupported.is_empty() {
            warn!(
                standard = self.standard.key,
                pollutants = ?unsupported,
                "Skipping pollutants the standard does not define"
            );
        }
        if groups.is_empty() && !measurements.is_empty() {
            return Err(AqiError::Data(format!(
                "No measurements for pollutants supported by {}",
                self.standard.key
            )));
        }
        Ok(groups)
    }

    fn score(
        &self,
        pollutant: Pollutant,
        window: Window,
        mean: Option<f64>,
        failure: Option<&str>,
        missing_reason: impl FnOnce() -> String,
    ) -> Result<Scored> {
        if let Some(reason) = failure {
            return Ok(Scored {
                index_value: None,
                category: None,
                status: CellStatus::ConversionFailed,
                reason: Some(reason.to_string()),
            });
        }

        match mean {
            None => Ok(Scored {
                index_value: None,
                category: None,
                status: CellStatus::InsufficientCoverage,
                reason: Some(missing_reason()),
            }),
            Some(mean) => {
                let reading = self.interpolator.interpolate_for_window(
                    mean,
                    pollutant,
                    self.standard,
                    window,
                )?;
                Ok(Scored {
                    index_value: Some(reading.index_value),
                    category: Some(reading.category.clone()),
                    status: reading.status(),
                    reason: reading.reason(pollutant, self.standard),
                })
            }
        }
    }

    fn warn_low_coverage(&self, site_code: &str, pollutant: Pollutant, aggregates: &[AggregatedValue]) {
        let missing = aggregates.iter().filter(|a| a.is_missing()).count();
        if missing > 0 {
            warn!(
                site = site_code,
                pollutant = %pollutant,
                missing,
                total = aggregates.len(),
                "Periods below the coverage threshold"
            );
        }
    }
}

fn coverage_reason(aggregate: &AggregatedValue, min_coverage: f64) -> String {
    format!(
        "coverage {:.0}% ({} of {} hours) is below the required {:.0}%",
        aggregate.coverage_fraction * 100.0,
        aggregate.valid_samples,
        aggregate.expected_samples,
        min_coverage * 100.0
    )
}

// Whole-span period per site for the `all` frequency
fn site_spans(measurements: &[Measurement]) -> BTreeMap<&str, Period> {
    let mut bounds: BTreeMap<&str, (DateTime<Utc>, DateTime<Utc>)> = BTreeMap::new();
    for m in measurements {
        bounds
            .entry(m.site_code.as_str())
            .and_modify(|(first, last)| {
                *first = (*first).min(m.date_time);
                *last = (*last).max(m.date_time);
            })
            .or_insert((m.date_time, m.date_time));
    }
    bounds
        .into_iter()
        .map(|(site, (first, last))| {
            (site, Period::new(floor_hour(first), floor_hour(last) + Duration::hours(1)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Unit;
    use crate::standards::StandardRegistry;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, h, 0, 0).unwrap()
    }

    fn day(site: &str, d: u32, measurand: &str, value: f64, units: &str) -> Vec<Measurement> {
        (0..24)
            .map(|h| Measurement::new(site, at(d, h), measurand, value, units))
            .collect()
    }

    #[test]
    fn test_pass_fail_standard_is_rejected() {
        let registry = StandardRegistry::new().unwrap();
        let err = IndexOrchestrator::new(registry.get("WHO").unwrap()).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_daily_summary_and_dominant_pollutant() {
        let registry = StandardRegistry::new().unwrap();
        let orchestrator = IndexOrchestrator::new(registry.get("UK_DAQI").unwrap()).unwrap();

        let mut data = day("MY1", 1, "PM2.5", 40.0, "ug/m3");
        data.extend(day("MY1", 1, "NO2", 50.0, "ug/m3"));

        let table = orchestrator.summarize(&data, Frequency::Daily, false).unwrap();
        assert_eq!(table.pollutant_rows.len(), 2);
        assert_eq!(table.overall_rows.len(), 1);

        let pm = &table.pollutant_rows[0];
        assert_eq!(pm.pollutant, Pollutant::Pm25);
        assert_eq!(pm.mean_value, Some(40.0));
        assert_eq!(pm.index_value, Some(4));
        assert_eq!(pm.coverage_fraction, 1.0);

        let overall = &table.overall_rows[0];
        assert_eq!(overall.overall_index_value, Some(4));
        assert_eq!(overall.overall_category.as_deref(), Some("Moderate"));
        assert_eq!(overall.dominant_pollutant, Some(Pollutant::Pm25));
        assert_eq!(overall.period_start, at(1, 0));
        assert_eq!(overall.period_end, at(2, 0));
    }

    #[test]
    fn test_ties_follow_priority_order() {
        let registry = StandardRegistry::new().unwrap();
        let orchestrator = IndexOrchestrator::new(registry.get("UK_DAQI").unwrap()).unwrap();

        // Both land in band 1
        let mut data = day("S", 1, "NO2", 20.0, "ug/m3");
        data.extend(day("S", 1, "PM10", 5.0, "ug/m3"));

        let table = orchestrator.summarize(&data, Frequency::Daily, true).unwrap();
        assert_eq!(table.overall_rows[0].overall_index_value, Some(1));
        assert_eq!(table.overall_rows[0].dominant_pollutant, Some(Pollutant::Pm10));
    }

    #[test]
    fn test_coverage_gap_is_surfaced() {
        let registry = StandardRegistry::new().unwrap();
        let orchestrator = IndexOrchestrator::new(registry.get("UK_DAQI").unwrap()).unwrap();

        let data: Vec<Measurement> = (0..12)
            .map(|h| Measurement::new("S", at(1, h), "no2", 30.0, "ug/m3"))
            .collect();
        let table = orchestrator.summarize(&data, Frequency::Daily, false).unwrap();

        let row = &table.pollutant_rows[0];
        assert_eq!(row.mean_value, None);
        assert_eq!(row.index_value, None);
        assert_eq!(row.coverage_fraction, 0.5);
        assert_eq!(row.status, CellStatus::InsufficientCoverage);
        assert!(row.reason.as_deref().unwrap().contains("50%"));

        assert_eq!(table.overall_rows[0].overall_index_value, None);
        assert_eq!(table.overall_rows[0].status, CellStatus::InsufficientCoverage);
    }

    #[test]
    fn test_conversion_failure_is_isolated() {
        let registry = StandardRegistry::new().unwrap();
        let orchestrator = IndexOrchestrator::new(registry.get("US_EPA").unwrap()).unwrap();

        let mut data = day("S", 1, "PM2.5", 12.0, "ppb");
        data.extend(day("S", 1, "NO2", 40.0, "ppb"));

        let table = orchestrator.summarize(&data, Frequency::Daily, false).unwrap();
        let pm = table
            .pollutant_rows
            .iter()
            .find(|r| r.pollutant == Pollutant::Pm25)
            .unwrap();
        assert_eq!(pm.status, CellStatus::ConversionFailed);
        assert_eq!(pm.mean_value, None);
        assert!(pm.reason.as_deref().unwrap().contains("molecular weight"));

        let no2 = table
            .pollutant_rows
            .iter()
            .find(|r| r.pollutant == Pollutant::No2)
            .unwrap();
        assert_eq!(no2.index_value, Some(38));
        assert_eq!(table.overall_rows[0].dominant_pollutant, Some(Pollutant::No2));
    }

    #[test]
    fn test_units_are_converted_to_table_units() {
        let registry = StandardRegistry::new().unwrap();
        let orchestrator = IndexOrchestrator::new(registry.get("UK_DAQI").unwrap()).unwrap();

        // 150 ppb NO2 is about 282 µg/m³
        let data = day("S", 1, "NO2", 150.0, "ppb");
        let table = orchestrator.summarize(&data, Frequency::Daily, false).unwrap();
        let row = &table.pollutant_rows[0];
        assert_eq!(row.unit, Unit::MicrogramsPerCubicMetre);
        assert!((row.mean_value.unwrap() - 150.0 * 46.01 / 24.45).abs() < 1e-9);
        assert_eq!(row.index_value, Some(5));
    }

    #[test]
    fn test_mandatory_pollutant_gating() {
        let registry = StandardRegistry::new().unwrap();
        let orchestrator =
            IndexOrchestrator::new(registry.get("EU_CAQI_ROADSIDE").unwrap()).unwrap();

        // NO2 alone: no particulate present
        let data = day("S", 1, "NO2", 100.0, "ug/m3");
        let table = orchestrator.summarize(&data, Frequency::Daily, false).unwrap();
        assert_eq!(table.pollutant_rows[0].index_value, Some(3));
        let overall = &table.overall_rows[0];
        assert_eq!(overall.overall_index_value, None);
        assert_eq!(overall.status, CellStatus::IncompletePollutantSet);
        assert!(overall.reason.as_deref().unwrap().contains("PM2.5 or PM10"));

        // Adding PM10 completes the set
        let mut data = day("S", 1, "NO2", 100.0, "ug/m3");
        data.extend(day("S", 1, "PM10", 10.0, "ug/m3"));
        let table = orchestrator.summarize(&data, Frequency::Daily, false).unwrap();
        assert_eq!(table.overall_rows[0].overall_index_value, Some(3));
        assert_eq!(table.overall_rows[0].dominant_pollutant, Some(Pollutant::No2));
    }

    #[test]
    fn test_unsupported_and_unknown_measurands() {
        let registry = StandardRegistry::new().unwrap();
        let orchestrator =
            IndexOrchestrator::new(registry.get("EU_CAQI_ROADSIDE").unwrap()).unwrap();

        let mut data = day("S", 1, "CO", 1.0, "mg/m3");
        data.extend(day("S", 1, "benzene", 1.0, "ug/m3"));
        let err = orchestrator.summarize(&data, Frequency::Daily, false).unwrap_err();
        assert!(err.is_data());

        assert!(orchestrator.summarize(&[], Frequency::Daily, false).unwrap().is_empty());
    }

    #[test]
    fn test_all_frequency_shares_site_span() {
        let registry = StandardRegistry::new().unwrap();
        let orchestrator = IndexOrchestrator::new(registry.get("UK_DAQI").unwrap()).unwrap();

        let mut data = day("S", 1, "NO2", 20.0, "ug/m3");
        data.extend(day("S", 1, "PM10", 20.0, "ug/m3"));
        data.truncate(36);

        let table = orchestrator.summarize(&data, Frequency::All, false).unwrap();
        assert_eq!(table.overall_rows.len(), 1);
        assert!(table
            .pollutant_rows
            .iter()
            .all(|r| r.period_start == at(1, 0) && r.period_end == at(2, 0)));
        let pm10 = table
            .pollutant_rows
            .iter()
            .find(|r| r.pollutant == Pollutant::Pm10)
            .unwrap();
        assert_eq!(pm10.coverage_fraction, 0.5);
    }

    #[test]
    fn test_timeseries_uses_standard_windows() {
        let registry = StandardRegistry::new().unwrap();
        let orchestrator = IndexOrchestrator::new(registry.get("UK_DAQI").unwrap()).unwrap();

        let data = day("S", 1, "O3", 120.0, "ug/m3");
        let rows = orchestrator.timeseries(&data, false).unwrap();
        assert_eq!(rows.len(), 24);
        assert!(rows.iter().all(|r| r.window == "8h"));

        // Five hours of an 8-hour window is not enough
        assert_eq!(rows[4].status, CellStatus::InsufficientCoverage);
        assert_eq!(rows[4].hourly_value, Some(120.0));
        assert_eq!(rows[5].index_value, Some(4));
        assert_eq!(rows[5].date_time, at(1, 6));
    }

    #[test]
    fn test_timeseries_nowcast() {
        let registry = StandardRegistry::new().unwrap();
        let orchestrator = IndexOrchestrator::new(registry.get("US_EPA").unwrap()).unwrap();

        let mut data = day("S", 1, "PM2.5", 12.0, "ug/m3");
        data.extend(day("S", 1, "NO2", 40.0, "ppb"));
        let rows = orchestrator.timeseries(&data, true).unwrap();

        let pm: Vec<&TimeseriesRow> = rows.iter().filter(|r| r.pollutant == Pollutant::Pm25).collect();
        assert!(pm.iter().all(|r| r.window == "nowcast"));
        assert_eq!(pm[0].status, CellStatus::InsufficientCoverage);
        assert_eq!(pm[1].window_mean, Some(12.0));
        assert_eq!(pm[1].index_value, Some(56));

        // NO2 carries no NowCast parameters and keeps its 1-hour window
        let no2 = rows.iter().find(|r| r.pollutant == Pollutant::No2).unwrap();
        assert_eq!(no2.window, "1h");
        assert_eq!(no2.index_value, Some(38));
    }

    #[test]
    fn test_us_epa_ozone_above_eight_hour_table() {
        let registry = StandardRegistry::new().unwrap();
        let orchestrator = IndexOrchestrator::new(registry.get("US_EPA").unwrap()).unwrap();

        let data = day("S", 1, "O3", 0.45, "ppm");
        let table = orchestrator.summarize(&data, Frequency::Daily, false).unwrap();
        let row = &table.pollutant_rows[0];
        assert_eq!(row.index_value, Some(346));
        assert_eq!(row.status, CellStatus::Valid);
        assert_eq!(row.category.as_deref(), Some("Hazardous"));
    }

    #[test]
    fn test_timeseries_window_override() {
        let registry = StandardRegistry::new().unwrap();
        let china = registry.get("CHINA").unwrap();

        let mut data = day("S", 1, "SO2", 150.0, "ug/m3");
        data.extend(day("S", 1, "PM10", 50.0, "ug/m3"));

        let rows = IndexOrchestrator::new(china)
            .unwrap()
            .with_window(Window::OneHour)
            .timeseries(&data, false)
            .unwrap();
        let so2: Vec<&TimeseriesRow> = rows.iter().filter(|r| r.pollutant == Pollutant::So2).collect();
        assert!(so2.iter().all(|r| r.window == "1h"));
        assert_eq!(so2[0].index_value, Some(50));

        // PM10 has no hourly table and keeps its 24-hour window
        let pm10 = rows.iter().find(|r| r.pollutant == Pollutant::Pm10).unwrap();
        assert_eq!(pm10.window, "24h");

        let rows = IndexOrchestrator::new(china).unwrap().timeseries(&data, false).unwrap();
        let so2 = rows.iter().filter(|r| r.pollutant == Pollutant::So2).last().unwrap();
        assert_eq!(so2.window, "24h");
        assert_eq!(so2.index_value, Some(100));
    }
}
