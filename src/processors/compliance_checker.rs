use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::error::{AqiError, Result};
use crate::models::{
    validate_measurements, AggregatedValue, CellStatus, ComplianceResult, Frequency, Measurement,
    Pollutant, Unit, Window,
};
use crate::processors::temporal_aggregator::HourlySeries;
use crate::processors::{ConvertedRows, TemporalAggregator, UnitConverter};
use crate::standards::{GuidelinePeriod, GuidelineSet, TargetLevel};

/// Compares aggregated concentrations against guideline targets
pub struct ComplianceChecker<'a> {
    guidelines: &'a GuidelineSet,
    converter: UnitConverter,
    aggregator: TemporalAggregator,
}

impl<'a> ComplianceChecker<'a> {
    pub fn new(guidelines: &'a GuidelineSet) -> Self {
        Self {
            guidelines,
            converter: UnitConverter::default(),
            aggregator: TemporalAggregator::default(),
        }
    }

    pub fn with_converter(mut self, converter: UnitConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_min_coverage(mut self, min_coverage: f64) -> Self {
        self.aggregator = TemporalAggregator::new(min_coverage);
        self
    }

    /// One result per site, pollutant and averaging period.
    ///
    /// `averaging` overrides each pollutant's default period; pollutants without a
    /// guideline for the requested period and target are skipped.
    pub fn check_compliance(
        &self,
        measurements: &[Measurement],
        target: TargetLevel,
        averaging: Option<GuidelinePeriod>,
    ) -> Result<Vec<ComplianceResult>> {
        validate_measurements(measurements)?;

        let mut groups: BTreeMap<(String, Pollutant), Vec<&Measurement>> = BTreeMap::new();
        let mut skipped: BTreeSet<String> = BTreeSet::new();
        for measurement in measurements {
            match measurement.pollutant() {
                Some(pollutant) if self.guidelines.supports(pollutant) => groups
                    .entry((measurement.site_code.clone(), pollutant))
                    .or_default()
                    .push(measurement),
                _ => {
                    skipped.insert(measurement.measurand.clone());
                }
            }
        }
        if !skipped.is_empty() {
            warn!(measurands = ?skipped, "Skipping measurands without WHO guidelines");
        }
        if groups.is_empty() && !measurements.is_empty() {
            return Err(AqiError::Data(
                "No measurements for pollutants covered by the WHO guidelines".to_string(),
            ));
        }

        let mut results = Vec::new();
        for ((site_code, pollutant), rows) in &groups {
            let Some(period) = averaging.or_else(|| self.guidelines.default_period(*pollutant)) else {
                continue;
            };
            let Some(guideline_value) = self.guidelines.value(*pollutant, period, target) else {
                debug!(
                    pollutant = %pollutant,
                    averaging = %period,
                    guideline_target = %target,
                    "No guideline value; skipping"
                );
                continue;
            };
            let unit = self
                .guidelines
                .unit(*pollutant)
                .unwrap_or(Unit::MicrogramsPerCubicMetre);

            let ConvertedRows { samples, failure } =
                self.converter.convert_rows(*pollutant, rows, unit);
            let series = HourlySeries::from_samples(&samples);
            let aggregates = self.aggregate_for(site_code, *pollutant, &series, period)?;

            for aggregate in &aggregates {
                results.push(self.compare(
                    aggregate,
                    target,
                    period,
                    guideline_value,
                    unit,
                    failure.as_deref(),
                ));
            }
        }

        let failing = results
            .iter()
            .filter(|r| r.meets_guideline == Some(false))
            .count();
        debug!(results = results.len(), failing, guideline_target = %target, "Compliance check complete");
        Ok(results)
    }

    fn aggregate_for(
        &self,
        site_code: &str,
        pollutant: Pollutant,
        series: &HourlySeries,
        period: GuidelinePeriod,
    ) -> Result<Vec<AggregatedValue>> {
        let aggregator = &self.aggregator;
        match period {
            GuidelinePeriod::Annual => aggregator.aggregate_hourly(
                site_code,
                pollutant,
                series,
                Window::Calendar(Frequency::Yearly),
            ),
            GuidelinePeriod::Daily => aggregator.aggregate_hourly(
                site_code,
                pollutant,
                series,
                Window::Calendar(Frequency::Daily),
            ),
            GuidelinePeriod::EightHour => {
                let rolling = aggregator.aggregate_hourly(
                    site_code,
                    pollutant,
                    series,
                    Window::EightHourRolling,
                )?;
                aggregator.daily_maximum(&rolling)
            }
            GuidelinePeriod::OneHour => {
                aggregator.aggregate_hourly(site_code, pollutant, series, Window::OneHour)
            }
        }
    }

    fn compare(
        &self,
        aggregate: &AggregatedValue,
        target: TargetLevel,
        period: GuidelinePeriod,
        guideline_value: f64,
        unit: Unit,
        failure: Option<&str>,
    ) -> ComplianceResult {
        let pollutant = aggregate.pollutant;
        let mut result = ComplianceResult {
            site_code: aggregate.site_code.clone(),
            pollutant,
            target_name: target,
            averaging: period,
            period_start: aggregate.period_start,
            period_end: aggregate.period_end,
            guideline_value,
            unit,
            mean_concentration: None,
            coverage_fraction: aggregate.coverage_fraction,
            meets_guideline: None,
            exceedance_ratio: None,
            highest_target_met: None,
            status: CellStatus::Valid,
            reason: None,
            message: String::new(),
        };

        if let Some(reason) = failure {
            result.status = CellStatus::ConversionFailed;
            result.reason = Some(reason.to_string());
            result.message = format!("{} could not be compared with the WHO {} guideline: {}", pollutant, target, reason);
            return result;
        }

        let Some(mean) = aggregate.mean_value else {
            let reason = format!(
                "coverage {:.0}% ({} of {} samples) is below the required {:.0}%",
                aggregate.coverage_fraction * 100.0,
                aggregate.valid_samples,
                aggregate.expected_samples,
                self.aggregator.min_coverage() * 100.0
            );
            result.status = CellStatus::InsufficientCoverage;
            result.message = format!("{} {} average unavailable: {}", pollutant, period, reason);
            result.reason = Some(reason);
            return result;
        };

        result.mean_concentration = Some(mean);
        result.highest_target_met = self.guidelines.highest_met_target(pollutant, period, mean);
        if let Some(check) = self.guidelines.evaluate(pollutant, period, target, mean) {
            result.meets_guideline = Some(check.meets_guideline);
            result.exceedance_ratio = Some(check.exceedance_ratio);
            result.message = check.message;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn hours(site: &str, start: DateTime<Utc>, n: i64, measurand: &str, value: f64, units: &str) -> Vec<Measurement> {
        (0..n)
            .map(|h| Measurement::new(site, start + Duration::hours(h), measurand, value, units))
            .collect()
    }

    fn jan(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_annual_mean_at_guideline_meets() {
        let guidelines = GuidelineSet::who_2021();
        let checker = ComplianceChecker::new(&guidelines);
        let data = hours("S", jan(1), 365 * 24, "NO2", 10.0, "ug/m3");

        let results = checker.check_compliance(&data, TargetLevel::Aqg, None).unwrap();
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.averaging, GuidelinePeriod::Annual);
        assert_eq!(result.mean_concentration, Some(10.0));
        assert_eq!(result.meets_guideline, Some(true));
        assert_eq!(result.exceedance_ratio, Some(1.0));
        assert_eq!(result.highest_target_met, Some(TargetLevel::Aqg));
        assert_eq!(result.coverage_fraction, 1.0);
        assert_eq!(result.period_start, jan(1));
        assert!(result.message.contains("meets"));
    }

    #[test]
    fn test_stricter_target_changes_threshold_only() {
        let guidelines = GuidelineSet::who_2021();
        let checker = ComplianceChecker::new(&guidelines);
        let data = hours("S", jan(1), 24, "NO2", 30.0, "ug/m3");

        let lenient = checker
            .check_compliance(&data, TargetLevel::It1, Some(GuidelinePeriod::Daily))
            .unwrap();
        let strict = checker
            .check_compliance(&data, TargetLevel::Aqg, Some(GuidelinePeriod::Daily))
            .unwrap();

        assert_eq!(lenient[0].mean_concentration, strict[0].mean_concentration);
        assert_eq!(lenient[0].guideline_value, 120.0);
        assert_eq!(lenient[0].meets_guideline, Some(true));

        assert_eq!(strict[0].guideline_value, 25.0);
        assert_eq!(strict[0].meets_guideline, Some(false));
        assert!((strict[0].exceedance_ratio.unwrap() - 1.2).abs() < 1e-12);
        assert!(strict[0].message.ends_with("by 20%."));
        assert_eq!(strict[0].highest_target_met, Some(TargetLevel::It3));
    }

    #[test]
    fn test_co_is_compared_in_mg() {
        let guidelines = GuidelineSet::who_2021();
        let checker = ComplianceChecker::new(&guidelines);
        let data = hours("S", jan(1), 24, "CO", 2.0, "ppm");

        let results = checker.check_compliance(&data, TargetLevel::Aqg, None).unwrap();
        let result = &results[0];
        assert_eq!(result.unit, Unit::MilligramsPerCubicMetre);
        assert_eq!(result.averaging, GuidelinePeriod::Daily);
        assert!((result.mean_concentration.unwrap() - 2.0 * 28.01 / 24.45).abs() < 1e-9);
        assert_eq!(result.meets_guideline, Some(true));
    }

    #[test]
    fn test_ozone_uses_daily_maximum_eight_hour_mean() {
        let guidelines = GuidelineSet::who_2021();
        let checker = ComplianceChecker::new(&guidelines);
        let data = hours("S", jan(1), 24, "O3", 120.0, "ug/m3");

        let results = checker.check_compliance(&data, TargetLevel::Aqg, None).unwrap();
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.averaging, GuidelinePeriod::EightHour);
        assert_eq!(result.mean_concentration, Some(120.0));
        assert_eq!(result.meets_guideline, Some(false));
        assert_eq!(result.highest_target_met, Some(TargetLevel::It2));
        assert!((result.coverage_fraction - 19.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_low_coverage_leaves_comparison_empty() {
        let guidelines = GuidelineSet::who_2021();
        let checker = ComplianceChecker::new(&guidelines);
        let data = hours("S", jan(1), 12, "PM2.5", 80.0, "ug/m3");

        let results = checker
            .check_compliance(&data, TargetLevel::Aqg, Some(GuidelinePeriod::Daily))
            .unwrap();
        let result = &results[0];
        assert_eq!(result.status, CellStatus::InsufficientCoverage);
        assert_eq!(result.mean_concentration, None);
        assert_eq!(result.meets_guideline, None);
        assert_eq!(result.exceedance_ratio, None);
        assert_eq!(result.highest_target_met, None);
        assert!(result.reason.is_some());
    }

    #[test]
    fn test_missing_target_is_skipped() {
        let guidelines = GuidelineSet::who_2021();
        let checker = ComplianceChecker::new(&guidelines);
        let mut data = hours("S", jan(1), 24, "O3", 50.0, "ug/m3");
        data.extend(hours("S", jan(1), 24, "PM2.5", 20.0, "ug/m3"));

        // O3 has no IT-4 value and no 24h guideline
        let results = checker
            .check_compliance(&data, TargetLevel::It4, Some(GuidelinePeriod::Daily))
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].pollutant, Pollutant::Pm25);
        assert_eq!(results[0].guideline_value, 25.0);
        assert_eq!(results[0].meets_guideline, Some(true));
    }

    #[test]
    fn test_conversion_failure_and_unusable_input() {
        let guidelines = GuidelineSet::who_2021();
        let checker = ComplianceChecker::new(&guidelines);

        let data = hours("S", jan(1), 24, "PM10", 20.0, "ppb");
        let results = checker
            .check_compliance(&data, TargetLevel::Aqg, Some(GuidelinePeriod::Daily))
            .unwrap();
        assert_eq!(results[0].status, CellStatus::ConversionFailed);
        assert_eq!(results[0].meets_guideline, None);

        let data = hours("S", jan(1), 24, "benzene", 2.0, "ug/m3");
        assert!(checker
            .check_compliance(&data, TargetLevel::Aqg, None)
            .unwrap_err()
            .is_data());
    }
}
