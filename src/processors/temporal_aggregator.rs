use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::aggregate::floor_hour;
use crate::models::{
    AggregatedValue, Frequency, Measurement, Period, Pollutant, SampleStats, Window,
};
use crate::utils::constants::DEFAULT_MIN_COVERAGE;

#[derive(Debug, Clone, Copy, Default)]
struct HourBin {
    sum: f64,
    valid: usize,
}

impl HourBin {
    fn mean(&self) -> Option<f64> {
        (self.valid > 0).then(|| self.sum / self.valid as f64)
    }
}

/// Hourly means keyed by bin label; the bin labelled T holds instants in [T - 1h, T)
#[derive(Debug, Clone, Default)]
pub struct HourlySeries {
    bins: BTreeMap<DateTime<Utc>, HourBin>,
}

impl HourlySeries {
    pub fn from_samples(samples: &[(DateTime<Utc>, f64)]) -> Self {
        let mut bins: BTreeMap<DateTime<Utc>, HourBin> = BTreeMap::new();
        for &(date_time, value) in samples {
            let label = floor_hour(date_time) + Duration::hours(1);
            let bin = bins.entry(label).or_default();
            if value.is_finite() {
                bin.sum += value;
                bin.valid += 1;
            }
        }
        Self { bins }
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Labels of every hour that received at least one row
    pub fn labels(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.bins.keys().copied()
    }

    pub fn mean_at(&self, label: DateTime<Utc>) -> Option<f64> {
        self.bins.get(&label).and_then(HourBin::mean)
    }

    /// The `hours` bins ending at `label`, most recent first, `None` where missing
    pub fn trailing(&self, label: DateTime<Utc>, hours: usize) -> Vec<Option<f64>> {
        (0..hours)
            .map(|k| self.mean_at(label - Duration::hours(k as i64)))
            .collect()
    }

    fn first_label(&self) -> Option<DateTime<Utc>> {
        self.bins.keys().next().copied()
    }

    fn last_label(&self) -> Option<DateTime<Utc>> {
        self.bins.keys().next_back().copied()
    }
}

/// Produces window averages with coverage gating
#[derive(Debug, Clone, Copy)]
pub struct TemporalAggregator {
    min_coverage: f64,
}

impl TemporalAggregator {
    pub fn new(min_coverage: f64) -> Self {
        Self { min_coverage }
    }

    pub fn min_coverage(&self) -> f64 {
        self.min_coverage
    }

    /// Aggregate one pollutant's raw values per site, without unit conversion
    pub fn aggregate(
        &self,
        measurements: &[Measurement],
        pollutant: Pollutant,
        window: Window,
    ) -> Result<Vec<AggregatedValue>> {
        let mut by_site: BTreeMap<&str, Vec<(DateTime<Utc>, f64)>> = BTreeMap::new();
        for measurement in measurements {
            if measurement.pollutant() == Some(pollutant) {
                by_site
                    .entry(measurement.site_code.as_str())
                    .or_default()
                    .push((measurement.date_time, measurement.value));
            }
        }

        let mut aggregates = Vec::new();
        for (site_code, samples) in by_site {
            aggregates.extend(self.aggregate_series(site_code, pollutant, &samples, window)?);
        }
        Ok(aggregates)
    }

    pub fn aggregate_series(
        &self,
        site_code: &str,
        pollutant: Pollutant,
        samples: &[(DateTime<Utc>, f64)],
        window: Window,
    ) -> Result<Vec<AggregatedValue>> {
        let series = HourlySeries::from_samples(samples);
        self.aggregate_hourly(site_code, pollutant, &series, window)
    }

    pub fn aggregate_hourly(
        &self,
        site_code: &str,
        pollutant: Pollutant,
        series: &HourlySeries,
        window: Window,
    ) -> Result<Vec<AggregatedValue>> {
        match window {
            Window::Calendar(frequency) => self.calendar(site_code, pollutant, series, frequency),
            rolling => {
                let hours = rolling.rolling_hours().unwrap_or(1) as usize;
                Ok(self.rolling(site_code, pollutant, series, hours))
            }
        }
    }

    fn rolling(
        &self,
        site_code: &str,
        pollutant: Pollutant,
        series: &HourlySeries,
        hours: usize,
    ) -> Vec<AggregatedValue> {
        series
            .labels()
            .map(|label| {
                let values: Vec<f64> = series.trailing(label, hours).into_iter().flatten().collect();
                self.gated(
                    site_code,
                    pollutant,
                    Period::new(label - Duration::hours(hours as i64), label),
                    &values,
                    hours,
                    false,
                )
            })
            .collect()
    }

    fn calendar(
        &self,
        site_code: &str,
        pollutant: Pollutant,
        series: &HourlySeries,
        frequency: Frequency,
    ) -> Result<Vec<AggregatedValue>> {
        let mut periods: BTreeMap<Period, Vec<f64>> = BTreeMap::new();

        if frequency == Frequency::All {
            if let (Some(first), Some(last)) = (series.first_label(), series.last_label()) {
                let period = Period::new(first - Duration::hours(1), last);
                periods.insert(period, series.labels().filter_map(|l| series.mean_at(l)).collect());
            }
        } else {
            for label in series.labels() {
                let period = frequency.period_of(label - Duration::hours(1))?;
                let values = periods.entry(period).or_default();
                if let Some(mean) = series.mean_at(label) {
                    values.push(mean);
                }
            }
        }

        Ok(periods
            .into_iter()
            .map(|(period, values)| {
                let expected = period.hours().max(1) as usize;
                self.gated(site_code, pollutant, period, &values, expected, true)
            })
            .collect())
    }

    /// Aggregate every hour of `series` that falls inside a fixed period
    pub fn aggregate_within(
        &self,
        site_code: &str,
        pollutant: Pollutant,
        series: &HourlySeries,
        period: Period,
    ) -> AggregatedValue {
        let values: Vec<f64> = series
            .labels()
            .filter(|label| period.contains(*label - Duration::hours(1)))
            .filter_map(|label| series.mean_at(label))
            .collect();
        let expected = period.hours().max(1) as usize;
        self.gated(site_code, pollutant, period, &values, expected, true)
    }

    /// Daily maximum of rolling means, one value per UTC day
    pub fn daily_maximum(&self, rolling: &[AggregatedValue]) -> Result<Vec<AggregatedValue>> {
        let mut days: BTreeMap<(String, Period), (Pollutant, Vec<f64>)> = BTreeMap::new();
        for value in rolling {
            let day = Frequency::Daily.period_of(value.period_end - Duration::hours(1))?;
            let entry = days
                .entry((value.site_code.clone(), day))
                .or_insert_with(|| (value.pollutant, Vec::new()));
            if let Some(mean) = value.mean_value {
                entry.1.push(mean);
            }
        }

        Ok(days
            .into_iter()
            .map(|((site_code, day), (pollutant, means))| {
                let coverage = means.len() as f64 / 24.0;
                let max = means.iter().copied().fold(None, |acc: Option<f64>, v| {
                    Some(acc.map_or(v, |a| a.max(v)))
                });
                AggregatedValue {
                    site_code,
                    pollutant,
                    period_start: day.start,
                    period_end: day.end,
                    mean_value: max.filter(|_| coverage >= self.min_coverage),
                    coverage_fraction: coverage.min(1.0),
                    valid_samples: means.len(),
                    expected_samples: 24,
                    stats: None,
                }
            })
            .collect())
    }

    fn gated(
        &self,
        site_code: &str,
        pollutant: Pollutant,
        period: Period,
        values: &[f64],
        expected: usize,
        with_stats: bool,
    ) -> AggregatedValue {
        let coverage = (values.len() as f64 / expected as f64).min(1.0);
        let mean = if values.is_empty() || coverage < self.min_coverage {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        };

        AggregatedValue {
            site_code: site_code.to_string(),
            pollutant,
            period_start: period.start,
            period_end: period.end,
            mean_value: mean,
            coverage_fraction: coverage,
            valid_samples: values.len(),
            expected_samples: expected,
            stats: if with_stats && mean.is_some() {
                SampleStats::from_values(values)
            } else {
                None
            },
        }
    }
}

impl Default for TemporalAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_COVERAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap()
    }

    fn hourly(start: DateTime<Utc>, values: &[f64]) -> Vec<(DateTime<Utc>, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Duration::hours(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_bins_are_left_closed() {
        let samples = vec![
            (at(1, 10), 10.0),
            (at(1, 10) + Duration::minutes(59), 20.0),
            (at(1, 11), 40.0),
        ];
        let series = HourlySeries::from_samples(&samples);
        assert_eq!(series.len(), 2);
        assert_eq!(series.mean_at(at(1, 11)), Some(15.0));
        assert_eq!(series.mean_at(at(1, 12)), Some(40.0));
    }

    #[test]
    fn test_nan_rows_keep_their_hour() {
        let series = HourlySeries::from_samples(&[(at(1, 0), f64::NAN)]);
        assert_eq!(series.len(), 1);
        assert_eq!(series.mean_at(at(1, 1)), None);
    }

    #[test]
    fn test_half_coverage_reports_missing_not_zero() {
        let aggregator = TemporalAggregator::default();
        let values = [10.0, f64::NAN, 12.0, f64::NAN, 14.0, f64::NAN, 16.0, f64::NAN];
        let result = aggregator
            .aggregate_series("S1", Pollutant::O3, &hourly(at(1, 0), &values), Window::EightHourRolling)
            .unwrap();

        let last = result.last().unwrap();
        assert_eq!(last.coverage_fraction, 0.5);
        assert_eq!(last.mean_value, None);
        assert_eq!(last.period_end, at(1, 8));
        assert_eq!(last.period_start, at(1, 0));
        // Every hour with rows still appears
        assert_eq!(result.len(), 8);
    }

    #[test]
    fn test_rolling_window_at_threshold() {
        let aggregator = TemporalAggregator::default();
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let result = aggregator
            .aggregate_series("S1", Pollutant::O3, &hourly(at(1, 0), &values), Window::EightHourRolling)
            .unwrap();

        // Six of eight hours is exactly 75%
        let last = result.last().unwrap();
        assert_eq!(last.coverage_fraction, 0.75);
        assert_eq!(last.mean_value, Some(3.5));
        assert!(result[4].mean_value.is_none());
    }

    #[test]
    fn test_no_extrapolation_into_empty_hours() {
        let aggregator = TemporalAggregator::default();
        let samples = vec![(at(1, 0), 5.0), (at(1, 5), 7.0)];
        let result = aggregator
            .aggregate_series("S1", Pollutant::No2, &samples, Window::OneHour)
            .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|r| r.coverage_fraction == 1.0));
    }

    #[test]
    fn test_daily_calendar_coverage() {
        let aggregator = TemporalAggregator::default();
        let mut values = vec![20.0; 24];
        for v in values.iter_mut().take(8) {
            *v = f64::NAN;
        }
        let samples = hourly(at(1, 0), &values);
        let mut more = hourly(at(2, 0), &[30.0; 24]);
        let mut all = samples.clone();
        all.append(&mut more);

        let result = aggregator
            .aggregate_series("S1", Pollutant::Pm10, &all, Window::Calendar(Frequency::Daily))
            .unwrap();
        assert_eq!(result.len(), 2);

        assert_eq!(result[0].period_start, at(1, 0));
        assert!((result[0].coverage_fraction - 16.0 / 24.0).abs() < 1e-12);
        assert!(result[0].mean_value.is_none());

        assert_eq!(result[1].mean_value, Some(30.0));
        assert_eq!(result[1].valid_samples, 24);
        assert_eq!(result[1].stats.unwrap().median, 30.0);
    }

    #[test]
    fn test_all_frequency_spans_data() {
        let aggregator = TemporalAggregator::default();
        let samples = hourly(at(1, 6), &[1.0, 2.0, 3.0, 4.0]);
        let result = aggregator
            .aggregate_series("S1", Pollutant::Pm25, &samples, Window::Calendar(Frequency::All))
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].period_start, at(1, 6));
        assert_eq!(result[0].period_end, at(1, 10));
        assert_eq!(result[0].mean_value, Some(2.5));
    }

    #[test]
    fn test_aggregate_filters_pollutant_and_site() {
        let aggregator = TemporalAggregator::default();
        let measurements = vec![
            Measurement::new("A", at(1, 0), "no2", 10.0, "ug/m3"),
            Measurement::new("B", at(1, 0), "NO2", 30.0, "ug/m3"),
            Measurement::new("A", at(1, 0), "o3", 99.0, "ug/m3"),
        ];
        let result = aggregator
            .aggregate(&measurements, Pollutant::No2, Window::OneHour)
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].site_code, "A");
        assert_eq!(result[0].mean_value, Some(10.0));
        assert_eq!(result[1].mean_value, Some(30.0));
    }

    #[test]
    fn test_daily_maximum() {
        let aggregator = TemporalAggregator::default();
        let values: Vec<f64> = (0..24).map(|h| h as f64).collect();
        let rolling = aggregator
            .aggregate_series("S1", Pollutant::O3, &hourly(at(1, 0), &values), Window::EightHourRolling)
            .unwrap();
        let daily = aggregator.daily_maximum(&rolling).unwrap();

        assert_eq!(daily.len(), 1);
        // Windows ending at 06:00 and later have 6+ valid hours: 19 of 24
        assert!((daily[0].coverage_fraction - 19.0 / 24.0).abs() < 1e-12);
        assert_eq!(daily[0].mean_value, Some(19.5));
    }
}
