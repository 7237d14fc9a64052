use chrono::{DateTime, Utc};

use crate::processors::temporal_aggregator::HourlySeries;
use crate::standards::NowCastParams;

/// EPA NowCast over a trailing window of hourly means.
///
/// `hourly` is ordered most recent first; `None` marks a missing hour.
pub fn nowcast(hourly: &[Option<f64>], params: &NowCastParams) -> Option<f64> {
    let window = &hourly[..hourly.len().min(params.window_hours)];

    let recent_valid = window
        .iter()
        .take(params.recent_hours)
        .filter(|v| is_valid(v))
        .count();
    if recent_valid < params.min_recent_valid {
        return None;
    }

    let valid: Vec<(usize, f64)> = window
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|c| c.is_finite()).map(|c| (i, c)))
        .collect();

    let c_max = valid.iter().map(|(_, c)| *c).fold(f64::MIN, f64::max);
    let c_min = valid.iter().map(|(_, c)| *c).fold(f64::MAX, f64::min);
    // Kept within [0, 1]; without a positive maximum every hour weighs the same
    let mut weight_factor = if c_max > 0.0 {
        (c_min / c_max).clamp(0.0, 1.0)
    } else {
        1.0
    };
    if let Some(floor) = params.min_weight {
        weight_factor = weight_factor.max(floor);
    }

    // Missing hours drop out of both sums
    let (weighted, total_weight) = valid.iter().fold((0.0, 0.0), |(num, den), (i, c)| {
        let weight = weight_factor.powi(*i as i32);
        (num + weight * c, den + weight)
    });

    (total_weight > 0.0).then(|| weighted / total_weight)
}

fn is_valid(value: &Option<f64>) -> bool {
    matches!(value, Some(c) if c.is_finite())
}

/// NowCast applied along an hourly series
#[derive(Debug, Clone, Copy)]
pub struct NowCastCalculator {
    params: NowCastParams,
}

impl NowCastCalculator {
    pub fn new(params: NowCastParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &NowCastParams {
        &self.params
    }

    pub fn calculate(&self, hourly: &[Option<f64>]) -> Option<f64> {
        nowcast(hourly, &self.params)
    }

    /// One value per hour that received data, paired with the share of valid hours in its window
    pub fn along(&self, series: &HourlySeries) -> Vec<(DateTime<Utc>, Option<f64>, f64)> {
        series
            .labels()
            .map(|label| {
                let window = series.trailing(label, self.params.window_hours);
                let valid = window.iter().filter(|v| is_valid(v)).count();
                let coverage = valid as f64 / self.params.window_hours as f64;
                (label, self.calculate(&window), coverage)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|v| Some(*v)).collect()
    }

    #[test]
    fn test_constant_series() {
        let result = nowcast(&series(&[50.0; 12]), &NowCastParams::particulate()).unwrap();
        assert!((result - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_decreasing_series_weights_recent_hours() {
        // Most recent first: concentrations fell from 120 to 65 over the window
        let values = [
            120.0, 115.0, 110.0, 105.0, 100.0, 95.0, 90.0, 85.0, 80.0, 75.0, 70.0, 65.0,
        ];
        let result = nowcast(&series(&values), &NowCastParams::particulate()).unwrap();

        // c_min / c_max = 65 / 120 = 0.5417, above the 0.5 floor
        let w: f64 = 65.0 / 120.0;
        let mut num = 0.0;
        let mut den = 0.0;
        for (i, c) in values.iter().enumerate() {
            num += w.powi(i as i32) * c;
            den += w.powi(i as i32);
        }
        let expected = num / den;
        assert!((result - expected).abs() < 1e-9);

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        assert!(result > mean);
        assert!((result - 114.13).abs() < 0.01);
    }

    #[test]
    fn test_floor_applies_to_steep_changes() {
        let values = [100.0, 90.0, 80.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0];
        let result = nowcast(&series(&values), &NowCastParams::particulate()).unwrap();

        // Raw ratio 0.2 is raised to the 0.5 floor
        let mut num = 0.0;
        let mut den = 0.0;
        for (i, c) in values.iter().enumerate() {
            num += 0.5f64.powi(i as i32) * c;
            den += 0.5f64.powi(i as i32);
        }
        assert!((result - num / den).abs() < 1e-9);

        // Ozone carries no floor, so older hours count for even less
        let ozone = nowcast(&series(&values), &NowCastParams::ozone()).unwrap();
        assert!(ozone > result);
    }

    #[test]
    fn test_requires_two_of_three_recent_hours() {
        let params = NowCastParams::particulate();
        let values = vec![None, None, Some(50.0), Some(50.0), Some(50.0)];
        assert_eq!(nowcast(&values, &params), None);

        let values = vec![None, Some(40.0), Some(50.0), Some(50.0)];
        assert!(nowcast(&values, &params).is_some());

        let values = vec![Some(f64::NAN), Some(40.0), None, Some(50.0)];
        assert_eq!(nowcast(&values, &params), None);
    }

    #[test]
    fn test_missing_hours_are_not_zero() {
        let params = NowCastParams::particulate();
        let mut values = series(&[30.0; 12]);
        values[5] = None;
        values[9] = None;
        let result = nowcast(&values, &params).unwrap();
        assert!((result - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_zero_series() {
        let params = NowCastParams::particulate();
        assert_eq!(nowcast(&series(&[0.0; 12]), &params), Some(0.0));
    }

    #[test]
    fn test_negative_readings_keep_weights_in_range() {
        let ozone = NowCastParams::ozone();

        // A negative minimum would give a negative weight; it clamps to 0, leaving the latest hour
        let values = series(&[10.0, 12.0, -2.0, 8.0]);
        assert_eq!(nowcast(&values, &ozone), Some(10.0));

        // No positive reading: plain mean
        let result = nowcast(&series(&[-1.0, -3.0, -2.0]), &ozone).unwrap();
        assert!((result + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_calculator_along_series() {
        use chrono::{Duration, TimeZone};

        let start = Utc.with_ymd_and_hms(2024, 7, 4, 0, 0, 0).unwrap();
        let samples: Vec<(DateTime<Utc>, f64)> = (0..4)
            .map(|h| (start + Duration::hours(h), 20.0))
            .collect();
        let series = HourlySeries::from_samples(&samples);
        let calculator = NowCastCalculator::new(NowCastParams::particulate());
        let values = calculator.along(&series);

        assert_eq!(values.len(), 4);
        // The first hour has no earlier hours, so only 1 of the 3 most recent is valid
        assert_eq!(values[0].1, None);
        assert_eq!(values[1].1, Some(20.0));
        assert!((values[3].2 - 4.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_is_truncated() {
        let params = NowCastParams::particulate();
        let mut values = series(&[10.0; 12]);
        values.extend(series(&[1000.0; 12]));
        let result = nowcast(&values, &params).unwrap();
        assert!((result - 10.0).abs() < 1e-9);
    }
}
