use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AqiError, Result};
use crate::models::Pollutant;

/// Calendar period used to group results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[serde(alias = "h", alias = "H")]
    Hourly,
    #[serde(alias = "d", alias = "D")]
    Daily,
    #[serde(alias = "w", alias = "W")]
    Weekly,
    #[serde(alias = "m", alias = "M")]
    Monthly,
    #[serde(alias = "y", alias = "Y", alias = "annual")]
    Yearly,
    /// The whole span of a site's data
    All,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
            Frequency::All => "all",
        }
    }

    /// Calendar period containing `t`. `All` has no fixed calendar and is resolved by the aggregator.
    pub fn period_of(&self, t: DateTime<Utc>) -> Result<Period> {
        let date = t.date_naive();
        let (start, end) = match self {
            Frequency::Hourly => {
                let start = floor_hour(t);
                (start, start + Duration::hours(1))
            }
            Frequency::Daily => {
                let start = midnight(date)?;
                (start, start + Duration::days(1))
            }
            Frequency::Weekly => {
                let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
                let start = midnight(monday)?;
                (start, start + Duration::days(7))
            }
            Frequency::Monthly => {
                let (next_year, next_month) = if date.month() == 12 {
                    (date.year() + 1, 1)
                } else {
                    (date.year(), date.month() + 1)
                };
                (
                    midnight(ymd(date.year(), date.month(), 1)?)?,
                    midnight(ymd(next_year, next_month, 1)?)?,
                )
            }
            Frequency::Yearly => (
                midnight(ymd(date.year(), 1, 1)?)?,
                midnight(ymd(date.year() + 1, 1, 1)?)?,
            ),
            Frequency::All => {
                return Err(AqiError::Configuration(
                    "the 'all' frequency spans the data and has no calendar period".to_string(),
                ))
            }
        };
        Ok(Period { start, end })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = AqiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hourly" | "h" | "1h" => Ok(Frequency::Hourly),
            "daily" | "d" | "day" => Ok(Frequency::Daily),
            "weekly" | "w" | "week" => Ok(Frequency::Weekly),
            "monthly" | "m" | "month" => Ok(Frequency::Monthly),
            "yearly" | "y" | "year" | "annual" => Ok(Frequency::Yearly),
            "all" | "none" | "total" => Ok(Frequency::All),
            other => Err(AqiError::Configuration(format!(
                "Unknown frequency '{}'. Expected one of: hourly, daily, weekly, monthly, yearly, all",
                other
            ))),
        }
    }
}

/// Averaging window a standard prescribes for a pollutant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Window {
    OneHour,
    EightHourRolling,
    TwentyFourHour,
    Calendar(Frequency),
}

impl Window {
    /// Number of hourly bins in a rolling window
    pub fn rolling_hours(&self) -> Option<u32> {
        match self {
            Window::OneHour => Some(1),
            Window::EightHourRolling => Some(8),
            Window::TwentyFourHour => Some(24),
            Window::Calendar(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Window::OneHour => "1h".to_string(),
            Window::EightHourRolling => "8h".to_string(),
            Window::TwentyFourHour => "24h".to_string(),
            Window::Calendar(frequency) => frequency.to_string(),
        }
    }
}

impl FromStr for Window {
    type Err = AqiError;

    /// Rolling windows only; calendar periods are chosen through `Frequency`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1h" | "1hr" | "hour" | "hourly" => Ok(Window::OneHour),
            "8h" | "8hr" => Ok(Window::EightHourRolling),
            "24h" | "24hr" | "day" | "daily" => Ok(Window::TwentyFourHour),
            other => Err(AqiError::Configuration(format!(
                "Unknown averaging window '{}'. Expected one of: 1h, 8h, 24h",
                other
            ))),
        }
    }
}

/// Left-closed time interval [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }

    pub fn hours(&self) -> i64 {
        (self.end - self.start).num_hours()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Descriptive statistics over the valid hourly means of a period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl SampleStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Some(Self {
            min: sorted[0],
            p25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            p75: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

// Linear interpolation between closest ranks; `sorted` must be non-empty
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedValue {
    pub site_code: String,
    pub pollutant: Pollutant,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// `None` when coverage falls below the required threshold
    pub mean_value: Option<f64>,
    pub coverage_fraction: f64,
    pub valid_samples: usize,
    pub expected_samples: usize,
    pub stats: Option<SampleStats>,
}

impl AggregatedValue {
    pub fn period(&self) -> Period {
        Period::new(self.period_start, self.period_end)
    }

    pub fn is_missing(&self) -> bool {
        self.mean_value.is_none()
    }
}

pub(crate) fn floor_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    let secs = t.timestamp().div_euclid(3600) * 3600;
    DateTime::from_timestamp(secs, 0).unwrap_or(t)
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| AqiError::Data(format!("Date {}-{}-{} is out of range", year, month, day)))
}

fn midnight(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| AqiError::Data(format!("Date {} has no midnight", date)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_calendar_periods() {
        let t = at(2024, 2, 14, 13, 45);

        let hour = Frequency::Hourly.period_of(t).unwrap();
        assert_eq!(hour.start, at(2024, 2, 14, 13, 0));
        assert_eq!(hour.hours(), 1);

        let day = Frequency::Daily.period_of(t).unwrap();
        assert_eq!(day.start, at(2024, 2, 14, 0, 0));
        assert_eq!(day.hours(), 24);

        // 2024-02-14 is a Wednesday
        let week = Frequency::Weekly.period_of(t).unwrap();
        assert_eq!(week.start, at(2024, 2, 12, 0, 0));
        assert_eq!(week.hours(), 168);

        let month = Frequency::Monthly.period_of(t).unwrap();
        assert_eq!(month.start, at(2024, 2, 1, 0, 0));
        assert_eq!(month.hours(), 29 * 24);

        let year = Frequency::Yearly.period_of(t).unwrap();
        assert_eq!(year.hours(), 366 * 24);

        let december = Frequency::Monthly.period_of(at(2023, 12, 31, 23, 59)).unwrap();
        assert_eq!(december.end, at(2024, 1, 1, 0, 0));
    }

    #[test]
    fn test_period_is_left_closed() {
        let day = Frequency::Daily.period_of(at(2024, 1, 1, 0, 0)).unwrap();
        assert!(day.contains(at(2024, 1, 1, 0, 0)));
        assert!(!day.contains(at(2024, 1, 2, 0, 0)));
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("D".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert_eq!("annual".parse::<Frequency>().unwrap(), Frequency::Yearly);
        assert!("fortnightly".parse::<Frequency>().unwrap_err().is_configuration());
        assert!(Frequency::All.period_of(at(2024, 1, 1, 0, 0)).is_err());
    }

    #[test]
    fn test_window_parsing() {
        assert_eq!("1h".parse::<Window>().unwrap(), Window::OneHour);
        assert_eq!("8HR".parse::<Window>().unwrap(), Window::EightHourRolling);
        assert_eq!("daily".parse::<Window>().unwrap(), Window::TwentyFourHour);
        assert!("weekly".parse::<Window>().unwrap_err().is_configuration());
    }

    #[test]
    fn test_sample_stats() {
        let stats = SampleStats::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert!((stats.median - 2.5).abs() < 1e-12);
        assert!((stats.p25 - 1.75).abs() < 1e-12);
        assert!((stats.p75 - 3.25).abs() < 1e-12);
        assert!(SampleStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_floor_hour() {
        assert_eq!(floor_hour(at(2024, 5, 1, 7, 59)), at(2024, 5, 1, 7, 0));
    }
}
