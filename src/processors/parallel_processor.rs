use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

use crate::error::{AqiError, Result};
use crate::models::{
    validate_measurements, ComplianceResult, Frequency, Measurement, SummaryTable, TimeseriesRow,
    Window,
};
use crate::processors::{ComplianceChecker, IndexOrchestrator, UnitConverter};
use crate::standards::{GuidelinePeriod, GuidelineSet, StandardDefinition, TargetLevel};
use crate::utils::progress::ProgressReporter;

/// Runs the per-site computations on a bounded rayon pool
pub struct ParallelProcessor {
    max_workers: usize,
    min_coverage: Option<f64>,
    converter: UnitConverter,
    window: Option<Window>,
}

impl ParallelProcessor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            min_coverage: None,
            converter: UnitConverter::default(),
            window: None,
        }
    }

    pub fn with_min_coverage(mut self, min_coverage: f64) -> Self {
        self.min_coverage = Some(min_coverage);
        self
    }

    pub fn with_converter(mut self, converter: UnitConverter) -> Self {
        self.converter = converter;
        self
    }

    /// Timeseries window for pollutants whose standard publishes a table for it
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Summary table for every site, merged in site order
    pub fn process_summary(
        &self,
        standard: &StandardDefinition,
        measurements: &[Measurement],
        frequency: Frequency,
        overall_only: bool,
        progress: Option<&ProgressReporter>,
    ) -> Result<SummaryTable> {
        let orchestrator = self.orchestrator(standard)?;
        let sites = self.partition(measurements, |m| {
            m.pollutant().is_some_and(|p| standard.supports(p))
        })?;
        if sites.is_empty() {
            return if measurements.is_empty() {
                Ok(SummaryTable::new(standard.key, overall_only))
            } else {
                Err(AqiError::Data(format!(
                    "No measurements for pollutants supported by {}",
                    standard.key
                )))
            };
        }

        let tables = self.run(&sites, progress, |rows| {
            orchestrator.summarize(rows, frequency, overall_only)
        })?;

        let mut merged = SummaryTable::new(standard.key, overall_only);
        for table in tables {
            merged.extend(table);
        }
        info!(
            standard = standard.key,
            sites = sites.len(),
            periods = merged.overall_rows.len(),
            "Summary computed"
        );
        Ok(merged)
    }

    pub fn process_timeseries(
        &self,
        standard: &StandardDefinition,
        measurements: &[Measurement],
        use_nowcast: bool,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<TimeseriesRow>> {
        let orchestrator = self.orchestrator(standard)?;
        let sites = self.partition(measurements, |m| {
            m.pollutant().is_some_and(|p| standard.supports(p))
        })?;
        if sites.is_empty() && !measurements.is_empty() {
            return Err(AqiError::Data(format!(
                "No measurements for pollutants supported by {}",
                standard.key
            )));
        }

        let mut rows: Vec<TimeseriesRow> = self
            .run(&sites, progress, |rows| orchestrator.timeseries(rows, use_nowcast))?
            .into_iter()
            .flatten()
            .collect();

        // Sort by site, pollutant and hour
        rows.sort_by(|a, b| {
            a.site_code
                .cmp(&b.site_code)
                .then_with(|| a.pollutant.cmp(&b.pollutant))
                .then_with(|| a.date_time.cmp(&b.date_time))
        });
        info!(standard = standard.key, rows = rows.len(), "Timeseries computed");
        Ok(rows)
    }

    pub fn process_compliance(
        &self,
        guidelines: &GuidelineSet,
        measurements: &[Measurement],
        target: TargetLevel,
        averaging: Option<GuidelinePeriod>,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<ComplianceResult>> {
        let mut checker = ComplianceChecker::new(guidelines).with_converter(self.converter);
        if let Some(min_coverage) = self.min_coverage {
            checker = checker.with_min_coverage(min_coverage);
        }
        let sites = self.partition(measurements, |m| {
            m.pollutant().is_some_and(|p| guidelines.supports(p))
        })?;
        if sites.is_empty() && !measurements.is_empty() {
            return Err(AqiError::Data(
                "No measurements for pollutants covered by the WHO guidelines".to_string(),
            ));
        }

        let mut results: Vec<ComplianceResult> = self
            .run(&sites, progress, |rows| {
                checker.check_compliance(rows, target, averaging)
            })?
            .into_iter()
            .flatten()
            .collect();

        results.sort_by(|a, b| {
            a.site_code
                .cmp(&b.site_code)
                .then_with(|| a.pollutant.cmp(&b.pollutant))
                .then_with(|| a.period_start.cmp(&b.period_start))
        });
        info!(guideline_target = %target, results = results.len(), "Compliance computed");
        Ok(results)
    }

    fn orchestrator<'s>(&self, standard: &'s StandardDefinition) -> Result<IndexOrchestrator<'s>> {
        let mut orchestrator = IndexOrchestrator::new(standard)?.with_converter(self.converter);
        if let Some(min_coverage) = self.min_coverage {
            orchestrator = orchestrator.with_min_coverage(min_coverage);
        }
        if let Some(window) = self.window {
            orchestrator = orchestrator.with_window(window);
        }
        Ok(orchestrator)
    }

    /// Split rows by site, keeping only sites with at least one usable row
    fn partition<F>(&self, measurements: &[Measurement], usable: F) -> Result<Vec<(String, Vec<Measurement>)>>
    where
        F: Fn(&Measurement) -> bool,
    {
        validate_measurements(measurements)?;

        let mut by_site: BTreeMap<&str, Vec<Measurement>> = BTreeMap::new();
        for measurement in measurements {
            by_site
                .entry(measurement.site_code.as_str())
                .or_default()
                .push(measurement.clone());
        }

        Ok(by_site
            .into_iter()
            .filter(|(site, rows)| {
                let keep = rows.iter().any(&usable);
                if !keep {
                    debug!(site = *site, "No usable pollutants; skipping site");
                }
                keep
            })
            .map(|(site, rows)| (site.to_string(), rows))
            .collect())
    }

    fn run<T, F>(
        &self,
        sites: &[(String, Vec<Measurement>)],
        progress: Option<&ProgressReporter>,
        task: F,
    ) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&[Measurement]) -> Result<T> + Sync + Send,
    {
        let processed_count = AtomicUsize::new(0);

        if let Some(p) = progress {
            p.set_length(sites.len() as u64);
            p.set_message(&format!("Processing {} sites...", sites.len()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| AqiError::Configuration(format!("Cannot build worker pool: {}", e)))?;

        let results: Result<Vec<T>> = pool.install(|| {
            sites
                .par_iter()
                .map(|(site, rows)| {
                    debug!(site = %site, rows = rows.len(), "Processing site");
                    let result = task(rows);

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.update(count as u64);
                    }
                    result
                })
                .collect()
        });

        if let Some(p) = progress {
            p.finish_with_message(&format!("Processed {} sites", sites.len()));
        }
        results
    }
}

impl Default for ParallelProcessor {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pollutant;
    use crate::standards::StandardRegistry;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn dataset() -> Vec<Measurement> {
        let start: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let mut rows = Vec::new();
        for (s, site) in ["MY1", "KC1", "BL0", "HK6"].iter().enumerate() {
            for h in 0..72 {
                let t = start + Duration::hours(h);
                let wobble = ((h * 7 + s as i64 * 3) % 11) as f64;
                rows.push(Measurement::new(*site, t, "NO2", 30.0 + wobble * 4.0, "ug/m3"));
                rows.push(Measurement::new(*site, t, "PM2.5", 8.0 + wobble, "ug/m3"));
                rows.push(Measurement::new(*site, t, "O3", 40.0 + wobble * 3.0, "ppb"));
            }
        }
        rows.push(Measurement::new("XX9", start, "benzene", 1.0, "ug/m3"));
        rows
    }

    #[test]
    fn test_parallel_summary_matches_sequential() {
        let registry = StandardRegistry::new().unwrap();
        let standard = registry.get("UK_DAQI").unwrap();
        let data = dataset();

        let sequential = IndexOrchestrator::new(standard)
            .unwrap()
            .summarize(&data, Frequency::Daily, false)
            .unwrap();
        let parallel = ParallelProcessor::new(3)
            .process_summary(standard, &data, Frequency::Daily, false, None)
            .unwrap();

        assert_eq!(parallel, sequential);
        assert_eq!(parallel.overall_rows.len(), 4 * 3);
    }

    #[test]
    fn test_parallel_timeseries_matches_sequential() {
        let registry = StandardRegistry::new().unwrap();
        let standard = registry.get("US_EPA").unwrap();
        let data = dataset();

        let sequential = IndexOrchestrator::new(standard)
            .unwrap()
            .timeseries(&data, true)
            .unwrap();
        let parallel = ParallelProcessor::new(2)
            .process_timeseries(standard, &data, true, None)
            .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_parallel_compliance_matches_sequential() {
        let registry = StandardRegistry::new().unwrap();
        let data = dataset();

        let sequential = ComplianceChecker::new(registry.guidelines())
            .check_compliance(&data, TargetLevel::It1, Some(GuidelinePeriod::Daily))
            .unwrap();
        let parallel = ParallelProcessor::default()
            .process_compliance(
                registry.guidelines(),
                &data,
                TargetLevel::It1,
                Some(GuidelinePeriod::Daily),
                None,
            )
            .unwrap();
        assert_eq!(parallel, sequential);
        assert!(!parallel.is_empty());
    }

    #[test]
    fn test_pass_fail_standard_and_empty_input() {
        let registry = StandardRegistry::new().unwrap();
        let processor = ParallelProcessor::new(1);

        let err = processor
            .process_summary(registry.get("WHO").unwrap(), &dataset(), Frequency::Daily, false, None)
            .unwrap_err();
        assert!(err.is_configuration());

        let table = processor
            .process_summary(registry.get("CHINA").unwrap(), &[], Frequency::Daily, false, None)
            .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_min_coverage_override() {
        let registry = StandardRegistry::new().unwrap();
        let standard = registry.get("UK_DAQI").unwrap();
        let data: Vec<Measurement> = dataset().into_iter().take(30).collect();

        let strict = ParallelProcessor::new(2)
            .process_summary(standard, &data, Frequency::Daily, false, None)
            .unwrap();
        assert!(strict.pollutant_rows.iter().all(|r| r.mean_value.is_none()));

        let relaxed = ParallelProcessor::new(2)
            .with_min_coverage(0.0)
            .process_summary(standard, &data, Frequency::Daily, false, None)
            .unwrap();
        assert!(relaxed.pollutant_rows.iter().all(|r| r.mean_value.is_some()));
    }

    #[test]
    fn test_window_override() {
        let registry = StandardRegistry::new().unwrap();
        let china = registry.get("CHINA").unwrap();

        let rows = ParallelProcessor::new(2)
            .with_window(Window::OneHour)
            .process_timeseries(china, &dataset(), false, None)
            .unwrap();
        let no2: Vec<&TimeseriesRow> = rows.iter().filter(|r| r.pollutant == Pollutant::No2).collect();
        assert_eq!(no2.len(), 4 * 72);
        assert!(no2.iter().all(|r| r.window == "1h" && r.index_value.is_some()));
        assert!(rows
            .iter()
            .filter(|r| r.pollutant == Pollutant::Pm25)
            .all(|r| r.window == "24h"));
    }
}
