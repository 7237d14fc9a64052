use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::cli::args::{Cli, Commands};
use crate::config::{AnalysisConfig, ConfigOverrides, OutputFormat, ResolvedConfig};
use crate::error::{AqiError, Result};
use crate::models::{ComplianceResult, LongRecord, Measurement, SummaryTable, TimeseriesRow};
use crate::processors::ParallelProcessor;
use crate::readers::MeasurementReader;
use crate::standards::StandardRegistry;
use crate::utils::{init_logging, ProgressReporter};
use crate::writers::{CsvResultWriter, JsonResultWriter, OutputKind, ParquetWriter};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let registry = StandardRegistry::new()?;
    let config = AnalysisConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Summary {
            inputs,
            standard,
            frequency,
            format,
            overall_only,
            output,
            max_workers,
            min_coverage,
        } => {
            let config = config.apply(ConfigOverrides {
                standard,
                frequency,
                overall_only: overall_only.then_some(true),
                format,
                max_workers,
                min_coverage,
                ..Default::default()
            });
            let resolved = config.resolve(&registry)?;
            info!("Summary: {}", resolved.describe());

            let measurements = read_inputs(&inputs).await?;
            let progress = ProgressReporter::sites(0, "Computing summary...", output.is_none());
            let table = processor(&resolved).process_summary(
                resolved.standard,
                &measurements,
                resolved.frequency,
                resolved.overall_only,
                Some(&progress),
            )?;

            match output {
                Some(path) => write_summary(&table, resolved.format, &path)?,
                None => print_summary(&table),
            }
        }

        Commands::Timeseries {
            inputs,
            standard,
            nowcast,
            window,
            output,
            max_workers,
        } => {
            let config = config.apply(ConfigOverrides {
                standard,
                nowcast: nowcast.then_some(true),
                window,
                max_workers,
                ..Default::default()
            });
            let resolved = config.resolve(&registry)?;
            info!(
                nowcast = resolved.nowcast,
                window = ?resolved.window,
                "Timeseries: {}",
                resolved.describe()
            );

            let measurements = read_inputs(&inputs).await?;
            let progress = ProgressReporter::sites(0, "Computing timeseries...", output.is_none());
            let rows = processor(&resolved).process_timeseries(
                resolved.standard,
                &measurements,
                resolved.nowcast,
                Some(&progress),
            )?;

            match output {
                Some(path) => write_timeseries(&rows, &path)?,
                None => print_timeseries(&rows),
            }
        }

        Commands::Compliance {
            inputs,
            target,
            averaging,
            output,
            max_workers,
            min_coverage,
        } => {
            let config = config.apply(ConfigOverrides {
                target,
                averaging,
                max_workers,
                min_coverage,
                ..Default::default()
            });
            let resolved = config.resolve(&registry)?;
            info!(
                guideline_target = %resolved.target,
                averaging = %resolved
                    .averaging
                    .map_or_else(|| "per pollutant".to_string(), |a| a.to_string()),
                "Checking WHO guideline compliance"
            );

            let measurements = read_inputs(&inputs).await?;
            let progress = ProgressReporter::sites(0, "Checking compliance...", output.is_none());
            let results = processor(&resolved).process_compliance(
                registry.guidelines(),
                &measurements,
                resolved.target,
                resolved.averaging,
                Some(&progress),
            )?;

            match output {
                Some(path) => write_compliance(&results, &path)?,
                None => print_compliance(&results),
            }
        }

        Commands::Standards => print_standards(&registry),
    }

    Ok(())
}

async fn read_inputs(inputs: &[PathBuf]) -> Result<Vec<Measurement>> {
    let progress = ProgressReporter::spinner("Reading measurements...", false);
    let measurements = MeasurementReader::new().read_many(inputs).await?;
    progress.finish_with_message(&format!(
        "Read {} measurements from {} file(s)",
        measurements.len(),
        inputs.len()
    ));
    if measurements.is_empty() {
        warn!("Input files contain no measurements");
    }
    Ok(measurements)
}

fn processor(resolved: &ResolvedConfig<'_>) -> ParallelProcessor {
    let mut processor =
        ParallelProcessor::new(resolved.max_workers).with_converter(resolved.converter);
    if let Some(min_coverage) = resolved.min_coverage {
        processor = processor.with_min_coverage(min_coverage);
    }
    if let Some(window) = resolved.window {
        processor = processor.with_window(window);
    }
    processor
}

fn output_kind(path: &Path) -> Result<OutputKind> {
    OutputKind::from_path(path).ok_or_else(|| {
        AqiError::Configuration(format!(
            "Cannot infer output format from '{}'; use .csv, .json or .parquet",
            path.display()
        ))
    })
}

fn prepare_output(path: &Path) -> Result<OutputKind> {
    let kind = output_kind(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(kind)
}

pub fn write_summary(table: &SummaryTable, format: OutputFormat, path: &Path) -> Result<()> {
    let kind = prepare_output(path)?;
    match (format, kind) {
        (OutputFormat::Long, OutputKind::Csv) => {
            CsvResultWriter::new().write_rows(&table.long_records(), path)?
        }
        (OutputFormat::Long, OutputKind::Json) => {
            JsonResultWriter::new().write_rows(&table.long_records(), path)?
        }
        (OutputFormat::Long, OutputKind::Parquet) => {
            let writer = ParquetWriter::new();
            writer.write_long(&table.long_records(), path)?;
            println!("{}", writer.get_file_info(path)?.summary());
        }
        (OutputFormat::Wide, OutputKind::Csv) => {
            CsvResultWriter::new().write_wide(&table.wide_records(), &table.pollutants(), path)?
        }
        (OutputFormat::Wide, OutputKind::Json) => {
            JsonResultWriter::new().write_rows(&table.wide_records(), path)?
        }
        (OutputFormat::Wide, OutputKind::Parquet) => {
            return Err(AqiError::Configuration(
                "The wide layout is available as CSV or JSON; use the long layout for Parquet"
                    .to_string(),
            ))
        }
    }
    println!(
        "Wrote {} period(s) for {} to {}",
        table.overall_rows.len(),
        table.standard_name,
        path.display()
    );
    Ok(())
}

pub fn write_timeseries(rows: &[TimeseriesRow], path: &Path) -> Result<()> {
    match prepare_output(path)? {
        OutputKind::Csv => CsvResultWriter::new().write_rows(rows, path)?,
        OutputKind::Json => JsonResultWriter::new().write_rows(rows, path)?,
        OutputKind::Parquet => ParquetWriter::new().write_timeseries(rows, path)?,
    }
    println!("Wrote {} timeseries rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_compliance(results: &[ComplianceResult], path: &Path) -> Result<()> {
    match prepare_output(path)? {
        OutputKind::Csv => CsvResultWriter::new().write_rows(results, path)?,
        OutputKind::Json => JsonResultWriter::new().write_rows(results, path)?,
        OutputKind::Parquet => ParquetWriter::new().write_compliance(results, path)?,
    }
    println!("Wrote {} compliance results to {}", results.len(), path.display());
    Ok(())
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_summary(table: &SummaryTable) {
    if table.is_empty() {
        println!("No results");
        return;
    }
    println!("Standard: {}", table.standard_name);
    println!(
        "{:<8} {:<10} {:<8} {:>10} {:>6} {:<22} {:<24}",
        "Site", "Period", "Pollutant", "Mean", "Index", "Category", "Status"
    );
    for record in table.long_records() {
        print_long_record(&record);
    }
}

fn print_long_record(record: &LongRecord) {
    println!(
        "{:<8} {:<10} {:<8} {:>10} {:>6} {:<22} {:<24}",
        record.site_code,
        record.period_start.format("%Y-%m-%d"),
        record.pollutant,
        cell(record.mean_value.map(|v| format!("{:.1}", v))),
        cell(record.index_value),
        record.category.as_deref().unwrap_or("-"),
        record.status
    );
}

fn print_timeseries(rows: &[TimeseriesRow]) {
    println!(
        "{:<8} {:<17} {:<8} {:<8} {:>10} {:>6} {:<22}",
        "Site", "Hour", "Pollutant", "Window", "Mean", "Index", "Category"
    );
    for row in rows {
        println!(
            "{:<8} {:<17} {:<8} {:<8} {:>10} {:>6} {:<22}",
            row.site_code,
            row.date_time.format("%Y-%m-%d %H:%M"),
            row.pollutant,
            row.window,
            cell(row.window_mean.map(|v| format!("{:.1}", v))),
            cell(row.index_value),
            row.category.as_deref().unwrap_or("-")
        );
    }
}

fn print_compliance(results: &[ComplianceResult]) {
    if results.is_empty() {
        println!("No guideline comparisons were possible");
        return;
    }
    for result in results {
        println!(
            "{} {} {} {}: {}",
            result.site_code,
            result.pollutant,
            result.averaging,
            result.period_start.format("%Y-%m-%d"),
            result.message
        );
    }
    let failing = results
        .iter()
        .filter(|r| r.meets_guideline == Some(false))
        .count();
    println!(
        "\n{} of {} comparisons exceed the guideline",
        failing,
        results.len()
    );
}

fn print_standards(registry: &StandardRegistry) {
    for standard in registry.iter() {
        let pollutants: Vec<&str> = standard.pollutants.keys().map(|p| p.as_str()).collect();
        println!(
            "{:<14} {} ({}), scale {}",
            standard.key,
            standard.name,
            standard.region,
            standard.scale.describe()
        );
        println!("{:<14} pollutants: {}", "", pollutants.join(", "));
    }
}
