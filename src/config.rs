//! Layered analysis settings: built-in defaults, an optional TOML/JSON file,
//! `AQI_*` environment variables, then command-line overrides.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::Result;
use crate::models::{Frequency, Window};
use crate::processors::UnitConverter;
use crate::standards::{GuidelinePeriod, StandardDefinition, StandardRegistry, TargetLevel};
use crate::utils::constants::{
    DEFAULT_STANDARD, DEFAULT_TARGET, ENV_PREFIX, MOLAR_VOLUME_25C,
};

/// Summary table layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Long,
    Wide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnalysisConfig {
    #[validate(length(min = 1))]
    pub standard: String,
    pub frequency: String,
    pub overall_only: bool,
    pub format: OutputFormat,
    #[validate(length(min = 1))]
    pub target: String,
    pub averaging: Option<String>,
    /// Falls back to the standard's own threshold when unset
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_coverage: Option<f64>,
    #[validate(range(min = 1))]
    pub max_workers: usize,
    pub nowcast: bool,
    /// Timeseries window for pollutants that publish a table for it
    pub window: Option<String>,
    #[validate(range(min = 20.0, max = 30.0))]
    pub molar_volume: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            standard: DEFAULT_STANDARD.to_string(),
            frequency: Frequency::Daily.to_string(),
            overall_only: false,
            format: OutputFormat::Long,
            target: DEFAULT_TARGET.to_string(),
            averaging: None,
            min_coverage: None,
            max_workers: num_cpus::get(),
            nowcast: false,
            window: None,
            molar_volume: MOLAR_VOLUME_25C,
        }
    }
}

/// Command-line values that take precedence over every other source
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub standard: Option<String>,
    pub frequency: Option<String>,
    pub overall_only: Option<bool>,
    pub format: Option<OutputFormat>,
    pub target: Option<String>,
    pub averaging: Option<String>,
    pub min_coverage: Option<f64>,
    pub max_workers: Option<usize>,
    pub nowcast: Option<bool>,
    pub window: Option<String>,
}

/// Settings checked against the registry and parsed into domain types
#[derive(Debug, Clone)]
pub struct ResolvedConfig<'r> {
    pub standard: &'r StandardDefinition,
    pub frequency: Frequency,
    pub overall_only: bool,
    pub format: OutputFormat,
    pub target: TargetLevel,
    pub averaging: Option<GuidelinePeriod>,
    pub min_coverage: Option<f64>,
    pub max_workers: usize,
    pub nowcast: bool,
    pub window: Option<Window>,
    pub converter: UnitConverter,
}

impl AnalysisConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: AnalysisConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(standard) = overrides.standard {
            self.standard = standard;
        }
        if let Some(frequency) = overrides.frequency {
            self.frequency = frequency;
        }
        if let Some(overall_only) = overrides.overall_only {
            self.overall_only = overall_only;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if let Some(target) = overrides.target {
            self.target = target;
        }
        if overrides.averaging.is_some() {
            self.averaging = overrides.averaging;
        }
        if overrides.min_coverage.is_some() {
            self.min_coverage = overrides.min_coverage;
        }
        if let Some(max_workers) = overrides.max_workers {
            self.max_workers = max_workers;
        }
        if let Some(nowcast) = overrides.nowcast {
            self.nowcast = nowcast;
        }
        if overrides.window.is_some() {
            self.window = overrides.window;
        }
        self
    }

    /// Unknown names fail here rather than falling back to a default
    pub fn resolve<'r>(&self, registry: &'r StandardRegistry) -> Result<ResolvedConfig<'r>> {
        self.validate()?;

        let averaging = self
            .averaging
            .as_deref()
            .map(str::parse::<GuidelinePeriod>)
            .transpose()?;
        let window = self.window.as_deref().map(str::parse::<Window>).transpose()?;

        Ok(ResolvedConfig {
            standard: registry.get(&self.standard)?,
            frequency: self.frequency.parse()?,
            overall_only: self.overall_only,
            format: self.format,
            target: self.target.parse()?,
            averaging,
            min_coverage: self.min_coverage,
            max_workers: self.max_workers,
            nowcast: self.nowcast,
            window,
            converter: UnitConverter::with_molar_volume(self.molar_volume),
        })
    }
}

impl ResolvedConfig<'_> {
    pub fn describe(&self) -> String {
        format!(
            "{} ({}), {} periods, minimum coverage {:.0}%",
            self.standard.name,
            self.standard.key,
            self.frequency,
            self.min_coverage.unwrap_or(self.standard.min_coverage) * 100.0
        )
    }
}
