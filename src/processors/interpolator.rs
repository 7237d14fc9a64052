use serde::Serialize;

use crate::error::{AqiError, Result};
use crate::models::{CellStatus, Pollutant, Window};
use crate::standards::{Breakpoint, BreakpointTable, Location, StandardDefinition};

/// Index value and category for one concentration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexReading {
    /// Concentration after the standard's rounding rule
    pub concentration: f64,
    pub index_value: u16,
    pub category: String,
    pub off_scale: bool,
    pub clipped_below: bool,
}

impl IndexReading {
    pub fn status(&self) -> CellStatus {
        if self.off_scale {
            CellStatus::OffScale
        } else if self.clipped_below {
            CellStatus::BelowRange
        } else {
            CellStatus::Valid
        }
    }

    pub fn reason(&self, pollutant: Pollutant, standard: &StandardDefinition) -> Option<String> {
        if self.off_scale {
            Some(format!(
                "{} concentration {} is above the highest {} breakpoint; reported at ceiling index {}",
                pollutant, self.concentration, standard.key, self.index_value
            ))
        } else if self.clipped_below {
            Some(format!(
                "{} concentration {} is below the lowest {} breakpoint; clipped to index {}",
                pollutant, self.concentration, standard.key, self.index_value
            ))
        } else {
            None
        }
    }
}

/// Maps averaged concentrations onto a standard's breakpoint tables
#[derive(Debug, Clone, Copy, Default)]
pub struct BreakpointInterpolator;

impl BreakpointInterpolator {
    pub fn new() -> Self {
        Self
    }

    /// `concentration` must already be in the unit of the standard's table.
    ///
    /// Alternate tables that apply automatically at this concentration are read as
    /// well and the higher index wins. The result is off scale only when every table
    /// read was exceeded.
    pub fn interpolate(
        &self,
        concentration: f64,
        pollutant: Pollutant,
        standard: &StandardDefinition,
    ) -> Result<IndexReading> {
        check_finite(concentration, pollutant)?;
        let rule = standard.rule(pollutant)?;
        let mut reading = self.read_table(concentration, &rule.table, standard)?;

        for alternate in &rule.alternates {
            let quantised = standard.rounding.apply(concentration, alternate.table.decimals());
            if !alternate.applies_to(quantised) {
                continue;
            }
            let candidate = self.read_table(concentration, &alternate.table, standard)?;
            let off_scale = reading.off_scale && candidate.off_scale;
            if candidate.index_value > reading.index_value {
                reading = candidate;
            }
            reading.off_scale = off_scale;
        }
        Ok(reading)
    }

    /// Read the table published for `window` rather than the pollutant's main one.
    ///
    /// Upper-range tables hand concentrations below their first row back to the
    /// main table.
    pub fn interpolate_for_window(
        &self,
        concentration: f64,
        pollutant: Pollutant,
        standard: &StandardDefinition,
        window: Window,
    ) -> Result<IndexReading> {
        let rule = standard.rule(pollutant)?;
        if window == rule.window {
            return self.interpolate(concentration, pollutant, standard);
        }
        check_finite(concentration, pollutant)?;

        let table = rule.table_for(window).ok_or_else(|| {
            AqiError::Configuration(format!(
                "{} publishes no {} table for {}",
                standard.key,
                window.label(),
                pollutant
            ))
        })?;
        let reading = self.read_table(concentration, table, standard)?;
        if reading.clipped_below && table.is_upper_range() {
            return self.read_table(concentration, &rule.table, standard);
        }
        Ok(reading)
    }

    fn read_table(
        &self,
        concentration: f64,
        table: &BreakpointTable,
        standard: &StandardDefinition,
    ) -> Result<IndexReading> {
        let quantised = standard.rounding.apply(concentration, table.decimals());

        let (raw_index, off_scale, clipped_below) = match table.locate(quantised) {
            Location::Row(i) => (linear(&table.rows()[i], quantised), false, false),
            Location::Below => (table.floor_index() as f64, false, true),
            Location::Above => (table.ceiling_index() as f64, true, false),
        };

        let index_value = raw_index
            .round()
            .clamp(table.floor_index() as f64, table.ceiling_index() as f64)
            as u16;

        let category = standard.category_for(index_value).ok_or_else(|| {
            AqiError::Configuration(format!(
                "{} has no category band for index {}",
                standard.key, index_value
            ))
        })?;

        Ok(IndexReading {
            concentration: quantised,
            index_value,
            category: category.to_string(),
            off_scale,
            clipped_below,
        })
    }
}

fn check_finite(concentration: f64, pollutant: Pollutant) -> Result<()> {
    if concentration.is_finite() {
        Ok(())
    } else {
        Err(AqiError::Data(format!(
            "{} concentration {} is not a finite number",
            pollutant, concentration
        )))
    }
}

// Exact at both ends of the row
fn linear(row: &Breakpoint, c: f64) -> f64 {
    if row.index_low == row.index_high || c <= row.conc_low {
        return row.index_low as f64;
    }
    if c >= row.conc_high {
        return row.index_high as f64;
    }
    let (il, ih) = (row.index_low as f64, row.index_high as f64);
    (ih - il) / (row.conc_high - row.conc_low) * (c - row.conc_low) + il
}
