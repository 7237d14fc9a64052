use std::collections::BTreeMap;

use crate::error::{AqiError, Result};
use crate::standards::{
    china, eu_caqi, india_naqi, uk_daqi, us_epa, who, GuidelineSet, StandardDefinition,
};

/// Every supported standard, built and validated once at startup.
///
/// The registry is read-only after construction; share it by reference.
#[derive(Debug, Clone)]
pub struct StandardRegistry {
    standards: BTreeMap<&'static str, StandardDefinition>,
    guidelines: GuidelineSet,
}

impl StandardRegistry {
    pub fn new() -> Result<Self> {
        let definitions = [
            uk_daqi::definition()?,
            us_epa::definition()?,
            china::definition()?,
            india_naqi::definition()?,
            eu_caqi::roadside()?,
            eu_caqi::background()?,
            who::definition()?,
        ];

        let standards = definitions
            .into_iter()
            .map(|definition| (definition.key, definition))
            .collect();

        Ok(Self {
            standards,
            guidelines: GuidelineSet::who_2021(),
        })
    }

    /// Look up a standard by key, ignoring case
    pub fn get(&self, name: &str) -> Result<&StandardDefinition> {
        let wanted = name.trim().to_uppercase().replace('-', "_");
        self.standards
            .get(wanted.as_str())
            .ok_or_else(|| AqiError::UnknownStandard {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.standards.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StandardDefinition> {
        self.standards.values()
    }

    pub fn guidelines(&self) -> &GuidelineSet {
        &self.guidelines
    }
}
