//! US state abbreviation table.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};

/// Default table embedded at compile time
const US_STATES: &str = include_str!("../../config/us_states.yml");

/// Subdivision name -> abbreviation lookup.
///
/// Loaded once at startup from a YAML map of `abbr: Name` and shared by
/// reference afterwards; never mutated.
#[derive(Debug, Clone, Default)]
pub struct StateAbbreviations {
    by_name: HashMap<String, String>,
}

impl StateAbbreviations {
    /// The table shipped with the crate
    pub fn embedded() -> Result<Self> {
        Self::from_yaml(US_STATES)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let table = Self::from_yaml(&content)?;
        info!(
            "Loaded {} state abbreviations from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let by_abbr: BTreeMap<String, String> = serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("invalid state table: {}", e)))?;

        // First abbreviation (alphabetically) wins if a name is listed twice
        let mut by_name = HashMap::with_capacity(by_abbr.len());
        for (abbr, name) in by_abbr {
            by_name.entry(name).or_insert(abbr);
        }
        Ok(Self { by_name })
    }

    /// Abbreviation for a full subdivision name
    pub fn abbreviation(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
