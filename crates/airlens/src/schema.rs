//! Schema resolution: mapping logical concepts onto real column names.
//!
//! Datasets spell the same variable many ways (`PM2.5`, `pm2_5`, ` pm25 `).
//! An [`AliasSet`] lists the spellings of one concept and [`resolve`] finds
//! the column that matches, comparing names case-insensitively after trimming
//! surrounding whitespace. Matching is exact after normalization; there is no
//! substring or fuzzy matching.
//!
//! When several aliases could match different columns, the column that comes
//! first in the table wins, regardless of the order of the aliases.

use crate::error::{AnalysisError, Result};
use once_cell::sync::Lazy;
use polars::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A logical variable of the air-quality dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concept {
    Pm25,
    Pm10,
    Humidity,
    /// Air-quality category, usually an ordinal encoded 0-3.
    Target,
    PopulationDensity,
    CarbonMonoxide,
}

impl Concept {
    pub const ALL: [Concept; 6] = [
        Concept::Pm25,
        Concept::Pm10,
        Concept::Humidity,
        Concept::Target,
        Concept::PopulationDensity,
        Concept::CarbonMonoxide,
    ];

    /// Human-readable label used in reports and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Concept::Pm25 => "PM2.5",
            Concept::Pm10 => "PM10",
            Concept::Humidity => "Humidity",
            Concept::Target => "Air quality",
            Concept::PopulationDensity => "Population density",
            Concept::CarbonMonoxide => "CO",
        }
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered candidate spellings for one concept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasSet(Vec<String>);

impl AliasSet {
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(aliases.into_iter().map(Into::into).collect())
    }

    pub fn aliases(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check whether a column name matches any alias after normalization.
    pub fn matches(&self, column_name: &str) -> bool {
        let normalized = normalize(column_name);
        self.0.iter().any(|alias| normalize(alias) == normalized)
    }
}

impl<S: Into<String>> FromIterator<S> for AliasSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Alias sets for every known concept.
///
/// Deserializing overlays the given entries on the default table, so a
/// config only lists the concepts it changes. An empty list disables a
/// concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AliasTable(BTreeMap<Concept, AliasSet>);

impl<'de> Deserialize<'de> for AliasTable {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let overrides = BTreeMap::<Concept, AliasSet>::deserialize(deserializer)?;
        let mut table = AliasTable::default();
        for (concept, aliases) in overrides {
            table.set(concept, aliases);
        }
        Ok(table)
    }
}

static DEFAULT_ALIASES: Lazy<AliasTable> = Lazy::new(|| {
    let mut table = BTreeMap::new();
    table.insert(Concept::Pm25, AliasSet::new(["pm2.5", "pm2_5", "pm25"]));
    table.insert(Concept::Pm10, AliasSet::new(["pm10", "pm_10"]));
    table.insert(
        Concept::Humidity,
        AliasSet::new(["humidity", "humidité", "humidite", "hum"]),
    );
    table.insert(
        Concept::Target,
        AliasSet::new([
            "airquality",
            "qualite_de_l'air",
            "qualite_air",
            "quality",
            "variable_cible",
            "target",
        ]),
    );
    table.insert(
        Concept::PopulationDensity,
        AliasSet::new([
            "population_density",
            "densite_de_population",
            "densite(hab/km2)",
            "densite_hab_km2",
        ]),
    );
    table.insert(
        Concept::CarbonMonoxide,
        AliasSet::new(["co", "monoxyde_de_carbone"]),
    );
    AliasTable(table)
});

impl Default for AliasTable {
    fn default() -> Self {
        DEFAULT_ALIASES.clone()
    }
}

impl AliasTable {
    /// An alias table with no entries.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Alias set for a concept. Concepts without an entry have an empty set.
    pub fn get(&self, concept: Concept) -> Option<&AliasSet> {
        self.0.get(&concept)
    }

    /// Replace the alias set of a concept.
    pub fn set(&mut self, concept: Concept, aliases: AliasSet) {
        self.0.insert(concept, aliases);
    }

    /// Builder-style variant of [`AliasTable::set`].
    pub fn with(mut self, concept: Concept, aliases: AliasSet) -> Self {
        self.set(concept, aliases);
        self
    }
}

/// Normalize a column name or alias for comparison.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Find the first table column whose normalized name matches any alias.
///
/// Returns the column name exactly as stored in the frame.
pub fn resolve(df: &DataFrame, aliases: &AliasSet) -> Option<String> {
    if aliases.is_empty() {
        return None;
    }

    df.get_column_names()
        .into_iter()
        .find(|name| aliases.matches(name.as_str()))
        .map(|name| name.to_string())
}

/// Resolve a concept through an alias table.
pub fn resolve_concept(df: &DataFrame, table: &AliasTable, concept: Concept) -> Option<String> {
    table.get(concept).and_then(|aliases| resolve(df, aliases))
}

/// Resolve a concept, turning a miss into [`AnalysisError::UnresolvedColumn`].
pub fn require_concept(df: &DataFrame, table: &AliasTable, concept: Concept) -> Result<String> {
    resolve_concept(df, table, concept)
        .ok_or_else(|| AnalysisError::UnresolvedColumn(concept.label().to_string()))
}
