//! Fuel-category catalogue.
//!
//! Upstream price exports name every commercial fuel product separately
//! ("Gasolio Premium", "V-Power Diesel", ...). The catalogue folds those names
//! into the handful of main categories users filter by.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const BUILTIN: &[(&str, &[&str])] = &[
    (
        "Benzina",
        &[
            "Benzina",
            "Benzina speciale",
            "Benzina 100 ottani",
            "Benzina 102 Ottani",
            "Benzina Plus 98",
            "Benzina Speciale 98 Ottani",
            "Benzina Energy 98 ottani",
            "Benzina Shell V Power",
            "Benzina WR 100",
            "Blue Super",
            "Verde speciale",
            "F-101",
            "F101",
            "V-Power",
        ],
    ),
    (
        "Gasolio",
        &[
            "Gasolio",
            "Gasolio Alpino",
            "Gasolio Artico",
            "Gasolio speciale",
            "Gasolio Artico Igloo",
            "Gasolio Ecoplus",
            "Gasolio Energy D",
            "Gasolio Gelo",
            "Gasolio Oro Diesel",
            "Gasolio Plus",
            "Gasolio Premium",
            "Gasolio Prestazionale",
            "Gasolio artico",
            "Blu Diesel Alpino",
            "Blue Diesel",
            "Diesel Shell V Power",
            "DieselMax",
            "E-DIESEL",
            "Excellium Diesel",
            "Excellium diesel",
            "GP DIESEL",
            "Hi-Q Diesel",
            "HiQ Perform+",
            "S-Diesel",
            "Supreme Diesel",
            "V-Power Diesel",
        ],
    ),
    (
        "Gasolio HVO",
        &[
            "HVO",
            "HVO100",
            "HVOlution",
            "HVOvolution",
            "Diesel HVO",
            "Diesel HVO Energy",
            "Gasolio Bio HVO",
            "Gasolio HVO",
            "HVO Future",
            "HVO eco diesel",
            "REHVO",
            "BCHVO",
        ],
    ),
    ("GPL", &["GPL"]),
    ("Metano", &["Metano", "L-GNC"]),
    ("GNL", &["GNL"]),
];

/// One main category and the raw product names folded into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CategoriesFile {
    categories: Vec<CategoryDefinition>,
}

/// Lookup table from raw fuel product name to main category.
#[derive(Debug, Clone)]
pub struct CategoryCatalogue {
    definitions: Vec<CategoryDefinition>,
    by_alias: HashMap<String, usize>,
}

impl Default for CategoryCatalogue {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryCatalogue {
    /// The catalogue for the Italian MIMIT price export.
    #[must_use]
    pub fn builtin() -> Self {
        let definitions = BUILTIN
            .iter()
            .map(|(name, aliases)| CategoryDefinition {
                name: (*name).to_string(),
                aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
            })
            .collect();
        Self::from_definitions(definitions)
    }

    fn from_definitions(definitions: Vec<CategoryDefinition>) -> Self {
        let mut by_alias = HashMap::new();
        for (idx, def) in definitions.iter().enumerate() {
            by_alias.entry(def.name.clone()).or_insert(idx);
            for alias in &def.aliases {
                by_alias.entry(alias.clone()).or_insert(idx);
            }
        }
        Self {
            definitions,
            by_alias,
        }
    }

    /// Main category for a raw product name.
    ///
    /// Matching is exact. Names outside the catalogue are returned unchanged
    /// so they still form their own category.
    #[must_use]
    pub fn main_category<'a>(&'a self, fuel_name: &'a str) -> &'a str {
        let trimmed = fuel_name.trim();
        self.by_alias
            .get(trimmed)
            .map_or(trimmed, |&idx| self.definitions[idx].name.as_str())
    }

    /// Main category names in catalogue order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }

    #[must_use]
    pub fn definitions(&self) -> &[CategoryDefinition] {
        &self.definitions
    }
}

/// Load and validate a category catalogue from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoryCatalogue, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: CategoriesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::CategoriesFileParse)?;

    validate_categories(&file.categories)?;

    tracing::debug!(
        path = %path.display(),
        categories = file.categories.len(),
        "loaded fuel category catalogue"
    );

    Ok(CategoryCatalogue::from_definitions(file.categories))
}

fn validate_categories(definitions: &[CategoryDefinition]) -> Result<(), ConfigError> {
    if definitions.is_empty() {
        return Err(ConfigError::Validation(
            "category catalogue must define at least one category".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    let mut alias_owner: HashMap<&str, &str> = HashMap::new();

    for def in definitions {
        if def.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category name must be non-empty".to_string(),
            ));
        }
        if !seen_names.insert(def.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category name: '{}'",
                def.name
            )));
        }
        for alias in &def.aliases {
            if let Some(owner) = alias_owner.insert(alias.as_str(), def.name.as_str()) {
                if owner != def.name {
                    return Err(ConfigError::Validation(format!(
                        "alias '{alias}' is claimed by both '{owner}' and '{}'",
                        def.name
                    )));
                }
            }
        }
    }

    Ok(())
}
