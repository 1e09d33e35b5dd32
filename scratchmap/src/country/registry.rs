//! Country registry loaded from the supported-countries file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use super::{Country, CountryId};

/// Errors raised while loading the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read country list {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse country list: {0}")]
    Parse(#[from] serde_json::Error),

    /// A name or alias resolves to more than one country.
    #[error("'{name}' matches both {first} and {second}")]
    Ambiguous {
        name: String,
        first: String,
        second: String,
    },

    #[error("Country list is empty")]
    Empty,
}

/// Immutable lookup table of supported countries.
///
/// Name and alias matching is case-insensitive but otherwise exact:
/// surrounding whitespace is part of the name.
#[derive(Debug)]
pub struct CountryRegistry {
    countries: Vec<Country>,
    by_name: HashMap<String, CountryId>,
}

impl CountryRegistry {
    /// Builds a registry, rejecting names or aliases shared by two countries.
    pub fn new(countries: Vec<Country>) -> Result<Self, RegistryError> {
        if countries.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut by_name: HashMap<String, CountryId> = HashMap::new();
        for (index, country) in countries.iter().enumerate() {
            let id = CountryId::new(index);
            for name in country.names() {
                let key = normalize(name);
                match by_name.get(&key) {
                    // A country may list its own name as an alias
                    Some(existing) if *existing == id => {}
                    Some(existing) => {
                        return Err(RegistryError::Ambiguous {
                            name: name.to_string(),
                            first: countries[existing.index()].name.clone(),
                            second: country.name.clone(),
                        });
                    }
                    None => {
                        by_name.insert(key, id);
                    }
                }
            }
        }

        Ok(Self { countries, by_name })
    }

    /// Parses a JSON array of countries. Keys match case-insensitively.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let entries: Vec<Map<String, Value>> = serde_json::from_str(json)?;
        let countries = entries
            .into_iter()
            .map(|entry| serde_json::from_value(Value::Object(lowercase_keys(entry))))
            .collect::<Result<Vec<Country>, _>>()?;
        Self::new(countries)
    }

    /// Loads the registry from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            countries = registry.len(),
            "Loaded supported countries"
        );
        Ok(registry)
    }

    /// Resolves a user-supplied name or alias.
    pub fn resolve(&self, name: &str) -> Option<CountryId> {
        self.by_name.get(&normalize(name)).copied()
    }

    pub fn get(&self, id: CountryId) -> &Country {
        &self.countries[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CountryId, &Country)> {
        self.countries
            .iter()
            .enumerate()
            .map(|(index, country)| (CountryId::new(index), country))
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase()
}

/// Lowercases the keys of a country entry and of its geometry.
fn lowercase_keys(entry: Map<String, Value>) -> Map<String, Value> {
    entry
        .into_iter()
        .map(|(key, value)| {
            let key = key.to_lowercase();
            let value = match value {
                Value::Object(inner) if key == "geometry" => Value::Object(lowercase_keys(inner)),
                other => other,
            };
            (key, value)
        })
        .collect()
}
