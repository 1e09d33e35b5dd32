//! Supported countries.
//!
//! Countries are loaded once at startup into a [`CountryRegistry`] and are
//! read-only afterwards. Everything downstream refers to a country by its
//! [`CountryId`], so two lookups of "France" and "french republic" resolve to
//! the same entry and a [`CountrySelection`] never holds duplicates.

mod registry;
mod selection;

pub use registry::{CountryRegistry, RegistryError};
pub use selection::CountrySelection;

#[cfg(test)]
pub(crate) use registry::tests::sample_registry;

use serde::{Deserialize, Serialize};

/// Stable handle to a country inside a [`CountryRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryId(usize);

impl CountryId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// GeoJSON geometry, passed through to the style document untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: serde_json::Value,
}

/// A country that can be highlighted on the scratch map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Country {
    pub name: String,
    pub emoji: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub geometry: Geometry,
}

impl Country {
    /// Name of the GeoJSON source carrying this country's shape.
    pub fn source_name(&self) -> String {
        format!("{}-geojson", self.name)
    }

    /// Name of the fill layer highlighting this country.
    pub fn layer_name(&self) -> String {
        format!("fill-{}", self.name)
    }

    /// All names this country answers to: its name followed by its aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}
