//! Style document model.
//!
//! Mirrors the JSON consumed by the tile render backend:
//!
//! ```json
//! {
//!   "version": 8,
//!   "name": "Basic",
//!   "metadata": { "openmaptiles:version": "3.x" },
//!   "sources": { "openmaptiles": { "type": "vector", "url": "mbtiles://{v3}" } },
//!   "layers": [ { "id": "background", "type": "background", "paint": { "background-color": "#fff" } } ],
//!   "id": "basic"
//! }
//! ```
//!
//! Only `sources`, `layers` and each layer's `id` and `type` are modelled.
//! Everything else, explicit `null`s included, lives in the `extra` maps and
//! is written back unchanged. Sources are an insertion-ordered map, so
//! overlay sources are appended after the base sources and removing them
//! leaves the base order intact. Top-level keys other than `sources` and
//! `layers` are written after those two.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::country::{Country, Geometry};

/// Source type tag for per-country overlay sources.
pub const GEOJSON_SOURCE_TYPE: &str = "geojson";

/// Layer type for per-country overlay layers.
pub const FILL_LAYER_TYPE: &str = "fill";

/// A map rendering style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDocument {
    /// Named sources: vector tile references or GeoJSON feature sources.
    pub sources: Map<String, Value>,

    /// Rendering rules, drawn in order.
    pub layers: Vec<Layer>,

    /// `version`, `name`, `metadata`, `id` and anything else.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One rendering rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Layer {
    /// Name of the source this layer draws from, if any.
    pub fn source(&self) -> Option<&str> {
        self.extra.get("source").and_then(Value::as_str)
    }
}

/// Fill applied to every highlighted country.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPaint {
    pub fill_color: String,
    pub fill_opacity: f64,
}

impl OverlayPaint {
    pub fn new(fill_color: impl Into<String>, fill_opacity: f64) -> Self {
        Self {
            fill_color: fill_color.into(),
            fill_opacity,
        }
    }

    fn to_paint(&self) -> Value {
        let mut paint = Map::new();
        paint.insert("fill-color".to_string(), Value::String(self.fill_color.clone()));
        paint.insert("fill-opacity".to_string(), Value::from(self.fill_opacity));
        Value::Object(paint)
    }
}

/// Builds a GeoJSON source holding one feature with the given geometry.
fn geojson_source(geometry: &Geometry) -> Value {
    let mut geometry_json = Map::new();
    geometry_json.insert("type".to_string(), Value::String(geometry.kind.clone()));
    geometry_json.insert("coordinates".to_string(), geometry.coordinates.clone());

    let mut feature = Map::new();
    feature.insert("type".to_string(), Value::from("Feature"));
    feature.insert("properties".to_string(), Value::Object(Map::new()));
    feature.insert("geometry".to_string(), Value::Object(geometry_json));

    let mut source = Map::new();
    source.insert("type".to_string(), Value::from(GEOJSON_SOURCE_TYPE));
    source.insert("data".to_string(), Value::Object(feature));
    Value::Object(source)
}

impl StyleDocument {
    /// Adds the fill source and layer for a country.
    ///
    /// Adding a country that is already present replaces its source and
    /// layer in place, so the document never holds duplicates.
    pub fn add_overlay(&mut self, country: &Country, paint: &OverlayPaint) {
        let source_name = country.source_name();
        self.sources
            .insert(source_name.clone(), geojson_source(&country.geometry));

        let mut extra = Map::new();
        extra.insert("source".to_string(), Value::String(source_name));
        extra.insert("paint".to_string(), paint.to_paint());
        let layer = Layer {
            id: country.layer_name(),
            kind: FILL_LAYER_TYPE.to_string(),
            extra,
        };
        match self.layers.iter_mut().find(|l| l.id == layer.id) {
            Some(existing) => *existing = layer,
            None => self.layers.push(layer),
        }
    }

    /// Removes a country's source and layer. Absent entries are ignored.
    pub fn remove_overlay(&mut self, country: &Country) {
        self.sources.remove(&country.source_name());
        let layer_name = country.layer_name();
        self.layers.retain(|l| l.id != layer_name);
    }

    /// Returns true if either the source or the layer of a country is present.
    pub fn has_overlay(&self, country: &Country) -> bool {
        let layer_name = country.layer_name();
        self.sources.contains_key(&country.source_name())
            || self.layers.iter().any(|l| l.id == layer_name)
    }

    /// Checks that every layer references an existing source.
    pub fn validate(&self) -> Result<(), DanglingSource> {
        for layer in &self.layers {
            if let Some(source) = layer.source() {
                if !self.sources.contains_key(source) {
                    return Err(DanglingSource {
                        layer: layer.id.clone(),
                        source: source.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A layer referencing a source that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingSource {
    pub layer: String,
    pub source: String,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::country::sample_registry;

    pub(crate) const BASE_STYLE: &str = r##"{
        "version": 8,
        "name": "Basic",
        "metadata": { "openmaptiles:version": "3.x" },
        "sources": {
            "openmaptiles": { "type": "vector", "url": "mbtiles://{v3}" }
        },
        "layers": [
            { "id": "background", "type": "background", "paint": { "background-color": "hsl(47, 26%, 88%)" } },
            {
                "id": "boundary",
                "type": "line",
                "source": "openmaptiles",
                "source-layer": "boundary",
                "filter": ["==", "admin_level", 2],
                "layout": { "line-join": "round" },
                "paint": { "line-color": "#9e9cab", "line-width": { "base": 1.4, "stops": [[3, 0.5], [22, 15]] } }
            }
        ],
        "id": "basic"
    }"##;

    fn base() -> StyleDocument {
        serde_json::from_str(BASE_STYLE).unwrap()
    }

    fn paint() -> OverlayPaint {
        OverlayPaint::new("#d4af37", 0.6)
    }

    #[test]
    fn test_parse_keeps_unknown_fields() {
        let doc = base();
        assert_eq!(doc.layers.len(), 2);
        assert!(doc.layers[1].extra.contains_key("layout"));

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["layers"][1]["layout"]["line-join"], "round");
        assert_eq!(json["layers"][1]["source-layer"], "boundary");
        assert!(json["layers"][0].get("source").is_none());
    }

    #[test]
    fn test_add_overlay_appends_source_and_layer() {
        let registry = sample_registry();
        let france = registry.get(registry.resolve("France").unwrap());
        let mut doc = base();

        doc.add_overlay(france, &paint());

        let source = &doc.sources["France-geojson"];
        assert_eq!(source["type"], "geojson");
        assert_eq!(source["data"]["type"], "Feature");
        assert_eq!(source["data"]["geometry"]["type"], "Polygon");
        assert_eq!(source["data"]["properties"], serde_json::json!({}));

        let layer = doc.layers.last().unwrap();
        assert_eq!(layer.id, "fill-France");
        assert_eq!(layer.kind, "fill");
        assert_eq!(layer.source(), Some("France-geojson"));
        assert_eq!(layer.extra["paint"]["fill-color"], "#d4af37");
        assert_eq!(layer.extra["paint"]["fill-opacity"], 0.6);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_add_twice_keeps_one_entry() {
        let registry = sample_registry();
        let france = registry.get(registry.resolve("France").unwrap());
        let mut doc = base();

        doc.add_overlay(france, &paint());
        doc.add_overlay(france, &paint());

        assert_eq!(doc.sources.len(), 2);
        assert_eq!(doc.layers.len(), 3);
    }

    #[test]
    fn test_add_then_remove_restores_document() {
        let registry = sample_registry();
        let original = base();
        let mut doc = original.clone();

        for (_, country) in registry.iter() {
            doc.add_overlay(country, &paint());
        }
        for (_, country) in registry.iter() {
            doc.remove_overlay(country);
        }

        assert_eq!(doc, original);
        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            serde_json::to_string(&original).unwrap()
        );
    }

    #[test]
    fn test_explicit_nulls_survive_round_trip() {
        let registry = sample_registry();
        let france = registry.get(registry.resolve("France").unwrap());
        let style = r#"{
            "version": 8,
            "name": null,
            "metadata": null,
            "sources": {},
            "layers": [
                { "id": "background", "type": "background", "paint": null, "filter": null }
            ],
            "id": "basic"
        }"#;
        let original: Value = serde_json::from_str(style).unwrap();
        let mut doc: StyleDocument = serde_json::from_str(style).unwrap();

        doc.add_overlay(france, &paint());
        doc.remove_overlay(france);

        let after = serde_json::to_value(&doc).unwrap();
        assert_eq!(after, original);
        assert_eq!(after["metadata"], Value::Null);
        assert_eq!(after["layers"][0]["paint"], Value::Null);
    }

    #[test]
    fn test_zero_opacity_is_written() {
        let registry = sample_registry();
        let france = registry.get(registry.resolve("France").unwrap());
        let mut doc = base();

        doc.add_overlay(france, &OverlayPaint::new("#d4af37", 0.0));

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["layers"][2]["paint"]["fill-opacity"], 0.0);
    }

    #[test]
    fn test_remove_absent_overlay_is_noop() {
        let registry = sample_registry();
        let italy = registry.get(registry.resolve("Italy").unwrap());
        let mut doc = base();

        doc.remove_overlay(italy);

        assert_eq!(doc, base());
    }

    #[test]
    fn test_validate_detects_dangling_source() {
        let mut doc = base();
        doc.sources.remove("openmaptiles");

        let err = doc.validate().unwrap_err();
        assert_eq!(err.layer, "boundary");
        assert_eq!(err.source, "openmaptiles");
    }
}
