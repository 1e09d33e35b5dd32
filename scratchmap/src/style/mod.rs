//! Map style document and its on-disk store.
//!
//! The style file is shared with the tile render backend. Overlays for the
//! selected countries are written into it for the duration of one
//! generation and removed afterwards; a pristine backup next to it is the
//! recovery path when a generation fails halfway.

mod document;
mod store;

pub use document::{
    DanglingSource, Layer, OverlayPaint, StyleDocument, FILL_LAYER_TYPE, GEOJSON_SOURCE_TYPE,
};
pub use store::{StyleError, StyleStore};

#[cfg(test)]
pub(crate) use document::tests::BASE_STYLE;
