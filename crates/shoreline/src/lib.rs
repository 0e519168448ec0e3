//! # Shoreline Extraction Library
//!
//! Per-ROI orchestration of shoreline extraction. The detection itself is
//! delegated to a [`detection::Detector`]; this crate assembles the
//! settings the detector needs, post-filters the time series it returns and
//! turns the result into GeoJSON for files and map layers.
//!
//! ## Core Features
//!
//! - **Pipeline System**: detector call followed by composable record filters
//! - **CRS Handling**: WGS84, web mercator and UTM zones, reprojected per vertex
//! - **GeoJSON Support**: export/import of extracted shorelines, typed properties
//! - **Map Layers**: styled layer descriptions with plasma colormaps
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coast_common::{RoiSettings, Settings};
//! use detection::ProcessDetector;
//! use shoreline::{ExtractedShoreline, ExtractionPipelineBuilder, ReferenceShoreline};
//!
//! let detector = ProcessDetector::new("coastsat-detector")?;
//! let pipeline = ExtractionPipelineBuilder::build_default(detector);
//!
//! let reference = ReferenceShoreline::from_geojson_file("reference.geojson")?;
//! let roi: RoiSettings = serde_json::from_str(&std::fs::read_to_string("roi.json")?)?;
//! let extracted = ExtractedShoreline::new("17", &reference, &roi, &Settings::new(32611), &pipeline)?;
//!
//! extracted.save_to_file(&roi.sitename, "sessions")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod collection;
pub mod crs;
pub mod error;
pub mod extracted;
pub mod filters;
pub mod io;
pub mod layer;
pub mod pipeline;
pub mod reference;
pub mod registry;
pub mod traits;
pub mod typed_geojson;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenience
pub use collection::{ShorelineCollection, ShorelineFeature};
pub use crs::{Crs, MAP_CRS, most_accurate_epsg, utm_epsg_for};
pub use error::{Result, ShorelineError};
pub use extracted::{ExtractedShoreline, FILE_NAME, LAYER_NAME};
pub use filters::{DuplicateFilter, EmptyShorelineFilter, GeorefFilter};
pub use layer::{GeoJsonLayer, LayerStyle, PointStyle, date_colormap_layer, get_colors};
pub use pipeline::{ExtractionPipeline, builder::ExtractionPipelineBuilder};
pub use reference::{ReferenceShoreline, clip_to_bbox, get_reference_shoreline};
pub use registry::RoiShorelines;
pub use traits::RecordFilter;
pub use typed_geojson::{ExtractedShorelineProperties, ShorelineGeoJson};
