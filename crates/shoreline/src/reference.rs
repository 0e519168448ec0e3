//! Reference shoreline input.
//!
//! The detector discards shoreline candidates far from a reference
//! shoreline. The reference arrives as GeoJSON lines, usually in EPSG:4326,
//! and is handed to the detector as `[x, y, 0]` vertices in its output CRS.

use std::path::Path;

use geo::{BooleanOps, BoundingRect, EuclideanLength, Intersects};
use geo_types::{Geometry, LineString, MultiLineString, Rect};
use geojson::{FeatureCollection, GeoJson};
use tracing::debug;

use crate::{
    crs::{Crs, MAP_CRS, reproject_geometry},
    error::Result,
    io::{crs_from_members, into_features},
};

#[derive(Debug, Clone)]
pub struct ReferenceShoreline {
    pub crs: Crs,
    pub collection: FeatureCollection,
}

impl ReferenceShoreline {
    pub fn new(collection: FeatureCollection, crs: Crs) -> Self {
        Self { crs, collection }
    }

    /// Parse GeoJSON, honouring a legacy `crs` member (default EPSG:4326)
    pub fn from_geojson_str(geojson_str: &str) -> Result<Self> {
        let geojson: GeoJson = geojson_str.parse()?;
        let (features, foreign_members) = into_features(geojson);
        let crs = crs_from_members(foreign_members.as_ref())?.unwrap_or(MAP_CRS);
        Ok(Self {
            crs,
            collection: FeatureCollection {
                bbox: None,
                features,
                foreign_members,
            },
        })
    }

    pub fn from_geojson_file(path: impl AsRef<Path>) -> Result<Self> {
        let geojson_str = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&geojson_str)
    }

    pub fn is_empty(&self) -> bool {
        self.collection.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.collection.features.len()
    }

    /// Line geometries of the reference; other geometry types are skipped
    pub fn lines(&self) -> Result<Vec<Geometry<f64>>> {
        let mut lines = Vec::new();
        for feature in &self.collection.features {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            match geo_types::Geometry::<f64>::try_from(geometry.value.clone())? {
                line @ (Geometry::LineString(_) | Geometry::MultiLineString(_)) => lines.push(line),
                other => debug!("Skipping non-line reference geometry: {:?}", other),
            }
        }
        Ok(lines)
    }
}

/// Reference shoreline vertices in `output_crs` with a zero elevation column.
///
/// Vertices of every line are stacked in feature order.
pub fn get_reference_shoreline(reference: &ReferenceShoreline, output_crs: &Crs) -> Result<Vec<[f64; 3]>> {
    let mut vertices = Vec::new();
    for line in reference.lines()? {
        let projected = reproject_geometry(&line, &reference.crs, output_crs)?;
        match projected {
            Geometry::LineString(ls) => vertices.extend(ls.coords().map(|c| [c.x, c.y, 0.0])),
            Geometry::MultiLineString(mls) => {
                vertices.extend(mls.iter().flat_map(|ls| ls.coords()).map(|c| [c.x, c.y, 0.0]))
            }
            _ => {}
        }
    }
    debug!(
        "Reference shoreline: {} vertices in {}",
        vertices.len(),
        output_crs
    );
    Ok(vertices)
}

/// Keep only the parts of the reference lines inside `bbox`.
///
/// `bbox` is in the reference's CRS. Lines crossing its edges are cut at
/// the edges; parts of zero length and features left without any part
/// are dropped.
pub fn clip_to_bbox(reference: &ReferenceShoreline, bbox: &Rect<f64>) -> Result<ReferenceShoreline> {
    let mut features = Vec::new();
    for feature in &reference.collection.features {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        let mut parts: Vec<LineString<f64>> = match geo_types::Geometry::<f64>::try_from(geometry.value.clone())? {
            Geometry::LineString(ls) => clip_line(&ls, bbox),
            Geometry::MultiLineString(mls) => mls.iter().flat_map(|ls| clip_line(ls, bbox)).collect(),
            _ => continue,
        };

        let clipped = match parts.len() {
            0 => continue,
            1 => Geometry::LineString(parts.remove(0)),
            _ => Geometry::MultiLineString(MultiLineString::new(parts)),
        };
        let mut feature = feature.clone();
        feature.geometry = Some(geojson::Geometry::new(geojson::Value::from(&clipped)));
        features.push(feature);
    }

    Ok(ReferenceShoreline {
        crs: reference.crs,
        collection: FeatureCollection {
            bbox: None,
            features,
            foreign_members: reference.collection.foreign_members.clone(),
        },
    })
}

fn clip_line(line: &LineString<f64>, bbox: &Rect<f64>) -> Vec<LineString<f64>> {
    let Some(extent) = line.bounding_rect() else {
        return Vec::new();
    };
    let parts = if !bbox.intersects(&extent) {
        Vec::new()
    } else if contains_rect(bbox, &extent) {
        vec![line.clone()]
    } else {
        bbox.to_polygon()
            .clip(&MultiLineString::new(vec![line.clone()]), false)
            .into_iter()
            .collect()
    };
    parts
        .into_iter()
        .filter(|part| part.euclidean_length() > 0.0)
        .collect()
}

fn contains_rect(outer: &Rect<f64>, inner: &Rect<f64>) -> bool {
    outer.min().x <= inner.min().x
        && outer.min().y <= inner.min().y
        && inner.max().x <= outer.max().x
        && inner.max().y <= outer.max().y
}
