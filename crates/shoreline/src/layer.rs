//! Map layer descriptions handed to the front end.
//!
//! A layer is GeoJSON data plus the styles the map applies to it. Nothing
//! here draws; the front end owns rendering.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::{
    collection::ShorelineCollection,
    crs::MAP_CRS,
    error::{Result, ShorelineError},
};

/// Path style of a layer or feature
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, TS, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LayerStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub fill_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub dash_array: Option<String>,
}

/// Marker style used when the layer holds points
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PointStyle {
    pub radius: f64,
    pub opacity: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GeoJsonLayer {
    pub name: String,
    /// GeoJSON in EPSG:4326
    pub data: Value,
    pub style: LayerStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub hover_style: Option<LayerStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub point_style: Option<PointStyle>,
    /// Per-feature styles, index-aligned with the features of `data`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_styles: Vec<LayerStyle>,
}

/// Style of an extracted shoreline layer
pub fn shoreline_style(color: &str) -> LayerStyle {
    LayerStyle {
        color: Some(color.to_string()),
        opacity: Some(1.0),
        weight: Some(4.0),
        ..Default::default()
    }
}

pub fn shoreline_hover_style() -> LayerStyle {
    LayerStyle {
        color: Some("red".to_string()),
        dash_array: Some("4".to_string()),
        fill_opacity: Some(0.7),
        ..Default::default()
    }
}

/// True for `null`, `{}` and collections without features
pub fn is_empty_geojson(geojson: &Value) -> bool {
    match geojson {
        Value::Null => true,
        Value::Object(map) if map.is_empty() => true,
        Value::Object(map) => match map.get("features") {
            Some(Value::Array(features)) => features.is_empty(),
            Some(_) => false,
            None => map.get("type").and_then(Value::as_str) == Some("FeatureCollection"),
        },
        _ => false,
    }
}

/// Wrap GeoJSON in a shoreline layer; empty GeoJSON cannot be drawn
pub fn style_layer(geojson: Value, layer_name: &str, color: &str) -> Result<GeoJsonLayer> {
    if is_empty_geojson(&geojson) {
        return Err(ShorelineError::EmptyLayer);
    }
    Ok(GeoJsonLayer {
        name: layer_name.to_string(),
        data: geojson,
        style: shoreline_style(color),
        hover_style: Some(shoreline_hover_style()),
        point_style: None,
        feature_styles: Vec::new(),
    })
}

// matplotlib "plasma", sampled at i / 9
const PLASMA: [[u8; 3]; 10] = [
    [0x0d, 0x08, 0x87],
    [0x46, 0x03, 0x9f],
    [0x72, 0x01, 0xa8],
    [0x9c, 0x17, 0x9e],
    [0xbd, 0x37, 0x86],
    [0xd8, 0x57, 0x6b],
    [0xed, 0x79, 0x53],
    [0xfb, 0x9f, 0x3a],
    [0xfd, 0xca, 0x26],
    [0xf0, 0xf9, 0x21],
];

/// Hex color of the plasma colormap at `t` (clamped to 0..=1)
pub fn plasma(t: f64) -> String {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (PLASMA.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(PLASMA.len() - 2);
    let frac = scaled - lower as f64;

    let [r, g, b] = [0, 1, 2].map(|c| {
        let a = PLASMA[lower][c] as f64;
        let b = PLASMA[lower + 1][c] as f64;
        (a + (b - a) * frac).round() as u8
    });
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// `n` colors sampled evenly along plasma, first to last
pub fn get_colors(n: usize) -> Vec<String> {
    match n {
        0 => Vec::new(),
        1 => vec![plasma(0.0)],
        _ => (0..n).map(|i| plasma(i as f64 / (n - 1) as f64)).collect(),
    }
}

/// Points layer colored by acquisition date.
///
/// Dates are normalized to 0..1 over the collection; a collection with a
/// single distinct date maps to 0.25. `collection` must be in the map CRS.
pub fn date_colormap_layer(collection: &ShorelineCollection, layer_name: &str) -> Result<GeoJsonLayer> {
    if collection.is_empty() {
        return Err(ShorelineError::EmptyLayer);
    }
    let mut points = collection.to_crs(MAP_CRS)?.to_multipoints();
    points.sort_by_date();

    let dates = points.dates();
    let (first, last) = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(ShorelineError::EmptyLayer),
    };
    let span = (last - first).num_seconds() as f64;
    let feature_styles = dates
        .iter()
        .map(|date| {
            let t = if span > 0.0 {
                (*date - first).num_seconds() as f64 / span
            } else {
                0.25
            };
            let color = plasma(t);
            LayerStyle {
                color: Some(color.clone()),
                weight: Some(5.0),
                fill_color: Some(color),
                fill_opacity: Some(0.5),
                ..Default::default()
            }
        })
        .collect();

    Ok(GeoJsonLayer {
        name: layer_name.to_string(),
        data: points.to_geojson_value()?,
        style: LayerStyle::default(),
        hover_style: None,
        point_style: Some(PointStyle {
            radius: 1.0,
            opacity: 1.0,
        }),
        feature_styles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crs::Crs, test_support::record};
    use serde_json::json;

    #[test]
    fn test_colormap_ends() {
        assert_eq!(plasma(0.0), "#0d0887");
        assert_eq!(plasma(1.0), "#f0f921");
        assert_eq!(plasma(5.0 / 9.0), "#d8576b");
        assert_eq!(plasma(-3.0), "#0d0887");
    }

    #[test]
    fn test_get_colors() {
        assert!(get_colors(0).is_empty());
        assert_eq!(get_colors(1), vec!["#0d0887"]);
        let colors = get_colors(10);
        assert_eq!(colors.len(), 10);
        assert_eq!(colors[3], "#9c179e");
        assert_eq!(colors[9], "#f0f921");
    }

    #[test]
    fn test_style_layer() {
        let data = json!({"type": "FeatureCollection", "features": [{"type": "Feature"}]});
        let layer = style_layer(data, "ID1_2019-01-05 18:30:00", "#0d0887").unwrap();
        let value = serde_json::to_value(&layer).unwrap();

        assert_eq!(value["style"], json!({"color": "#0d0887", "opacity": 1.0, "weight": 4.0}));
        assert_eq!(value["hoverStyle"], json!({"color": "red", "fillOpacity": 0.7, "dashArray": "4"}));
        assert!(value.get("featureStyles").is_none());
    }

    #[test]
    fn test_empty_geojson_rejected() {
        for empty in [json!(null), json!({}), json!({"type": "FeatureCollection", "features": []})] {
            assert!(matches!(style_layer(empty, "x", "red"), Err(ShorelineError::EmptyLayer)));
        }
    }

    #[test]
    fn test_date_colormap_layer() {
        let collection = ShorelineCollection::from_records(
            &[
                record("2019-03-01 00:00:00", "L8", 3, 4.0),
                record("2019-01-01 00:00:00", "L8", 3, 4.0),
                record("2019-01-30 12:00:00", "S2", 2, 4.0),
            ],
            Crs::Utm { zone: 11, north: true },
        );
        let layer = date_colormap_layer(&collection, "date_colormap").unwrap();

        assert_eq!(layer.feature_styles.len(), 3);
        assert_eq!(layer.feature_styles[0].color.as_deref(), Some("#0d0887"));
        assert_eq!(layer.feature_styles[1].color.as_deref(), Some(plasma(0.5).as_str()));
        assert_eq!(layer.feature_styles[2].color.as_deref(), Some("#f0f921"));
        assert_eq!(layer.feature_styles[0].fill_opacity, Some(0.5));

        let features = layer.data["features"].as_array().unwrap();
        assert_eq!(features[1]["id"], "1");
        assert_eq!(features[0]["geometry"]["type"], "MultiPoint");
        assert_eq!(features[0]["properties"]["date"], "2019-01-01 00:00:00");
        assert_eq!(layer.point_style, Some(PointStyle { radius: 1.0, opacity: 1.0 }));
    }

    #[test]
    fn test_single_date_maps_to_quarter() {
        let collection = ShorelineCollection::from_records(
            &[record("2019-01-01 00:00:00", "L8", 3, 4.0)],
            Crs::Utm { zone: 11, north: true },
        );
        let layer = date_colormap_layer(&collection, "date_colormap").unwrap();
        assert_eq!(layer.feature_styles[0].color.as_deref(), Some(plasma(0.25).as_str()));
    }
}
