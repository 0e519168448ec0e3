use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use serde_json::{Value, json};
use tracing::info;

use crate::{
    collection::{ShorelineCollection, ShorelineFeature},
    crs::{Crs, MAP_CRS},
    error::{Result, ShorelineError},
    typed_geojson::{ExtractedShorelineProperties, ShorelineGeoJson, TypedFeature, TypedFeatureCollection, TypedGeoJson},
};

/// Legacy GeoJSON `crs` member naming `crs`
pub fn crs_member(crs: &Crs) -> Value {
    let name = match crs {
        Crs::Wgs84 => "urn:ogc:def:crs:OGC:1.3:CRS84".to_string(),
        other => format!("urn:ogc:def:crs:EPSG::{}", other.epsg()),
    };
    json!({ "type": "name", "properties": { "name": name } })
}

/// Read the legacy `crs` member, if any
pub fn crs_from_members(members: Option<&JsonObject>) -> Result<Option<Crs>> {
    let Some(member) = members.and_then(|m| m.get("crs")) else {
        return Ok(None);
    };
    let name = member
        .pointer("/properties/name")
        .and_then(Value::as_str)
        .ok_or_else(|| ShorelineError::InvalidCollection(format!("Unreadable crs member: {member}")))?;
    Ok(Some(name.parse()?))
}

/// Features of any GeoJSON object, plus the members of a collection
pub fn into_features(geojson: GeoJson) -> (Vec<Feature>, Option<JsonObject>) {
    match geojson {
        GeoJson::FeatureCollection(fc) => (fc.features, fc.foreign_members),
        GeoJson::Feature(feature) => (vec![feature], None),
        GeoJson::Geometry(geometry) => (
            vec![Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            None,
        ),
    }
}

impl ShorelineFeature {
    fn to_feature(&self, id: usize) -> Result<Feature> {
        let properties = match serde_json::to_value(&self.properties)? {
            Value::Object(map) => Some(map),
            _ => None,
        };
        Ok(Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.geometry))),
            id: Some(geojson::feature::Id::String(id.to_string())),
            properties,
            foreign_members: None,
        })
    }

    fn from_feature(feature: Feature) -> Result<Self> {
        let geometry = feature
            .geometry
            .ok_or_else(|| ShorelineError::InvalidCollection("Feature without geometry".to_string()))?;
        let properties: ExtractedShorelineProperties =
            serde_json::from_value(Value::Object(feature.properties.unwrap_or_default())).map_err(|e| {
                ShorelineError::InvalidCollection(format!("Not an extracted shoreline feature: {e}"))
            })?;
        Ok(Self {
            geometry: geo_types::Geometry::<f64>::try_from(geometry.value)?,
            properties,
        })
    }
}

impl ShorelineCollection {
    fn members(&self) -> JsonObject {
        let mut members = JsonObject::new();
        members.insert("crs".to_string(), crs_member(&self.crs));
        members
    }

    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let features = self
            .features
            .iter()
            .enumerate()
            .map(|(i, feature)| feature.to_feature(i))
            .collect::<Result<Vec<_>>>()?;

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(self.members()),
        })
    }

    /// Export to typed GeoJSON format
    pub fn to_typed_geojson(&self) -> Result<ShorelineGeoJson> {
        let features = self
            .features
            .iter()
            .enumerate()
            .map(|(i, feature)| TypedFeature::from_feature(feature.to_feature(i)?))
            .collect::<Result<Vec<_>>>()?;

        Ok(TypedGeoJson::FeatureCollection(TypedFeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(self.members()),
        }))
    }

    /// The collection as a GeoJSON value, as handed to map layers
    pub fn to_geojson_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_geojson()?)?)
    }

    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    pub fn save_geojson(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_geojson_string()?)?;
        info!("Saved {} shoreline(s) to {}", self.len(), path.display());
        Ok(())
    }

    pub fn from_geojson_file(path: impl AsRef<Path>) -> Result<Self> {
        let geojson_str = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&geojson_str)
    }

    /// Parse extracted shorelines. Coordinates are taken to be in the map
    /// CRS unless a `crs` member says otherwise.
    pub fn from_geojson_str(geojson_str: &str) -> Result<Self> {
        let geojson: GeoJson = geojson_str.parse()?;
        let (features, members) = into_features(geojson);
        let crs = crs_from_members(members.as_ref())?.unwrap_or(MAP_CRS);

        let features = features
            .into_iter()
            .map(ShorelineFeature::from_feature)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { crs, features })
    }
}
