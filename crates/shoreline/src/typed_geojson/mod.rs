use std::marker::PhantomData;

use coast_common::{DateTime, GeoAccuracy, ShorelineRecord, Utc};
use geojson::{Geometry, JsonObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use ts_rs::TS;

use crate::error::Result;

/// Properties of an extracted shoreline feature
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS, JsonSchema)]
#[ts(export)]
#[schemars(description = "Properties of an extracted shoreline feature")]
pub struct ExtractedShorelineProperties {
    #[serde(with = "coast_common::date_serde")]
    #[ts(type = "string")]
    #[schemars(with = "String", description = "Acquisition time, %Y-%m-%d %H:%M:%S (UTC)")]
    pub date: DateTime<Utc>,
    #[schemars(description = "Satellite the image was taken by (L5, L7, L8, L9, S2)")]
    pub satname: String,
    #[ts(type = "number | \"PASSED\" | \"FAILED\"")]
    #[schemars(description = "Georeferencing RMSE in metres (-1 if unknown) or quality flag")]
    pub geoaccuracy: GeoAccuracy,
    #[schemars(description = "Cloud cover fraction of the image")]
    pub cloud_cover: f64,
}

impl From<&ShorelineRecord> for ExtractedShorelineProperties {
    fn from(record: &ShorelineRecord) -> Self {
        Self {
            date: record.date,
            satname: record.satname.clone(),
            geoaccuracy: record.geoaccuracy,
            cloud_cover: record.cloud_cover,
        }
    }
}

/// Type alias for extracted shoreline GeoJSON
pub type ShorelineGeoJson = TypedGeoJson<ExtractedShorelineProperties>;

/// A GeoJSON Feature that is generic over its properties.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TypedFeature<P> {
    #[serde(flatten)]
    pub feature: geojson::Feature,
    #[serde(skip)]
    _properties: PhantomData<P>,
}

impl<P> TypedFeature<P>
where
    P: Serialize + DeserializeOwned,
{
    pub fn new(geometry: Option<Geometry>, properties: &P) -> Result<Self> {
        let properties = match serde_json::to_value(properties)? {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        };
        Ok(Self {
            feature: geojson::Feature {
                bbox: None,
                geometry,
                id: None,
                properties,
                foreign_members: None,
            },
            _properties: PhantomData,
        })
    }

    /// Wrap an untyped feature, checking that its properties parse as `P`
    pub fn from_feature(feature: geojson::Feature) -> Result<Self> {
        let typed = Self {
            feature,
            _properties: PhantomData,
        };
        typed.try_properties()?;
        Ok(typed)
    }

    pub fn try_properties(&self) -> Result<P> {
        let object = self.feature.properties.clone().unwrap_or_default();
        Ok(serde_json::from_value(serde_json::Value::Object(object))?)
    }

    /// Typed properties, `None` if they do not parse
    pub fn properties(&self) -> Option<P> {
        self.try_properties().ok()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TypedFeatureCollection<P> {
    pub bbox: Option<Vec<f64>>,
    pub features: Vec<TypedFeature<P>>,
    pub foreign_members: Option<JsonObject>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum TypedGeoJson<P> {
    Geometry(Geometry),
    Feature(TypedFeature<P>),
    FeatureCollection(TypedFeatureCollection<P>),
}

impl<P> TypedGeoJson<P> {
    pub fn as_feature_collection(&self) -> Option<&TypedFeatureCollection<P>> {
        match self {
            TypedGeoJson::FeatureCollection(fc) => Some(fc),
            _ => None,
        }
    }

    pub fn into_feature_collection(self) -> Option<TypedFeatureCollection<P>> {
        match self {
            TypedGeoJson::FeatureCollection(fc) => Some(fc),
            _ => None,
        }
    }

    /// Typed features regardless of the variant
    pub fn features(&self) -> Vec<&TypedFeature<P>> {
        match self {
            TypedGeoJson::Geometry(_) => Vec::new(),
            TypedGeoJson::Feature(feature) => vec![feature],
            TypedGeoJson::FeatureCollection(fc) => fc.features.iter().collect(),
        }
    }
}

impl<P> TypedFeatureCollection<P> {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[TypedFeature<P>] {
        &self.features
    }

    /// Plain GeoJSON collection with the same features and members
    pub fn into_geojson(self) -> geojson::FeatureCollection {
        geojson::FeatureCollection {
            bbox: self.bbox,
            features: self.features.into_iter().map(|f| f.feature).collect(),
            foreign_members: self.foreign_members,
        }
    }
}

impl ShorelineGeoJson {
    /// Shorelines detected on images from `satname`
    pub fn features_for_satellite(&self, satname: &str) -> Vec<&TypedFeature<ExtractedShorelineProperties>> {
        self.features()
            .into_iter()
            .filter(|feature| {
                feature
                    .properties()
                    .map(|props| props.satname == satname)
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn features_below_cloud_cover(&self, max_cloud_cover: f64) -> Vec<&TypedFeature<ExtractedShorelineProperties>> {
        self.features()
            .into_iter()
            .filter(|feature| {
                feature
                    .properties()
                    .map(|props| props.cloud_cover < max_cloud_cover)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// The most recently acquired shoreline
    pub fn latest_feature(&self) -> Option<&TypedFeature<ExtractedShorelineProperties>> {
        self.features()
            .into_iter()
            .filter_map(|feature| feature.properties().map(|props| (props.date, feature)))
            .max_by_key(|(date, _)| *date)
            .map(|(_, feature)| feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    fn shoreline_geojson() -> ShorelineGeoJson {
        let records = [
            record("2019-01-05 18:30:00", "L8", 3, 4.0),
            record("2019-02-06 18:30:00", "S2", 3, 4.0),
            record("2019-01-21 18:30:00", "L8", 3, 4.0),
        ];
        let mut features = Vec::new();
        for (i, r) in records.iter().enumerate() {
            let mut props = ExtractedShorelineProperties::from(r);
            props.cloud_cover = i as f64 * 0.2;
            let geometry = Geometry::new(geojson::Value::LineString(vec![vec![0.0, 0.0], vec![1.0, 1.0]]));
            features.push(TypedFeature::new(Some(geometry), &props).unwrap());
        }
        TypedGeoJson::FeatureCollection(TypedFeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    #[test]
    fn test_properties_wire_format() {
        let props = ExtractedShorelineProperties::from(&record("2019-01-05 18:30:00", "L8", 2, 4.5));
        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(value["date"], "2019-01-05 18:30:00");
        assert_eq!(value["satname"], "L8");
        assert_eq!(value["geoaccuracy"], 4.5);

        let parsed: ExtractedShorelineProperties = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, props);
    }

    #[test]
    fn test_shoreline_helpers() {
        let geojson = shoreline_geojson();
        assert_eq!(geojson.features_for_satellite("L8").len(), 2);
        assert_eq!(geojson.features_below_cloud_cover(0.3).len(), 2);

        let latest = geojson.latest_feature().and_then(|f| f.properties()).unwrap();
        assert_eq!(latest.satname, "S2");
    }

    #[test]
    fn test_from_feature_rejects_foreign_properties() {
        let feature = geojson::Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: serde_json::json!({ "name": "not a shoreline" }).as_object().cloned(),
            foreign_members: None,
        };
        assert!(TypedFeature::<ExtractedShorelineProperties>::from_feature(feature).is_err());
    }
}
