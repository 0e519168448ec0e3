use coast_common::{DateTime, ShorelineRecord, Utc};
use geo::BoundingRect;
use geo_types::{Coord, Geometry, LineString, MultiPoint, Point, Rect};

use crate::{
    crs::{Crs, reproject_geometry},
    error::Result,
    typed_geojson::ExtractedShorelineProperties,
};

/// One extracted shoreline
#[derive(Debug, Clone, PartialEq)]
pub struct ShorelineFeature {
    pub geometry: Geometry<f64>,
    pub properties: ExtractedShorelineProperties,
}

/// Extracted shorelines tagged with the CRS their coordinates are in
#[derive(Debug, Clone, PartialEq)]
pub struct ShorelineCollection {
    pub crs: Crs,
    pub features: Vec<ShorelineFeature>,
}

impl ShorelineCollection {
    pub fn new(crs: Crs) -> Self {
        Self {
            crs,
            features: Vec::new(),
        }
    }

    /// One LineString per record; records with fewer than two points are skipped
    pub fn from_records(records: &[ShorelineRecord], crs: Crs) -> Self {
        let features = records
            .iter()
            .filter(|record| record.shoreline.len() >= 2)
            .map(|record| ShorelineFeature {
                geometry: Geometry::LineString(LineString::from(
                    record
                        .shoreline
                        .iter()
                        .map(|&[x, y]| Coord { x, y })
                        .collect::<Vec<_>>(),
                )),
                properties: ExtractedShorelineProperties::from(record),
            })
            .collect();
        Self { crs, features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Reproject every feature into `crs`
    pub fn to_crs(&self, crs: Crs) -> Result<Self> {
        let features = self
            .features
            .iter()
            .map(|feature| {
                Ok(ShorelineFeature {
                    geometry: reproject_geometry(&feature.geometry, &self.crs, &crs)?,
                    properties: feature.properties.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { crs, features })
    }

    /// Replace line geometries by the points they are made of
    pub fn to_multipoints(&self) -> Self {
        let features = self
            .features
            .iter()
            .map(|feature| ShorelineFeature {
                geometry: as_multipoint(&feature.geometry),
                properties: feature.properties.clone(),
            })
            .collect();
        Self {
            crs: self.crs,
            features,
        }
    }

    pub fn dates(&self) -> Vec<DateTime<Utc>> {
        self.features.iter().map(|f| f.properties.date).collect()
    }

    /// Stable sort, oldest shoreline first
    pub fn sort_by_date(&mut self) {
        self.features.sort_by_key(|f| f.properties.date);
    }

    /// Keep the features for which `keep` returns true
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&ShorelineFeature) -> bool,
    {
        self.features.retain(|feature| keep(feature));
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    Coord {
                        x: a.min().x.min(b.min().x),
                        y: a.min().y.min(b.min().y),
                    },
                    Coord {
                        x: a.max().x.max(b.max().x),
                        y: a.max().y.max(b.max().y),
                    },
                )
            })
    }
}

fn as_multipoint(geometry: &Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::LineString(line) => Geometry::MultiPoint(line.points().collect()),
        Geometry::MultiLineString(lines) => Geometry::MultiPoint(
            lines.iter().flat_map(|line| line.points()).collect::<MultiPoint<f64>>(),
        ),
        Geometry::Point(point) => Geometry::MultiPoint(MultiPoint::new(vec![*point])),
        other => other.clone(),
    }
}

/// Combined bounding rectangle of a set of `[x, y]` rings
pub fn rings_bounding_rect(rings: &[Vec<[f64; 2]>]) -> Option<Rect<f64>> {
    let points: MultiPoint<f64> = rings
        .iter()
        .flatten()
        .map(|&[x, y]| Point::new(x, y))
        .collect();
    points.bounding_rect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    fn collection() -> ShorelineCollection {
        ShorelineCollection::from_records(
            &[
                record("2019-02-06 18:30:00", "L8", 4, 4.0),
                record("2019-01-05 18:30:00", "S2", 1, 4.0),
                record("2019-01-21 18:30:00", "L8", 3, 4.0),
            ],
            Crs::Utm { zone: 11, north: true },
        )
    }

    #[test]
    fn test_short_shorelines_skipped() {
        let collection = collection();
        assert_eq!(collection.len(), 2);
        assert!(matches!(collection.features[0].geometry, Geometry::LineString(ref l) if l.0.len() == 4));
    }

    #[test]
    fn test_reprojection_to_map_crs() {
        let wgs84 = collection().to_crs(Crs::Wgs84).unwrap();
        assert_eq!(wgs84.crs, Crs::Wgs84);
        let rect = wgs84.bounding_rect().unwrap();
        assert!(rect.min().x > -117.5 && rect.max().x < -117.4);
        assert!(rect.min().y > 33.1 && rect.max().y < 33.2);
        assert_eq!(wgs84.features[0].properties, collection().features[0].properties);
    }

    #[test]
    fn test_multipoints_and_sorting() {
        let mut points = collection().to_multipoints();
        assert!(matches!(points.features[0].geometry, Geometry::MultiPoint(ref m) if m.0.len() == 4));

        points.sort_by_date();
        let dates: Vec<String> = points.dates().iter().map(coast_common::utils::format_date).collect();
        assert_eq!(dates, vec!["2019-01-21 18:30:00", "2019-02-06 18:30:00"]);
    }

    #[test]
    fn test_rings_bounding_rect() {
        let rect = rings_bounding_rect(&[vec![[1.0, 5.0], [3.0, 2.0]], vec![[-1.0, 4.0]]]).unwrap();
        assert_eq!(rect.min(), Coord { x: -1.0, y: 2.0 });
        assert_eq!(rect.max(), Coord { x: 3.0, y: 5.0 });
        assert!(rings_bounding_rect(&[]).is_none());
    }
}
