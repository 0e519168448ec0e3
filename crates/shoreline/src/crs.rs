//! Coordinate reference systems used by the shoreline workflow.
//!
//! Shorelines are displayed in geographic WGS84 and extracted in a projected
//! UTM zone. Only the systems that workflow needs are supported: EPSG:4326,
//! EPSG:3857 and the WGS84 UTM zones (EPSG:326xx / EPSG:327xx).

use std::fmt;
use std::str::FromStr;

use geo::MapCoords;
use geo_types::{Coord, Geometry};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShorelineError};

/// CRS of everything drawn on the map
pub const MAP_CRS: Crs = Crs::Wgs84;

// WGS84 ellipsoid
const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;

const UTM_SCALE: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// Geographic longitude/latitude, EPSG:4326
    Wgs84,
    /// Spherical web mercator, EPSG:3857
    WebMercator,
    /// WGS84 / UTM zone `zone`, EPSG:326xx (north) or EPSG:327xx (south)
    Utm { zone: u8, north: bool },
}

impl Crs {
    pub fn from_epsg(code: u32) -> Result<Self> {
        match code {
            4326 => Ok(Crs::Wgs84),
            3857 | 900913 => Ok(Crs::WebMercator),
            32601..=32660 => Ok(Crs::Utm { zone: (code - 32600) as u8, north: true }),
            32701..=32760 => Ok(Crs::Utm { zone: (code - 32700) as u8, north: false }),
            _ => Err(ShorelineError::UnsupportedCrs(format!("EPSG:{code}"))),
        }
    }

    pub fn epsg(&self) -> u32 {
        match *self {
            Crs::Wgs84 => 4326,
            Crs::WebMercator => 3857,
            Crs::Utm { zone, north: true } => 32600 + zone as u32,
            Crs::Utm { zone, north: false } => 32700 + zone as u32,
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Wgs84)
    }

    /// Transform a single coordinate from `self` into `to`
    pub fn transform(&self, to: &Crs, coord: Coord<f64>) -> Result<Coord<f64>> {
        if self == to {
            return Ok(coord);
        }
        let lonlat = self.unproject(coord)?;
        let out = to.project(lonlat)?;
        if out.x.is_finite() && out.y.is_finite() {
            Ok(out)
        } else {
            Err(ShorelineError::Projection(format!(
                "({}, {}) cannot be expressed in {}",
                coord.x, coord.y, to
            )))
        }
    }

    fn unproject(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        match *self {
            Crs::Wgs84 => Ok(coord),
            Crs::WebMercator => Ok(Coord {
                x: (coord.x / SEMI_MAJOR_AXIS).to_degrees(),
                y: (2.0 * (coord.y / SEMI_MAJOR_AXIS).exp().atan() - std::f64::consts::FRAC_PI_2)
                    .to_degrees(),
            }),
            Crs::Utm { zone, north } => Ok(utm_inverse(zone, north, coord)),
        }
    }

    fn project(&self, lonlat: Coord<f64>) -> Result<Coord<f64>> {
        if !(-90.0..=90.0).contains(&lonlat.y) {
            return Err(ShorelineError::Projection(format!(
                "latitude {} out of range",
                lonlat.y
            )));
        }
        match *self {
            Crs::Wgs84 => Ok(lonlat),
            Crs::WebMercator => Ok(Coord {
                x: SEMI_MAJOR_AXIS * lonlat.x.to_radians(),
                y: SEMI_MAJOR_AXIS
                    * (std::f64::consts::FRAC_PI_4 + lonlat.y.to_radians() / 2.0).tan().ln(),
            }),
            Crs::Utm { zone, north } => Ok(utm_forward(zone, north, lonlat)),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = ShorelineError;

    /// Accepts `EPSG:4326`, `epsg:32611`, `32611`, OGC URNs and `CRS84`
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Ok(Crs::Wgs84);
        }
        let code = upper
            .rsplit(':')
            .find(|part| !part.is_empty())
            .unwrap_or(&upper);
        code.parse::<u32>()
            .map_err(|_| ShorelineError::UnsupportedCrs(trimmed.to_string()))
            .and_then(Crs::from_epsg)
    }
}

impl TryFrom<String> for Crs {
    type Error = ShorelineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

/// Reproject every vertex of a geometry
pub fn reproject_geometry(geometry: &Geometry<f64>, from: &Crs, to: &Crs) -> Result<Geometry<f64>> {
    if from == to {
        return Ok(geometry.clone());
    }
    geometry.try_map_coords(|coord| from.transform(to, coord))
}

/// EPSG code of the WGS84 UTM zone containing `lon`/`lat`
pub fn utm_epsg_for(lon: f64, lat: f64) -> u32 {
    let zone = ((lon + 180.0) / 6.0).floor().rem_euclid(60.0) as u32 + 1;
    if lat >= 0.0 { 32600 + zone } else { 32700 + zone }
}

/// Replace a geographic output EPSG (4326/4327) with the UTM zone of `area`.
///
/// Any other code is returned unchanged. `area` is in EPSG:4326.
pub fn most_accurate_epsg(epsg: u32, area: &Geometry<f64>) -> u32 {
    use geo::Centroid;

    if epsg != 4326 && epsg != 4327 {
        return epsg;
    }
    match area.centroid() {
        Some(centroid) => utm_epsg_for(centroid.x(), centroid.y()),
        None => epsg,
    }
}

fn central_meridian(zone: u8) -> f64 {
    (zone as f64 * 6.0 - 183.0).to_radians()
}

/// Series coefficients of the Krüger transverse Mercator expansion
struct Kruger {
    rectifying_radius: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
    ecc_factor: f64,
}

fn kruger() -> Kruger {
    let n = FLATTENING / (2.0 - FLATTENING);
    let n2 = n * n;
    let n3 = n2 * n;
    Kruger {
        rectifying_radius: SEMI_MAJOR_AXIS / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
        alpha: [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
            61.0 * n3 / 240.0,
        ],
        beta: [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
            n2 / 48.0 + n3 / 15.0,
            17.0 * n3 / 480.0,
        ],
        delta: [
            2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
            7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
            56.0 * n3 / 15.0,
        ],
        ecc_factor: 2.0 * n.sqrt() / (1.0 + n),
    }
}

fn utm_forward(zone: u8, north: bool, lonlat: Coord<f64>) -> Coord<f64> {
    let k = kruger();
    let phi = lonlat.y.to_radians();
    let dlambda = lonlat.x.to_radians() - central_meridian(zone);

    let t = (phi.sin().atanh() - k.ecc_factor * (k.ecc_factor * phi.sin()).atanh()).sinh();
    let xi_p = t.atan2(dlambda.cos());
    let eta_p = (dlambda.sin() / (1.0 + t * t).sqrt()).atanh();

    let mut easting = eta_p;
    let mut northing = xi_p;
    for (j, alpha) in k.alpha.iter().enumerate() {
        let m = 2.0 * (j + 1) as f64;
        easting += alpha * (m * xi_p).cos() * (m * eta_p).sinh();
        northing += alpha * (m * xi_p).sin() * (m * eta_p).cosh();
    }

    let false_northing = if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };
    Coord {
        x: UTM_FALSE_EASTING + UTM_SCALE * k.rectifying_radius * easting,
        y: false_northing + UTM_SCALE * k.rectifying_radius * northing,
    }
}

fn utm_inverse(zone: u8, north: bool, coord: Coord<f64>) -> Coord<f64> {
    let k = kruger();
    let false_northing = if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };
    let xi = (coord.y - false_northing) / (UTM_SCALE * k.rectifying_radius);
    let eta = (coord.x - UTM_FALSE_EASTING) / (UTM_SCALE * k.rectifying_radius);

    let mut xi_p = xi;
    let mut eta_p = eta;
    for (j, beta) in k.beta.iter().enumerate() {
        let m = 2.0 * (j + 1) as f64;
        xi_p -= beta * (m * xi).sin() * (m * eta).cosh();
        eta_p -= beta * (m * xi).cos() * (m * eta).sinh();
    }

    let chi = (xi_p.sin() / eta_p.cosh()).asin();
    let mut phi = chi;
    for (j, delta) in k.delta.iter().enumerate() {
        phi += delta * (2.0 * (j + 1) as f64 * chi).sin();
    }
    let lambda = central_meridian(zone) + eta_p.sinh().atan2(xi_p.cos());

    Coord {
        x: lambda.to_degrees(),
        y: phi.to_degrees(),
    }
}
