// src/aoi.rs
//! Area of interest: one polygon in EPSG:4326.

use std::path::Path;

use gdal::spatial_ref::SpatialRef;
use gdal::vector::LayerAccess;
use gdal::Dataset;
use geo::{BoundingRect, Contains, Coord, Geometry, Intersects, LineString, Point, Polygon, Rect};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::spatial;

#[derive(Debug, Clone, PartialEq)]
pub struct Aoi {
    polygon: Polygon<f64>,
}

impl Aoi {
    /// Build from exterior ring vertices (lon, lat). The ring is closed if needed.
    pub fn from_coords(coords: Vec<(f64, f64)>) -> Result<Self> {
        let mut distinct: Vec<(f64, f64)> = Vec::with_capacity(coords.len());
        for c in &coords {
            if !c.0.is_finite() || !c.1.is_finite() {
                return Err(Error::InvalidAoi(format!("non-finite vertex {c:?}")));
            }
            if !distinct.contains(c) {
                distinct.push(*c);
            }
        }
        if distinct.len() < 3 {
            return Err(Error::InvalidAoi(format!(
                "polygon needs at least 3 distinct vertices, got {}",
                distinct.len()
            )));
        }
        // LineString -> Polygon closes the ring
        let polygon = Polygon::new(LineString::from(coords), vec![]);
        Ok(Self { polygon })
    }

    /// Axis-aligned rectangle, handy for tests and bbox-style inputs.
    pub fn from_bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        Self::from_coords(vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, max_y),
            (min_x, max_y),
        ])
    }

    /// Parse a GeoJSON Polygon, MultiPolygon, Feature or FeatureCollection.
    /// Only the first polygon's exterior ring is kept.
    pub fn from_geojson(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let ring = geojson_ring(&value)?;
        Self::from_coords(ring)
    }

    /// Load from any OGR-readable vector source (GeoJSON, shapefile, ...),
    /// reprojected to EPSG:4326 when the layer declares another CRS.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Reading AOI from: {}", path.display());

        let dataset = Dataset::open(path)?;
        let mut layer = dataset.layer(0)?;
        let wgs84 = spatial::wgs84()?;
        let layer_srs: Option<SpatialRef> = layer.spatial_ref();

        let feature = layer
            .features()
            .next()
            .ok_or_else(|| Error::InvalidAoi(format!("{} has no features", path.display())))?;
        let geometry = feature
            .geometry()
            .ok_or_else(|| Error::InvalidAoi("first feature has no geometry".to_string()))?;

        let geometry = match layer_srs {
            Some(srs) if srs != wgs84 => {
                log::info!("Transforming AOI to EPSG:4326");
                geometry.transform_to(&wgs84)?
            }
            _ => geometry.clone(),
        };

        let polygon = match geometry.to_geo()? {
            Geometry::Polygon(p) => p,
            Geometry::MultiPolygon(mp) => mp
                .0
                .into_iter()
                .next()
                .ok_or_else(|| Error::InvalidAoi("empty multipolygon".to_string()))?,
            other => {
                return Err(Error::InvalidAoi(format!(
                    "expected a polygon geometry, got {other:?}"
                )))
            }
        };
        let ring = polygon.exterior().coords().map(|c| (c.x, c.y)).collect();
        Self::from_coords(ring)
    }

    pub fn exterior(&self) -> Vec<(f64, f64)> {
        self.polygon.exterior().coords().map(|c| (c.x, c.y)).collect()
    }

    /// `[min_lon, min_lat, max_lon, max_lat]`
    pub fn bounds(&self) -> [f64; 4] {
        match self.polygon.bounding_rect() {
            Some(rect) => [rect.min().x, rect.min().y, rect.max().x, rect.max().y],
            None => [0.0; 4],
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygon.contains(&Point::new(lon, lat))
    }

    /// Whether a lon/lat footprint `[min_x, min_y, max_x, max_y]` touches the AOI.
    pub fn intersects_bounds(&self, footprint: [f64; 4]) -> bool {
        let rect = Rect::new(
            Coord {
                x: footprint[0],
                y: footprint[1],
            },
            Coord {
                x: footprint[2],
                y: footprint[3],
            },
        );
        self.polygon.intersects(&rect)
    }

    /// The polygon with its vertices transformed into `srs`.
    pub fn polygon_in(&self, srs: &SpatialRef) -> Result<Polygon<f64>> {
        let projected = spatial::transform_points(&self.exterior(), &spatial::wgs84()?, srs)?;
        Ok(Polygon::new(LineString::from(projected), vec![]))
    }
}

fn geojson_ring(value: &Value) -> Result<Vec<(f64, f64)>> {
    let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "FeatureCollection" => {
            let first = value
                .get("features")
                .and_then(Value::as_array)
                .and_then(|f| f.first())
                .ok_or_else(|| Error::InvalidAoi("feature collection is empty".to_string()))?;
            geojson_ring(first)
        }
        "Feature" => {
            let geometry = value
                .get("geometry")
                .ok_or_else(|| Error::InvalidAoi("feature has no geometry".to_string()))?;
            geojson_ring(geometry)
        }
        "Polygon" => ring_from(value.pointer("/coordinates/0")),
        "MultiPolygon" => ring_from(value.pointer("/coordinates/0/0")),
        other => Err(Error::InvalidAoi(format!(
            "unsupported GeoJSON type '{other}'"
        ))),
    }
}

fn ring_from(ring: Option<&Value>) -> Result<Vec<(f64, f64)>> {
    let ring = ring
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidAoi("missing polygon coordinates".to_string()))?;
    ring.iter()
        .map(|pos| match (pos.get(0).and_then(Value::as_f64), pos.get(1).and_then(Value::as_f64)) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(Error::InvalidAoi(format!("invalid position {pos}"))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELD: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-93.7, 42.0], [-93.6, 42.0], [-93.6, 42.1], [-93.7, 42.1], [-93.7, 42.0]]]
            }
        }]
    }"#;

    #[test]
    fn parses_feature_collection() {
        let aoi = Aoi::from_geojson(FIELD).unwrap();
        let b = aoi.bounds();
        assert_eq!(b, [-93.7, 42.0, -93.6, 42.1]);
        assert!(aoi.contains(-93.65, 42.05));
        assert!(!aoi.contains(-93.5, 42.05));
    }

    #[test]
    fn footprint_intersection() {
        let aoi = Aoi::from_bounds(0.0, 0.0, 1.0, 1.0).unwrap();
        assert!(aoi.intersects_bounds([0.5, 0.5, 2.0, 2.0]));
        assert!(!aoi.intersects_bounds([1.5, 1.5, 2.0, 2.0]));
    }

    #[test]
    fn rejects_degenerate_rings() {
        assert!(Aoi::from_coords(vec![(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]).is_err());
        assert!(Aoi::from_geojson(r#"{"type": "Point", "coordinates": [0, 0]}"#).is_err());
    }
}
