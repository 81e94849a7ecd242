// src/spatial.rs
//! Spatial reference helpers shared by AOI handling, clipping and export.

use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};

use crate::error::Result;

/// Metres per degree at the equator, used to turn a scale in metres into a
/// pixel size for geographic CRSs.
pub const METERS_PER_DEGREE: f64 = 111_319.49;

fn traditional(mut srs: SpatialRef) -> SpatialRef {
    // lon/lat (x/y) order regardless of the authority's axis order
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    srs
}

pub fn wgs84() -> Result<SpatialRef> {
    Ok(traditional(SpatialRef::from_epsg(4326)?))
}

pub fn wgs84_wkt() -> Result<String> {
    Ok(wgs84()?.to_wkt()?)
}

/// Parse `EPSG:xxxx`, PROJ or WKT definitions. An empty string means WGS84.
pub fn parse_srs(definition: &str) -> Result<SpatialRef> {
    if definition.trim().is_empty() {
        return wgs84();
    }
    Ok(traditional(SpatialRef::from_definition(definition)?))
}

/// Reproject `[min_x, min_y, max_x, max_y]` between reference systems.
pub fn transform_bounds(bounds: [f64; 4], from: &SpatialRef, to: &SpatialRef) -> Result<[f64; 4]> {
    if from == to {
        return Ok(bounds);
    }
    let transform = CoordTransform::new(from, to)?;
    Ok(transform.transform_bounds(&bounds, 21)?)
}

/// Reproject a list of `(x, y)` vertices.
pub fn transform_points(
    points: &[(f64, f64)],
    from: &SpatialRef,
    to: &SpatialRef,
) -> Result<Vec<(f64, f64)>> {
    if from == to {
        return Ok(points.to_vec());
    }
    let transform = CoordTransform::new(from, to)?;
    let mut xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let mut ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    let mut zs = vec![0.0; points.len()];
    transform.transform_coords(&mut xs, &mut ys, &mut zs)?;
    Ok(xs.into_iter().zip(ys).collect())
}

/// Pixel size in map units for a nominal scale in metres.
pub fn pixel_size_for_scale(scale_m: f64, srs: &SpatialRef) -> f64 {
    if srs.is_geographic() {
        scale_m / METERS_PER_DEGREE
    } else {
        scale_m
    }
}
