// src/io/reader.rs
use std::path::Path;

use gdal::raster::ResampleAlg;
use gdal::Dataset;
use rayon::prelude::*;

use crate::collection::SceneEntry;
use crate::error::{Error, Result};
use crate::image::{Band, GeoInfo, Image, ImageProperties};
use crate::spatial;

/// Grid of the first raster band of a dataset.
pub fn geo_info(dataset: &Dataset) -> Result<GeoInfo> {
    let (width, height) = dataset.raster_size();
    Ok(GeoInfo {
        projection: dataset.projection(),
        geo_transform: dataset.geo_transform()?,
        width,
        height,
    })
}

/// Read band 1 of `path` as `f32`, resampled (nearest) to `size`.
/// The band's nodata value becomes NaN.
fn read_band(path: &Path, size: (usize, usize)) -> Result<Vec<f32>> {
    let dataset = Dataset::open(path)?;
    let band = dataset.rasterband(1)?;
    let nodata = band.no_data_value();
    let full = dataset.raster_size();
    let resample = (full != size).then_some(ResampleAlg::NearestNeighbour);

    let buffer = band.read_as::<f32>((0, 0), full, size, resample)?;
    let mut data = buffer.data().to_vec();
    if let Some(nodata) = nodata {
        let nodata = nodata as f32;
        data.par_iter_mut()
            .filter(|v| **v == nodata)
            .for_each(|v| *v = f32::NAN);
    }
    Ok(data)
}

/// Read `(name, path)` bands onto one grid, in parallel.
///
/// The grid is taken from the finest-resolution input; coarser bands are
/// upsampled with nearest neighbour. All inputs must cover the same extent.
pub fn read_bands_parallel(bands: &[(&str, &Path)]) -> Result<(Vec<Band>, GeoInfo)> {
    let grids = bands
        .iter()
        .map(|(_, path)| Dataset::open(path).map_err(Error::from).and_then(|ds| geo_info(&ds)))
        .collect::<Result<Vec<_>>>()?;

    let reference = grids
        .iter()
        .min_by(|a, b| a.geo_transform[1].abs().total_cmp(&b.geo_transform[1].abs()))
        .cloned()
        .ok_or_else(|| Error::Config("no bands to read".to_string()))?;

    let ref_bounds = reference.bounds();
    let tolerance = reference.geo_transform[1].abs() * 0.5;
    for grid in &grids {
        let fits = grid
            .bounds()
            .iter()
            .zip(ref_bounds.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance);
        if !fits {
            return Err(Error::ShapeMismatch {
                expected: reference.shape(),
                found: grid.shape(),
            });
        }
    }

    let shape = reference.shape();
    let data = bands
        .par_iter()
        .map(|(name, path)| {
            log::debug!("reading {} from {}", name, path.display());
            read_band(path, shape).map(|data| Band::from_vec(*name, shape, data))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((data, reference))
}

/// Load `bands` (archive codes) of a catalog scene into an image.
pub fn read_scene(scene: &SceneEntry, bands: &[&str]) -> Result<Image> {
    let paths = bands
        .iter()
        .map(|band| scene.band_path(band).map(|p| (*band, p)))
        .collect::<Result<Vec<_>>>()?;

    let (bands, geo) = read_bands_parallel(&paths)?;
    let mut image = Image::new(scene.id.clone(), geo).with_properties(ImageProperties {
        date: Some(scene.date),
        cloud_cover: Some(scene.cloud_cover),
    });
    for band in bands {
        image.add_band(band)?;
    }
    Ok(image)
}

/// Lon/lat extent `[min_x, min_y, max_x, max_y]` of a raster file.
pub fn footprint_wgs84(path: &Path) -> Result<[f64; 4]> {
    let dataset = Dataset::open(path)?;
    let geo = geo_info(&dataset)?;
    let srs = spatial::parse_srs(&geo.projection)?;
    spatial::transform_bounds(geo.bounds(), &srs, &spatial::wgs84()?)
}
