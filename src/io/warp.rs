// src/io/warp.rs
use gdal::DriverManager;

use super::writer::{to_mem_dataset, NODATA_VALUE_FLOAT};
use crate::error::Result;
use crate::image::{Band, GeoInfo, Image};

/// Nearest-neighbour resample of every band of `image` onto `target`.
/// Pixels outside the source come back masked.
pub fn resample(image: &Image, target: &GeoInfo) -> Result<Image> {
    if image.geo().same_grid(target) {
        return Ok(image.clone());
    }

    let source = to_mem_dataset(image)?;
    let band_count = image.bands().len();

    let driver = DriverManager::get_driver_by_name("MEM")?;
    let mut dest =
        driver.create_with_band_type::<f32, _>("", target.width, target.height, band_count)?;
    dest.set_projection(&target.projection)?;
    dest.set_geo_transform(&target.geo_transform)?;
    for idx in 1..=band_count {
        let mut band = dest.rasterband(idx)?;
        band.set_no_data_value(Some(NODATA_VALUE_FLOAT as f64))?;
        band.fill(NODATA_VALUE_FLOAT as f64, None)?;
    }

    gdal::raster::reproject(&source, &dest)?;

    let shape = target.shape();
    let mut out = Image::new(image.id(), target.clone()).with_properties(image.properties().clone());
    for (idx, source_band) in image.bands().iter().enumerate() {
        let band = dest.rasterband(idx + 1)?;
        let buffer = band.read_as::<f32>((0, 0), shape, shape, None)?;
        let data = buffer
            .data()
            .iter()
            .map(|&v| if v == NODATA_VALUE_FLOAT { f32::NAN } else { v })
            .collect();
        out.add_band(Band::from_vec(source_band.name(), shape, data))?;
    }

    log::debug!(
        "resampled {} from {}x{} to {}x{}",
        image.id(),
        image.geo().width,
        image.geo().height,
        target.width,
        target.height
    );
    Ok(out)
}
