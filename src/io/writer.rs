// src/io/writer.rs
use std::path::Path;

use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::{Dataset, DriverManager, Metadata};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::image::Image;
use crate::spatial;

/// Nodata value written in place of masked (NaN) pixels.
pub const NODATA_VALUE_FLOAT: f32 = -999.0;

/// GeoTIFF creation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteOptions {
    #[serde(default = "default_compress")]
    pub compress: String,
    #[serde(default = "default_compress_level")]
    pub compress_level: u8,
    #[serde(default = "default_true")]
    pub tiled: bool,
}

fn default_compress() -> String {
    "DEFLATE".to_string()
}

fn default_compress_level() -> u8 {
    6
}

fn default_true() -> bool {
    true
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress: default_compress(),
            compress_level: default_compress_level(),
            tiled: true,
        }
    }
}

impl WriteOptions {
    pub fn creation_options(&self) -> Vec<String> {
        let mut options = Vec::new();
        let compress = self.compress.to_uppercase();

        // Add compression if not NONE
        if compress != "NONE" {
            options.push(format!("COMPRESS={compress}"));

            // Add compression level for supported algorithms
            match compress.as_str() {
                "DEFLATE" => options.push(format!("ZLEVEL={}", self.compress_level.min(9))),
                "ZSTD" => options.push(format!("ZSTD_LEVEL={}", self.compress_level.min(22))),
                _ => {}
            }
        }

        if self.tiled {
            options.push("TILED=YES".to_string());
        }

        // Always use multi-threading
        options.push("NUM_THREADS=ALL_CPUS".to_string());
        options
    }
}

/// Copy grid, band data, nodata and band names of `image` into `dataset`.
/// An empty projection is written as WGS84.
pub(crate) fn populate(dataset: &mut Dataset, image: &Image) -> Result<()> {
    let geo = image.geo();
    if geo.projection.is_empty() {
        dataset.set_projection(&spatial::wgs84_wkt()?)?;
    } else {
        dataset.set_projection(&geo.projection)?;
    }
    dataset.set_geo_transform(&geo.geo_transform)?;

    for (idx, source) in image.bands().iter().enumerate() {
        let mut band = dataset.rasterband(idx + 1)?;
        band.set_no_data_value(Some(NODATA_VALUE_FLOAT as f64))?;
        band.set_description(source.name())?;

        let data: Vec<f32> = source
            .data()
            .iter()
            .map(|&v| if v.is_nan() { NODATA_VALUE_FLOAT } else { v })
            .collect();
        let mut buffer = Buffer::new(source.shape(), data);
        band.write((0, 0), source.shape(), &mut buffer)?;
    }
    Ok(())
}

/// In-memory float32 copy of `image`.
pub(crate) fn to_mem_dataset(image: &Image) -> Result<Dataset> {
    let driver = DriverManager::get_driver_by_name("MEM")?;
    let (width, height) = image.shape();
    let mut dataset =
        driver.create_with_band_type::<f32, _>("", width, height, image.bands().len())?;
    populate(&mut dataset, image)?;
    Ok(dataset)
}

/// Write every band of `image` to a float32 GeoTIFF.
pub fn write_raster(image: &Image, output_path: &Path, options: &WriteOptions) -> Result<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let creation_options = RasterCreationOptions::from_iter(options.creation_options());
    let (width, height) = image.shape();

    let mut out_ds = driver.create_with_band_type_with_options::<f32, _>(
        output_path,
        width,
        height,
        image.bands().len(),
        &creation_options,
    )?;
    populate(&mut out_ds, image)?;
    out_ds.flush_cache()?;

    log::info!(
        "wrote {} bands ({}x{}) to {}",
        image.bands().len(),
        width,
        height,
        output_path.display()
    );
    Ok(())
}
