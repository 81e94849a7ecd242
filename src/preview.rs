// src/preview.rs
//! Palette-stretched PNG previews of a single composite band.

use std::fs;
use std::path::{Path, PathBuf};

use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::DriverManager;
use itertools::{Itertools, MinMaxResult};

use crate::error::{Error, Result};
use crate::image::{Band, Image};

/// Vegetation palette, white through dark green.
pub const DEFAULT_PALETTE: [&str; 17] = [
    "FFFFFF", "CE7E45", "DF923D", "F1B555", "FCD163", "99B718", "74A901", "66A000", "529400",
    "3E8601", "207401", "056201", "004C00", "023B01", "012E01", "011D01", "011301",
];

#[derive(Debug, Clone, PartialEq)]
pub struct VisParams {
    pub min: f32,
    pub max: f32,
    pub palette: Vec<String>,
}

pub fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|s| s.to_string()).collect()
}

impl Default for VisParams {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1.8,
            palette: default_palette(),
        }
    }
}

pub fn parse_hex_color(hex: &str) -> Result<[u8; 3]> {
    let hex = hex.trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .ok_or_else(|| Error::Config(format!("invalid palette colour '{hex}'")))
    };
    if hex.len() != 6 {
        return Err(Error::Config(format!("invalid palette colour '{hex}'")));
    }
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// A parsed palette with a linear stretch.
#[derive(Debug, Clone)]
pub struct ColorRamp {
    min: f32,
    max: f32,
    stops: Vec<[u8; 3]>,
}

impl ColorRamp {
    pub fn new(params: &VisParams) -> Result<Self> {
        if params.palette.is_empty() {
            return Err(Error::Config("palette is empty".to_string()));
        }
        if !(params.max > params.min) {
            return Err(Error::Config(format!(
                "preview max {} must exceed min {}",
                params.max, params.min
            )));
        }
        let stops = params
            .palette
            .iter()
            .map(|c| parse_hex_color(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            min: params.min,
            max: params.max,
            stops,
        })
    }

    /// RGBA for a value; masked values are fully transparent.
    pub fn color(&self, value: f32) -> [u8; 4] {
        if value.is_nan() {
            return [0, 0, 0, 0];
        }
        let t = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        if self.stops.len() == 1 {
            let [r, g, b] = self.stops[0];
            return [r, g, b, 255];
        }

        let pos = t * (self.stops.len() - 1) as f32;
        let lower = (pos.floor() as usize).min(self.stops.len() - 2);
        let frac = pos - lower as f32;
        let (a, b) = (self.stops[lower], self.stops[lower + 1]);
        let mix = |i: usize| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * frac).round() as u8;
        [mix(0), mix(1), mix(2), 255]
    }
}

/// Summary of the unmasked values of a band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandStats {
    pub valid: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

pub fn band_stats(band: &Band) -> BandStats {
    let valid = band.data().iter().copied().filter(|v| !v.is_nan());
    let (min, max) = match valid.clone().minmax_by(f32::total_cmp) {
        MinMaxResult::NoElements => (f32::NAN, f32::NAN),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };
    let count = band.valid_count();
    let sum: f64 = valid.map(|v| v as f64).sum();
    BandStats {
        valid: count,
        min,
        max,
        mean: if count == 0 { f32::NAN } else { (sum / count as f64) as f32 },
    }
}

/// Log per-band statistics of an image.
pub fn log_summary(image: &Image) {
    log::info!(
        "{}: {}x{} pixels, bands [{}]",
        image.id(),
        image.geo().width,
        image.geo().height,
        image.band_names().iter().join(", ")
    );
    for band in image.bands() {
        let stats = band_stats(band);
        log::info!(
            "  {:<12} valid={:<8} min={:.4} max={:.4} mean={:.4}",
            band.name(),
            stats.valid,
            stats.min,
            stats.max,
            stats.mean
        );
    }
}

/// Render `band_name` of `image` into an RGBA PNG at `path`.
pub fn render_png(image: &Image, band_name: &str, params: &VisParams, path: &Path) -> Result<PathBuf> {
    let band = image.band(band_name)?;
    let ramp = ColorRamp::new(params)?;
    let (width, height) = band.shape();

    let mut channels = vec![Vec::with_capacity(band.data().len()); 4];
    for &value in band.data() {
        for (channel, c) in channels.iter_mut().zip(ramp.color(value)) {
            channel.push(c);
        }
    }

    let mem = DriverManager::get_driver_by_name("MEM")?;
    let mut dataset = mem.create_with_band_type::<u8, _>("", width, height, 4)?;
    for (idx, channel) in channels.into_iter().enumerate() {
        let mut out_band = dataset.rasterband(idx + 1)?;
        let mut buffer = Buffer::new((width, height), channel);
        out_band.write((0, 0), (width, height), &mut buffer)?;
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let png = DriverManager::get_driver_by_name("PNG")?;
    dataset.create_copy(&png, path, &RasterCreationOptions::new())?;

    log::info!("preview of {} written to {}", band_name, path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_endpoints_and_midpoints() {
        let params = VisParams {
            min: 0.0,
            max: 1.0,
            palette: vec!["000000".into(), "FF0000".into(), "FFFFFF".into()],
        };
        let ramp = ColorRamp::new(&params).unwrap();
        assert_eq!(ramp.color(-5.0), [0, 0, 0, 255]);
        assert_eq!(ramp.color(0.5), [255, 0, 0, 255]);
        assert_eq!(ramp.color(0.25), [128, 0, 0, 255]);
        assert_eq!(ramp.color(1.0), [255, 255, 255, 255]);
        assert_eq!(ramp.color(f32::NAN), [0, 0, 0, 0]);
    }

    #[test]
    fn default_palette_parses() {
        let ramp = ColorRamp::new(&VisParams::default()).unwrap();
        assert_eq!(ramp.color(0.0), [255, 255, 255, 255]);
        assert_eq!(ramp.color(1.8), [0x01, 0x13, 0x01, 255]);
        assert!(parse_hex_color("12345").is_err());
        assert!(parse_hex_color("GG0000").is_err());
    }
}
