// src/image.rs
//! In-memory multi-band raster with named bands.
//!
//! Masked pixels are stored as `NaN`, so band arithmetic propagates the mask
//! without a separate mask layer.

use std::fmt;

use chrono::NaiveDate;
use gdal::raster::Buffer;
use itertools::Itertools;
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Grid description shared by every band of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoInfo {
    pub projection: String,
    pub geo_transform: [f64; 6],
    pub width: usize,
    pub height: usize,
}

impl GeoInfo {
    /// Build a north-up grid covering `bounds` (`[min_x, min_y, max_x, max_y]`)
    /// with square pixels of `pixel_size` map units.
    pub fn from_bounds(bounds: [f64; 4], pixel_size: f64, projection: String) -> Self {
        let [min_x, min_y, max_x, max_y] = bounds;
        let width = cell_count(max_x - min_x, pixel_size) as usize;
        let height = cell_count(max_y - min_y, pixel_size) as usize;
        Self {
            projection,
            geo_transform: [min_x, pixel_size, 0.0, max_y, 0.0, -pixel_size],
            width,
            height,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map coordinates of the centre of pixel (`col`, `row`).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        let gt = &self.geo_transform;
        let c = col as f64 + 0.5;
        let r = row as f64 + 0.5;
        (gt[0] + c * gt[1] + r * gt[2], gt[3] + c * gt[4] + r * gt[5])
    }

    /// Extent as `[min_x, min_y, max_x, max_y]`.
    pub fn bounds(&self) -> [f64; 4] {
        let gt = &self.geo_transform;
        let (w, h) = (self.width as f64, self.height as f64);
        let corners = [
            (gt[0], gt[3]),
            (gt[0] + w * gt[1], gt[3] + w * gt[4]),
            (gt[0] + h * gt[2], gt[3] + h * gt[5]),
            (gt[0] + w * gt[1] + h * gt[2], gt[3] + w * gt[4] + h * gt[5]),
        ];
        let (min_x, max_x) = corners
            .iter()
            .map(|c| c.0)
            .minmax_by(f64::total_cmp)
            .into_option()
            .unwrap_or((gt[0], gt[0]));
        let (min_y, max_y) = corners
            .iter()
            .map(|c| c.1)
            .minmax_by(f64::total_cmp)
            .into_option()
            .unwrap_or((gt[3], gt[3]));
        [min_x, min_y, max_x, max_y]
    }

    /// True when both grids have the same size, transform and projection.
    pub fn same_grid(&self, other: &GeoInfo) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.projection == other.projection
            && self
                .geo_transform
                .iter()
                .zip(other.geo_transform.iter())
                .all(|(a, b)| (a - b).abs() <= 1e-9 * a.abs().max(1.0))
    }
}

/// Pixels needed to cover `span` map units, at least one.
/// Quotients within 1e-6 of an integer are taken as exact.
pub fn cell_count(span: f64, pixel_size: f64) -> f64 {
    let cells = span / pixel_size;
    let nearest = cells.round();
    let cells = if (cells - nearest).abs() < 1e-6 {
        nearest
    } else {
        cells.ceil()
    };
    cells.max(1.0)
}

/// Acquisition metadata carried along with an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageProperties {
    pub date: Option<NaiveDate>,
    pub cloud_cover: Option<f64>,
}

/// A single named `f32` band.
pub struct Band {
    name: String,
    buffer: Buffer<f32>,
}

impl Clone for Band {
    fn clone(&self) -> Self {
        Self::from_vec(self.name.clone(), self.shape(), self.data().to_vec())
    }
}

impl fmt::Debug for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Band")
            .field("name", &self.name)
            .field("shape", &self.shape())
            .finish()
    }
}

impl Band {
    pub fn new(name: impl Into<String>, buffer: Buffer<f32>) -> Self {
        Self {
            name: name.into(),
            buffer,
        }
    }

    pub fn from_vec(name: impl Into<String>, shape: (usize, usize), data: Vec<f32>) -> Self {
        Self::new(name, Buffer::new(shape, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer(&self) -> &Buffer<f32> {
        &self.buffer
    }

    pub fn data(&self) -> &[f32] {
        self.buffer.data()
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        self.buffer.data_mut()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.buffer.shape()
    }

    /// Number of unmasked pixels.
    pub fn valid_count(&self) -> usize {
        self.data().iter().filter(|v| !v.is_nan()).count()
    }

    fn renamed(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    id: String,
    properties: ImageProperties,
    geo: GeoInfo,
    bands: Vec<Band>,
}

impl Image {
    pub fn new(id: impl Into<String>, geo: GeoInfo) -> Self {
        Self {
            id: id.into(),
            properties: ImageProperties::default(),
            geo,
            bands: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: ImageProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn properties(&self) -> &ImageProperties {
        &self.properties
    }

    pub fn geo(&self) -> &GeoInfo {
        &self.geo
    }

    pub fn shape(&self) -> (usize, usize) {
        self.geo.shape()
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(Band::name).collect()
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|b| b.name == name)
    }

    pub fn band(&self, name: &str) -> Result<&Band> {
        self.bands
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| self.missing(name))
    }

    pub fn band_mut(&mut self, name: &str) -> Result<&mut Band> {
        match self.bands.iter().position(|b| b.name == name) {
            Some(idx) => Ok(&mut self.bands[idx]),
            None => Err(self.missing(name)),
        }
    }

    /// Append a band. Fails if the name is taken or the shape differs.
    pub fn add_band(&mut self, band: Band) -> Result<()> {
        if band.shape() != self.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape(),
                found: band.shape(),
            });
        }
        if self.has_band(band.name()) {
            return Err(Error::DuplicateBand {
                band: band.name,
                image: self.id.clone(),
            });
        }
        self.bands.push(band);
        Ok(())
    }

    pub fn with_band(mut self, band: Band) -> Result<Self> {
        self.add_band(band)?;
        Ok(self)
    }

    /// New image holding only `names`, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Image> {
        let pairs: Vec<(&str, &str)> = names.iter().map(|n| (*n, *n)).collect();
        self.select_rename(&pairs)
    }

    /// New image holding `(source, target)` bands renamed to `target`.
    pub fn select_rename(&self, pairs: &[(&str, &str)]) -> Result<Image> {
        let mut out = Image {
            id: self.id.clone(),
            properties: self.properties.clone(),
            geo: self.geo.clone(),
            bands: Vec::with_capacity(pairs.len()),
        };
        for (source, target) in pairs {
            let band = self.band(source)?.clone().renamed(target);
            out.add_band(band)?;
        }
        Ok(out)
    }

    /// Mask every band where `keep` is false.
    pub fn update_mask(&mut self, keep: &[bool]) -> Result<()> {
        if keep.len() != self.geo.len() {
            return Err(Error::ShapeMismatch {
                expected: self.shape(),
                found: (keep.len(), 1),
            });
        }
        for band in &mut self.bands {
            band.data_mut()
                .par_iter_mut()
                .zip(keep.par_iter())
                .for_each(|(value, &keep)| {
                    if !keep {
                        *value = f32::NAN;
                    }
                });
        }
        Ok(())
    }

    /// Apply `f` to every pixel of the named band.
    pub fn map_band<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        F: Fn(f32) -> f32 + Sync,
    {
        let band = self.band_mut(name)?;
        band.data_mut().par_iter_mut().for_each(|v| *v = f(*v));
        Ok(())
    }

    /// Apply `f` to every pixel of every band.
    pub fn map_all<F>(&mut self, f: F)
    where
        F: Fn(f32) -> f32 + Sync,
    {
        for band in &mut self.bands {
            band.data_mut().par_iter_mut().for_each(|v| *v = f(*v));
        }
    }

    fn missing(&self, name: &str) -> Error {
        Error::MissingBand {
            band: name.to_string(),
            image: self.id.clone(),
        }
    }
}
