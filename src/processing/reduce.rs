// src/processing/reduce.rs
//! Per-pixel temporal reducers over an image collection.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::{Band, Image};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Mean,
    Median,
    Min,
    Max,
}

impl Reducer {
    pub const ALL: [Reducer; 4] = [Reducer::Mean, Reducer::Median, Reducer::Min, Reducer::Max];

    pub fn as_str(&self) -> &'static str {
        match self {
            Reducer::Mean => "mean",
            Reducer::Median => "median",
            Reducer::Min => "min",
            Reducer::Max => "max",
        }
    }

    /// Reduce the unmasked values in `values`. Returns NaN when none remain.
    /// `values` is reordered in place.
    pub fn reduce_values(&self, values: &mut [f32]) -> f32 {
        if values.is_empty() {
            return f32::NAN;
        }
        match self {
            Reducer::Mean => {
                let sum: f64 = values.iter().map(|&v| v as f64).sum();
                (sum / values.len() as f64) as f32
            }
            Reducer::Min => values.iter().copied().fold(f32::INFINITY, f32::min),
            Reducer::Max => values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            Reducer::Median => {
                values.sort_unstable_by(f32::total_cmp);
                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    (values[mid - 1] + values[mid]) / 2.0
                } else {
                    values[mid]
                }
            }
        }
    }

    /// Reduce `bands` of every image into one image, pixel by pixel.
    ///
    /// All images must share a grid. Masked pixels are skipped; a pixel masked
    /// everywhere stays masked.
    pub fn reduce(&self, images: &[Image], bands: &[&str]) -> Result<Image> {
        let first = images
            .first()
            .ok_or_else(|| Error::EmptyCollection(format!("nothing to reduce with {self}")))?;
        let geo = first.geo().clone();

        if let Some(other) = images.iter().find(|img| !img.geo().same_grid(&geo)) {
            return Err(Error::ShapeMismatch {
                expected: geo.shape(),
                found: other.shape(),
            });
        }

        let mut out = Image::new(self.as_str(), geo.clone());
        for &name in bands {
            let inputs = images
                .iter()
                .map(|img| img.band(name).map(Band::data))
                .collect::<Result<Vec<_>>>()?;

            let data: Vec<f32> = (0..geo.len())
                .into_par_iter()
                .map_init(
                    || Vec::with_capacity(inputs.len()),
                    |scratch, i| {
                        scratch.clear();
                        scratch.extend(inputs.iter().map(|d| d[i]).filter(|v| !v.is_nan()));
                        self.reduce_values(scratch)
                    },
                )
                .collect();

            out.add_band(Band::from_vec(name, geo.shape(), data))?;
        }

        log::debug!(
            "reduced {} images with {} into {} bands",
            images.len(),
            self,
            bands.len()
        );
        Ok(out)
    }
}

impl FromStr for Reducer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(Reducer::Mean),
            "median" => Ok(Reducer::Median),
            "min" => Ok(Reducer::Min),
            "max" => Ok(Reducer::Max),
            other => Err(Error::Config(format!("unknown reducer: {other}"))),
        }
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
