// src/processing/mask.rs
//! QA bitmask cloud/shadow masking and reflectance rescaling.

use rayon::prelude::*;

use crate::error::Result;
use crate::image::Image;

/// Per-pixel mask built from a QA bitmask band.
///
/// A pixel is kept when none of `bits` are set in `qa_band` and every band in
/// `zero_bands` equals zero. NaN QA values are masked.
#[derive(Debug, Clone, PartialEq)]
pub struct QaMask {
    pub qa_band: &'static str,
    pub bits: &'static [u32],
    pub zero_bands: &'static [&'static str],
}

impl QaMask {
    /// `QA_PIXEL` bits 3 and 5, plus the `QA_RADSAT` saturation mask.
    pub fn landsat8() -> Self {
        Self {
            qa_band: "QA_PIXEL",
            bits: &[3, 5],
            zero_bands: &["QA_RADSAT"],
        }
    }

    /// `QA60` bits 10 (opaque cloud) and 11 (cirrus).
    pub fn sentinel2() -> Self {
        Self {
            qa_band: "QA60",
            bits: &[10, 11],
            zero_bands: &[],
        }
    }

    pub fn bitmask(&self) -> u32 {
        self.bits.iter().fold(0, |acc, bit| acc | (1 << bit))
    }

    pub fn source_bands(&self) -> Vec<&'static str> {
        std::iter::once(self.qa_band)
            .chain(self.zero_bands.iter().copied())
            .collect()
    }

    /// Keep-mask for every pixel of `image`.
    pub fn clear_pixels(&self, image: &Image) -> Result<Vec<bool>> {
        let bitmask = self.bitmask();
        let qa = image.band(self.qa_band)?.data();
        let mut keep: Vec<bool> = qa
            .par_iter()
            .map(|&value| !value.is_nan() && (value as u32) & bitmask == 0)
            .collect();

        for name in self.zero_bands {
            let band = image.band(name)?.data();
            keep.par_iter_mut()
                .zip(band.par_iter())
                .for_each(|(keep, &value)| *keep = *keep && value == 0.0);
        }
        Ok(keep)
    }

    pub fn apply(&self, image: &mut Image) -> Result<()> {
        let keep = self.clear_pixels(image)?;
        image.update_mask(&keep)
    }
}

/// Which bands a rescaling rule applies to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandSelector {
    All,
    Prefix(&'static str),
    Exact(&'static str),
}

impl BandSelector {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            BandSelector::All => true,
            BandSelector::Prefix(prefix) => name.starts_with(prefix),
            BandSelector::Exact(exact) => name == *exact,
        }
    }
}

/// Linear `value * gain + offset` rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRule {
    pub bands: BandSelector,
    pub gain: f32,
    pub offset: f32,
}

/// Digital number to surface reflectance (or temperature) conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectanceScale {
    pub rules: Vec<ScaleRule>,
}

impl ReflectanceScale {
    pub fn landsat8() -> Self {
        Self {
            rules: vec![
                ScaleRule {
                    bands: BandSelector::Prefix("SR_B"),
                    gain: 0.0000275,
                    offset: -0.2,
                },
                ScaleRule {
                    bands: BandSelector::Exact("ST_B10"),
                    gain: 0.00341802,
                    offset: 149.0,
                },
            ],
        }
    }

    pub fn sentinel2() -> Self {
        Self {
            rules: vec![ScaleRule {
                bands: BandSelector::All,
                gain: 1.0 / 10000.0,
                offset: 0.0,
            }],
        }
    }

    /// Apply the first matching rule to each band; unmatched bands are left as is.
    pub fn apply(&self, image: &mut Image) -> Result<()> {
        let names: Vec<String> = image.band_names().iter().map(|s| s.to_string()).collect();
        for name in names {
            if let Some(rule) = self.rules.iter().find(|r| r.bands.matches(&name)) {
                let (gain, offset) = (rule.gain, rule.offset);
                image.map_band(&name, move |v| v * gain + offset)?;
            }
        }
        Ok(())
    }
}

/// Mask clouds and shadows, then rescale to physical units.
pub fn mask_and_scale(mask: &QaMask, scale: &ReflectanceScale, mut image: Image) -> Result<Image> {
    mask.apply(&mut image)?;
    scale.apply(&mut image)?;
    Ok(image)
}
