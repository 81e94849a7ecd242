// src/collection/platform.rs
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::processing::mask::{QaMask, ReflectanceScale};

/// Spectral index bands appended to every image, in order.
pub const INDEX_BANDS: [&str; 6] = ["NDVI", "SAVI", "EVI", "GCI", "ARVI", "VARI"];

/// Supported surface reflectance archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Landsat-8 Collection 2 Tier 1 Level-2
    #[serde(alias = "l8", alias = "landsat-8")]
    Landsat8,
    /// Sentinel-2 Level-2A
    #[serde(alias = "s2", alias = "sentinel-2")]
    Sentinel2,
}

const LANDSAT8_BANDS: [(&str, &str); 7] = [
    ("SR_B2", "blue"),
    ("SR_B3", "green"),
    ("SR_B4", "red"),
    ("SR_B5", "nir"),
    ("SR_B6", "swir1"),
    ("SR_B7", "swir2"),
    ("ST_B10", "surface_temp"),
];

const SENTINEL2_BANDS: [(&str, &str); 9] = [
    ("QA60", "QA60"),
    ("B2", "blue"),
    ("B3", "green"),
    ("B4", "red"),
    ("B8", "nir"),
    ("B8A", "rededge4"),
    ("B9", "watervapor"),
    ("B11", "swir1"),
    ("B12", "swir2"),
];

impl Platform {
    /// Archive identifier on the hosted catalog.
    pub fn collection_id(&self) -> &'static str {
        match self {
            Platform::Landsat8 => "LANDSAT/LC08/C02/T1_L2",
            Platform::Sentinel2 => "COPERNICUS/S2_SR",
        }
    }

    /// Metadata property holding the scene cloud percentage.
    pub fn cloud_property(&self) -> &'static str {
        match self {
            Platform::Landsat8 => "CLOUD_COVER",
            Platform::Sentinel2 => "CLOUDY_PIXEL_PERCENTAGE",
        }
    }

    pub fn default_cloud_cover(&self) -> f64 {
        match self {
            Platform::Landsat8 => 10.0,
            Platform::Sentinel2 => 5.0,
        }
    }

    pub fn first_acquisition(&self) -> NaiveDate {
        match self {
            Platform::Landsat8 => NaiveDate::from_ymd_opt(2013, 3, 18),
            Platform::Sentinel2 => NaiveDate::from_ymd_opt(2017, 3, 28),
        }
        .unwrap_or(NaiveDate::MIN)
    }

    pub fn default_description(&self) -> &'static str {
        match self {
            Platform::Landsat8 => "L8",
            Platform::Sentinel2 => "S2",
        }
    }

    /// Stack multiplier applied after the indices are computed.
    pub fn default_output_gain(&self) -> f32 {
        match self {
            Platform::Landsat8 => 1.0,
            Platform::Sentinel2 => 10000.0,
        }
    }

    /// Band shown in map previews.
    pub fn default_preview_band(&self) -> &'static str {
        match self {
            Platform::Landsat8 => "EVI",
            Platform::Sentinel2 => "NDVI",
        }
    }

    /// Preview stretch `(min, max)` on the scale of the output stack.
    pub fn default_preview_range(&self) -> (f32, f32) {
        match self {
            Platform::Landsat8 => (0.0, 1.8),
            Platform::Sentinel2 => (0.0, 10000.0),
        }
    }

    /// `(archive code, semantic name)` pairs kept after masking.
    pub fn band_table(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Platform::Landsat8 => &LANDSAT8_BANDS,
            Platform::Sentinel2 => &SENTINEL2_BANDS,
        }
    }

    /// Every band a scene must provide: renamed bands plus QA inputs.
    pub fn required_source_bands(&self) -> Vec<&'static str> {
        let mut bands: Vec<&'static str> = self.band_table().iter().map(|(src, _)| *src).collect();
        for qa in self.qa_mask().source_bands() {
            if !bands.contains(&qa) {
                bands.push(qa);
            }
        }
        bands
    }

    /// Bands reduced and exported: renamed reflectance bands plus indices.
    pub fn export_bands(&self) -> Vec<&'static str> {
        self.band_table()
            .iter()
            .map(|(_, name)| *name)
            .filter(|name| *name != "QA60")
            .chain(INDEX_BANDS)
            .collect()
    }

    pub fn qa_mask(&self) -> QaMask {
        match self {
            Platform::Landsat8 => QaMask::landsat8(),
            Platform::Sentinel2 => QaMask::sentinel2(),
        }
    }

    pub fn reflectance_scale(&self) -> ReflectanceScale {
        match self {
            Platform::Landsat8 => ReflectanceScale::landsat8(),
            Platform::Sentinel2 => ReflectanceScale::sentinel2(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Landsat8 => write!(f, "landsat8"),
            Platform::Sentinel2 => write!(f, "sentinel2"),
        }
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "landsat8" | "landsat-8" | "l8" => Ok(Platform::Landsat8),
            "sentinel2" | "sentinel-2" | "s2" => Ok(Platform::Sentinel2),
            other => Err(Error::Config(format!("unknown platform: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_bands_drop_qa_and_append_indices() {
        let s2 = Platform::Sentinel2.export_bands();
        assert_eq!(s2.len(), 14);
        assert!(!s2.contains(&"QA60"));
        assert_eq!(&s2[8..], &INDEX_BANDS);

        let l8 = Platform::Landsat8.export_bands();
        assert_eq!(l8.len(), 13);
        assert_eq!(l8[6], "surface_temp");
    }

    #[test]
    fn landsat_requires_qa_bands() {
        let bands = Platform::Landsat8.required_source_bands();
        assert!(bands.contains(&"QA_PIXEL"));
        assert!(bands.contains(&"QA_RADSAT"));
        assert_eq!(bands.len(), 9);
    }

    #[test]
    fn parses_platform_aliases() {
        assert_eq!("L8".parse::<Platform>().unwrap(), Platform::Landsat8);
        assert_eq!("sentinel-2".parse::<Platform>().unwrap(), Platform::Sentinel2);
        assert!("modis".parse::<Platform>().is_err());
    }
}
