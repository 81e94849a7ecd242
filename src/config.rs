// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::collection::Platform;
use crate::error::{Error, Result};
use crate::export::{DEFAULT_CRS, DEFAULT_FOLDER, DEFAULT_MAX_PIXELS, DEFAULT_SCALE};
use crate::io::WriteOptions;
use crate::preview::{default_palette, ColorRamp, VisParams};
use crate::processing::Reducer;

/// Export settings; unset fields fall back to a global section, then defaults.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ExportConfig {
    pub scale: Option<f64>,
    pub description: Option<String>,
    pub folder: Option<String>,
    pub crs: Option<String>,
    pub max_pixels: Option<f64>,
    pub output_dir: Option<PathBuf>,
    pub compress: Option<String>,
    pub compress_level: Option<u8>,
    pub tiled: Option<bool>,
    pub workers: Option<usize>,
}

impl ExportConfig {
    /// Fill unset fields from `fallback`.
    pub fn or(self, fallback: &ExportConfig) -> ExportConfig {
        ExportConfig {
            scale: self.scale.or(fallback.scale),
            description: self.description.or_else(|| fallback.description.clone()),
            folder: self.folder.or_else(|| fallback.folder.clone()),
            crs: self.crs.or_else(|| fallback.crs.clone()),
            max_pixels: self.max_pixels.or(fallback.max_pixels),
            output_dir: self.output_dir.or_else(|| fallback.output_dir.clone()),
            compress: self.compress.or_else(|| fallback.compress.clone()),
            compress_level: self.compress_level.or(fallback.compress_level),
            tiled: self.tiled.or(fallback.tiled),
            workers: self.workers.or(fallback.workers),
        }
    }

    pub fn resolve(&self, platform: Platform) -> ExportSettings {
        let defaults = WriteOptions::default();
        ExportSettings {
            scale: self.scale.unwrap_or(DEFAULT_SCALE),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| platform.default_description().to_string()),
            folder: self.folder.clone().unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
            crs: self.crs.clone().unwrap_or_else(|| DEFAULT_CRS.to_string()),
            max_pixels: self.max_pixels.unwrap_or(DEFAULT_MAX_PIXELS),
            output_dir: self.output_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
            write: WriteOptions {
                compress: self.compress.clone().unwrap_or(defaults.compress),
                compress_level: self.compress_level.unwrap_or(defaults.compress_level),
                tiled: self.tiled.unwrap_or(defaults.tiled),
            },
            workers: self.workers,
        }
    }
}

/// Export settings with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub scale: f64,
    pub description: String,
    pub folder: String,
    pub crs: String,
    pub max_pixels: f64,
    pub output_dir: PathBuf,
    pub write: WriteOptions,
    pub workers: Option<usize>,
}

/// Preview settings; unset fields take the platform's defaults.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PreviewConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub band: Option<String>,
    #[serde(default)]
    pub min: Option<f32>,
    #[serde(default)]
    pub max: Option<f32>,
    #[serde(default)]
    pub palette: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            band: None,
            min: None,
            max: None,
            palette: None,
        }
    }
}

impl PreviewConfig {
    pub fn resolve(&self, platform: Platform) -> PreviewSettings {
        let (min, max) = platform.default_preview_range();
        PreviewSettings {
            enabled: self.enabled,
            band: self
                .band
                .clone()
                .unwrap_or_else(|| platform.default_preview_band().to_string()),
            vis: VisParams {
                min: self.min.unwrap_or(min),
                max: self.max.unwrap_or(max),
                palette: self.palette.clone().unwrap_or_else(default_palette),
            },
        }
    }
}

/// Preview settings with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSettings {
    pub enabled: bool,
    pub band: String,
    pub vis: VisParams,
}

fn default_reducers() -> Vec<Reducer> {
    Reducer::ALL.to_vec()
}

/// One composite run.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub platform: Platform,
    pub catalog: PathBuf,
    pub aoi: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Maximum scene cloud percentage; defaults per platform
    #[serde(default)]
    pub cloud_cover: Option<f64>,
    #[serde(default = "default_reducers")]
    pub reducers: Vec<Reducer>,
    /// Multiplier applied to the whole stack after the indices
    #[serde(default)]
    pub output_gain: Option<f32>,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl PipelineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config: PipelineConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
        config.resolve_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        Ok(config)
    }

    /// Make relative input/output paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.catalog, &mut self.aoi] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let Some(dir) = self.export.output_dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    pub fn cloud_cover(&self) -> f64 {
        self.cloud_cover
            .unwrap_or_else(|| self.platform.default_cloud_cover())
    }

    pub fn output_gain(&self) -> f32 {
        self.output_gain
            .unwrap_or_else(|| self.platform.default_output_gain())
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_date >= self.end_date {
            return Err(Error::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.reducers.is_empty() {
            return Err(Error::Config("no reducers requested".to_string()));
        }
        let cloud = self.cloud_cover();
        if !(0.0..=100.0).contains(&cloud) {
            return Err(Error::Config(format!(
                "cloud cover threshold must be within 0-100, got {cloud}"
            )));
        }
        let preview = self.preview.resolve(self.platform);
        if preview.enabled {
            let bands = self.platform.export_bands();
            if !bands.contains(&preview.band.as_str()) {
                return Err(Error::Config(format!(
                    "preview band '{}' is not one of [{}]",
                    preview.band,
                    bands.join(", ")
                )));
            }
            ColorRamp::new(&preview.vis)?;
        }
        if self.start_date < self.platform.first_acquisition() {
            log::warn!(
                "{} imagery starts on {}; earlier dates will match nothing",
                self.platform.collection_id(),
                self.platform.first_acquisition()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_script_defaults() {
        let json = r#"{
            "platform": "sentinel2",
            "catalog": "catalog.json",
            "aoi": "field.geojson",
            "start_date": "2021-01-01",
            "end_date": "2021-01-31"
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.cloud_cover(), 5.0);
        assert_eq!(config.output_gain(), 10000.0);
        assert_eq!(config.reducers, Reducer::ALL.to_vec());
        let preview = config.preview.resolve(config.platform);
        assert_eq!(preview.band, "NDVI");
        assert_eq!((preview.vis.min, preview.vis.max), (0.0, 10000.0));
        assert_eq!(preview.vis.palette.len(), 17);

        let export = config.export.resolve(config.platform);
        assert_eq!(export.description, "S2");
        assert_eq!(export.folder, "AGRON665X");
        assert_eq!(export.crs, "EPSG:4326");
        assert_eq!(export.scale, 10.0);
        assert_eq!(export.max_pixels, 1e13);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn job_settings_override_global() {
        let global = ExportConfig {
            folder: Some("SHARED".into()),
            scale: Some(30.0),
            ..Default::default()
        };
        let job = ExportConfig {
            scale: Some(20.0),
            ..Default::default()
        };
        let merged = job.or(&global).resolve(Platform::Landsat8);
        assert_eq!(merged.scale, 20.0);
        assert_eq!(merged.folder, "SHARED");
        assert_eq!(merged.description, "L8");
    }

    #[test]
    fn rejects_reversed_dates() {
        let json = r#"{
            "platform": "landsat8",
            "catalog": "c.json",
            "aoi": "a.geojson",
            "start_date": "2021-12-31",
            "end_date": "2021-01-01"
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(config.validate(), Err(Error::InvalidDateRange { .. })));
    }

    #[test]
    fn preview_defaults_follow_platform() {
        let landsat = PreviewConfig::default().resolve(Platform::Landsat8);
        assert_eq!(landsat.band, "EVI");
        assert_eq!((landsat.vis.min, landsat.vis.max), (0.0, 1.8));

        let partial = PreviewConfig {
            max: Some(5000.0),
            ..Default::default()
        };
        let sentinel = partial.resolve(Platform::Sentinel2);
        assert_eq!(sentinel.band, "NDVI");
        assert_eq!((sentinel.vis.min, sentinel.vis.max), (0.0, 5000.0));
    }

    #[test]
    fn rejects_unknown_preview_band_and_bad_palette() {
        let json = r#"{
            "platform": "sentinel2",
            "catalog": "c.json",
            "aoi": "a.geojson",
            "start_date": "2021-01-01",
            "end_date": "2021-02-01",
            "preview": { "band": "ndvi" }
        }"#;
        let mut config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.preview.band = Some("surface_temp".into());
        assert!(config.validate().is_err(), "L8-only band on S2");

        config.preview.band = None;
        config.preview.palette = Some(vec!["FFFFFF".into(), "XYZ123".into()]);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.preview.enabled = false;
        assert!(config.validate().is_ok());
    }
}
