use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::collection::Platform;
use crate::processing::Reducer;

#[derive(Parser)]
#[command(name = "sr-composite")]
#[command(about = "Cloud-masked Landsat-8 / Sentinel-2 composites with spectral indices")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Worker threads for raster processing (default: all cores)
    #[arg(long, global = true)]
    pub threads: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one composite job from a JSON config
    Run {
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Run several composite jobs from a JSON batch file
    Batch {
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Build, export and preview composites from command-line options
    Composite {
        #[command(flatten)]
        selection: SceneSelection,

        /// Reducers to compute (default: all four)
        #[arg(long, value_delimiter = ',')]
        reducers: Vec<Reducer>,

        /// Export scale in metres
        #[arg(long, default_value = "10")]
        scale: f64,

        /// Export file name prefix (default: L8 or S2)
        #[arg(short, long)]
        description: Option<String>,

        /// Output folder name under the output directory
        #[arg(short, long, default_value = "AGRON665X")]
        folder: String,

        /// Export coordinate reference system
        #[arg(long, default_value = "EPSG:4326")]
        crs: String,

        /// Root directory for exports and previews
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Band shown in the PNG previews (default: EVI for L8, NDVI for S2)
        #[arg(long)]
        preview_band: Option<String>,

        /// Skip PNG previews
        #[arg(long)]
        no_preview: bool,
    },

    /// List the scenes that pass the date, cloud and bounds filters
    Scenes {
        #[command(flatten)]
        selection: SceneSelection,
    },
}

#[derive(Args)]
pub struct SceneSelection {
    /// Image archive: landsat8 or sentinel2
    #[arg(short, long)]
    pub platform: Platform,

    /// Scene catalog manifest (JSON)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Area of interest (GeoJSON, shapefile, or any OGR source)
    #[arg(long)]
    pub aoi: PathBuf,

    /// First acquisition date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last acquisition date, exclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    /// Maximum scene cloud percentage (default: 10 for L8, 5 for S2)
    #[arg(long)]
    pub cloud_cover: Option<f64>,
}
