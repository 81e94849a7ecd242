// src/main.rs
use anyhow::{bail, Result};
use clap::Parser;

use sr_composite::aoi::Aoi;
use sr_composite::batch::process_batch;
use sr_composite::cli::{Cli, Commands, SceneSelection};
use sr_composite::config::{ExportConfig, PipelineConfig, PreviewConfig};
use sr_composite::pipeline::{self, PipelineReport};
use sr_composite::processing::{ParallelProcessor, Reducer};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn base_config(selection: &SceneSelection) -> PipelineConfig {
    PipelineConfig {
        platform: selection.platform,
        catalog: selection.catalog.clone(),
        aoi: selection.aoi.clone(),
        start_date: selection.start,
        end_date: selection.end,
        cloud_cover: selection.cloud_cover,
        reducers: Reducer::ALL.to_vec(),
        output_gain: None,
        export: ExportConfig::default(),
        preview: PreviewConfig::default(),
    }
}

fn print_report(report: &PipelineReport) -> Result<()> {
    println!("Composited {} scenes", report.scenes.len());
    for status in &report.exports {
        println!("  [{}] {}: {:?}", status.id, status.description, status.state);
    }
    for path in &report.previews {
        println!("  preview: {}", path.display());
    }

    let failed = report.failed_exports();
    if !failed.is_empty() {
        bail!("{} of {} exports failed", failed.len(), report.exports.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let processor = ParallelProcessor::new(cli.threads)?;
    log::info!("processing with {} threads", processor.threads());

    match &cli.command {
        Commands::Run { config } => {
            let config = PipelineConfig::load(config)?;
            print_report(&pipeline::run(&config, &processor)?)?;
        }
        Commands::Batch { config } => {
            for report in process_batch(config, &processor)? {
                print_report(&report)?;
            }
        }
        Commands::Composite {
            selection,
            reducers,
            scale,
            description,
            folder,
            crs,
            output_dir,
            preview_band,
            no_preview,
        } => {
            let mut config = base_config(selection);
            if !reducers.is_empty() {
                config.reducers = reducers.clone();
            }
            config.export = ExportConfig {
                scale: Some(*scale),
                description: description.clone(),
                folder: Some(folder.clone()),
                crs: Some(crs.clone()),
                output_dir: Some(output_dir.clone()),
                ..Default::default()
            };
            config.preview.band = preview_band.clone();
            config.preview.enabled = !no_preview;
            print_report(&pipeline::run(&config, &processor)?)?;
        }
        Commands::Scenes { selection } => {
            let config = base_config(selection);
            config.validate()?;
            let aoi = Aoi::from_path(&config.aoi)?;
            let scenes = pipeline::select_scenes(&config, &aoi)?;
            for scene in &scenes.scenes {
                println!("{}\t{}\t{:.2}", scene.id, scene.date, scene.cloud_cover);
            }
            println!("{} scenes", scenes.len());
        }
    }

    Ok(())
}
