use clap::{Parser, Subcommand};
use cli::ExtractionConfig;
use color_eyre::eyre::{Result, eyre};
use shoreline::{
    ExtractedShoreline, GeoJsonLayer, ReferenceShoreline, RoiShorelines, date_colormap_layer, utm_epsg_for,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract shorelines for every ROI of a job file
    Extract {
        /// Path to the TOML or JSON job file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Write the map layers of a saved ROI session
    Layers {
        /// Session directory of one ROI
        #[arg(short, long)]
        input: PathBuf,
        /// Path of the layers JSON to write
        #[arg(short, long)]
        output: PathBuf,
        /// One points layer colored by date instead of one layer per shoreline
        #[arg(long)]
        colormap_by_date: bool,
    },
    /// Remove shorelines from a saved ROI session
    Remove {
        /// Session directory of one ROI
        #[arg(short, long)]
        input: PathBuf,
        /// Shoreline to remove, as "<satname>_<date>" (repeatable)
        #[arg(long = "item", required = true)]
        items: Vec<String>,
    },
    /// Print the UTM EPSG code for a location
    Epsg {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
    },
    /// Print the JSON schema of the job file
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { config } => {
            // Detector calls block on the external program
            tokio::task::spawn_blocking(move || extract(&config)).await??;
        }
        Commands::Layers { input, output, colormap_by_date } => {
            write_layers(&input, &output, colormap_by_date)?;
        }
        Commands::Remove { input, items } => {
            remove_items(&input, &items)?;
        }
        Commands::Epsg { lon, lat } => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(eyre!("Latitude {} is out of range", lat));
            }
            println!("{}", utm_epsg_for(lon, lat));
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(ExtractionConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn extract(config_path: &Path) -> Result<()> {
    let job = ExtractionConfig::from_file(config_path)?;
    let roi_ids = job.selected_roi_ids()?;
    let pipeline = job.build_pipeline()?;
    info!("{}", pipeline.info());

    let reference = ReferenceShoreline::from_geojson_file(&job.reference_shoreline)?;
    info!(
        "Reference shoreline: {} feature(s) in {}",
        reference.len(),
        reference.crs
    );

    let mut registry = RoiShorelines::new();
    let extracted = registry.extract_all(&roi_ids, &reference, &job.rois, &job.settings, &pipeline);
    if extracted.is_empty() {
        warn!("No shorelines were extracted for any ROI");
        return Ok(());
    }

    let saved = registry.save_all(&job.session_dir)?;
    info!("✅ Saved {} ROI session(s) to {}", saved.len(), job.session_dir);
    Ok(())
}

fn write_layers(input: &Path, output: &Path, colormap_by_date: bool) -> Result<()> {
    let extracted = ExtractedShoreline::load_from_directory(input)?;
    let layers: Vec<GeoJsonLayer> = if colormap_by_date {
        let name = format!("ID{}_{}", extracted.roi_id(), shoreline::LAYER_NAME);
        vec![date_colormap_layer(extracted.collection(), &name)?]
    } else {
        extracted.get_styled_layers()?
    };

    std::fs::write(output, serde_json::to_string_pretty(&layers)?)?;
    info!("Wrote {} layer(s) to {}", layers.len(), output.display());
    Ok(())
}

fn remove_items(input: &Path, items: &[String]) -> Result<()> {
    let mut extracted = ExtractedShoreline::load_from_directory(input)?;
    let removed = extracted.remove_items(items)?;
    if removed == 0 {
        warn!("None of the selected shorelines were found in {}", input.display());
        return Ok(());
    }
    if !extracted.update_session(input)? {
        warn!(
            "Every shoreline of ROI {} was removed, deleted the session in {}",
            extracted.roi_id(),
            input.display()
        );
        return Ok(());
    }
    info!("Removed {} shoreline(s) from {}", removed, input.display());
    Ok(())
}
