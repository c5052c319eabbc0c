use anyhow::{bail, Result};
use building_data::{BuildingId, RunConfig, Year};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

mod availability_report;
mod building_plots;
mod figures;
mod html;
mod static_heatmap;

use availability_report::AvailabilityReport;
use building_plots::BuildingPlotter;

#[derive(Parser)]
#[command(name = "building-data-viz")]
#[command(about = "Interactive charts of building electricity/gas data and data availability")]
struct Cli {
    /// TOML run configuration; command line flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root of the processed data tree
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Directory under which docs/building_plots and plots are written
    #[arg(long, global = true)]
    output_root: Option<PathBuf>,

    /// Open every written chart in a browser
    #[arg(long, global = true)]
    show: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plot every building in the configured id range
    Buildings {
        /// First building id (inclusive)
        #[arg(long)]
        start: Option<BuildingId>,

        /// Last building id (exclusive)
        #[arg(long)]
        end: Option<BuildingId>,

        /// Plot buildings on a thread pool
        #[arg(long)]
        parallel: bool,

        /// Worker threads for --parallel (defaults to all cores)
        #[arg(long)]
        jobs: Option<usize>,
    },

    /// Plot a single building
    Building {
        id: BuildingId,

        /// Output HTML file (defaults to docs/building_plots/UCam_Building_b<id>.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Heat maps of which buildings have data for which years
    Availability {
        /// Year drawn as its own category in the per-channel charts
        #[arg(long, conflicts_with = "no_anomaly")]
        anomaly_year: Option<Year>,

        /// Per-channel charts without an anomaly year
        #[arg(long)]
        no_anomaly: bool,

        /// Also write static SVG heat maps
        #[arg(long)]
        svg: bool,
    },

    /// Building plots followed by the availability heat maps
    All,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_toml_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(root) = &self.data_root {
            config.data_root = root.clone();
        }
        if let Some(root) = &self.output_root {
            config.output_root = root.clone();
        }
        config.show |= self.show;

        match &self.command {
            Command::Buildings {
                start,
                end,
                parallel,
                jobs,
            } => {
                if let Some(start) = start {
                    config.first_building = *start;
                }
                if let Some(end) = end {
                    config.end_building = *end;
                }
                config.parallel |= *parallel;
                if jobs.is_some() {
                    config.jobs = *jobs;
                }
            }
            Command::Availability {
                anomaly_year,
                no_anomaly,
                svg,
            } => {
                if *no_anomaly {
                    config.anomaly_year = None;
                } else if anomaly_year.is_some() {
                    config.anomaly_year = *anomaly_year;
                }
                config.svg |= *svg;
            }
            Command::Building { .. } | Command::All => {}
        }

        config.validate()?;
        Ok(config)
    }
}

fn run_buildings(config: &RunConfig) -> Result<()> {
    let summary = BuildingPlotter::new(config).plot_all()?;
    println!("✅ Wrote {} building plots", summary.written.len());

    if !summary.failed.is_empty() {
        let ids: Vec<String> = summary.failed_ids().iter().map(|id| format!("b{}", id)).collect();
        bail!("{} buildings failed: {}", ids.len(), ids.join(", "));
    }
    Ok(())
}

fn run_availability(config: &RunConfig) -> Result<()> {
    let written = AvailabilityReport::new(config).run()?;
    for path in &written {
        println!("  💾 {}", path.display());
    }
    println!("✅ Wrote {} availability outputs", written.len());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.run_config()?;

    println!("🏢 Building Data Visualisation");
    println!("{}", "=".repeat(60));
    info!("Data root: {}", config.data_root.display());

    let start = std::time::Instant::now();

    match &cli.command {
        Command::Buildings { .. } => run_buildings(&config)?,
        Command::Building { id, output } => {
            let plotter = BuildingPlotter::new(&config);
            let output = output.clone().unwrap_or_else(|| plotter.output_path(*id));
            plotter.plot_building(*id, &output)?;
            println!("✅ Wrote {}", output.display());
        }
        Command::Availability { .. } => run_availability(&config)?,
        Command::All => {
            // Availability first: it does not depend on any one building loading
            run_availability(&config)?;
            run_buildings(&config)?;
        }
    }

    println!("Done in {:?}", start.elapsed());
    Ok(())
}
