use crate::figures::building_figure;
use crate::html::{open_in_browser, write_page};
use anyhow::Result;
use building_data::layout::building_dir_name;
use building_data::{BuildingId, DataLayout, DataLoader, RunConfig};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct PlotSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(BuildingId, String)>,
}

impl PlotSummary {
    pub fn failed_ids(&self) -> Vec<BuildingId> {
        self.failed.iter().map(|(id, _)| *id).collect()
    }
}

pub struct BuildingPlotter<'a> {
    config: &'a RunConfig,
    loader: DataLoader,
}

impl<'a> BuildingPlotter<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        let loader = DataLoader::new(DataLayout::new(&config.data_root));
        Self { config, loader }
    }

    pub fn output_path(&self, building_id: BuildingId) -> PathBuf {
        self.config
            .building_plots_dir()
            .join(format!("{}.html", building_dir_name(building_id)))
    }

    /// Load, align and chart one building, writing the page to `output`
    pub fn plot_building(&self, building_id: BuildingId, output: &Path) -> Result<()> {
        let data = self.loader.load_building(building_id)?;
        let figure = building_figure(&data);
        write_page(output, &building_dir_name(building_id), &figure)?;

        if self.config.show {
            open_in_browser(output);
        }
        Ok(())
    }

    /// Plot every building in the configured range. A failing building is
    /// logged and recorded; the others still get plotted.
    pub fn plot_all(&self) -> Result<PlotSummary> {
        let ids: Vec<BuildingId> = self.config.building_ids().collect();
        info!(
            "Plotting {} buildings from {} into {}",
            ids.len(),
            self.config.data_root.display(),
            self.config.building_plots_dir().display()
        );

        let pb = ProgressBar::new(ids.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
        );

        let plot_one = |bid: BuildingId| {
            let output = self.output_path(bid);
            let result = self.plot_building(bid, &output).map(|_| output);
            pb.inc(1);
            (bid, result)
        };

        let results: Vec<_> = if self.config.parallel {
            let threads = self.config.jobs.unwrap_or_else(num_cpus::get);
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            info!("Using {} worker threads", pool.current_num_threads());
            pool.install(|| ids.par_iter().map(|&bid| plot_one(bid)).collect())
        } else {
            ids.iter().map(|&bid| plot_one(bid)).collect()
        };
        pb.finish_and_clear();

        let mut summary = PlotSummary::default();
        for (bid, result) in results {
            match result {
                Ok(path) => summary.written.push(path),
                Err(e) => {
                    error!("{}: {:#}", building_dir_name(bid), e);
                    summary.failed.push((bid, format!("{:#}", e)));
                }
            }
        }

        Ok(summary)
    }
}
