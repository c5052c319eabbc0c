//! Run configuration shared by the plotting and availability pipelines.

use crate::availability::Year;
use crate::models::BuildingId;
use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Everything an entry point needs to know about where to read, where to
/// write and how to run.
///
/// All fields have defaults, so a TOML file only needs the values it
/// changes. Load with [`RunConfig::from_toml_file`] or start from
/// [`RunConfig::default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// First building id to plot (inclusive).
    pub first_building: BuildingId,
    /// End of the building id range (exclusive).
    pub end_building: BuildingId,
    /// Root of the processed data tree.
    pub data_root: PathBuf,
    /// Root under which `docs/building_plots` and `plots` are written.
    pub output_root: PathBuf,
    /// Open every written chart in a browser.
    pub show: bool,
    /// Year drawn as its own category in per-channel availability charts.
    pub anomaly_year: Option<Year>,
    /// Plot buildings on a thread pool instead of one after another.
    pub parallel: bool,
    /// Worker count for parallel runs; all cores when unset.
    pub jobs: Option<usize>,
    /// Also write static SVG availability heat maps.
    pub svg: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            first_building: 0,
            end_building: 121,
            data_root: PathBuf::from("processed_data"),
            output_root: PathBuf::from("."),
            show: false,
            anomaly_year: Some(2020),
            parallel: false,
            jobs: None,
            svg: false,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(s).context("invalid run configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.first_building < self.end_building,
            "empty building range {}..{}",
            self.first_building,
            self.end_building
        );
        if let Some(jobs) = self.jobs {
            ensure!(jobs > 0, "jobs must be > 0");
        }
        Ok(())
    }

    pub fn building_ids(&self) -> Range<BuildingId> {
        self.first_building..self.end_building
    }

    pub fn building_plots_dir(&self) -> PathBuf {
        self.output_root.join("docs").join("building_plots")
    }

    pub fn availability_dir(&self) -> PathBuf {
        self.output_root.join("plots")
    }

    /// Tick label for the anomaly category
    pub fn anomaly_label(&self) -> Option<String> {
        self.anomaly_year.map(|year| format!("Anomaly year ({})", year))
    }
}
