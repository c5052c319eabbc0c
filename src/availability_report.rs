use crate::figures::availability_figure;
use crate::html::{open_in_browser, write_page};
use crate::static_heatmap::write_svg_heatmap;
use anyhow::{ensure, Context, Result};
use building_data::{
    classify_records, AvailabilityMatrices, AvailabilityRecords, BandScale, Channel, DataLayout, RunConfig,
};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

const SUMMARY_TITLE: &str = "Building Data Availability";

#[derive(Debug, Serialize)]
struct AvailabilityRow<'a> {
    building_id: u32,
    year: i32,
    electricity: bool,
    gas: bool,
    category: &'a str,
}

pub struct AvailabilityReport<'a> {
    config: &'a RunConfig,
    layout: DataLayout,
}

impl<'a> AvailabilityReport<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self {
            config,
            layout: DataLayout::new(&config.data_root),
        }
    }

    pub fn summary_path(&self) -> PathBuf {
        self.config.availability_dir().join("building_data_availability.html")
    }

    pub fn channel_path(&self, channel: Channel, extension: &str) -> PathBuf {
        self.config
            .availability_dir()
            .join(format!("data_availability_{}.{}", channel.short_name(), extension))
    }

    pub fn table_path(&self) -> PathBuf {
        self.config.availability_dir().join("data_availability.csv")
    }

    /// Scale for the per-channel charts: a third category only when an
    /// anomaly year is configured
    pub fn channel_scale(&self) -> BandScale {
        match self.config.anomaly_label() {
            Some(label) => BandScale::anomaly_three_category(&label),
            None => BandScale::two_category(),
        }
    }

    pub fn collect(&self) -> Result<AvailabilityRecords> {
        let ids = self.layout.discover_building_ids()?;
        info!(
            "Found {} building directories in {}",
            ids.len(),
            self.layout.data_root().display()
        );
        let records = self.layout.scan_availability(&ids)?;
        info!("Found {} yearly data files", records.file_count());
        Ok(records)
    }

    /// Write every availability chart. Returns the paths written.
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        let records = self.collect()?;
        let years = records.year_span();
        ensure!(
            !years.is_empty(),
            "no yearly data files found under {}",
            self.layout.data_root().display()
        );
        info!("Years covered: {}-{}", years[0], years[years.len() - 1]);

        let plain = classify_records(&records, None);
        let overlaid = match self.config.anomaly_year {
            Some(year) => plain.with_anomaly_year(year),
            None => plain.clone(),
        };

        let mut written = Vec::new();

        let summary_scale = BandScale::four_category();
        let summary_path = self.summary_path();
        let summary_figure = availability_figure(&plain.summary(), &summary_scale, SUMMARY_TITLE);
        write_page(&summary_path, SUMMARY_TITLE, &summary_figure)?;
        written.push(summary_path);

        let channel_scale = self.channel_scale();
        for channel in Channel::ALL {
            let matrix = overlaid.channel(channel);
            let path = self.channel_path(channel, "html");
            write_page(&path, channel.title(), &availability_figure(matrix, &channel_scale, channel.title()))?;
            written.push(path);

            if self.config.svg {
                let svg_path = self.channel_path(channel, "svg");
                write_svg_heatmap(&svg_path, matrix, &channel_scale, channel.title())?;
                written.push(svg_path);
            }
        }

        let table_path = self.table_path();
        write_table(&table_path, &plain, &summary_scale)?;
        written.push(table_path);

        if self.config.show {
            for path in written.iter().filter(|p| p.extension().map_or(false, |e| e == "html")) {
                open_in_browser(path);
            }
        }

        Ok(written)
    }
}

/// One row per building and year with the four-category label, for
/// screening buildings by hand
fn write_table(path: &Path, matrices: &AvailabilityMatrices, scale: &BandScale) -> Result<()> {
    let summary = matrices.summary();
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for (col, &building_id) in summary.building_ids.iter().enumerate() {
        for (row, &year) in summary.years.iter().enumerate() {
            let value = summary.values[row][col];
            wtr.serialize(AvailabilityRow {
                building_id,
                year,
                electricity: matrices.channel(Channel::Electricity).values[row][col] > 0.0,
                gas: matrices.channel(Channel::Gas).values[row][col] > 0.0,
                category: scale.label_for(value).unwrap_or("Unknown"),
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}
