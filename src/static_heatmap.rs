use anyhow::{ensure, Result};
use building_data::{AvailabilityMatrix, BandScale, Rgb};
use plotters::prelude::*;
use std::path::Path;

const MAX_X_LABELS: usize = 30;

fn rgb(color: Rgb) -> RGBColor {
    let Rgb(r, g, b) = color;
    RGBColor(r, g, b)
}

/// Static counterpart of the interactive availability heat map, for
/// reports where a browser is not available
pub fn write_svg_heatmap(path: &Path, matrix: &AvailabilityMatrix, scale: &BandScale, title: &str) -> Result<()> {
    ensure!(
        !matrix.years.is_empty() && !matrix.building_ids.is_empty(),
        "nothing to draw for {}",
        title
    );

    let n_buildings = matrix.building_ids.len();
    let first_year = matrix.years[0];
    let last_year = matrix.years[matrix.years.len() - 1];

    let width = (n_buildings as u32 * 12 + 260).max(640);
    let height = (matrix.years.len() as u32 * 28 + 160).max(320);

    let root = SVGBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0..n_buildings as i32, first_year..last_year + 1)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Building ID")
        .y_desc("Year")
        .x_labels(n_buildings.min(MAX_X_LABELS))
        .x_label_formatter(&|x: &i32| {
            matrix
                .building_ids
                .get(*x as usize)
                .map(|bid| format!("b{}", bid))
                .unwrap_or_default()
        })
        .y_labels(matrix.years.len())
        .draw()?;

    for (year, row) in matrix.years.iter().zip(&matrix.values) {
        chart.draw_series(row.iter().enumerate().map(|(col, value)| {
            let color = scale
                .band_for(*value)
                .map(|band| rgb(band.color))
                .unwrap_or(WHITE);
            let col = col as i32;
            Rectangle::new([(col, *year), (col + 1, *year + 1)], color.filled())
        }))?;
    }

    for band in scale.bands() {
        let color = rgb(band.color);
        chart
            .draw_series(std::iter::empty::<Rectangle<(i32, i32)>>())?
            .label(band.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
