use anyhow::{ensure, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
    pub const GRAY: Rgb = Rgb(0x80, 0x80, 0x80);
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// One category of a discrete colour scale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorBand {
    pub lower: f64,
    pub upper: f64,
    pub color: Rgb,
    pub label: String,
}

impl ColorBand {
    pub fn new(lower: f64, upper: f64, color: Rgb, label: impl Into<String>) -> Self {
        Self {
            lower,
            upper,
            color,
            label: label.into(),
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// Piecewise mapping from a cell value in [0, 1] to a colour and a label.
///
/// Bands are contiguous and cover the unit interval. A value falls in the
/// band whose `[lower, upper)` contains it; the last band also takes its
/// upper bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandScale {
    bands: Vec<ColorBand>,
}

impl BandScale {
    pub fn new(bands: Vec<ColorBand>) -> Result<Self> {
        ensure!(!bands.is_empty(), "band scale needs at least one band");
        ensure!(bands[0].lower == 0.0, "first band must start at 0, got {}", bands[0].lower);
        let last = &bands[bands.len() - 1];
        ensure!(last.upper == 1.0, "last band must end at 1, got {}", last.upper);

        for band in &bands {
            ensure!(
                band.lower < band.upper,
                "band '{}' is empty: [{}, {})",
                band.label,
                band.lower,
                band.upper
            );
        }
        for pair in bands.windows(2) {
            ensure!(
                pair[0].upper == pair[1].lower,
                "bands '{}' and '{}' are not contiguous",
                pair[0].label,
                pair[1].label
            );
        }

        Ok(Self { bands })
    }

    /// Split [0, 1] into equal-width bands, one per (colour, label) pair
    pub fn equal_width(categories: &[(Rgb, &str)]) -> Result<Self> {
        let n = categories.len() as f64;
        let bands = categories
            .iter()
            .enumerate()
            .map(|(i, (color, label))| {
                let lower = i as f64 / n;
                // Pin the last edge so rounding never leaves a hole at 1.0
                let upper = if i + 1 == categories.len() { 1.0 } else { (i + 1) as f64 / n };
                ColorBand::new(lower, upper, *color, *label)
            })
            .collect();
        Self::new(bands)
    }

    /// None / Gas / Electricity / Both, for values of `0.625*elec + 0.375*gas`
    pub fn four_category() -> Self {
        let bounds = [0.0, 0.25, 0.5, 0.75, 1.0];
        let categories = [
            (Rgb(0xd8, 0xdc, 0xd6), "None"),
            (Rgb(0xfd, 0xaa, 0x48), "Gas"),
            (Rgb(0x01, 0x65, 0xfc), "Electricity"),
            (Rgb(0x3f, 0x9b, 0x0b), "Both"),
        ];
        let bands = categories
            .iter()
            .enumerate()
            .map(|(i, (color, label))| ColorBand::new(bounds[i], bounds[i + 1], *color, *label))
            .collect();
        Self { bands }
    }

    /// No / anomaly year / Yes, for per-channel matrices with the overlay applied
    pub fn anomaly_three_category(anomaly_label: &str) -> Self {
        let third = 1.0 / 3.0;
        Self {
            bands: vec![
                ColorBand::new(0.0, third, Rgb::WHITE, "No"),
                ColorBand::new(third, 2.0 * third, Rgb::GRAY, anomaly_label),
                ColorBand::new(2.0 * third, 1.0, Rgb::BLACK, "Yes"),
            ],
        }
    }

    pub fn two_category() -> Self {
        Self {
            bands: vec![
                ColorBand::new(0.0, 0.5, Rgb::WHITE, "No"),
                ColorBand::new(0.5, 1.0, Rgb::BLACK, "Yes"),
            ],
        }
    }

    pub fn bands(&self) -> &[ColorBand] {
        &self.bands
    }

    pub fn band_for(&self, value: f64) -> Option<&ColorBand> {
        let last = self.bands.len() - 1;
        self.bands.iter().enumerate().find_map(|(i, band)| {
            let inside = value >= band.lower
                && (value < band.upper || (i == last && value <= band.upper));
            inside.then_some(band)
        })
    }

    pub fn label_for(&self, value: f64) -> Option<&str> {
        self.band_for(value).map(|b| b.label.as_str())
    }

    /// Plotly colour scale with a hard step at every band edge
    pub fn plotly_colorscale(&self) -> Vec<(f64, String)> {
        self.bands
            .iter()
            .flat_map(|band| {
                let color = band.color.hex();
                [(band.lower, color.clone()), (band.upper, color)]
            })
            .collect()
    }

    pub fn tick_values(&self) -> Vec<f64> {
        self.bands.iter().map(ColorBand::midpoint).collect()
    }

    pub fn tick_labels(&self) -> Vec<String> {
        self.bands.iter().map(|b| b.label.clone()).collect()
    }
}
