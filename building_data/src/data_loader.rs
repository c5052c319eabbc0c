use crate::calendar::{align, gap_count};
use crate::layout::{building_dir_name, DataLayout};
use crate::models::{BuildingId, Observation, ObservationSeries, Utility};
use anyhow::{bail, ensure, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use polars::prelude::*;
use std::path::Path;

const DATETIME_COLUMN: &str = "datetime";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-style timestamp. Offsets are dropped and the wall-clock
/// time kept; a bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let s = raw.trim();

    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.naive_local());
    }
    if let Ok(ts) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(ts.naive_local());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(NaiveDateTime::new(date, NaiveTime::default()));
    }

    bail!("unrecognised timestamp '{}'", raw)
}

/// Electricity and gas series for one building, already on a daily calendar
#[derive(Debug, Clone)]
pub struct BuildingData {
    pub building_id: BuildingId,
    pub electricity: ObservationSeries,
    pub gas: Option<ObservationSeries>,
}

pub struct DataLoader {
    layout: DataLayout,
}

impl DataLoader {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// Read one yearly CSV file into observations
    pub fn load_csv(&self, path: &Path, utility: Utility) -> Result<Vec<Observation>> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let df = CsvReader::new(file)
            .has_header(true)
            .finish()
            .with_context(|| format!("failed to read CSV {}", path.display()))?;

        let datetimes = df
            .column(DATETIME_COLUMN)
            .and_then(|c| c.cast(&DataType::Utf8))
            .with_context(|| format!("{}: no usable '{}' column", path.display(), DATETIME_COLUMN))?;
        let loads = df
            .column(utility.load_column())
            .and_then(|c| c.cast(&DataType::Float64))
            .with_context(|| {
                format!("{}: no usable '{}' column", path.display(), utility.load_column())
            })?;

        let mut observations = Vec::with_capacity(df.height());
        for (row, (ts, value)) in datetimes.utf8()?.into_iter().zip(loads.f64()?.into_iter()).enumerate() {
            let ts = match ts {
                Some(ts) => ts,
                None => bail!("{}: missing {} in row {}", path.display(), DATETIME_COLUMN, row + 1),
            };
            let timestamp = parse_timestamp(ts)
                .with_context(|| format!("{}: bad {} in row {}", path.display(), DATETIME_COLUMN, row + 1))?;
            observations.push(Observation::new(timestamp, value));
        }

        debug!("Loaded {} rows from {}", observations.len(), path.display());
        Ok(observations)
    }

    /// Every yearly file of one utility, concatenated in file name order.
    /// The utility directory must exist and hold at least one CSV file.
    pub fn load_series(&self, building_id: BuildingId, utility: Utility) -> Result<ObservationSeries> {
        let dir = self.layout.utility_dir(building_id, utility);
        ensure!(
            dir.is_dir(),
            "no {} directory for {}: {}",
            utility,
            building_dir_name(building_id),
            dir.display()
        );

        let files = self.layout.csv_files(&dir)?;
        ensure!(!files.is_empty(), "no CSV files in {}", dir.display());

        let mut observations = Vec::new();
        for file in &files {
            observations.extend(self.load_csv(file, utility)?);
        }

        Ok(ObservationSeries::new(building_id, utility, observations))
    }

    /// Load and align a building's data. Electricity is required; a
    /// building without a gas directory simply has no gas series.
    pub fn load_building(&self, building_id: BuildingId) -> Result<BuildingData> {
        let electricity = self.load_aligned(building_id, Utility::Electricity)?;

        let gas = if self.layout.utility_dir(building_id, Utility::Gas).exists() {
            Some(self.load_aligned(building_id, Utility::Gas)?)
        } else {
            debug!("{}: no gas data", building_dir_name(building_id));
            None
        };

        Ok(BuildingData {
            building_id,
            electricity,
            gas,
        })
    }

    fn load_aligned(&self, building_id: BuildingId, utility: Utility) -> Result<ObservationSeries> {
        let raw = self.load_series(building_id, utility)?;
        debug!(
            "{} {}: {} rows, {} missing days filled",
            building_dir_name(building_id),
            utility,
            raw.len(),
            gap_count(&raw)
        );
        Ok(align(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(layout: &DataLayout, bid: BuildingId, utility: Utility, name: &str, body: &str) {
        let dir = layout.utility_dir(bid, utility);
        fs::create_dir_all(&dir).unwrap();
        let header = format!("{},{}\n", DATETIME_COLUMN, utility.load_column());
        fs::write(dir.join(name), header + body).unwrap();
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let midnight = NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        assert_eq!(parse_timestamp("2020-01-02 00:00:00").unwrap(), midnight);
        assert_eq!(parse_timestamp("2020-01-02T00:00:00").unwrap(), midnight);
        assert_eq!(parse_timestamp("2020-01-02").unwrap(), midnight);
        assert_eq!(parse_timestamp("2020-01-02 00:00").unwrap(), midnight);
        assert_eq!(parse_timestamp("2020-01-02T00:00:00+00:00").unwrap(), midnight);
        assert_eq!(parse_timestamp("2020-01-02 00:00:00+01:00").unwrap(), midnight);
        assert_eq!(
            parse_timestamp("2020-01-02 06:30:00.500").unwrap(),
            midnight + chrono::Duration::milliseconds(6 * 3_600_000 + 30 * 60_000 + 500)
        );
        assert!(parse_timestamp("02/01/2020").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_load_building_with_gap_and_gas() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path());
        write_csv(
            &layout,
            5,
            Utility::Electricity,
            "2023.csv",
            "2023-01-01 00:00:00,10.5\n2023-01-03 00:00:00,-2\n",
        );
        write_csv(
            &layout,
            5,
            Utility::Gas,
            "2023.csv",
            "2023-01-02 00:00:00,\n2023-01-03 00:00:00,4\n",
        );

        let loader = DataLoader::new(layout);
        let data = loader.load_building(5).unwrap();

        let elec: Vec<_> = data.electricity.observations.iter().map(|o| o.value).collect();
        assert_eq!(elec, vec![Some(10.5), None, Some(-2.0)]);

        let gas = data.gas.unwrap();
        let gas: Vec<_> = gas.observations.iter().map(|o| o.value).collect();
        assert_eq!(gas, vec![None, Some(4.0)]);
    }

    #[test]
    fn test_files_are_concatenated_across_years() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path());
        write_csv(&layout, 2, Utility::Electricity, "2020.csv", "2020-12-30,1\n2020-12-31,2\n");
        write_csv(&layout, 2, Utility::Electricity, "2021.csv", "2021-01-02,3\n");

        let loader = DataLoader::new(layout);
        let data = loader.load_building(2).unwrap();

        assert!(data.gas.is_none());
        assert_eq!(data.electricity.len(), 4);
        assert!(data.electricity.observations[2].is_absent());
    }

    #[test]
    fn test_missing_electricity_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path());
        write_csv(&layout, 9, Utility::Gas, "2019.csv", "2019-01-01,1\n");

        let loader = DataLoader::new(layout);
        let err = loader.load_building(9).unwrap_err();
        assert!(err.to_string().contains("UCam_Building_b9"));
    }

    #[test]
    fn test_empty_electricity_dir_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path());
        fs::create_dir_all(layout.utility_dir(1, Utility::Electricity)).unwrap();

        let loader = DataLoader::new(layout);
        assert!(loader.load_building(1).is_err());
    }

    #[test]
    fn test_malformed_timestamp_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path());
        write_csv(&layout, 3, Utility::Electricity, "2018.csv", "yesterday,1\n");

        let loader = DataLoader::new(layout);
        let err = loader.load_building(3).unwrap_err();
        assert!(format!("{:#}", err).contains("yesterday"));
    }

    #[test]
    fn test_missing_load_column_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path());
        let dir = layout.utility_dir(4, Utility::Electricity);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("2018.csv"), "datetime,power\n2018-01-01,1\n").unwrap();

        let loader = DataLoader::new(layout);
        assert!(loader.load_building(4).is_err());
    }
}
