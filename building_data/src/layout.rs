use crate::availability::{AvailabilityRecords, Year};
use crate::models::{BuildingId, Utility};
use anyhow::{anyhow, Context, Result};
use glob::glob;
use log::{debug, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use walkdir::WalkDir;

const BUILDING_DIR_PREFIX: &str = "UCam_Building_b";

pub fn building_dir_name(building_id: BuildingId) -> String {
    format!("{}{}", BUILDING_DIR_PREFIX, building_id)
}

/// First run of digits in `name`, e.g. the year in `2019.csv` or the id
/// in `UCam_Building_b42`
pub fn first_integer<T: FromStr>(name: &str) -> Option<T> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let digits = DIGITS.get_or_init(|| Regex::new(r"\d+").expect("valid digit pattern"));
    digits.find(name)?.as_str().parse().ok()
}

/// Processed data directory convention:
/// `<root>/UCam_Building_b<id>/{electricity,gas}/<year>.csv`
#[derive(Debug, Clone)]
pub struct DataLayout {
    data_root: PathBuf,
}

impl DataLayout {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn building_dir(&self, building_id: BuildingId) -> PathBuf {
        self.data_root.join(building_dir_name(building_id))
    }

    pub fn utility_dir(&self, building_id: BuildingId, utility: Utility) -> PathBuf {
        self.building_dir(building_id).join(utility.dir_name())
    }

    /// Regular `.csv` files directly inside `dir`, sorted by path
    pub fn csv_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let dir_str = dir
            .to_str()
            .ok_or_else(|| anyhow!("non UTF-8 path: {}", dir.display()))?;
        let pattern = format!("{}/*.csv", glob::Pattern::escape(dir_str));

        let mut files: Vec<PathBuf> = glob(&pattern)?
            .filter_map(Result::ok)
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Building ids taken from the sub-directories of the data root.
    /// Symlinked building directories count, as they do for loading.
    pub fn discover_building_ids(&self) -> Result<Vec<BuildingId>> {
        let mut ids = Vec::new();

        let walker = WalkDir::new(&self.data_root)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1);
        for entry in walker {
            let entry = entry.with_context(|| {
                format!("failed to list data root {}", self.data_root.display())
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            match first_integer::<BuildingId>(&name) {
                Some(id) => ids.push(id),
                None => debug!("Skipping {}: no building id in name", entry.path().display()),
            }
        }

        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// Years with a CSV file for one building and utility. A missing
    /// utility directory means no years.
    pub fn years_available(&self, building_id: BuildingId, utility: Utility) -> Result<Vec<Year>> {
        let dir = self.utility_dir(building_id, utility);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut years = Vec::new();
        for file in self.csv_files(&dir)? {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match first_integer::<Year>(&name) {
                Some(year) => years.push(year),
                None => warn!("Skipping {}: no year in file name", file.display()),
            }
        }
        Ok(years)
    }

    pub fn scan_availability(&self, building_ids: &[BuildingId]) -> Result<AvailabilityRecords> {
        let mut records = AvailabilityRecords::new();

        for &bid in building_ids {
            for utility in Utility::ALL {
                records.add_building(utility, bid);
                for year in self.years_available(bid, utility)? {
                    records.insert(utility, bid, year);
                }
            }
        }

        Ok(records)
    }
}
