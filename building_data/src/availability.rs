use crate::models::{BuildingId, Utility};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub type Year = i32;

/// Cell value for a building with data in a year
pub const AVAILABLE: f64 = 1.0;
/// Cell value for data that exists but falls in the anomaly year
pub const ANOMALOUS: f64 = 0.5;
pub const MISSING: f64 = 0.0;

const ELECTRICITY_WEIGHT: f64 = 0.625;
const GAS_WEIGHT: f64 = 0.375;

/// Years with a data file, per utility and building
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityRecords {
    years: BTreeMap<Utility, BTreeMap<BuildingId, BTreeSet<Year>>>,
}

impl AvailabilityRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a building for a utility even if no year is found for it
    pub fn add_building(&mut self, utility: Utility, building_id: BuildingId) {
        self.years
            .entry(utility)
            .or_default()
            .entry(building_id)
            .or_default();
    }

    pub fn insert(&mut self, utility: Utility, building_id: BuildingId, year: Year) {
        self.years
            .entry(utility)
            .or_default()
            .entry(building_id)
            .or_default()
            .insert(year);
    }

    pub fn years_for(&self, utility: Utility, building_id: BuildingId) -> Option<&BTreeSet<Year>> {
        self.years.get(&utility)?.get(&building_id)
    }

    pub fn has(&self, utility: Utility, building_id: BuildingId, year: Year) -> bool {
        self.years_for(utility, building_id)
            .map_or(false, |years| years.contains(&year))
    }

    /// Every building registered under any utility, ascending
    pub fn building_ids(&self) -> Vec<BuildingId> {
        self.years
            .values()
            .flat_map(|buildings| buildings.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Inclusive range from the earliest to the latest year seen anywhere.
    /// Empty when no file was found at all.
    pub fn year_span(&self) -> Vec<Year> {
        let all_years = self
            .years
            .values()
            .flat_map(|buildings| buildings.values())
            .flat_map(|years| years.iter().copied());

        let (first, last) = all_years.fold((None, None), |(lo, hi): (Option<Year>, Option<Year>), y| {
            (Some(lo.map_or(y, |lo| lo.min(y))), Some(hi.map_or(y, |hi| hi.max(y))))
        });

        match (first, last) {
            (Some(first), Some(last)) => (first..=last).collect(),
            _ => Vec::new(),
        }
    }

    pub fn file_count(&self) -> usize {
        self.years
            .values()
            .flat_map(|buildings| buildings.values())
            .map(BTreeSet::len)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Electricity,
    Gas,
    Combined,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Electricity, Channel::Gas, Channel::Combined];

    pub fn short_name(&self) -> &'static str {
        match self {
            Channel::Electricity => "elec",
            Channel::Gas => "gas",
            Channel::Combined => "comb",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Channel::Electricity => "Electricity Data Availability",
            Channel::Gas => "Gas Data Availability",
            Channel::Combined => "Electricity & Gas Data Availability",
        }
    }
}

/// Building × year grid, stored row-per-year so that it lines up with
/// heat map axes (x = building, y = year).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityMatrix {
    pub building_ids: Vec<BuildingId>,
    pub years: Vec<Year>,
    /// `values[year_index][building_index]`
    pub values: Vec<Vec<f64>>,
}

impl AvailabilityMatrix {
    fn from_fn(
        building_ids: &[BuildingId],
        years: &[Year],
        cell: impl Fn(BuildingId, Year) -> f64,
    ) -> Self {
        let values = years
            .iter()
            .map(|&year| building_ids.iter().map(|&bid| cell(bid, year)).collect())
            .collect();

        Self {
            building_ids: building_ids.to_vec(),
            years: years.to_vec(),
            values,
        }
    }

    pub fn get(&self, year: Year, building_id: BuildingId) -> Option<f64> {
        let row = self.years.iter().position(|&y| y == year)?;
        let col = self.building_ids.iter().position(|&b| b == building_id)?;
        Some(self.values[row][col])
    }

    /// Values for one building across all years, oldest first
    pub fn column(&self, building_id: BuildingId) -> Option<Vec<f64>> {
        let col = self.building_ids.iter().position(|&b| b == building_id)?;
        Some(self.values.iter().map(|row| row[col]).collect())
    }

    fn with_anomaly_year(&self, anomaly_year: Year) -> Self {
        let mut overlaid = self.clone();
        for (year, row) in overlaid.years.iter().zip(overlaid.values.iter_mut()) {
            if *year != anomaly_year {
                continue;
            }
            for value in row.iter_mut().filter(|v| **v == AVAILABLE) {
                *value = ANOMALOUS;
            }
        }
        overlaid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityMatrices {
    pub electricity: AvailabilityMatrix,
    pub gas: AvailabilityMatrix,
    pub combined: AvailabilityMatrix,
}

impl AvailabilityMatrices {
    pub fn channel(&self, channel: Channel) -> &AvailabilityMatrix {
        match channel {
            Channel::Electricity => &self.electricity,
            Channel::Gas => &self.gas,
            Channel::Combined => &self.combined,
        }
    }

    /// Mark every available cell of `anomaly_year` as anomalous, in all
    /// three matrices. Other years are untouched.
    pub fn with_anomaly_year(&self, anomaly_year: Year) -> Self {
        Self {
            electricity: self.electricity.with_anomaly_year(anomaly_year),
            gas: self.gas.with_anomaly_year(anomaly_year),
            combined: self.combined.with_anomaly_year(anomaly_year),
        }
    }

    /// Four-category summary `0.625*elec + 0.375*gas`: 0 none, 0.375 gas
    /// only, 0.625 electricity only, 1 both. Anomalous cells count as
    /// present.
    pub fn summary(&self) -> AvailabilityMatrix {
        let present = |v: f64| if v > MISSING { 1.0 } else { 0.0 };
        let values = self
            .electricity
            .values
            .iter()
            .zip(&self.gas.values)
            .map(|(elec_row, gas_row)| {
                elec_row
                    .iter()
                    .zip(gas_row)
                    .map(|(e, g)| ELECTRICITY_WEIGHT * present(*e) + GAS_WEIGHT * present(*g))
                    .collect()
            })
            .collect();

        AvailabilityMatrix {
            building_ids: self.electricity.building_ids.clone(),
            years: self.electricity.years.clone(),
            values,
        }
    }
}

/// Build the electricity, gas and combined availability matrices.
///
/// A cell is 1 when the building has a file for that utility and year. The
/// combined channel needs both utilities. With `anomaly_year` set, the 1s in
/// that year become 0.5 in every matrix; the combined channel is decided
/// before the overlay.
pub fn classify(
    records: &AvailabilityRecords,
    building_ids: &[BuildingId],
    years: &[Year],
    anomaly_year: Option<Year>,
) -> AvailabilityMatrices {
    let electricity = AvailabilityMatrix::from_fn(building_ids, years, presence(records, Utility::Electricity));
    let gas = AvailabilityMatrix::from_fn(building_ids, years, presence(records, Utility::Gas));
    let combined = AvailabilityMatrix::from_fn(building_ids, years, |bid, year| {
        if records.has(Utility::Electricity, bid, year) && records.has(Utility::Gas, bid, year) {
            AVAILABLE
        } else {
            MISSING
        }
    });

    let matrices = AvailabilityMatrices {
        electricity,
        gas,
        combined,
    };

    match anomaly_year {
        Some(year) => matrices.with_anomaly_year(year),
        None => matrices,
    }
}

fn presence(records: &AvailabilityRecords, utility: Utility) -> impl Fn(BuildingId, Year) -> f64 + '_ {
    move |bid, year| {
        if records.has(utility, bid, year) {
            AVAILABLE
        } else {
            MISSING
        }
    }
}

/// Classify over every registered building and the full year span
pub fn classify_records(records: &AvailabilityRecords, anomaly_year: Option<Year>) -> AvailabilityMatrices {
    classify(records, &records.building_ids(), &records.year_span(), anomaly_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building_seven() -> AvailabilityRecords {
        let mut records = AvailabilityRecords::new();
        for year in [2019, 2020, 2021] {
            records.insert(Utility::Electricity, 7, year);
        }
        for year in [2020, 2021] {
            records.insert(Utility::Gas, 7, year);
        }
        records
    }

    #[test]
    fn test_building_seven_without_overlay() {
        let records = building_seven();
        assert_eq!(records.year_span(), vec![2019, 2020, 2021]);

        let matrices = classify_records(&records, None);

        assert_eq!(matrices.electricity.column(7).unwrap(), vec![1.0, 1.0, 1.0]);
        assert_eq!(matrices.gas.column(7).unwrap(), vec![0.0, 1.0, 1.0]);
        assert_eq!(matrices.combined.column(7).unwrap(), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_building_seven_with_overlay() {
        let matrices = classify_records(&building_seven(), Some(2020));

        assert_eq!(matrices.electricity.column(7).unwrap(), vec![1.0, 0.5, 1.0]);
        assert_eq!(matrices.gas.column(7).unwrap(), vec![0.0, 0.5, 1.0]);
        assert_eq!(matrices.combined.column(7).unwrap(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_building_without_years_is_all_zero() {
        let mut records = building_seven();
        records.add_building(Utility::Electricity, 2);
        records.add_building(Utility::Gas, 2);

        let matrices = classify_records(&records, Some(2020));

        assert_eq!(records.building_ids(), vec![2, 7]);
        for channel in Channel::ALL {
            assert_eq!(matrices.channel(channel).column(2).unwrap(), vec![0.0; 3]);
        }
    }

    #[test]
    fn test_combined_is_and_of_channels() {
        let mut records = AvailabilityRecords::new();
        records.insert(Utility::Electricity, 1, 2015);
        records.insert(Utility::Electricity, 1, 2017);
        records.insert(Utility::Gas, 1, 2017);
        records.insert(Utility::Gas, 4, 2016);
        records.insert(Utility::Electricity, 4, 2016);
        records.insert(Utility::Gas, 9, 2015);

        let matrices = classify_records(&records, None);

        for (y, year) in matrices.combined.years.iter().enumerate() {
            for (b, bid) in matrices.combined.building_ids.iter().enumerate() {
                let both = matrices.electricity.values[y][b] == 1.0 && matrices.gas.values[y][b] == 1.0;
                assert_eq!(
                    matrices.combined.values[y][b] == 1.0,
                    both,
                    "building {} year {}",
                    bid,
                    year
                );
            }
        }
        assert_eq!(matrices.combined.get(2017, 1), Some(1.0));
        assert_eq!(matrices.combined.get(2015, 1), Some(0.0));
    }

    #[test]
    fn test_overlay_only_touches_anomaly_year() {
        let mut records = AvailabilityRecords::new();
        for bid in 0..4 {
            for year in 2018..=2022 {
                if (bid + year as u32) % 2 == 0 {
                    records.insert(Utility::Electricity, bid, year);
                }
                records.insert(Utility::Gas, bid, year);
            }
        }

        let plain = classify_records(&records, None);
        let overlaid = classify_records(&records, Some(2020));

        for channel in Channel::ALL {
            let before = plain.channel(channel);
            let after = overlaid.channel(channel);
            for (y, year) in before.years.iter().enumerate() {
                for b in 0..before.building_ids.len() {
                    let expected = if *year == 2020 && before.values[y][b] == 1.0 {
                        0.5
                    } else {
                        before.values[y][b]
                    };
                    assert_eq!(after.values[y][b], expected);
                }
            }
        }
    }

    #[test]
    fn test_overlay_outside_range_is_noop() {
        let records = building_seven();
        assert_eq!(classify_records(&records, Some(1990)), classify_records(&records, None));
    }

    #[test]
    fn test_matrix_rows_are_years() {
        let mut records = building_seven();
        records.insert(Utility::Electricity, 11, 2021);

        let matrices = classify_records(&records, None);

        assert_eq!(matrices.electricity.values.len(), 3);
        assert!(matrices.electricity.values.iter().all(|row| row.len() == 2));
        assert_eq!(matrices.electricity.values[0], vec![1.0, 0.0]);
        assert_eq!(matrices.electricity.values[2], vec![1.0, 1.0]);
    }

    #[test]
    fn test_summary_weights() {
        let mut records = building_seven();
        records.insert(Utility::Gas, 3, 2019);

        let summary = classify_records(&records, None).summary();

        assert_eq!(summary.column(7).unwrap(), vec![0.625, 1.0, 1.0]);
        assert_eq!(summary.column(3).unwrap(), vec![0.375, 0.0, 0.0]);

        let overlaid_summary = classify_records(&records, Some(2020)).summary();
        assert_eq!(overlaid_summary, summary);
    }

    #[test]
    fn test_explicit_years_extend_the_grid() {
        let records = building_seven();
        let matrices = classify(&records, &[7], &[2018, 2019], None);

        assert_eq!(matrices.electricity.column(7).unwrap(), vec![0.0, 1.0]);
        assert_eq!(matrices.gas.get(2019, 7), Some(0.0));
        assert_eq!(matrices.gas.get(2030, 7), None);
    }

    #[test]
    fn test_empty_records() {
        let records = AvailabilityRecords::new();
        assert!(records.year_span().is_empty());
        assert_eq!(records.file_count(), 0);

        let matrices = classify_records(&records, Some(2020));
        assert!(matrices.electricity.values.is_empty());
    }
}
