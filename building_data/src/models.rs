use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative integer identifying one metered building.
pub type BuildingId = u32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Utility {
    Electricity,
    Gas,
}

impl Utility {
    pub const ALL: [Utility; 2] = [Utility::Electricity, Utility::Gas];

    /// Sub-directory holding this utility's yearly CSV files
    pub fn dir_name(&self) -> &'static str {
        match self {
            Utility::Electricity => "electricity",
            Utility::Gas => "gas",
        }
    }

    /// Measurement column in the processed CSV files
    pub fn load_column(&self) -> &'static str {
        match self {
            Utility::Electricity => "equipment load [kWh]",
            Utility::Gas => "heating load [kWh]",
        }
    }

    /// Trace name used in building charts
    pub fn display_name(&self) -> &'static str {
        match self {
            Utility::Electricity => "Equipment load",
            Utility::Gas => "Heating load",
        }
    }
}

impl fmt::Display for Utility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One metered reading. `value` is `None` for an absent observation,
/// which is not the same thing as a zero reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }

    pub fn absent(timestamp: NaiveDateTime) -> Self {
        Self { timestamp, value: None }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservationSeries {
    pub building_id: BuildingId,
    pub utility: Utility,
    pub observations: Vec<Observation>,
}

impl ObservationSeries {
    pub fn new(building_id: BuildingId, utility: Utility, observations: Vec<Observation>) -> Self {
        Self {
            building_id,
            utility,
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// First and last calendar date covered by the series
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.observations.iter().map(Observation::date).min()?;
        let last = self.observations.iter().map(Observation::date).max()?;
        Some((first, last))
    }

    pub fn absent_count(&self) -> usize {
        self.observations.iter().filter(|o| o.is_absent()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_utility_columns() {
        assert_eq!(Utility::Electricity.load_column(), "equipment load [kWh]");
        assert_eq!(Utility::Gas.load_column(), "heating load [kWh]");
        assert_eq!(Utility::Gas.dir_name(), "gas");
        assert_eq!(Utility::Electricity.to_string(), "electricity");
    }

    #[test]
    fn test_date_range_ignores_order() {
        let series = ObservationSeries::new(
            3,
            Utility::Gas,
            vec![
                Observation::new(at("2021-03-04"), Some(1.0)),
                Observation::absent(at("2021-03-01")),
                Observation::new(at("2021-03-02"), Some(0.0)),
            ],
        );

        let (first, last) = series.date_range().unwrap();
        assert_eq!(first.to_string(), "2021-03-01");
        assert_eq!(last.to_string(), "2021-03-04");
        assert_eq!(series.absent_count(), 1);
    }

    #[test]
    fn test_empty_series_has_no_range() {
        let series = ObservationSeries::new(0, Utility::Electricity, vec![]);
        assert!(series.date_range().is_none());
        assert!(series.is_empty());
    }
}
