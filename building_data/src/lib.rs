pub mod availability;
pub mod bands;
pub mod calendar;
pub mod config;
pub mod data_loader;
pub mod layout;
pub mod models;

pub use availability::{classify, classify_records, AvailabilityMatrices, AvailabilityMatrix, AvailabilityRecords, Channel, Year};
pub use bands::{BandScale, ColorBand, Rgb};
pub use calendar::align;
pub use config::RunConfig;
pub use data_loader::{BuildingData, DataLoader};
pub use layout::DataLayout;
pub use models::{BuildingId, Observation, ObservationSeries, Utility};
