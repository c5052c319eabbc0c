use crate::models::{Observation, ObservationSeries};
use std::collections::BTreeSet;

/// Place a series onto a complete daily calendar.
///
/// Every calendar date between the first and last observation gets at
/// least one row. Dates with no reading are filled with an absent
/// observation carrying the time of day of the first reading, so the
/// inserted rows sit on the same daily grid as the series start.
///
/// Rows sharing a date are all kept. Nothing is aggregated, so a series
/// with duplicate dates comes out longer than its calendar span.
pub fn align(series: &ObservationSeries) -> ObservationSeries {
    let mut rows = series.observations.clone();
    rows.sort_by_key(|o| o.timestamp);

    let (first, last) = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return series.clone(),
    };
    let anchor = first.timestamp.time();
    let last_date = last.date();

    let mut aligned = Vec::with_capacity(rows.len() + gap_count(series));
    let mut rows = rows.into_iter().peekable();

    for date in first.date().iter_days().take_while(|d| *d <= last_date) {
        let before = aligned.len();
        while let Some(obs) = rows.next_if(|o| o.date() == date) {
            aligned.push(obs);
        }
        if aligned.len() == before {
            aligned.push(Observation::absent(date.and_time(anchor)));
        }
    }

    ObservationSeries::new(series.building_id, series.utility, aligned)
}

/// Number of calendar dates in the series range that have no reading
pub fn gap_count(series: &ObservationSeries) -> usize {
    match series.date_range() {
        Some((first, last)) => {
            let span = (last - first).num_days() as usize + 1;
            span - distinct_dates(series)
        }
        None => 0,
    }
}

/// Rows beyond the first on each calendar date
pub fn duplicate_count(series: &ObservationSeries) -> usize {
    series.len() - distinct_dates(series)
}

fn distinct_dates(series: &ObservationSeries) -> usize {
    series
        .observations
        .iter()
        .map(Observation::date)
        .collect::<BTreeSet<_>>()
        .len()
}
