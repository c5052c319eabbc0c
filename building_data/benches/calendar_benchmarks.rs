use building_data::availability::{classify_records, AvailabilityRecords};
use building_data::{align, Observation, ObservationSeries, Utility};
use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn benchmark_align_hourly_year(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2019, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    // A year of hourly readings with every fifth day dropped
    let observations: Vec<Observation> = (0..365 * 24)
        .filter(|h| (h / 24) % 5 != 0)
        .map(|h| Observation::new(start + Duration::hours(h), Some((h % 24) as f64)))
        .collect();
    let series = ObservationSeries::new(0, Utility::Electricity, observations);

    c.bench_function("align_hourly_year", |b| {
        b.iter(|| {
            let _aligned = black_box(align(&series));
        });
    });
}

fn benchmark_classify(c: &mut Criterion) {
    let mut records = AvailabilityRecords::new();
    for bid in 0..121 {
        for year in 2000..2024 {
            if (bid + year as u32) % 3 != 0 {
                records.insert(Utility::Electricity, bid, year);
            }
            if (bid + year as u32) % 4 != 0 {
                records.insert(Utility::Gas, bid, year);
            }
        }
    }

    c.bench_function("classify_121_buildings", |b| {
        b.iter(|| {
            let _matrices = black_box(classify_records(&records, Some(2020)));
        });
    });
}

criterion_group!(benches, benchmark_align_hourly_year, benchmark_classify);
criterion_main!(benches);
