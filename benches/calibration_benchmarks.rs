use confcal::binning::bin_records;
use confcal::calibration::LogisticCalibrator;
use confcal::config::CalibrationConfig;
use confcal::data::{DetectionRecord, DetectionTable, ThresholdSpec};
use confcal::partition::Partition;
use confcal::report::CalibrationReport;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

fn simulated_table(n_categories: usize, n: usize) -> (DetectionTable, Vec<ThresholdSpec>) {
    let mut records: Vec<DetectionRecord> = Vec::with_capacity(n_categories * n);
    let mut thresholds = Vec::with_capacity(n_categories);
    for i in 0..n_categories {
        let category = format!("category_{}", i);
        let slope = 4.0 + i as f64 % 7.0;
        let table = DetectionTable::simulate(&category, -0.7 * slope, slope, n, (0.1, 1.0), i as u64).unwrap();
        records.extend_from_slice(table.records());
        thresholds.push(ThresholdSpec::new(category, 0.6 + 0.01 * (i % 30) as f64));
    }
    (DetectionTable::new(records).unwrap(), thresholds)
}

pub fn calibration_benchmarks(c: &mut Criterion) {
    let cfg = CalibrationConfig::default();
    let (single, _) = simulated_table(1, 100_000);
    let partition = Partition::new(&single, cfg.min_conf);
    let records = partition.get("category_0");
    let calibrator = LogisticCalibrator::new(&cfg);

    c.bench_function("Fit 100k records", |b| b.iter(|| calibrator.fit(black_box(records))));
    c.bench_function("Bin 100k records", |b| {
        b.iter(|| bin_records(black_box(records), cfg.bin_width, cfg.min_conf))
    });

    let (table, thresholds) = simulated_table(200, 2_000);
    let mut group = c.benchmark_group("report");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));
    group.bench_function("Report 200 categories sequential", |b| {
        b.iter(|| CalibrationReport::build(black_box(&table), black_box(&thresholds), &cfg, false).unwrap())
    });
    group.bench_function("Report 200 categories parallel", |b| {
        b.iter(|| CalibrationReport::build(black_box(&table), black_box(&thresholds), &cfg, true).unwrap())
    });
    group.finish();
}

criterion_group!(benches, calibration_benchmarks);
criterion_main!(benches);
