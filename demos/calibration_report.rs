use confcal::io::{read_detections, read_thresholds, write_bins, write_curve, write_evaluations};
use confcal::{CalibrationConfig, CalibrationReport, CutoffOverlay, JsonIO};
use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let detections_path = args.get(1).map(String::as_str).unwrap_or("resources/validated_detections.csv");
    let thresholds_path = args.get(2).map(String::as_str).unwrap_or("resources/thresholds.csv");
    let out_dir = PathBuf::from(args.get(3).map(String::as_str).unwrap_or("calibration_output"));
    fs::create_dir_all(out_dir.join("curves"))?;

    // 1. Read data
    let (table, summary) = read_detections(detections_path, b';')?;
    let thresholds = read_thresholds(thresholds_path, b',')?;
    println!(
        "Kept {} detections, rescaled {}, dropped {}.",
        summary.kept,
        summary.rescaled,
        summary.dropped()
    );

    // 2. Calibrate every category with a threshold
    let cfg = CalibrationConfig::default();
    let report = CalibrationReport::build(&table, &thresholds, &cfg, true)?;

    println!("\n{:<30} {:>9} {:>9} {:>9} {:>7}", "category", "threshold", "emp. TPR", "model TPR", "n_true");
    let evaluations = report.evaluations();
    for e in &evaluations {
        let model_tpr = e.model_tpr.map(|t| format!("{:.3}", t)).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<30} {:>9.3} {:>9.3} {:>9} {:>7}",
            e.category, e.threshold, e.empirical_tpr, model_tpr, e.n_true
        );
    }

    // 3. Export
    write_evaluations(out_dir.join("tpr_at_thresholds.csv"), &evaluations)?;
    for category in &report.categories {
        let name = category.category.replace(' ', "_");
        if let Some(curve) = category.curve(&cfg) {
            write_curve(out_dir.join("curves").join(format!("{}_curve.csv", name)), &curve)?;
        }
        if !category.bins.is_empty() {
            write_bins(out_dir.join("curves").join(format!("{}_bins.csv", name)), &category.bins)?;
        }
    }
    report.save_json(out_dir.join("report.json"))?;

    // 4. One cutoff for everything
    let overlay = CutoffOverlay::build(&table, &cfg, 0.7, 0.9, true)?;
    println!("\nAt cutoff {:.2}:", overlay.cutoff);
    for point in &overlay.points {
        println!("{:<30} {:.3}", point.category, point.probability_at_cutoff);
    }
    println!("Below {:.2}: {:?}", overlay.reference, overlay.below_reference());
    overlay.save_json(out_dir.join("overlay.json"))?;

    Ok(())
}
