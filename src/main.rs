// This file is an example of how to use the `xray_vision` library.
// The main library entry point is `src/lib.rs`.

use xray_vision::pipeline::{self, DiseaseClass, Raster};

fn main() {
    println!("X-ray Vision Scoring Engine - Example Runner");

    // In a real application the raster comes from an uploaded file, e.g.
    // `Raster::from_bytes(&upload)`. Here we synthesize a radiograph-shaped
    // intensity distribution: dark background, mid tissue, bright enamel.
    let mut plane = Vec::with_capacity(10_000);
    plane.extend(std::iter::repeat_n(20u8, 3_500));
    plane.extend(std::iter::repeat_n(120u8, 4_000));
    plane.extend(std::iter::repeat_n(200u8, 2_500));
    let raster = match Raster::from_buffer(100, 100, 1, plane) {
        Ok(raster) => raster,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };

    // Stage 1: the plausibility gate runs before any disease inference.
    let verdict = pipeline::check_validity(&raster);
    println!(
        "gate: valid={} confidence={:.1}",
        verdict.is_valid, verdict.confidence
    );
    if !verdict.is_valid {
        println!("rejected: {}", verdict.reason);
        return;
    }

    // Stage 2: the external classifier would produce the disease class; the
    // engine enriches it with a severity estimate.
    let (report, tier) = pipeline::score_severity(&raster, DiseaseClass::Caries);
    println!(
        "severity: score={:.1} tier={}",
        report.severity_score,
        tier.map_or("not applicable", |t| t.label())
    );
}
