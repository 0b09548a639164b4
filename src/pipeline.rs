// THEORY:
// The `pipeline` module is the top-level API for the scoring engine. It
// encapsulates the full stack (raster validation, feature extraction, the
// plausibility gate, severity fusion and tier classification) behind the only
// two calls a host application needs:
//
// 1.  `check_validity` — the radiograph plausibility gate, run before any
//     disease inference.
// 2.  `score_severity` — the severity report and tier for an image whose
//     disease class an external classifier has already determined.
//
// Both are stateless pure functions over the input buffer: no caching, no
// shared state, safe to call from any number of parallel workers. The `_bytes`
// variants accept still-encoded uploads; a decode failure surfaces as an
// invalid verdict (gate) or an `AnalysisError` (severity), never as a panic.

use crate::core_modules::feature_extractor;
use crate::core_modules::severity;
use crate::core_modules::validity;

// Re-export the caller-facing data structures for the public API.
pub use crate::core_modules::error::AnalysisError;
pub use crate::core_modules::feature_extractor::FeatureVector;
pub use crate::core_modules::raster::Raster;
pub use crate::core_modules::severity::{DiseaseClass, SeverityReport, SeverityTier};
pub use crate::core_modules::validity::ValidityVerdict;

/// Runs the radiograph plausibility gate over a decoded raster.
pub fn check_validity(raster: &Raster) -> ValidityVerdict {
    let verdict = validity::check_validity(raster);
    log::debug!(
        "validity gate: valid={} confidence={:.1} reason={:?}",
        verdict.is_valid,
        verdict.confidence,
        verdict.reason
    );
    verdict
}

/// Gate for still-encoded image bytes. Decode failures are reported as an
/// invalid verdict with zero confidence, not routed through the fusion.
pub fn check_validity_bytes(bytes: &[u8]) -> ValidityVerdict {
    match Raster::from_bytes(bytes) {
        Ok(raster) => check_validity(&raster),
        Err(AnalysisError::Decode(detail)) => ValidityVerdict::unreadable(detail),
        Err(other) => ValidityVerdict::unreadable(other),
    }
}

/// Scores how severe the finding looks on a decoded raster, given the disease
/// class the external classifier produced. The tier is `None` when severity is
/// not applicable to the class.
pub fn score_severity(
    raster: &Raster,
    disease_class: DiseaseClass,
) -> (SeverityReport, Option<SeverityTier>) {
    let features = feature_extractor::extract(raster);
    let report = severity::severity_report(&features);
    let tier = severity::classify(report.severity_score, disease_class);
    log::debug!(
        "severity: class={} score={:.1} tier={:?}",
        disease_class.label(),
        report.severity_score,
        tier.map(|t| t.label())
    );
    (report, tier)
}

/// Severity scoring for still-encoded image bytes.
pub fn score_severity_bytes(
    bytes: &[u8],
    disease_class: DiseaseClass,
) -> Result<(SeverityReport, Option<SeverityTier>), AnalysisError> {
    let raster = Raster::from_bytes(bytes)?;
    Ok(score_severity(&raster, disease_class))
}
