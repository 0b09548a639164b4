// THEORY:
// The `severity` module answers "how bad does it look?" once an external
// classifier has already said *what* it is. The severity score is a weighted
// fusion of four image signals, independent of the disease identity; the
// discrete tier then depends on which disease the classifier named, because a
// score that is moderate for caries can already be severe for a fracture.
//
// Key architectural principles:
// 1.  **Class is consumed, never produced**: `DiseaseClass` belongs to the
//     external classifier. This module only branches on it; an unrecognized
//     label is a data-contract violation, logged and degraded to "no tier"
//     rather than crashing the request.
// 2.  **Ordered boundary tables**: each tier ladder is a sorted list of upper
//     bounds, so a score sitting exactly on a boundary resolves to the upper
//     tier by construction.
// 3.  **Total over valid features**: non-finite feature values contribute zero
//     instead of poisoning the fusion.

use crate::core_modules::error::AnalysisError;
use crate::core_modules::feature_extractor::FeatureVector;
use serde::Serialize;
use std::str::FromStr;

/// Fusion weights: dark area, contrast, edge intensity, histogram variance.
const DARK_AREA_WEIGHT: f64 = 0.40;
const CONTRAST_WEIGHT: f64 = 0.25;
const EDGE_WEIGHT: f64 = 0.25;
const HIST_VARIANCE_WEIGHT: f64 = 0.10;

/// The disease enumeration owned by the external classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiseaseClass {
    Caries,
    Fractured,
    Normal,
}

impl DiseaseClass {
    pub fn label(&self) -> &'static str {
        match self {
            DiseaseClass::Caries => "Caries",
            DiseaseClass::Fractured => "Fractured",
            DiseaseClass::Normal => "Normal",
        }
    }
}

impl FromStr for DiseaseClass {
    type Err = AnalysisError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "Caries" => Ok(DiseaseClass::Caries),
            "Fractured" => Ok(DiseaseClass::Fractured),
            "Normal" => Ok(DiseaseClass::Normal),
            other => Err(AnalysisError::DataContract(other.to_string())),
        }
    }
}

/// Discrete severity bucket, ordered from least to most serious.
/// "Not applicable" (healthy finding, unknown class) is `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SeverityTier {
    Mild,
    Moderate,
    Severe,
}

impl SeverityTier {
    pub fn label(&self) -> &'static str {
        match self {
            SeverityTier::Mild => "Mild",
            SeverityTier::Moderate => "Moderate",
            SeverityTier::Severe => "Severe",
        }
    }
}

/// The fused severity score together with the four signals that produced it,
/// echoed for explainability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityReport {
    pub severity_score: f64,
    pub dark_area_ratio: f64,
    pub contrast_level: f64,
    pub edge_intensity: f64,
    pub hist_variance: f64,
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Weighted fusion of the four severity signals into a 0-100 score.
pub fn severity_score(features: &FeatureVector) -> f64 {
    let score = 100.0
        * (DARK_AREA_WEIGHT * finite_or_zero(features.dark_area_ratio)
            + CONTRAST_WEIGHT * finite_or_zero(features.contrast_level)
            + EDGE_WEIGHT * finite_or_zero(features.edge_intensity)
            + HIST_VARIANCE_WEIGHT * finite_or_zero(features.hist_variance));
    score.clamp(0.0, 100.0)
}

/// Builds the explainable report for a feature vector.
pub fn severity_report(features: &FeatureVector) -> SeverityReport {
    SeverityReport {
        severity_score: severity_score(features),
        dark_area_ratio: features.dark_area_ratio,
        contrast_level: features.contrast_level,
        edge_intensity: features.edge_intensity,
        hist_variance: features.hist_variance,
    }
}

/// Upper-bound ladders per class; a score below a bound takes that tier,
/// anything past the last bound is Severe.
const CARIES_TIER_BOUNDS: [(f64, SeverityTier); 2] =
    [(35.0, SeverityTier::Mild), (65.0, SeverityTier::Moderate)];
/// Fractures are binary by design: no Moderate tier.
const FRACTURED_TIER_BOUNDS: [(f64, SeverityTier); 1] = [(50.0, SeverityTier::Mild)];

fn tier_from_bounds(score: f64, bounds: &[(f64, SeverityTier)]) -> SeverityTier {
    for &(bound, tier) in bounds {
        if score < bound {
            return tier;
        }
    }
    SeverityTier::Severe
}

/// Maps a severity score to a tier for the given disease class.
/// A healthy finding has no severity, so `Normal` is always `None`.
pub fn classify(score: f64, disease_class: DiseaseClass) -> Option<SeverityTier> {
    match disease_class {
        DiseaseClass::Normal => None,
        DiseaseClass::Caries => Some(tier_from_bounds(score, &CARIES_TIER_BOUNDS)),
        DiseaseClass::Fractured => Some(tier_from_bounds(score, &FRACTURED_TIER_BOUNDS)),
    }
}

/// Label-based entry point for callers holding the classifier's raw string.
/// An unknown label is a data-contract violation: logged, then treated as
/// "not applicable" instead of crashing the request.
pub fn classify_label(score: f64, label: &str) -> Option<SeverityTier> {
    match DiseaseClass::from_str(label) {
        Ok(class) => classify(score, class),
        Err(err) => {
            log::warn!("disease classifier contract violation: {err}");
            None
        }
    }
}
