// THEORY:
// This file is the main entry point for the `xray_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (the host web application and
// its classifier ensemble).
//
// The primary goal is to export the `pipeline` functions and their associated
// data structures (`Raster`, `ValidityVerdict`, `SeverityReport`, ...) as the
// clean, high-level interface for the scoring engine. The internal modules
// (`core_modules`) stay encapsulated behind it.
//
// The engine itself is deliberately small and honest about what it is: a
// heuristic, rule-based signal combiner for dental radiographs. It gates
// implausible uploads before any disease inference runs and enriches an
// externally produced disease class with a severity estimate. It is not a
// diagnostic or clinically validated detector.

pub mod core_modules;
pub mod parallel_pipeline;
pub mod pipeline;
