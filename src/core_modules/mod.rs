pub mod edge_detector;
pub mod error;
pub mod feature_extractor;
pub mod histogram;
pub mod pixel;
pub mod raster;
pub mod severity;
pub mod validity;
