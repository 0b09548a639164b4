// THEORY:
// The engine has exactly two ways to fail, and both are boundary failures, not
// scoring failures: an input that never becomes a pixel grid (`Decode`), and a
// disease-class label from the external classifier that is outside the agreed
// enumeration (`DataContract`). Everything downstream of a valid `Raster` is a
// total function; numerical degeneracies (uniform images, zero variance) produce
// extreme-but-valid scores rather than errors.

use thiserror::Error;

/// Failures the scoring engine can surface to its caller.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The input could not be parsed into a pixel grid.
    #[error("unreadable image: {0}")]
    Decode(String),

    /// A disease-class label outside the known enumeration reached the engine.
    #[error("unknown disease class: {0}")]
    DataContract(String),
}

impl From<image::ImageError> for AnalysisError {
    fn from(err: image::ImageError) -> Self {
        AnalysisError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::AnalysisError;

    #[test]
    fn decode_message_names_the_image() {
        let err = AnalysisError::Decode("empty buffer".to_string());
        assert_eq!(err.to_string(), "unreadable image: empty buffer");
    }

    #[test]
    fn contract_message_names_the_label() {
        let err = AnalysisError::DataContract("Gingivitis".to_string());
        assert_eq!(err.to_string(), "unknown disease class: Gingivitis");
    }
}
