//! Error types for the guardrail_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for guardrail_core operations
///
/// Out-of-range doses and weight-band misses are deliberately absent: they are
/// reported inside a [`crate::DosingReport`] rather than aborting the request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Requested drug is not in the catalog
    #[error("Drug not found in database")]
    UnknownDrug(String),

    /// Dose unit string not recognised
    #[error("Unknown dose unit: {0}")]
    UnknownUnit(String),

    /// No conversion rule exists between the two units
    #[error("Unsupported unit conversion: {from} -> {to}")]
    UnsupportedConversion {
        from: crate::DoseUnit,
        to: crate::DoseUnit,
    },

    /// Infusion math would divide by zero (or overflow)
    #[error(
        "Infusion volume undefined for concentration {concentration} with {diluent_volume_ml} mL diluent"
    )]
    DivisionUndefined {
        concentration: f64,
        diluent_volume_ml: f64,
    },

    /// Request failed basic sanity checks
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),
}
