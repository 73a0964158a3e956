//! Error types for geomark operations.

use thiserror::Error;

/// Errors returned by index construction, queries, and filters.
#[derive(Error, Debug)]
pub enum GeomarkError {
    /// Latitude or longitude outside the valid geographic domain, or
    /// non-finite. Raised during index construction and proximity
    /// filtering; offending records must be fixed or dropped by the
    /// caller, coordinates are never silently clamped.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// A cluster id that does not belong to the current index, e.g. an
    /// id retained across an index rebuild. Re-query and retry.
    #[error("Unknown cluster id: {0}")]
    UnknownClusterId(u64),

    /// Structurally invalid input that is not a coordinate problem
    /// (negative radius, non-finite altitude, malformed config).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The location feed could not be parsed.
    #[error("Malformed location feed: {0}")]
    MalformedFeed(#[from] serde_json::Error),
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeomarkError>;
