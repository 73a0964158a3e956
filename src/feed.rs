//! Location feed loading.
//!
//! The engine is agnostic about where locations come from; this module
//! covers the common case of a JSON feed shaped like the public data
//! model, validated before it reaches the index builder.

use std::io::Read;

use crate::error::Result;
use crate::types::RawLocation;
use crate::validation::validate_locations;

/// Parse and validate a location feed from JSON bytes.
///
/// # Examples
///
/// ```
/// use geomark::feed::from_json_slice;
///
/// let json = br#"[
///     { "lat": 40.7128, "lng": -74.0060, "label": "New York", "weight": 3586 },
///     { "lat": 34.0522, "lng": -118.2437, "label": "Los Angeles", "weight": 6354 }
/// ]"#;
///
/// let feed = from_json_slice(json)?;
/// assert_eq!(feed.len(), 2);
/// assert_eq!(feed[0].label, "New York");
/// # Ok::<(), geomark::GeomarkError>(())
/// ```
pub fn from_json_slice(bytes: &[u8]) -> Result<Vec<RawLocation>> {
    let locations: Vec<RawLocation> = serde_json::from_slice(bytes)?;
    validate_locations(&locations)?;
    Ok(locations)
}

/// Parse and validate a location feed from a reader.
pub fn from_json_reader<R: Read>(reader: R) -> Result<Vec<RawLocation>> {
    let locations: Vec<RawLocation> = serde_json::from_reader(reader)?;
    validate_locations(&locations)?;
    Ok(locations)
}
