//! Validation for geographic coordinates.
//!
//! Out-of-domain coordinates are rejected, never clamped: clamping would
//! silently move a record into the wrong spatial bucket.

use geo::Point;

use crate::error::{GeomarkError, Result};
use crate::types::RawLocation;

/// Validates a longitude/latitude pair.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use geomark::validation::validate_lng_lat;
///
/// assert!(validate_lng_lat(-74.0060, 40.7128).is_ok());
/// assert!(validate_lng_lat(200.0, 40.0).is_err());
/// assert!(validate_lng_lat(-74.0, 95.0).is_err());
/// ```
pub fn validate_lng_lat(lng: f64, lat: f64) -> Result<()> {
    if !lng.is_finite() {
        return Err(GeomarkError::InvalidCoordinate(format!(
            "Longitude must be finite, got: {}",
            lng
        )));
    }

    if !lat.is_finite() {
        return Err(GeomarkError::InvalidCoordinate(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lng) {
        return Err(GeomarkError::InvalidCoordinate(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lng
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeomarkError::InvalidCoordinate(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    Ok(())
}

/// Validates a query center point (x = longitude, y = latitude).
pub fn validate_point(point: &Point) -> Result<()> {
    validate_lng_lat(point.x(), point.y())
}

/// Validates a single location record.
pub fn validate_location(location: &RawLocation) -> Result<()> {
    validate_lng_lat(location.lng, location.lat)
}

/// Validates a whole location feed, reporting the offending index.
///
/// # Examples
///
/// ```
/// use geomark::validation::validate_locations;
/// use geomark::RawLocation;
///
/// let feed = vec![
///     RawLocation::new(40.7128, -74.0060, "New York", 3586),
///     RawLocation::new(95.0, 0.0, "Nowhere", 1), // invalid latitude
/// ];
///
/// assert!(validate_locations(&feed).is_err());
/// ```
pub fn validate_locations(locations: &[RawLocation]) -> Result<()> {
    for (idx, location) in locations.iter().enumerate() {
        validate_location(location).map_err(|e| {
            GeomarkError::InvalidCoordinate(format!("Location at index {}: {}", idx, e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinates() {
        assert!(validate_lng_lat(-74.0060, 40.7128).is_ok());
        assert!(validate_lng_lat(139.6917, 35.6895).is_ok());

        // Edge cases
        assert!(validate_lng_lat(180.0, 0.0).is_ok());
        assert!(validate_lng_lat(-180.0, 0.0).is_ok());
        assert!(validate_lng_lat(0.0, 90.0).is_ok());
        assert!(validate_lng_lat(0.0, -90.0).is_ok());
    }

    #[test]
    fn test_invalid_longitude() {
        assert!(validate_lng_lat(200.0, 40.0).is_err());
        assert!(validate_lng_lat(-200.0, 40.0).is_err());
        assert!(validate_lng_lat(180.1, 40.0).is_err());
    }

    #[test]
    fn test_invalid_latitude() {
        assert!(validate_lng_lat(-74.0, 95.0).is_err());
        assert!(validate_lng_lat(-74.0, -95.0).is_err());
        assert!(validate_lng_lat(-74.0, 90.1).is_err());
    }

    #[test]
    fn test_non_finite_coordinates() {
        assert!(validate_lng_lat(f64::NAN, 40.0).is_err());
        assert!(validate_lng_lat(-74.0, f64::NAN).is_err());
        assert!(validate_lng_lat(f64::INFINITY, 40.0).is_err());
        assert!(validate_lng_lat(-74.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_validate_feed_reports_index() {
        let feed = vec![
            RawLocation::new(40.7128, -74.0060, "New York", 3586),
            RawLocation::new(0.0, 999.0, "Broken", 1),
        ];

        let err = validate_locations(&feed).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }
}
