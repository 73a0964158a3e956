//! Great-circle proximity filtering over raw locations.
//!
//! Backs the "highlight nearby users" interaction: a click on an
//! individual marker asks for every raw location within a radius of the
//! clicked coordinate.

use geo::Point;

use crate::error::{GeomarkError, Result};
use crate::geodesy::haversine_distance;
use crate::types::RawLocation;
use crate::validation::validate_point;

/// All locations within `radius_meters` of `center`, boundary inclusive,
/// nearest first.
///
/// A zero radius returns only exact coordinate matches. The underlying
/// haversine distance works on angular differences, so pairs straddling
/// the antimeridian are measured correctly.
///
/// # Examples
///
/// ```
/// use geo::Point;
/// use geomark::RawLocation;
/// use geomark::proximity::within_radius;
///
/// let feed = vec![
///     RawLocation::new(40.7128, -74.0060, "New York", 3586),
///     RawLocation::new(40.6782, -73.9442, "Brooklyn", 900),
///     RawLocation::new(34.0522, -118.2437, "Los Angeles", 6354),
/// ];
///
/// let nearby = within_radius(&feed, &Point::new(-74.0060, 40.7128), 10_000.0)?;
/// assert_eq!(nearby.len(), 2); // LA is well outside 10 km
/// # Ok::<(), geomark::GeomarkError>(())
/// ```
pub fn within_radius<'a>(
    locations: &'a [RawLocation],
    center: &Point,
    radius_meters: f64,
) -> Result<Vec<&'a RawLocation>> {
    validate_point(center)?;

    if !radius_meters.is_finite() || radius_meters < 0.0 {
        return Err(GeomarkError::InvalidInput(format!(
            "Radius must be non-negative and finite, got: {}",
            radius_meters
        )));
    }

    let mut hits: Vec<(f64, &RawLocation)> = locations
        .iter()
        .filter_map(|location| {
            let distance = haversine_distance(center, &location.point());
            (distance <= radius_meters).then_some((distance, location))
        })
        .collect();

    hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    Ok(hits.into_iter().map(|(_, location)| location).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nyc_feed() -> Vec<RawLocation> {
        vec![
            RawLocation::new(40.7128, -74.0060, "New York", 3586),
            RawLocation::new(40.6782, -73.9442, "Brooklyn", 900),
            RawLocation::new(40.7306, -73.9356, "Queens", 700),
            RawLocation::new(34.0522, -118.2437, "Los Angeles", 6354),
        ]
    }

    #[test]
    fn test_radius_filters_and_sorts() {
        let feed = nyc_feed();
        let center = Point::new(-74.0060, 40.7128);

        let nearby = within_radius(&feed, &center, 15_000.0).unwrap();
        assert_eq!(nearby.len(), 3);
        assert_eq!(nearby[0].label, "New York"); // distance zero comes first
    }

    #[test]
    fn test_zero_radius_matches_exact_coordinates_only() {
        let feed = nyc_feed();

        let exact = within_radius(&feed, &Point::new(-74.0060, 40.7128), 0.0).unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].label, "New York");

        let near_miss = within_radius(&feed, &Point::new(-74.0061, 40.7128), 0.0).unwrap();
        assert!(near_miss.is_empty());
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let center = Point::new(0.0, 0.0);
        let spot = RawLocation::new(0.5, 0.0, "North of center", 1);
        let exact_distance = haversine_distance(&center, &spot.point());
        let feed = vec![spot];

        // Exactly at the radius: included.
        let hits = within_radius(&feed, &center, exact_distance).unwrap();
        assert_eq!(hits.len(), 1);

        // One meter short: excluded.
        let hits = within_radius(&feed, &center, exact_distance - 1.0).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_antimeridian_neighbors_found() {
        let feed = vec![
            RawLocation::new(0.0, 179.9, "East side", 1),
            RawLocation::new(0.0, -179.9, "West side", 1),
        ];

        // Both sit ~11 km from the line; a 30 km radius catches both.
        let hits = within_radius(&feed, &Point::new(180.0, 0.0), 30_000.0).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let feed = nyc_feed();

        assert!(within_radius(&feed, &Point::new(999.0, 0.0), 100.0).is_err());
        assert!(within_radius(&feed, &Point::new(0.0, 0.0), -1.0).is_err());
        assert!(within_radius(&feed, &Point::new(0.0, 0.0), f64::NAN).is_err());
    }

    #[test]
    fn test_empty_feed() {
        let hits = within_radius(&[], &Point::new(0.0, 0.0), 1000.0).unwrap();
        assert!(hits.is_empty());
    }
}
