//! Spherical geometry helpers: great-circle distance and the
//! web-mercator unit-square projection used as index space.

use geo::Point;

/// Earth radius in meters for haversine distance calculations.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Latitude bound of the web-mercator projection; the poles themselves
/// are not representable.
pub const MAX_PROJECTED_LATITUDE: f64 = 85.051_128_779_806_59;

/// Great-circle distance between two points in meters, haversine formula.
///
/// Operates on angular differences, so it stays correct for point pairs
/// straddling the antimeridian.
///
/// # Examples
///
/// ```
/// use geo::Point;
/// use geomark::geodesy::haversine_distance;
///
/// let nyc = Point::new(-74.0060, 40.7128);
/// let la = Point::new(-118.2437, 34.0522);
///
/// let dist = haversine_distance(&nyc, &la);
/// assert!(dist > 3_900_000.0 && dist < 4_000_000.0); // ~3,944 km
/// ```
pub fn haversine_distance(a: &Point, b: &Point) -> f64 {
    let lat1_rad = a.y().to_radians();
    let lat2_rad = b.y().to_radians();
    let delta_lat = (b.y() - a.y()).to_radians();
    let delta_lng = (b.x() - a.x()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Longitude to unit-square mercator x in [0, 1].
pub fn lng_to_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Latitude to unit-square mercator y in [0, 1]; latitudes beyond the
/// projection bound saturate at the edges.
pub fn lat_to_y(lat: f64) -> f64 {
    let sin = lat.to_radians().sin();
    let y = 0.5 - (0.25 * ((1.0 + sin) / (1.0 - sin)).ln()) / std::f64::consts::PI;
    y.clamp(0.0, 1.0)
}

/// Unit-square mercator x back to longitude.
pub fn x_to_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// Unit-square mercator y back to latitude.
pub fn y_to_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0).to_radians();
    (360.0 * y2.exp().atan()) / std::f64::consts::PI - 90.0
}
