//! Camera-to-query translation.
//!
//! Pure functions from a camera state (center + altitude over a unit
//! sphere) to the bounding box and zoom level the cluster index should
//! be queried with. The camera itself stays an input value; nothing here
//! reads back from a live rendering object or keeps state.

use crate::error::{GeomarkError, Result};
use crate::types::{BoundingBox, Viewport, ViewportConfig};
use crate::validation::validate_lng_lat;

/// Latitude bound of produced bounding boxes; standard web-map
/// projections cannot represent the poles.
pub const MAX_VIEW_LATITUDE: f64 = 85.0;

/// Floor for the latitude-compression factor, so longitude widths stay
/// bounded when the camera is centered near a pole.
const MIN_LAT_COMPRESSION: f64 = 0.01;

/// Clustering zoom for a camera altitude (in sphere radii).
///
/// Steps down monotonically as the camera descends: the first table row
/// whose threshold the altitude exceeds wins, and a camera below every
/// threshold gets the surface zoom.
pub fn zoom_for_altitude(altitude: f64, config: &ViewportConfig) -> u8 {
    for step in &config.altitude_steps {
        if altitude > step.min_altitude {
            return step.zoom;
        }
    }
    config.surface_zoom
}

/// A camera altitude from which [`zoom_for_altitude`] resolves to at
/// least `zoom`. Drives "zoom to reveal" navigation after a cluster
/// click: the host animates the camera to the returned altitude and the
/// next query sees the cluster split.
pub fn target_altitude_for_zoom(zoom: u8, config: &ViewportConfig) -> f64 {
    for (i, step) in config.altitude_steps.iter().enumerate() {
        if step.zoom >= zoom {
            return match i {
                0 => step.min_altitude * 1.5,
                _ => (step.min_altitude + config.altitude_steps[i - 1].min_altitude) / 2.0,
            };
        }
    }
    match config.altitude_steps.last() {
        Some(last) => last.min_altitude / 2.0,
        None => 0.1,
    }
}

/// The geographic bounding box visible from a camera.
///
/// Models a perspective camera looking at the sphere: the view cone's
/// angular footprint grows with altitude, the box's longitude half-width
/// is widened by `1 / cos(center_lat)` to compensate latitude
/// compression, and the result is clamped to
/// `[-180, 180] x [-85, 85]`.
pub fn visible_bounds(
    camera: &Viewport,
    aspect_ratio: f64,
    config: &ViewportConfig,
) -> Result<BoundingBox> {
    validate_lng_lat(camera.center_lng, camera.center_lat)?;
    config.validate()?;

    if !camera.altitude.is_finite() || camera.altitude <= 0.0 {
        return Err(GeomarkError::InvalidInput(format!(
            "Camera altitude must be positive and finite, got: {}",
            camera.altitude
        )));
    }
    if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
        return Err(GeomarkError::InvalidInput(format!(
            "Aspect ratio must be positive and finite, got: {}",
            aspect_ratio
        )));
    }

    let half_fov = (config.fov_degrees / 2.0).to_radians();
    // Angular radius of the view cone's footprint on the sphere surface.
    let lat_half = (half_fov.tan() * camera.altitude).atan().to_degrees();

    // Degrees of longitude per unit distance shrink by cos(lat) away
    // from the equator; the floor keeps the division bounded near poles.
    let compression = camera
        .center_lat
        .to_radians()
        .cos()
        .max(MIN_LAT_COMPRESSION);
    let lng_half = (lat_half * aspect_ratio / compression).min(180.0);

    Ok(BoundingBox::new(
        (camera.center_lng - lng_half).max(-180.0),
        (camera.center_lat - lat_half).max(-MAX_VIEW_LATITUDE),
        (camera.center_lng + lng_half).min(180.0),
        (camera.center_lat + lat_half).min(MAX_VIEW_LATITUDE),
    ))
}

/// Translate a camera state into `(bounds, zoom)` for a marker query.
///
/// # Examples
///
/// ```
/// use geomark::{Viewport, ViewportConfig};
/// use geomark::viewport::query_params;
///
/// let config = ViewportConfig::default();
/// let orbit = Viewport::new(40.7128, -74.0060, 8.0);
/// let (bounds, zoom) = query_params(&orbit, 16.0 / 9.0, &config)?;
///
/// assert_eq!(zoom, 0); // far out means global clustering
/// assert!(bounds.min_lng < bounds.max_lng);
/// # Ok::<(), geomark::GeomarkError>(())
/// ```
pub fn query_params(
    camera: &Viewport,
    aspect_ratio: f64,
    config: &ViewportConfig,
) -> Result<(BoundingBox, u8)> {
    let bounds = visible_bounds(camera, aspect_ratio, config)?;
    Ok((bounds, zoom_for_altitude(camera.altitude, config)))
}
