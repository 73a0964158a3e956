//! Core data model and configuration for geomark.
//!
//! All types here are plain serializable values: the engine itself holds
//! no camera handles, timers, or event state.

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::error::{GeomarkError, Result};

/// A single input location with an attached population weight.
///
/// Immutable once created; the index takes a snapshot of these at build
/// time and never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLocation {
    /// Latitude in degrees, `[-90, 90]`.
    pub lat: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub lng: f64,
    /// Place name.
    pub label: String,
    /// Population/user count attached to this point.
    pub weight: u64,
}

impl RawLocation {
    /// Create a new location record.
    pub fn new(lat: f64, lng: f64, label: impl Into<String>, weight: u64) -> Self {
        Self {
            lat,
            lng,
            label: label.into(),
            weight,
        }
    }

    /// The location as a `geo::Point` (x = longitude, y = latitude).
    pub fn point(&self) -> Point {
        Point::new(self.lng, self.lat)
    }
}

/// A visual marker produced by a cluster query.
///
/// Consumers switch exhaustively on the variant instead of probing an
/// `is_cluster` flag: a `Cluster` merges two or more raw locations at the
/// queried resolution, a `Point` is a single unmerged location returned
/// as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Marker {
    /// Two or more raw locations merged at this resolution.
    Cluster {
        /// Stable id within the current index; valid until the index is
        /// rebuilt.
        id: u64,
        /// Weighted centroid latitude of the merged locations.
        lat: f64,
        /// Weighted centroid longitude of the merged locations.
        lng: f64,
        /// Number of raw locations merged into this cluster.
        point_count: usize,
        /// Sum of the merged locations' weights.
        weight: u64,
    },
    /// A single location with no neighbor inside the clustering radius.
    Point {
        /// Index of the location in the input feed.
        id: u64,
        lat: f64,
        lng: f64,
        /// The underlying input record.
        location: RawLocation,
    },
}

impl Marker {
    /// Marker id. Point ids index the input feed; cluster ids live in a
    /// disjoint range above it.
    pub fn id(&self) -> u64 {
        match self {
            Marker::Cluster { id, .. } | Marker::Point { id, .. } => *id,
        }
    }

    /// Marker latitude in degrees.
    pub fn lat(&self) -> f64 {
        match self {
            Marker::Cluster { lat, .. } | Marker::Point { lat, .. } => *lat,
        }
    }

    /// Marker longitude in degrees.
    pub fn lng(&self) -> f64 {
        match self {
            Marker::Cluster { lng, .. } | Marker::Point { lng, .. } => *lng,
        }
    }

    /// Whether this marker aggregates more than one location.
    pub fn is_cluster(&self) -> bool {
        matches!(self, Marker::Cluster { .. })
    }

    /// Number of raw locations this marker represents (1 for a point).
    pub fn point_count(&self) -> usize {
        match self {
            Marker::Cluster { point_count, .. } => *point_count,
            Marker::Point { .. } => 1,
        }
    }

    /// Total weight this marker represents.
    pub fn weight(&self) -> u64 {
        match self {
            Marker::Cluster { weight, .. } => *weight,
            Marker::Point { location, .. } => location.weight,
        }
    }

    /// Abbreviated point-count label for marker captions, e.g. `"842"`,
    /// `"1.3k"`, `"12k"`.
    pub fn count_label(&self) -> String {
        abbreviate_count(self.point_count())
    }
}

/// Abbreviate a count for display: thousands collapse to a `k` suffix.
pub fn abbreviate_count(count: usize) -> String {
    if count >= 10_000 {
        format!("{}k", count / 1000)
    } else if count >= 1000 {
        format!("{:.1}k", count as f64 / 1000.0)
    } else {
        count.to_string()
    }
}

/// A geographic bounding box `(min_lng, min_lat, max_lng, max_lat)`.
///
/// Ephemeral query input, typically derived from a [`Viewport`] by the
/// translator in [`crate::viewport`]. Longitude normalization for boxes
/// that wrap past the antimeridian is handled inside the index query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// The whole world.
    pub const WORLD: BoundingBox = BoundingBox {
        min_lng: -180.0,
        min_lat: -90.0,
        max_lng: 180.0,
        max_lat: 90.0,
    };

    /// Create a bounding box from its four edges.
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// Whether a coordinate lies inside the box, edges inclusive.
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng >= self.min_lng && lng <= self.max_lng && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// Transient camera state, owned by the caller.
///
/// `altitude` is the camera's height above the sphere surface expressed
/// as a multiple of the sphere's radius; the engine never stores it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center_lat: f64,
    pub center_lng: f64,
    pub altitude: f64,
}

impl Viewport {
    pub fn new(center_lat: f64, center_lng: f64, altitude: f64) -> Self {
        Self {
            center_lat,
            center_lng,
            altitude,
        }
    }
}

/// Clustering parameters.
///
/// Tuning values, not contracts: the radius controls how many
/// index-space pixels apart two points may be before merging at a given
/// resolution, relative to `extent`.
///
/// # Example
///
/// ```rust
/// use geomark::ClusterConfig;
///
/// let config = ClusterConfig::default().with_radius(120.0).with_max_zoom(12);
/// assert!(config.validate().is_ok());
///
/// // Loadable from JSON; missing fields fall back to defaults.
/// let config: ClusterConfig = serde_json::from_str(r#"{ "min_points": 3 }"#).unwrap();
/// assert_eq!(config.min_points, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Clustering radius in extent-relative pixels.
    #[serde(default = "ClusterConfig::default_radius")]
    pub radius: f64,

    /// Tile extent the radius is measured against.
    #[serde(default = "ClusterConfig::default_extent")]
    pub extent: f64,

    /// Finest zoom level on which clusters are still formed. One level
    /// finer than this holds fully split individual points.
    #[serde(default = "ClusterConfig::default_max_zoom")]
    pub max_zoom: u8,

    /// Minimum number of raw locations required to form a cluster.
    /// Groups smaller than this stay individual points, so sparse areas
    /// show real locations instead of trivial clusters.
    #[serde(default = "ClusterConfig::default_min_points")]
    pub min_points: usize,
}

impl ClusterConfig {
    const fn default_radius() -> f64 {
        60.0
    }

    const fn default_extent() -> f64 {
        512.0
    }

    const fn default_max_zoom() -> u8 {
        16
    }

    const fn default_min_points() -> usize {
        2
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_extent(mut self, extent: f64) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Check the parameters are usable for index construction.
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(GeomarkError::InvalidInput(format!(
                "Clustering radius must be positive and finite, got: {}",
                self.radius
            )));
        }
        if !self.extent.is_finite() || self.extent <= 0.0 {
            return Err(GeomarkError::InvalidInput(format!(
                "Extent must be positive and finite, got: {}",
                self.extent
            )));
        }
        if self.max_zoom > 30 {
            return Err(GeomarkError::InvalidInput(format!(
                "Max zoom must be <= 30, got: {}",
                self.max_zoom
            )));
        }
        if self.min_points < 2 {
            return Err(GeomarkError::InvalidInput(format!(
                "A cluster needs at least 2 points, got min_points: {}",
                self.min_points
            )));
        }
        Ok(())
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            extent: Self::default_extent(),
            max_zoom: Self::default_max_zoom(),
            min_points: Self::default_min_points(),
        }
    }
}

/// One row of the altitude-to-zoom step table: cameras strictly above
/// `min_altitude` (in sphere radii) use `zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeStep {
    pub min_altitude: f64,
    pub zoom: u8,
}

/// Camera translation parameters.
///
/// The step table is a tunable policy; the hard contract is monotonicity
/// (a lower camera never gets a coarser zoom), which [`validate`] and the
/// tests enforce.
///
/// [`validate`]: ViewportConfig::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Vertical field of view of the modeled perspective camera, degrees.
    #[serde(default = "ViewportConfig::default_fov_degrees")]
    pub fov_degrees: f64,

    /// Altitude thresholds, ordered from highest camera to lowest.
    #[serde(default = "ViewportConfig::default_altitude_steps")]
    pub altitude_steps: Vec<AltitudeStep>,

    /// Zoom used below the lowest threshold (camera at close range).
    #[serde(default = "ViewportConfig::default_surface_zoom")]
    pub surface_zoom: u8,
}

impl ViewportConfig {
    const fn default_fov_degrees() -> f64 {
        75.0
    }

    const fn default_surface_zoom() -> u8 {
        16
    }

    fn default_altitude_steps() -> Vec<AltitudeStep> {
        // Global view down to street level.
        [
            (5.0, 0),
            (3.0, 1),
            (2.0, 3),
            (1.5, 5),
            (1.0, 7),
            (0.7, 9),
            (0.4, 11),
            (0.2, 13),
        ]
        .into_iter()
        .map(|(min_altitude, zoom)| AltitudeStep { min_altitude, zoom })
        .collect()
    }

    /// Check the table is usable: descending altitudes, ascending zooms.
    pub fn validate(&self) -> Result<()> {
        if !self.fov_degrees.is_finite() || self.fov_degrees <= 0.0 || self.fov_degrees >= 180.0 {
            return Err(GeomarkError::InvalidInput(format!(
                "Field of view must be in (0, 180) degrees, got: {}",
                self.fov_degrees
            )));
        }
        for pair in self.altitude_steps.windows(2) {
            if pair[1].min_altitude >= pair[0].min_altitude {
                return Err(GeomarkError::InvalidInput(format!(
                    "Altitude thresholds must strictly decrease: {} then {}",
                    pair[0].min_altitude, pair[1].min_altitude
                )));
            }
            if pair[1].zoom < pair[0].zoom {
                return Err(GeomarkError::InvalidInput(format!(
                    "Zoom levels must not decrease with lower altitude: {} then {}",
                    pair[0].zoom, pair[1].zoom
                )));
            }
        }
        if let Some(last) = self.altitude_steps.last() {
            if self.surface_zoom < last.zoom {
                return Err(GeomarkError::InvalidInput(format!(
                    "Surface zoom {} is coarser than the last step's zoom {}",
                    self.surface_zoom, last.zoom
                )));
            }
        }
        Ok(())
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            fov_degrees: Self::default_fov_degrees(),
            altitude_steps: Self::default_altitude_steps(),
            surface_zoom: Self::default_surface_zoom(),
        }
    }
}
