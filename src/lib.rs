//! Hierarchical marker clustering for globe and map viewports.
//!
//! geomark takes a large set of weighted point locations and, for any
//! camera state, produces the reduced marker list a rendering surface
//! should draw: aggregated clusters where points crowd together,
//! individual points where they don't. The index is built once per
//! location set and queried on every camera change.
//!
//! ```rust
//! use geomark::{ClusterConfig, RawLocation, SpatialIndex, Viewport, ViewportConfig};
//!
//! let feed = vec![
//!     RawLocation::new(40.7128, -74.0060, "New York", 3586),
//!     RawLocation::new(34.0522, -118.2437, "Los Angeles", 6354),
//!     RawLocation::new(41.8781, -87.6298, "Chicago", 10756),
//! ];
//!
//! let index = SpatialIndex::build(feed, ClusterConfig::default())?;
//!
//! // Camera orbiting far out over the US: coarse clustering.
//! let camera = Viewport::new(39.0, -98.0, 6.0);
//! let markers = index.markers_for_viewport(&camera, 16.0 / 9.0, &ViewportConfig::default())?;
//! assert!(!markers.is_empty());
//! # Ok::<(), geomark::GeomarkError>(())
//! ```

pub mod error;
pub mod feed;
pub mod geodesy;
pub mod index;
pub mod proximity;
pub mod types;
pub mod validation;
pub mod viewport;

pub use error::{GeomarkError, Result};

pub use index::SpatialIndex;

pub use types::{
    abbreviate_count, AltitudeStep, BoundingBox, ClusterConfig, Marker, RawLocation, Viewport,
    ViewportConfig,
};

pub use geodesy::{haversine_distance, EARTH_RADIUS_METERS};

pub use proximity::within_radius;

pub use viewport::{query_params, target_altitude_for_zoom, zoom_for_altitude};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeomarkError, Result, SpatialIndex};

    pub use crate::{BoundingBox, ClusterConfig, Marker, RawLocation, Viewport, ViewportConfig};

    pub use crate::proximity::within_radius;

    pub use crate::viewport::{query_params, target_altitude_for_zoom, zoom_for_altitude};

    pub use geo::Point;
}
