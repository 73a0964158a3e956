//! Hierarchical cluster index over a snapshot of raw locations.
//!
//! The index is built once per location-set change and is read-only
//! afterwards: every zoom level's cluster set is computed at construction
//! time by greedy bottom-up merging in web-mercator space, with one
//! R-tree per level for neighborhood and range queries. Concurrent
//! queries against the same index need no locking.

use log::{debug, warn};
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{GeomarkError, Result};
use crate::geodesy::{lat_to_y, lng_to_x, x_to_lng, y_to_lat};
use crate::types::{BoundingBox, ClusterConfig, Marker, RawLocation, Viewport, ViewportConfig};
use crate::validation::validate_locations;
use crate::viewport;

type TreeEntry = GeomWithData<[f64; 2], usize>;

/// What a level node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeOrigin {
    /// A single raw location, identified by its index in the input feed.
    Location(usize),
    /// A cluster formed at some level of the hierarchy.
    Cluster(u64),
}

/// One aggregation node within a zoom level.
#[derive(Debug, Clone)]
struct Node {
    /// Unit-square mercator x.
    x: f64,
    /// Unit-square mercator y.
    y: f64,
    /// Raw locations represented by this node.
    count: usize,
    /// Sum of the represented locations' weights.
    weight: u64,
    origin: NodeOrigin,
    /// Cluster that absorbed this node one formation level coarser, if any.
    parent: Option<u64>,
}

/// All nodes visible at one zoom level, plus their search tree.
struct Level {
    nodes: Vec<Node>,
    tree: RTree<TreeEntry>,
}


/// Immutable hierarchical spatial index over weighted point locations.
///
/// Levels `0..=max_zoom` hold progressively finer cluster views; the
/// internal level `max_zoom + 1` holds every location fully split, and is
/// what [`max_resolution`] exposes as the finest queryable zoom.
///
/// # Examples
///
/// ```
/// use geomark::{BoundingBox, ClusterConfig, RawLocation, SpatialIndex};
///
/// let feed = vec![
///     RawLocation::new(40.7128, -74.0060, "New York", 3586),
///     RawLocation::new(34.0522, -118.2437, "Los Angeles", 6354),
/// ];
/// let index = SpatialIndex::build(feed, ClusterConfig::default())?;
///
/// let markers = index.markers_within(&BoundingBox::WORLD, 0);
/// assert!(!markers.is_empty());
/// # Ok::<(), geomark::GeomarkError>(())
/// ```
///
/// [`max_resolution`]: SpatialIndex::max_resolution
pub struct SpatialIndex {
    config: ClusterConfig,
    locations: Vec<RawLocation>,
    /// `levels[z]` answers queries at zoom `z`; length is `max_zoom + 2`.
    levels: Vec<Level>,
    /// Live cluster ids, each mapped to the zoom level it was formed at.
    clusters: FxHashMap<u64, u8>,
}

impl SpatialIndex {
    /// Build an index from a snapshot of locations.
    ///
    /// Empty input yields an index that always returns zero markers.
    /// Duplicate coordinates are fine; each record still contributes its
    /// own weight. Invalid coordinates are rejected.
    pub fn build(locations: Vec<RawLocation>, config: ClusterConfig) -> Result<Self> {
        config.validate()?;
        validate_locations(&locations)?;

        let leaves: Vec<Node> = locations
            .iter()
            .enumerate()
            .map(|(i, loc)| Node {
                x: lng_to_x(loc.lng),
                y: lat_to_y(loc.lat),
                count: 1,
                weight: loc.weight,
                origin: NodeOrigin::Location(i),
                parent: None,
            })
            .collect();

        let mut clusters = FxHashMap::default();
        // Cluster ids start above the feed indices so the two never collide.
        let mut next_cluster_id = locations.len() as u64;

        // Merge from the finest level down to zoom 0. Each pass freezes
        // the finer level (its parents are final once the coarser level
        // is formed) and produces the next one up.
        let mut built: Vec<Level> = Vec::with_capacity(config.max_zoom as usize + 2);
        let mut finer = leaves;
        for zoom in (0..=config.max_zoom).rev() {
            let tree = build_tree(&finer);
            let coarser = merge_level(
                &mut finer,
                &tree,
                zoom,
                &config,
                &mut next_cluster_id,
                &mut clusters,
            );
            built.push(Level { nodes: finer, tree });
            finer = coarser;
        }
        let tree = build_tree(&finer);
        built.push(Level { nodes: finer, tree });
        built.reverse();

        debug!(
            "built spatial index: {} locations, {} levels, {} clusters",
            locations.len(),
            built.len(),
            clusters.len()
        );

        Ok(Self {
            config,
            locations,
            levels: built,
            clusters,
        })
    }

    /// The finest zoom level queries resolve to; requesting anything
    /// finer behaves identically to requesting this value.
    pub fn max_resolution(&self) -> u8 {
        self.config.max_zoom + 1
    }

    /// Number of indexed locations.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// The indexed location snapshot, in feed order.
    pub fn locations(&self) -> &[RawLocation] {
        &self.locations
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Markers visible inside `bounds` at the given zoom.
    ///
    /// `zoom` is clamped into `[0, max_resolution]`, so continuous
    /// altitude-derived estimates may be passed directly. The result is
    /// a pure function of the index, bounds, and clamped zoom; markers
    /// are returned ordered by id.
    pub fn markers_within(&self, bounds: &BoundingBox, zoom: i32) -> Vec<Marker> {
        if ![bounds.min_lng, bounds.min_lat, bounds.max_lng, bounds.max_lat]
            .iter()
            .all(|v| v.is_finite())
        {
            warn!("Rejecting marker query with non-finite bounds");
            return Vec::new();
        }

        let zoom = zoom.clamp(0, self.max_resolution() as i32) as u8;
        let mut markers = self.collect_markers(bounds, zoom);
        markers.sort_unstable_by_key(|m| m.id());
        markers
    }

    fn collect_markers(&self, bounds: &BoundingBox, zoom: u8) -> Vec<Marker> {
        // Normalize longitudes into [-180, 180]; latitudes saturate at
        // the poles rather than wrapping. In-range longitudes pass
        // through bit-exact so points sitting on a box edge stay inside.
        let mut min_lng = wrap_lng(bounds.min_lng);
        let min_lat = bounds.min_lat.clamp(-90.0, 90.0);
        let mut max_lng = wrap_lng(bounds.max_lng);
        let max_lat = bounds.max_lat.clamp(-90.0, 90.0);

        if bounds.max_lng - bounds.min_lng >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        } else if min_lng > max_lng {
            // The box wraps past the antimeridian; query each hemisphere
            // strip and splice.
            let east = self.collect_markers(&BoundingBox::new(min_lng, min_lat, 180.0, max_lat), zoom);
            let west =
                self.collect_markers(&BoundingBox::new(-180.0, min_lat, max_lng, max_lat), zoom);
            return east.into_iter().chain(west).collect();
        }

        let level = &self.levels[zoom as usize];
        let envelope = AABB::from_corners(
            [lng_to_x(min_lng), lat_to_y(max_lat)],
            [lng_to_x(max_lng), lat_to_y(min_lat)],
        );

        level
            .tree
            .locate_in_envelope(&envelope)
            .map(|entry| self.node_marker(&level.nodes[entry.data]))
            .collect()
    }

    /// Markers for a camera state: translates the viewport into a
    /// bounding box and zoom, then queries.
    pub fn markers_for_viewport(
        &self,
        camera: &Viewport,
        aspect_ratio: f64,
        config: &ViewportConfig,
    ) -> Result<Vec<Marker>> {
        let (bounds, zoom) = viewport::query_params(camera, aspect_ratio, config)?;
        Ok(self.markers_within(&bounds, zoom as i32))
    }

    /// The minimum zoom at which the identified cluster no longer exists
    /// as a single cluster.
    ///
    /// Fails with [`GeomarkError::UnknownClusterId`] if the id does not
    /// belong to this index (e.g. retained across a rebuild).
    pub fn expansion_zoom(&self, cluster_id: u64) -> Result<u8> {
        // A cluster is carried unchanged from its formation level up to
        // wherever it gets absorbed, so it splits exactly one level finer
        // than where it formed.
        Ok(self.cluster_zoom(cluster_id)? + 1)
    }

    /// The immediate next-level decomposition of a cluster: what it
    /// splits into one zoom level finer, not the full unpacking down to
    /// raw points.
    pub fn children(&self, cluster_id: u64) -> Result<Vec<Marker>> {
        let zoom = self.cluster_zoom(cluster_id)?;
        let child_level = &self.levels[zoom as usize + 1];

        let mut markers: Vec<Marker> = child_level
            .nodes
            .iter()
            .filter(|node| node.parent == Some(cluster_id))
            .map(|node| self.node_marker(node))
            .collect();
        markers.sort_unstable_by_key(|m| m.id());
        Ok(markers)
    }

    fn cluster_zoom(&self, cluster_id: u64) -> Result<u8> {
        self.clusters
            .get(&cluster_id)
            .copied()
            .ok_or(GeomarkError::UnknownClusterId(cluster_id))
    }

    fn node_marker(&self, node: &Node) -> Marker {
        match node.origin {
            NodeOrigin::Location(i) => {
                let location = self.locations[i].clone();
                Marker::Point {
                    id: i as u64,
                    lat: location.lat,
                    lng: location.lng,
                    location,
                }
            }
            NodeOrigin::Cluster(id) => Marker::Cluster {
                id,
                lat: y_to_lat(node.y),
                lng: x_to_lng(node.x),
                point_count: node.count,
                weight: node.weight,
            },
        }
    }
}

fn build_tree(nodes: &[Node]) -> RTree<TreeEntry> {
    let entries: Vec<TreeEntry> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| TreeEntry::new([node.x, node.y], i))
        .collect();
    RTree::bulk_load(entries)
}

/// One merge pass: fold the nodes of the finer level into the cluster
/// set for `zoom`. Sets `parent` on absorbed finer nodes.
fn merge_level(
    finer: &mut [Node],
    tree: &RTree<TreeEntry>,
    zoom: u8,
    config: &ClusterConfig,
    next_cluster_id: &mut u64,
    clusters: &mut FxHashMap<u64, u8>,
) -> Vec<Node> {
    let radius = config.radius / (config.extent * f64::powi(2.0, zoom as i32));
    let radius_sq = radius * radius;
    let mut visited = vec![false; finer.len()];
    let mut coarser: Vec<Node> = Vec::with_capacity(finer.len());

    for i in 0..finer.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let (x, y) = (finer[i].x, finer[i].y);
        let mut neighbors: SmallVec<[usize; 8]> = tree
            .locate_within_distance([x, y], radius_sq)
            .map(|entry| entry.data)
            .filter(|&j| j != i && !visited[j])
            .collect();
        // Stable order keeps ids and centroid sums reproducible across builds.
        neighbors.sort_unstable();

        let own_count = finer[i].count;
        let mut point_count = own_count;
        for &j in &neighbors {
            point_count += finer[j].count;
        }

        if point_count > own_count && point_count >= config.min_points {
            let id = *next_cluster_id;
            *next_cluster_id += 1;

            // Count-weighted centroid of the merged group.
            let mut wx = x * own_count as f64;
            let mut wy = y * own_count as f64;
            let mut weight = finer[i].weight;
            finer[i].parent = Some(id);
            for &j in &neighbors {
                visited[j] = true;
                wx += finer[j].x * finer[j].count as f64;
                wy += finer[j].y * finer[j].count as f64;
                weight += finer[j].weight;
                finer[j].parent = Some(id);
            }

            clusters.insert(id, zoom);
            coarser.push(Node {
                x: wx / point_count as f64,
                y: wy / point_count as f64,
                count: point_count,
                weight,
                origin: NodeOrigin::Cluster(id),
                parent: None,
            });
        } else {
            // Group below the cluster threshold: carry this node up
            // unmerged. Its neighbors stay available and may still form
            // clusters of their own when their turn comes.
            coarser.push(finer[i].clone());
        }
    }

    coarser
}

/// Wrap a longitude into [-180, 180]. Values already in range pass
/// through bit-exact; the modular arithmetic introduces round-off, so it
/// only runs for longitudes that actually need wrapping.
fn wrap_lng(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        lng
    } else {
        (((lng + 180.0) % 360.0) + 360.0) % 360.0 - 180.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city_feed() -> Vec<RawLocation> {
        vec![
            RawLocation::new(32.7157, -117.1611, "San Diego", 140_867),
            RawLocation::new(40.7128, -74.0060, "New York", 3586),
            RawLocation::new(29.7604, -95.3698, "Houston", 24_980),
            RawLocation::new(34.0522, -118.2437, "Los Angeles", 6354),
            RawLocation::new(41.8781, -87.6298, "Chicago", 10_756),
        ]
    }

    // Wide enough that all five cities merge at zoom 0.
    fn aggressive_config() -> ClusterConfig {
        ClusterConfig::default().with_radius(1000.0)
    }

    #[test]
    fn test_empty_index() {
        let index = SpatialIndex::build(Vec::new(), ClusterConfig::default()).unwrap();
        assert!(index.is_empty());
        assert!(index.markers_within(&BoundingBox::WORLD, 0).is_empty());
        assert!(index.markers_within(&BoundingBox::WORLD, 99).is_empty());
    }

    #[test]
    fn test_invalid_location_rejected() {
        let feed = vec![RawLocation::new(95.0, 0.0, "Broken", 1)];
        assert!(SpatialIndex::build(feed, ClusterConfig::default()).is_err());
    }

    #[test]
    fn test_world_query_merges_everything_with_wide_radius() {
        let index = SpatialIndex::build(city_feed(), aggressive_config()).unwrap();

        let markers = index.markers_within(&BoundingBox::WORLD, 0);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].point_count(), 5);
        assert_eq!(markers[0].weight(), 186_543);
    }

    #[test]
    fn test_finest_zoom_splits_everything() {
        let index = SpatialIndex::build(city_feed(), aggressive_config()).unwrap();

        let markers = index.markers_within(&BoundingBox::WORLD, index.max_resolution() as i32);
        assert_eq!(markers.len(), 5);
        assert!(markers.iter().all(|m| !m.is_cluster()));
    }

    #[test]
    fn test_bounds_restrict_results() {
        let index = SpatialIndex::build(city_feed(), ClusterConfig::default()).unwrap();

        // Just the east coast.
        let east = BoundingBox::new(-80.0, 35.0, -70.0, 45.0);
        let markers = index.markers_within(&east, 10);
        assert_eq!(markers.len(), 1);
        match &markers[0] {
            Marker::Point { location, .. } => assert_eq!(location.label, "New York"),
            other => panic!("expected a point marker, got {:?}", other),
        }
    }

    #[test]
    fn test_children_partition_cluster() {
        let index = SpatialIndex::build(city_feed(), aggressive_config()).unwrap();
        let markers = index.markers_within(&BoundingBox::WORLD, 0);
        let cluster_id = markers[0].id();
        let total: usize = markers[0].point_count();

        let children = index.children(cluster_id).unwrap();
        assert!(children.len() >= 2);
        assert_eq!(children.iter().map(|m| m.point_count()).sum::<usize>(), total);
        assert_eq!(
            children.iter().map(|m| m.weight()).sum::<u64>(),
            markers[0].weight()
        );
    }

    #[test]
    fn test_expansion_zoom_reveals_split() {
        let index = SpatialIndex::build(city_feed(), aggressive_config()).unwrap();
        let markers = index.markers_within(&BoundingBox::WORLD, 0);
        let cluster_id = markers[0].id();

        let expansion = index.expansion_zoom(cluster_id).unwrap();
        assert!(expansion > 0);

        let split = index.markers_within(&BoundingBox::WORLD, expansion as i32);
        assert!(split.iter().all(|m| m.id() != cluster_id));
        assert!(split.len() > 1);
    }

    #[test]
    fn test_unknown_cluster_id_errors() {
        let index = SpatialIndex::build(city_feed(), ClusterConfig::default()).unwrap();

        let err = index.expansion_zoom(9_999_999).unwrap_err();
        assert!(matches!(err, GeomarkError::UnknownClusterId(9_999_999)));
        assert!(index.children(9_999_999).is_err());

        // Point ids are not cluster ids.
        assert!(index.children(0).is_err());
    }

    #[test]
    fn test_duplicate_coordinates_keep_their_weights() {
        let mut feed = city_feed();
        feed.push(RawLocation::new(40.7128, -74.0060, "New York dup", 1000));
        let index = SpatialIndex::build(feed, aggressive_config()).unwrap();

        let markers = index.markers_within(&BoundingBox::WORLD, 0);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].point_count(), 6);
        assert_eq!(markers[0].weight(), 187_543);
    }

    #[test]
    fn test_non_finite_bounds_yield_nothing() {
        let index = SpatialIndex::build(city_feed(), ClusterConfig::default()).unwrap();
        let bounds = BoundingBox::new(f64::NAN, -90.0, 180.0, 90.0);
        assert!(index.markers_within(&bounds, 5).is_empty());
    }

    #[test]
    fn test_wrap_lng() {
        assert_eq!(wrap_lng(0.0), 0.0);
        assert_eq!(wrap_lng(-180.0), -180.0);
        assert_eq!(wrap_lng(180.0), 180.0);
        assert_eq!(wrap_lng(190.0), -170.0);
        assert_eq!(wrap_lng(-190.0), 170.0);
        assert_eq!(wrap_lng(540.0), -180.0);

        // In-range longitudes must come back bit-exact; round-off here
        // would shift query envelopes off edge-sitting points.
        assert_eq!(wrap_lng(-74.0060), -74.0060);
        assert_eq!(wrap_lng(179.999_999_9), 179.999_999_9);
    }

    #[test]
    fn test_box_edges_are_inclusive() {
        let feed = vec![RawLocation::new(40.7128, -74.0060, "New York", 1)];
        let index = SpatialIndex::build(feed, ClusterConfig::default()).unwrap();

        // Point exactly on the west edge.
        let west_edge = BoundingBox::new(-74.0060, 40.0, -70.0, 41.0);
        assert_eq!(index.markers_within(&west_edge, 5).len(), 1);

        // Point exactly on the east edge.
        let east_edge = BoundingBox::new(-80.0, 40.0, -74.0060, 41.0);
        assert_eq!(index.markers_within(&east_edge, 5).len(), 1);

        // Zero-area box placed exactly on the point.
        let pin = BoundingBox::new(-74.0060, 40.7128, -74.0060, 40.7128);
        for zoom in [0, 5, index.max_resolution() as i32] {
            assert_eq!(
                index.markers_within(&pin, zoom).len(),
                1,
                "edge-sitting point dropped at zoom {}",
                zoom
            );
        }
    }

    #[test]
    fn test_antimeridian_spanning_bounds() {
        let feed = vec![
            RawLocation::new(0.0, 179.5, "East of the line", 10),
            RawLocation::new(0.0, -179.5, "West of the line", 20),
            RawLocation::new(0.0, 0.0, "Greenwich", 30),
        ];
        let index = SpatialIndex::build(feed, ClusterConfig::default()).unwrap();

        // A narrow box crossing the antimeridian after normalization.
        let bounds = BoundingBox::new(170.0, -10.0, 190.0, 10.0);
        let markers = index.markers_within(&bounds, index.max_resolution() as i32);
        assert_eq!(markers.len(), 2);
        assert!(markers.iter().all(|m| m.lng().abs() > 170.0));
    }
}
