//! Globe Session Example
//!
//! Walks through a full dashboard interaction: load a location feed,
//! build the cluster index, query markers for an orbiting camera, click
//! a cluster to descend, and highlight nearby locations around an
//! individual point.

use geo::Point;
use geomark::{
    target_altitude_for_zoom, within_radius, zoom_for_altitude, ClusterConfig, RawLocation,
    SpatialIndex, Viewport, ViewportConfig,
};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("=== geomark - Globe Session ===\n");

    // ========================================
    // 1. Build the index from a feed
    // ========================================
    println!("1. Building the index");
    println!("---------------------");

    let feed = vec![
        RawLocation::new(32.7157, -117.1611, "San Diego", 140_867),
        RawLocation::new(40.7128, -74.0060, "New York", 3586),
        RawLocation::new(29.7604, -95.3698, "Houston", 24_980),
        RawLocation::new(34.0522, -118.2437, "Los Angeles", 6354),
        RawLocation::new(41.8781, -87.6298, "Chicago", 10_756),
        RawLocation::new(40.6782, -73.9442, "Brooklyn", 902),
        RawLocation::new(40.7306, -73.9356, "Queens", 713),
    ];

    let index = SpatialIndex::build(feed, ClusterConfig::default().with_radius(120.0))?;
    println!("   Indexed {} locations\n", index.len());

    // ========================================
    // 2. Query markers for an orbiting camera
    // ========================================
    println!("2. Orbit view");
    println!("-------------");

    let camera_config = ViewportConfig::default();
    let aspect_ratio = 16.0 / 9.0;

    let orbit = Viewport::new(39.0, -98.0, 6.0);
    println!(
        "   Camera at ({:.1}, {:.1}), altitude {:.1} -> zoom {}",
        orbit.center_lat,
        orbit.center_lng,
        orbit.altitude,
        zoom_for_altitude(orbit.altitude, &camera_config)
    );

    let markers = index.markers_for_viewport(&orbit, aspect_ratio, &camera_config)?;
    for marker in &markers {
        if marker.is_cluster() {
            println!(
                "     cluster #{} at ({:.2}, {:.2}): {} locations, label \"{}\"",
                marker.id(),
                marker.lat(),
                marker.lng(),
                marker.point_count(),
                marker.count_label()
            );
        } else {
            println!(
                "     point   #{} at ({:.2}, {:.2})",
                marker.id(),
                marker.lat(),
                marker.lng()
            );
        }
    }

    // ========================================
    // 3. Click a cluster and descend
    // ========================================
    println!("\n3. Cluster click");
    println!("----------------");

    let clicked = markers
        .iter()
        .find(|m| m.is_cluster())
        .expect("orbit view should show at least one cluster");

    let expansion = index.expansion_zoom(clicked.id())?;
    let descent = target_altitude_for_zoom(expansion, &camera_config);
    println!(
        "   Cluster #{} splits at zoom {}; descending to altitude {:.2}",
        clicked.id(),
        expansion,
        descent
    );

    for child in index.children(clicked.id())? {
        println!(
            "     child #{}: {} location(s) at ({:.2}, {:.2})",
            child.id(),
            child.point_count(),
            child.lat(),
            child.lng()
        );
    }

    let closer = Viewport::new(clicked.lat(), clicked.lng(), descent);
    let revealed = index.markers_for_viewport(&closer, aspect_ratio, &camera_config)?;
    println!("   After descent the viewport shows {} markers", revealed.len());

    // ========================================
    // 4. Point click: highlight nearby users
    // ========================================
    println!("\n4. Nearby highlight");
    println!("-------------------");

    let manhattan = Point::new(-74.0060, 40.7128);
    let nearby = within_radius(index.locations(), &manhattan, 15_000.0)?;
    println!("   Within 15 km of Manhattan:");
    for location in nearby {
        println!("     {} (weight {})", location.label, location.weight);
    }

    println!("\n=== Session complete ===");
    Ok(())
}
