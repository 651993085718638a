//! Test fixtures for waste-router.
//!
//! Provides small hand-built networks and descriptor shorthands.

#![allow(dead_code)]

use waste_router::network::{Edge, Network, Node, NodeKind};
use waste_router::waste::{VehicleDescriptor, WasteCategory, WasteDescriptor};

/// source -> a -> disposal, disposal open 06:00-20:00.
pub fn two_hop_network() -> Network {
    two_hop_with(Edge::new("source", "a", 10.0).with_risk(0.1, 0.2))
}

/// Same as [`two_hop_network`] with a custom first hop.
pub fn two_hop_with(first_hop: Edge) -> Network {
    Network::new(
        vec![
            Node::new("source", "Waste Source", NodeKind::Source),
            Node::new("a", "Waypoint A", NodeKind::Waypoint),
            Node::new("disposal", "Disposal Site", NodeKind::Disposal).with_time_window(6.0, 20.0),
        ],
        vec![
            first_hop,
            Edge::new("a", "disposal", 8.0).with_risk(0.05, 0.1),
        ],
    )
    .unwrap()
}

/// Two branches to disposal: a short one through `fast` and a long one
/// through `inspection`. `island` has no roads at all.
pub fn branching_network() -> Network {
    Network::new(
        vec![
            Node::new("source", "Waste Source", NodeKind::Source),
            Node::new("inspection", "Inspection", NodeKind::Inspection),
            Node::new("fast", "Fast Lane", NodeKind::Waypoint),
            Node::new("slow", "Slow Lane", NodeKind::Waypoint),
            Node::new("disposal", "Disposal Site", NodeKind::Disposal).with_time_window(6.0, 20.0),
            Node::new("island", "Island", NodeKind::Waypoint),
        ],
        vec![
            Edge::new("source", "fast", 5.0).with_risk(0.1, 0.1),
            Edge::new("source", "inspection", 12.0).with_risk(0.1, 0.1),
            Edge::new("fast", "disposal", 6.0).with_risk(0.1, 0.1),
            Edge::new("inspection", "slow", 9.0).with_risk(0.2, 0.1),
            Edge::new("slow", "disposal", 9.0).with_risk(0.1, 0.1),
            Edge::new("inspection", "disposal", 20.0).with_risk(0.3, 0.2),
            Edge::new("fast", "slow", 2.0).with_risk(0.05, 0.05),
        ],
    )
    .unwrap()
}

pub fn route(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

pub fn waste(category: WasteCategory, quantity_kg: f64) -> WasteDescriptor {
    WasteDescriptor::new(category, quantity_kg).unwrap()
}

pub fn vehicle(capacity_kg: f64) -> VehicleDescriptor {
    VehicleDescriptor::new(capacity_kg).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
