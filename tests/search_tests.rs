//! Route search tests
//!
//! Exhaustive and evolutionary strategies on small hand-built networks.

mod fixtures;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use waste_router::error::PlanError;
use waste_router::fitness::{ScoringConfig, evaluate};
use waste_router::network::{Edge, Network, Node, NodeKind};
use waste_router::solver::{Evolutionary, Exhaustive, SearchParams};
use waste_router::traits::{RouteQuery, RouteSearch};
use waste_router::waste::{VehicleDescriptor, WasteCategory, WasteDescriptor};

use fixtures::*;

fn query<'a>(
    source: &'a str,
    target: &'a str,
    required_node: Option<&'a str>,
    waste: &'a WasteDescriptor,
    vehicle: &'a VehicleDescriptor,
) -> RouteQuery<'a> {
    RouteQuery {
        source,
        target,
        required_node,
        waste,
        vehicle,
    }
}

/// `r` is one short hop from the source and leads nowhere; the only way to
/// disposal is the long direct road.
fn dead_end_network() -> Network {
    Network::new(
        vec![
            Node::new("s", "Waste Source", NodeKind::Source),
            Node::new("r", "Inspection", NodeKind::Inspection),
            Node::new("d", "Disposal Site", NodeKind::Disposal),
        ],
        vec![Edge::new("s", "r", 1.0), Edge::new("s", "d", 50.0)],
    )
    .unwrap()
}

fn evolutionary(seed: u64) -> Evolutionary {
    Evolutionary::new(SearchParams {
        population_size: 60,
        seed,
        ..SearchParams::default()
    })
}

// ============================================================================
// Exhaustive Search
// ============================================================================

#[test]
fn test_exhaustive_picks_shortest_clean_route() {
    let network = branching_network();
    let load = waste(WasteCategory::General, 100.0);
    let truck = vehicle(200.0);

    let scored = Exhaustive::default()
        .search(
            &query("source", "disposal", None, &load, &truck),
            &network,
            &ScoringConfig::default(),
        )
        .unwrap();

    assert_eq!(scored.route.nodes(), route(&["source", "fast", "disposal"]));
    assert_eq!(scored.candidates_evaluated, 4);
}

#[test]
fn test_exhaustive_never_beaten_by_any_simple_path() {
    let network = branching_network();
    let config = ScoringConfig::default();
    let truck = vehicle(200.0);

    for category in WasteCategory::ALL {
        let load = waste(category, 100.0);
        let scored = Exhaustive::default()
            .search(&query("source", "disposal", None, &load, &truck), &network, &config)
            .unwrap();

        for path in network.simple_paths("source", "disposal").unwrap() {
            let other = evaluate(&path, &load, &truck, &network, &config);
            assert!(scored.fitness.fitness >= other.fitness, "{path:?} beats the search result");
        }
    }
}

#[test]
fn test_exhaustive_avoids_restricted_edge() {
    let network = branching_network();
    let config = ScoringConfig {
        restriction_penalty: 500.0,
        ..ScoringConfig::default()
    };
    let restricted = waste_router::network::Network::new(
        network.nodes().to_vec(),
        network
            .edges()
            .iter()
            .cloned()
            .map(|edge| {
                if edge.from == "fast" && edge.to == "disposal" {
                    edge.forbid(WasteCategory::Corrosive)
                } else {
                    edge
                }
            })
            .collect(),
    )
    .unwrap();
    let load = waste(WasteCategory::Corrosive, 100.0);
    let truck = vehicle(200.0);

    let scored = Exhaustive::default()
        .search(&query("source", "disposal", None, &load, &truck), &restricted, &config)
        .unwrap();

    assert_eq!(scored.route.nodes(), route(&["source", "fast", "slow", "disposal"]));
    assert_eq!(scored.fitness.total_penalty, 0.0);
}

#[test]
fn test_exhaustive_honours_required_node() {
    let network = branching_network();
    let load = waste(WasteCategory::General, 100.0);
    let truck = vehicle(200.0);

    let scored = Exhaustive::default()
        .search(
            &query("source", "disposal", Some("inspection"), &load, &truck),
            &network,
            &ScoringConfig::default(),
        )
        .unwrap();

    assert_eq!(
        scored.route.nodes(),
        route(&["source", "inspection", "slow", "disposal"])
    );
    assert_eq!(scored.fitness.total_penalty, 0.0);
}

#[test]
fn test_unreachable_required_node_still_returns_route() {
    let network = branching_network();
    let load = waste(WasteCategory::General, 100.0);
    let truck = vehicle(200.0);

    let scored = Exhaustive::default()
        .search(
            &query("source", "disposal", Some("island"), &load, &truck),
            &network,
            &ScoringConfig::default(),
        )
        .unwrap();

    assert_eq!(scored.route.nodes(), route(&["source", "fast", "disposal"]));
    assert_eq!(scored.fitness.total_penalty, 1000.0);
}

#[test]
fn test_exhaustive_no_route_found() {
    let network = branching_network();
    let load = waste(WasteCategory::General, 100.0);
    let truck = vehicle(200.0);

    let result = Exhaustive::default().search(
        &query("source", "island", None, &load, &truck),
        &network,
        &ScoringConfig::default(),
    );

    assert_eq!(
        result.unwrap_err(),
        PlanError::NoRouteFound {
            origin: "source".to_string(),
            target: "island".to_string(),
        }
    );
}

#[test]
fn test_same_source_and_target_rejected_by_both_strategies() {
    let network = branching_network();
    let load = waste(WasteCategory::General, 100.0);
    let truck = vehicle(200.0);
    let q = query("fast", "fast", None, &load, &truck);
    let config = ScoringConfig::default();

    let exhaustive = Exhaustive::default().search(&q, &network, &config);
    let evolved = evolutionary(1).search(&q, &network, &config);

    assert!(matches!(exhaustive, Err(PlanError::InvalidRequest(_))));
    assert!(matches!(evolved, Err(PlanError::InvalidRequest(_))));
}

// ============================================================================
// Evolutionary Search
// ============================================================================

#[test]
fn test_evolutionary_matches_exhaustive_on_small_network() {
    let network = branching_network();
    let load = waste(WasteCategory::General, 100.0);
    let truck = vehicle(200.0);
    let config = ScoringConfig::default();
    let q = query("source", "disposal", None, &load, &truck);

    let exhaustive = Exhaustive::default().search(&q, &network, &config).unwrap();
    let evolved = evolutionary(7).search(&q, &network, &config).unwrap();

    assert_eq!(evolved.route, exhaustive.route);
    assert_eq!(evolved.fitness, exhaustive.fitness);
}

#[test]
fn test_evolutionary_is_reproducible_with_seed() {
    let network = branching_network();
    let load = waste(WasteCategory::Toxic, 100.0);
    let truck = vehicle(200.0);
    let config = ScoringConfig::default();
    let q = query("source", "disposal", None, &load, &truck);

    let first = evolutionary(99).search(&q, &network, &config).unwrap();
    let second = evolutionary(99).search(&q, &network, &config).unwrap();
    assert_eq!(first, second);

    let mut rng_a = ChaCha8Rng::seed_from_u64(5);
    let mut rng_b = ChaCha8Rng::seed_from_u64(5);
    let a = evolutionary(0)
        .search_with_rng(&q, &network, &config, &mut rng_a)
        .unwrap();
    let b = evolutionary(0)
        .search_with_rng(&q, &network, &config, &mut rng_b)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_evolutionary_result_is_traversable() {
    let network = branching_network();
    let load = waste(WasteCategory::Flammable, 100.0);
    let truck = vehicle(200.0);
    let q = query("source", "disposal", None, &load, &truck);

    for seed in 0..5 {
        let scored = evolutionary(seed)
            .search(&q, &network, &ScoringConfig::default())
            .unwrap();
        let nodes = scored.route.nodes();
        assert_eq!(nodes.first().map(String::as_str), Some("source"));
        assert_eq!(nodes.last().map(String::as_str), Some("disposal"));
        assert!(nodes.windows(2).all(|hop| network.edge(&hop[0], &hop[1]).is_some()));
    }
}

#[test]
fn test_evolutionary_honours_required_node() {
    let network = branching_network();
    let load = waste(WasteCategory::General, 100.0);
    let truck = vehicle(200.0);

    let scored = evolutionary(3)
        .search(
            &query("source", "disposal", Some("inspection"), &load, &truck),
            &network,
            &ScoringConfig::default(),
        )
        .unwrap();

    assert_eq!(
        scored.route.nodes(),
        route(&["source", "inspection", "slow", "disposal"])
    );
}

#[test]
fn test_evolutionary_no_route_found() {
    let network = branching_network();
    let load = waste(WasteCategory::General, 100.0);
    let truck = vehicle(200.0);

    let result = evolutionary(1).search(
        &query("source", "island", None, &load, &truck),
        &network,
        &ScoringConfig::default(),
    );

    assert!(matches!(result, Err(PlanError::NoRouteFound { .. })));
}

#[test]
fn test_evolutionary_counts_every_generation() {
    let network = branching_network();
    let load = waste(WasteCategory::General, 100.0);
    let truck = vehicle(200.0);
    let search = Evolutionary::new(SearchParams {
        population_size: 10,
        generations: 4,
        ..SearchParams::default()
    });

    let scored = search
        .search(
            &query("source", "disposal", None, &load, &truck),
            &network,
            &ScoringConfig::default(),
        )
        .unwrap();

    // four ranked generations plus the final ranking
    assert_eq!(scored.candidates_evaluated, 50);
}

#[test]
fn test_evolutionary_skips_dead_end_required_node() {
    let network = dead_end_network();
    let load = waste(WasteCategory::General, 100.0);
    let truck = vehicle(200.0);
    let config = ScoringConfig::default();
    let q = query("s", "d", Some("r"), &load, &truck);

    let exhaustive = Exhaustive::default().search(&q, &network, &config).unwrap();
    assert_eq!(exhaustive.route.nodes(), route(&["s", "d"]));

    for seed in 0..5 {
        let evolved = evolutionary(seed).search(&q, &network, &config).unwrap();
        assert_eq!(evolved.route, exhaustive.route);
        assert_eq!(evolved.fitness.total_penalty, 1000.0);
    }
}
