//! Route fitness evaluation.
//!
//! A candidate route is scored by driving it hop by hop: distance, cost and
//! risk accumulate, and every violated soft constraint adds a penalty. The
//! evaluator never fails. Infeasible hops are priced, not rejected, so the
//! search can still rank bad routes against each other.

use serde::{Deserialize, Serialize};

use crate::network::Network;
use crate::waste::{VehicleDescriptor, WasteDescriptor};

/// Weights and penalty constants used by [`evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Added for each hop with no usable road.
    pub missing_edge_penalty: f64,
    /// Added for each road that forbids the carried category.
    pub restriction_penalty: f64,
    /// Added for each arrival outside the destination's opening hours.
    pub time_window_penalty: f64,
    pub distance_weight: f64,
    pub cost_weight: f64,
    pub risk_weight: f64,
    /// Monetary cost per km.
    pub cost_rate: f64,
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
    /// Departure time, hour of day.
    pub start_hour: f64,
    /// Accept a road in the reverse direction when the forward one is missing.
    pub allow_reverse_edges: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            missing_edge_penalty: 1000.0,
            restriction_penalty: 500.0,
            time_window_penalty: 200.0,
            distance_weight: 0.5,
            cost_weight: 0.2,
            risk_weight: 0.2,
            cost_rate: 10.0,
            speed_kmh: 50.0,
            start_hour: 8.0,
            allow_reverse_edges: false,
        }
    }
}

impl ScoringConfig {
    /// Checks that weights and penalties are usable. Returns a reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        let non_negative = [
            ("missing_edge_penalty", self.missing_edge_penalty),
            ("restriction_penalty", self.restriction_penalty),
            ("time_window_penalty", self.time_window_penalty),
            ("distance_weight", self.distance_weight),
            ("cost_weight", self.cost_weight),
            ("risk_weight", self.risk_weight),
            ("cost_rate", self.cost_rate),
        ];
        for (key, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(format!("{key} must be a non-negative number, got {value}"));
            }
        }
        if !(self.speed_kmh.is_finite() && self.speed_kmh > 0.0) {
            return Err(format!("speed_kmh must be positive, got {}", self.speed_kmh));
        }
        if !(0.0..=24.0).contains(&self.start_hour) {
            return Err(format!("start_hour must be within [0, 24], got {}", self.start_hour));
        }
        Ok(())
    }

    /// Minutes needed to drive `km` at the configured speed.
    fn travel_minutes(&self, km: f64) -> f64 {
        km / self.speed_kmh * 60.0
    }
}

/// Totals accumulated while driving a route, and the resulting score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FitnessResult {
    pub total_distance: f64,
    pub total_cost: f64,
    pub total_risk: f64,
    pub total_penalty: f64,
    /// In `(0, 1]`; higher is better.
    pub fitness: f64,
}

impl FitnessResult {
    fn score(&mut self, config: &ScoringConfig) {
        let weighted = config.distance_weight * self.total_distance
            + config.cost_weight * self.total_cost
            + config.risk_weight * self.total_risk;
        self.fitness = 1.0 / (weighted + self.total_penalty + 1.0);
    }

    /// Adds a penalty imposed outside the evaluator and rescores.
    pub fn penalized(mut self, penalty: f64, config: &ScoringConfig) -> Self {
        self.total_penalty += penalty;
        self.score(config);
        self
    }
}

/// Scores `route` for carrying `waste` on `vehicle`.
///
/// Capacity is not checked here; see [`VehicleDescriptor::ensure_fits`].
pub fn evaluate(
    route: &[String],
    waste: &WasteDescriptor,
    _vehicle: &VehicleDescriptor,
    network: &Network,
    config: &ScoringConfig,
) -> FitnessResult {
    let mut result = FitnessResult::default();
    let mut clock_minutes = config.start_hour * 60.0;

    for hop in route.windows(2) {
        let (from, to) = (hop[0].as_str(), hop[1].as_str());

        let edge = network.edge(from, to).or_else(|| {
            if config.allow_reverse_edges {
                network.edge(to, from)
            } else {
                None
            }
        });
        let Some(edge) = edge else {
            result.total_penalty += config.missing_edge_penalty;
            continue;
        };

        if edge.forbids(waste.category()) {
            result.total_penalty += config.restriction_penalty;
        }

        result.total_distance += edge.distance;
        result.total_cost += edge.distance * config.cost_rate;
        result.total_risk += edge.risk + edge.weather_risk;

        clock_minutes += config.travel_minutes(edge.distance);
        if let Ok(node) = network.node(to) {
            if !node.time_window.contains(clock_minutes / 60.0) {
                result.total_penalty += config.time_window_penalty;
            }
        }
    }

    result.score(config);
    result
}
