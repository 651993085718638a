//! Seams shared by the route search strategies.

use crate::error::PlanError;
use crate::fitness::ScoringConfig;
use crate::network::Network;
use crate::solver::ScoredRoute;
use crate::waste::{VehicleDescriptor, WasteDescriptor};

/// One search problem: where to start, where to end, what is carried.
#[derive(Debug, Clone, Copy)]
pub struct RouteQuery<'a> {
    pub source: &'a str,
    pub target: &'a str,
    /// Node the route should pass through. Missing it is penalized, not rejected.
    pub required_node: Option<&'a str>,
    pub waste: &'a WasteDescriptor,
    pub vehicle: &'a VehicleDescriptor,
}

impl RouteQuery<'_> {
    pub fn misses_required(&self, route: &[String]) -> bool {
        self.required_node
            .is_some_and(|required| !route.iter().any(|id| id == required))
    }
}

/// A strategy that finds the best-scoring route for a query.
///
/// Implementations must return [`PlanError::NoRouteFound`] rather than an
/// empty or partial route when nothing reaches the target.
pub trait RouteSearch {
    fn search(
        &self,
        query: &RouteQuery<'_>,
        network: &Network,
        scoring: &ScoringConfig,
    ) -> Result<ScoredRoute, PlanError>;
}
