//! Route search and request planning.
//!
//! Two strategies sit behind [`RouteSearch`]: [`Exhaustive`] scores every simple
//! path, [`Evolutionary`] evolves a small population of candidate routes. The
//! [`Planner`] checks a request, picks a strategy and returns the best route.

use std::fmt;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::{DispatchTable, Settings};
use crate::error::PlanError;
use crate::fitness::{FitnessResult, ScoringConfig, evaluate};
use crate::network::Network;
use crate::traits::{RouteQuery, RouteSearch};
use crate::waste::{VehicleDescriptor, WasteDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Exhaustive up to `exhaustive_node_limit` nodes, evolutionary above.
    Auto,
    Exhaustive,
    Evolutionary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchParams {
    pub strategy: SearchStrategy,
    pub exhaustive_node_limit: usize,
    pub population_size: usize,
    pub generations: usize,
    /// Probability that a child gets two interior nodes swapped.
    pub mutation_rate: f64,
    /// Probability that a child is recombined rather than cloned from a survivor.
    pub crossover_rate: f64,
    /// Added when a route skips the requested required node.
    pub required_node_penalty: f64,
    pub seed: u64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::Auto,
            exhaustive_node_limit: 15,
            population_size: 30,
            generations: 40,
            mutation_rate: 0.2,
            crossover_rate: 1.0,
            required_node_penalty: 1000.0,
            seed: 42,
        }
    }
}

impl SearchParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            ));
        }
        for (key, value) in [
            ("mutation_rate", self.mutation_rate),
            ("crossover_rate", self.crossover_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{key} must be within [0, 1], got {value}"));
            }
        }
        if !(self.required_node_penalty.is_finite() && self.required_node_penalty >= 0.0) {
            return Err(format!(
                "required_node_penalty must be non-negative, got {}",
                self.required_node_penalty
            ));
        }
        Ok(())
    }

    /// Resolves [`SearchStrategy::Auto`] against the network size.
    pub fn strategy_for(&self, network: &Network) -> SearchStrategy {
        match self.strategy {
            SearchStrategy::Auto if network.len() <= self.exhaustive_node_limit => {
                SearchStrategy::Exhaustive
            }
            SearchStrategy::Auto => SearchStrategy::Evolutionary,
            other => other,
        }
    }
}

/// Ordered node ids from source to target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Route(Vec<String>);

impl Route {
    pub fn nodes(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|node| node == id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_nodes(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for Route {
    fn from(nodes: Vec<String>) -> Self {
        Self(nodes)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" -> "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRoute {
    pub route: Route,
    pub fitness: FitnessResult,
    pub candidates_evaluated: usize,
}

/// Evaluator score plus the search-level required-node penalty.
fn score_candidate(
    route: &[String],
    query: &RouteQuery<'_>,
    network: &Network,
    scoring: &ScoringConfig,
    required_node_penalty: f64,
) -> FitnessResult {
    let result = evaluate(route, query.waste, query.vehicle, network, scoring);
    if query.misses_required(route) {
        result.penalized(required_node_penalty, scoring)
    } else {
        result
    }
}

fn hop_exists(network: &Network, from: usize, to: usize, scoring: &ScoringConfig) -> bool {
    network.edge_at(from, to).is_some()
        || (scoring.allow_reverse_edges && network.edge_at(to, from).is_some())
}

fn is_traversable(network: &Network, route: &[usize], scoring: &ScoringConfig) -> bool {
    route
        .windows(2)
        .all(|hop| hop_exists(network, hop[0], hop[1], scoring))
}

/// A route needs two distinct ends.
fn distinct_endpoints(source: &str, target: &str) -> Result<(), PlanError> {
    if source == target {
        return Err(PlanError::InvalidRequest(format!(
            "source and target are both `{source}`"
        )));
    }
    Ok(())
}

/// Scores every simple path between source and target.
///
/// Paths are enumerated depth first in edge definition order; on equal
/// fitness the first path found wins.
#[derive(Debug, Clone, Default)]
pub struct Exhaustive {
    params: SearchParams,
}

impl Exhaustive {
    pub fn new(params: SearchParams) -> Self {
        Self { params }
    }
}

impl RouteSearch for Exhaustive {
    fn search(
        &self,
        query: &RouteQuery<'_>,
        network: &Network,
        scoring: &ScoringConfig,
    ) -> Result<ScoredRoute, PlanError> {
        let paths = network.simple_paths(query.source, query.target)?;
        distinct_endpoints(query.source, query.target)?;
        let candidates_evaluated = paths.len();

        let mut best: Option<(Vec<String>, FitnessResult)> = None;
        for path in paths {
            let fitness = score_candidate(
                &path,
                query,
                network,
                scoring,
                self.params.required_node_penalty,
            );
            if best
                .as_ref()
                .is_none_or(|(_, incumbent)| fitness.fitness > incumbent.fitness)
            {
                best = Some((path, fitness));
            }
        }

        debug!(candidates_evaluated, "exhaustive enumeration finished");

        let (path, fitness) = best.ok_or_else(|| PlanError::NoRouteFound {
            origin: query.source.to_string(),
            target: query.target.to_string(),
        })?;
        Ok(ScoredRoute {
            route: Route::from(path),
            fitness,
            candidates_evaluated,
        })
    }
}

type Candidate = Vec<usize>;

/// Genetic search over node sequences anchored at source and target.
///
/// Each generation keeps the better half of the population and refills it
/// with recombined, occasionally mutated children. The result is the best
/// fully traversable candidate ranked in any generation.
#[derive(Debug, Clone, Default)]
pub struct Evolutionary {
    params: SearchParams,
}

impl Evolutionary {
    pub fn new(params: SearchParams) -> Self {
        Self { params }
    }

    /// Runs the search with a caller-supplied random source.
    pub fn search_with_rng<R: Rng + ?Sized>(
        &self,
        query: &RouteQuery<'_>,
        network: &Network,
        scoring: &ScoringConfig,
        rng: &mut R,
    ) -> Result<ScoredRoute, PlanError> {
        let source = network.require(query.source)?;
        let target = network.require(query.target)?;
        let required = query.required_node.map(|id| network.require(id)).transpose()?;
        distinct_endpoints(query.source, query.target)?;

        let size = self.params.population_size.max(2);
        let survivors_len = size / 2;

        // Even slots walk through the required node, odd slots sample a
        // random subset of the network and may skip it.
        let mut population: Vec<Candidate> = (0..size)
            .map(|slot| {
                let forced = slot % 2 == 0;
                seed_candidate(
                    network,
                    source,
                    target,
                    required.filter(|_| forced),
                    !forced,
                    scoring,
                    rng,
                )
            })
            .collect();
        let mut candidates_evaluated = 0;
        let mut best: Option<(Candidate, FitnessResult)> = None;

        for generation in 0..self.params.generations {
            let mut ranked = self.rank(population, query, network, scoring);
            candidates_evaluated += ranked.len();
            keep_best(&mut best, &ranked, network, scoring);
            debug!(generation, best = ranked[0].1.fitness, "generation ranked");

            ranked.truncate(survivors_len);
            let survivors: Vec<Candidate> = ranked.into_iter().map(|(c, _)| c).collect();

            let mut next = survivors.clone();
            while next.len() < size {
                let mut child = self.offspring(&survivors, source, target, rng);
                self.mutate(&mut child, rng);
                next.push(child);
            }
            population = next;
        }

        let ranked = self.rank(population, query, network, scoring);
        candidates_evaluated += ranked.len();
        keep_best(&mut best, &ranked, network, scoring);

        let (best, fitness) = best.ok_or_else(|| PlanError::NoRouteFound {
            origin: query.source.to_string(),
            target: query.target.to_string(),
        })?;

        Ok(ScoredRoute {
            route: Route::from(network.ids(&best)),
            fitness,
            candidates_evaluated,
        })
    }

    /// Best first; the sort is stable so earlier candidates win ties.
    fn rank(
        &self,
        population: Vec<Candidate>,
        query: &RouteQuery<'_>,
        network: &Network,
        scoring: &ScoringConfig,
    ) -> Vec<(Candidate, FitnessResult)> {
        let mut ranked: Vec<(Candidate, FitnessResult)> = population
            .into_iter()
            .map(|candidate| {
                let fitness = score_candidate(
                    &network.ids(&candidate),
                    query,
                    network,
                    scoring,
                    self.params.required_node_penalty,
                );
                (candidate, fitness)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.fitness.total_cmp(&a.1.fitness));
        ranked
    }

    /// Single-point recombination of two survivors.
    fn offspring<R: Rng + ?Sized>(
        &self,
        survivors: &[Candidate],
        source: usize,
        target: usize,
        rng: &mut R,
    ) -> Candidate {
        let (first, second) = if survivors.len() >= 2 {
            let picks = rand::seq::index::sample(rng, survivors.len(), 2);
            (&survivors[picks.index(0)], &survivors[picks.index(1)])
        } else {
            (&survivors[0], &survivors[0])
        };

        if rng.gen_range(0.0..1.0) >= self.params.crossover_rate {
            return first.clone();
        }

        let cut = if first.len() >= 3 {
            rng.gen_range(1..=first.len() - 2)
        } else {
            1
        };

        let head = &first[..cut.min(first.len())];
        let mut child: Candidate = head.to_vec();
        child.extend(second.iter().filter(|node| !head.contains(node)));
        reanchor(&mut child, source, target);
        child
    }

    /// Swaps two interior nodes with probability `mutation_rate`.
    fn mutate<R: Rng + ?Sized>(&self, candidate: &mut Candidate, rng: &mut R) {
        if candidate.len() <= 3 || rng.gen_range(0.0..1.0) >= self.params.mutation_rate {
            return;
        }
        let picks = rand::seq::index::sample(rng, candidate.len() - 2, 2);
        candidate.swap(picks.index(0) + 1, picks.index(1) + 1);
    }
}

impl RouteSearch for Evolutionary {
    fn search(
        &self,
        query: &RouteQuery<'_>,
        network: &Network,
        scoring: &ScoringConfig,
    ) -> Result<ScoredRoute, PlanError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);
        self.search_with_rng(query, network, scoring, &mut rng)
    }
}

/// Replaces `best` when `ranked` holds a fitter traversable candidate.
fn keep_best(
    best: &mut Option<(Candidate, FitnessResult)>,
    ranked: &[(Candidate, FitnessResult)],
    network: &Network,
    scoring: &ScoringConfig,
) {
    let Some((candidate, fitness)) = ranked
        .iter()
        .find(|(candidate, _)| is_traversable(network, candidate, scoring))
    else {
        return;
    };
    if best
        .as_ref()
        .is_none_or(|(_, incumbent)| fitness.fitness > incumbent.fitness)
    {
        *best = Some((candidate.clone(), *fitness));
    }
}

/// Random permutation of the free nodes, kept only where each hop is a road.
///
/// `required` goes first when given. With `sparse` each free node is
/// dropped with probability one half before the walk.
fn seed_candidate<R: Rng + ?Sized>(
    network: &Network,
    source: usize,
    target: usize,
    required: Option<usize>,
    sparse: bool,
    scoring: &ScoringConfig,
    rng: &mut R,
) -> Candidate {
    let required = required.filter(|&r| r != source && r != target);
    let mut free: Vec<usize> = (0..network.len())
        .filter(|&i| i != source && i != target && Some(i) != required)
        .collect();
    free.shuffle(rng);
    if sparse {
        free.retain(|_| rng.gen_bool(0.5));
    }

    let sequence = required.into_iter().chain(free).chain(std::iter::once(target));

    let mut candidate = vec![source];
    for node in sequence {
        let last = candidate[candidate.len() - 1];
        if hop_exists(network, last, node, scoring) {
            candidate.push(node);
        }
    }
    if candidate.last() != Some(&target) {
        candidate.push(target);
    }
    candidate
}

/// Drops repeats and makes sure the route starts at source and ends at target.
fn reanchor(candidate: &mut Candidate, source: usize, target: usize) {
    let mut seen = Vec::with_capacity(candidate.len());
    candidate.retain(|node| {
        if seen.contains(node) {
            false
        } else {
            seen.push(*node);
            true
        }
    });
    candidate.retain(|&node| node != source && node != target);
    candidate.insert(0, source);
    candidate.push(target);
}

/// A routing job as received from the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub source: String,
    pub target: String,
    pub required_node: Option<String>,
    pub waste: WasteDescriptor,
    pub vehicle: VehicleDescriptor,
}

impl PlanRequest {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        waste: WasteDescriptor,
        vehicle: VehicleDescriptor,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            required_node: None,
            waste,
            vehicle,
        }
    }

    pub fn via(mut self, required_node: impl Into<String>) -> Self {
        self.required_node = Some(required_node.into());
        self
    }

    fn query(&self) -> RouteQuery<'_> {
        RouteQuery {
            source: &self.source,
            target: &self.target,
            required_node: self.required_node.as_deref(),
            waste: &self.waste,
            vehicle: &self.vehicle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub route: Route,
    pub fitness: FitnessResult,
    pub strategy: SearchStrategy,
    pub candidates_evaluated: usize,
}

/// Plans requests against one shared, read-only network.
#[derive(Debug, Clone)]
pub struct Planner<'a> {
    network: &'a Network,
    scoring: ScoringConfig,
    params: SearchParams,
    dispatch: DispatchTable,
}

impl<'a> Planner<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self {
            network,
            scoring: ScoringConfig::default(),
            params: SearchParams::default(),
            dispatch: DispatchTable::new(),
        }
    }

    /// Uses the scoring, search and dispatch sections of `settings`.
    pub fn from_settings(network: &'a Network, settings: &Settings) -> Self {
        Self {
            network,
            scoring: settings.scoring.clone(),
            params: settings.search.clone(),
            dispatch: settings.dispatch.clone(),
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_params(mut self, params: SearchParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_dispatch(mut self, dispatch: DispatchTable) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn network(&self) -> &Network {
        self.network
    }

    /// Builds a request from the dispatch rule for the waste's category.
    pub fn dispatch(
        &self,
        source: &str,
        waste: WasteDescriptor,
        vehicle: VehicleDescriptor,
    ) -> Result<PlanRequest, PlanError> {
        let rule = self.dispatch.get(&waste.category()).ok_or_else(|| {
            PlanError::InvalidRequest(format!("no dispatch rule for {}", waste.category()))
        })?;

        let request = PlanRequest::new(source, rule.target.clone(), waste, vehicle);
        Ok(match &rule.required_node {
            Some(required) => request.via(required.clone()),
            None => request,
        })
    }

    #[instrument(level = "debug", skip_all, fields(source = %request.source, target = %request.target))]
    pub fn plan(&self, request: &PlanRequest) -> Result<Plan, PlanError> {
        if let Err(err) = request.vehicle.ensure_fits(&request.waste) {
            warn!(%err, "request rejected");
            return Err(err);
        }
        self.params.validate().map_err(PlanError::InvalidRequest)?;
        self.scoring.validate().map_err(PlanError::InvalidRequest)?;

        self.network.node(&request.source)?;
        self.network.node(&request.target)?;
        if let Some(required) = &request.required_node {
            self.network.node(required)?;
        }
        distinct_endpoints(&request.source, &request.target)?;

        let query = request.query();
        let strategy = self.params.strategy_for(self.network);
        let scored = match strategy {
            SearchStrategy::Evolutionary => {
                Evolutionary::new(self.params.clone()).search(&query, self.network, &self.scoring)
            }
            _ => Exhaustive::new(self.params.clone()).search(&query, self.network, &self.scoring),
        }?;

        if query.misses_required(scored.route.nodes()) {
            warn!(
                required = request.required_node.as_deref(),
                route = %scored.route,
                "best route skips the required node"
            );
        }
        info!(
            route = %scored.route,
            fitness = scored.fitness.fitness,
            ?strategy,
            "route planned"
        );

        Ok(Plan {
            route: scored.route,
            fitness: scored.fitness,
            strategy,
            candidates_evaluated: scored.candidates_evaluated,
        })
    }

    /// Plans independent requests in parallel. Results keep the input order.
    pub fn plan_batch(&self, requests: &[PlanRequest]) -> Vec<Result<Plan, PlanError>> {
        requests.par_iter().map(|request| self.plan(request)).collect()
    }
}
