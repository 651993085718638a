//! Static transport network: locations, their opening hours, and directed roads.
//!
//! A [`Network`] is built once from a [`NetworkDefinition`] and is read-only
//! afterwards, so one instance can be shared by every request.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::waste::WasteCategory;

/// Role a location plays along a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Source,
    Inspection,
    Waypoint,
    Disposal,
}

/// Operating hours as `[start, end]` hours of day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub const ALWAYS_OPEN: TimeWindow = TimeWindow {
        start: 0.0,
        end: 24.0,
    };

    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, hour: f64) -> bool {
        self.start <= hour && hour <= self.end
    }

    fn is_well_formed(&self) -> bool {
        (0.0..=24.0).contains(&self.start)
            && (0.0..=24.0).contains(&self.end)
            && self.start <= self.end
    }
}

impl From<[f64; 2]> for TimeWindow {
    fn from([start, end]: [f64; 2]) -> Self {
        Self { start, end }
    }
}

impl From<TimeWindow> for [f64; 2] {
    fn from(window: TimeWindow) -> Self {
        [window.start, window.end]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default = "always_open")]
    pub time_window: TimeWindow,
}

fn always_open() -> TimeWindow {
    TimeWindow::ALWAYS_OPEN
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            time_window: TimeWindow::ALWAYS_OPEN,
        }
    }

    pub fn with_time_window(mut self, start: f64, end: f64) -> Self {
        self.time_window = TimeWindow::new(start, end);
        self
    }
}

/// A directed road between two locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    /// Length in km.
    pub distance: f64,
    pub risk: f64,
    pub weather_risk: f64,
    /// Categories that may not be carried along this road.
    #[serde(default)]
    pub forbidden: HashSet<WasteCategory>,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, distance: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            distance,
            risk: 0.0,
            weather_risk: 0.0,
            forbidden: HashSet::new(),
        }
    }

    pub fn with_risk(mut self, risk: f64, weather_risk: f64) -> Self {
        self.risk = risk;
        self.weather_risk = weather_risk;
        self
    }

    pub fn forbid(mut self, category: WasteCategory) -> Self {
        self.forbidden.insert(category);
        self
    }

    pub fn forbids(&self, category: WasteCategory) -> bool {
        self.forbidden.contains(&category)
    }
}

/// Serialized form of a network, as found in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkDefinition {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Validated, immutable network.
///
/// Nodes keep their definition order and successors keep edge definition
/// order, which makes path enumeration deterministic.
#[derive(Debug, Clone)]
pub struct Network {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    edge_index: HashMap<(usize, usize), usize>,
    successors: Vec<Vec<usize>>,
}

impl Network {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, NetworkError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if !node.time_window.is_well_formed() {
                return Err(invalid(format!(
                    "node `{}` has malformed time window [{}, {}]",
                    node.id, node.time_window.start, node.time_window.end
                )));
            }
            if index.insert(node.id.clone(), i).is_some() {
                return Err(invalid(format!("duplicate node `{}`", node.id)));
            }
        }

        let mut edge_index = HashMap::with_capacity(edges.len());
        let mut successors = vec![Vec::new(); nodes.len()];
        for (i, edge) in edges.iter().enumerate() {
            let from = lookup(&index, &edge.from, edge)?;
            let to = lookup(&index, &edge.to, edge)?;
            validate_edge(edge)?;

            if edge_index.insert((from, to), i).is_some() {
                return Err(invalid(format!(
                    "duplicate edge `{}` -> `{}`",
                    edge.from, edge.to
                )));
            }
            successors[from].push(to);
        }

        Ok(Self {
            nodes,
            index,
            edges,
            edge_index,
            successors,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in definition order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Result<&Node, NetworkError> {
        self.index_of(id)
            .map(|i| &self.nodes[i])
            .ok_or_else(|| NetworkError::UnknownNode(id.to_string()))
    }

    /// Directed lookup; `None` when there is no road from `from` to `to`.
    pub fn edge(&self, from: &str, to: &str) -> Option<&Edge> {
        let from = self.index_of(from)?;
        let to = self.index_of(to)?;
        self.edge_at(from, to)
    }

    /// Nodes reachable from `id` in one hop, in edge definition order.
    pub fn successors(&self, id: &str) -> Result<impl Iterator<Item = &Node> + '_, NetworkError> {
        let i = self
            .index_of(id)
            .ok_or_else(|| NetworkError::UnknownNode(id.to_string()))?;
        Ok(self.successors[i].iter().map(|&j| &self.nodes[j]))
    }

    /// Every simple path from `source` to `target`, depth first, following
    /// successors in definition order. Empty when both ends are the same node.
    pub fn simple_paths(&self, source: &str, target: &str) -> Result<Vec<Vec<String>>, NetworkError> {
        let source = self.require(source)?;
        let target = self.require(target)?;
        if source == target {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut visited = vec![false; self.nodes.len()];
        let mut path = vec![source];
        visited[source] = true;
        self.walk(source, target, &mut visited, &mut path, &mut paths);

        Ok(paths
            .into_iter()
            .map(|path| self.ids(&path))
            .collect())
    }

    fn walk(
        &self,
        current: usize,
        target: usize,
        visited: &mut [bool],
        path: &mut Vec<usize>,
        paths: &mut Vec<Vec<usize>>,
    ) {
        if current == target {
            paths.push(path.clone());
            return;
        }
        for &next in self.successors_at(current) {
            if visited[next] {
                continue;
            }
            visited[next] = true;
            path.push(next);
            self.walk(next, target, visited, path, paths);
            path.pop();
            visited[next] = false;
        }
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn require(&self, id: &str) -> Result<usize, NetworkError> {
        self.index_of(id)
            .ok_or_else(|| NetworkError::UnknownNode(id.to_string()))
    }

    pub(crate) fn edge_at(&self, from: usize, to: usize) -> Option<&Edge> {
        self.edge_index.get(&(from, to)).map(|&i| &self.edges[i])
    }

    fn successors_at(&self, i: usize) -> &[usize] {
        &self.successors[i]
    }

    pub(crate) fn ids(&self, path: &[usize]) -> Vec<String> {
        path.iter().map(|&i| self.nodes[i].id.clone()).collect()
    }
}

impl TryFrom<NetworkDefinition> for Network {
    type Error = NetworkError;

    fn try_from(definition: NetworkDefinition) -> Result<Self, Self::Error> {
        Network::new(definition.nodes, definition.edges)
    }
}

fn invalid(reason: String) -> NetworkError {
    NetworkError::InvalidNetwork(reason)
}

fn lookup(index: &HashMap<String, usize>, id: &str, edge: &Edge) -> Result<usize, NetworkError> {
    index.get(id).copied().ok_or_else(|| {
        invalid(format!(
            "edge `{}` -> `{}` references unknown node `{}`",
            edge.from, edge.to, id
        ))
    })
}

fn validate_edge(edge: &Edge) -> Result<(), NetworkError> {
    if !(edge.distance.is_finite() && edge.distance > 0.0) {
        return Err(invalid(format!(
            "edge `{}` -> `{}` has non-positive distance {}",
            edge.from, edge.to, edge.distance
        )));
    }
    for (label, value) in [("risk", edge.risk), ("weather risk", edge.weather_risk)] {
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid(format!(
                "edge `{}` -> `{}` has {} {} outside [0, 1]",
                edge.from, edge.to, label, value
            )));
        }
    }
    Ok(())
}
