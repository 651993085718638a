//! Static configuration: the network, scoring weights, search parameters and
//! the per-category dispatch table.
//!
//! Settings are JSON. Every section except `network` is optional and falls back
//! to its defaults; unknown keys are rejected so typos surface at startup.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, NetworkError};
use crate::fitness::ScoringConfig;
use crate::network::{Network, NetworkDefinition};
use crate::solver::SearchParams;
use crate::waste::WasteCategory;

/// Canonical network shipped with the crate.
const DEFAULT_SETTINGS: &str = include_str!("../data/default_settings.json");

/// Where a category of waste has to go, and what it should pass on the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchRule {
    pub target: String,
    #[serde(default)]
    pub required_node: Option<String>,
}

pub type DispatchTable = HashMap<WasteCategory, DispatchRule>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub network: NetworkDefinition,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub search: SearchParams,
    #[serde(default)]
    pub dispatch: DispatchTable,
}

impl Settings {
    /// The settings compiled into the crate.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json(DEFAULT_SETTINGS)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate().map_err(ConfigError::Invalid)?;
        self.search.validate().map_err(ConfigError::Invalid)?;
        self.build_network().map(|_| ())
    }

    /// Builds the network and checks that every dispatch rule points at known nodes.
    pub fn build_network(&self) -> Result<Network, ConfigError> {
        let network = Network::try_from(self.network.clone())?;

        for (category, rule) in &self.dispatch {
            let ids = std::iter::once(&rule.target).chain(rule.required_node.as_ref());
            for id in ids {
                if network.node(id).is_err() {
                    return Err(NetworkError::InvalidNetwork(format!(
                        "dispatch rule for {category} references unknown node `{id}`"
                    ))
                    .into());
                }
            }
        }

        info!(
            nodes = network.len(),
            edges = self.network.edges.len(),
            "network configuration loaded"
        );
        Ok(network)
    }
}
