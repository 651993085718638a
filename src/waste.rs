//! Waste and vehicle descriptors, plus the rule-based waste classifier.
//!
//! The router only consumes a [`WasteCategory`]. [`classify`] is provided for
//! callers that start from raw lab measurements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Flash point (°C) below which waste is treated as flammable.
const FLAMMABLE_FLASH_POINT_C: f64 = 37.0;

/// pH bounds outside of which waste is treated as corrosive.
const CORROSIVE_PH_LOW: f64 = 3.0;
const CORROSIVE_PH_HIGH: f64 = 11.0;

/// Hazard category that decides which edges a load may traverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteCategory {
    Flammable,
    Toxic,
    Corrosive,
    General,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 4] = [
        WasteCategory::Flammable,
        WasteCategory::Toxic,
        WasteCategory::Corrosive,
        WasteCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::Flammable => "flammable",
            WasteCategory::Toxic => "toxic",
            WasteCategory::Corrosive => "corrosive",
            WasteCategory::General => "general",
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified load: what it is and how much of it (kg).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WasteDescriptor {
    category: WasteCategory,
    quantity_kg: f64,
}

impl WasteDescriptor {
    /// Fails with [`PlanError::InvalidRequest`] unless `quantity_kg` is positive and finite.
    pub fn new(category: WasteCategory, quantity_kg: f64) -> Result<Self, PlanError> {
        ensure_positive("waste quantity", quantity_kg)?;
        Ok(Self {
            category,
            quantity_kg,
        })
    }

    pub fn category(&self) -> WasteCategory {
        self.category
    }

    pub fn quantity_kg(&self) -> f64 {
        self.quantity_kg
    }
}

/// The vehicle carrying the load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleDescriptor {
    capacity_kg: f64,
}

impl VehicleDescriptor {
    /// Fails with [`PlanError::InvalidRequest`] unless `capacity_kg` is positive and finite.
    pub fn new(capacity_kg: f64) -> Result<Self, PlanError> {
        ensure_positive("vehicle capacity", capacity_kg)?;
        Ok(Self { capacity_kg })
    }

    pub fn capacity_kg(&self) -> f64 {
        self.capacity_kg
    }

    /// Rejects loads heavier than the vehicle. A load exactly at capacity fits.
    pub fn ensure_fits(&self, waste: &WasteDescriptor) -> Result<(), PlanError> {
        if waste.quantity_kg > self.capacity_kg {
            return Err(PlanError::CapacityExceeded {
                quantity: waste.quantity_kg,
                capacity: self.capacity_kg,
            });
        }
        Ok(())
    }
}

fn ensure_positive(what: &str, value: f64) -> Result<(), PlanError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PlanError::InvalidRequest(format!(
            "{what} must be positive, got {value}"
        )))
    }
}

/// Reported toxicity of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToxicityLevel {
    Low,
    Medium,
    High,
}

impl FromStr for ToxicityLevel {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ToxicityLevel::Low),
            "medium" => Ok(ToxicityLevel::Medium),
            "high" => Ok(ToxicityLevel::High),
            other => Err(PlanError::InvalidRequest(format!(
                "unknown toxicity level `{other}`"
            ))),
        }
    }
}

/// Lab measurements of a waste sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WasteProperties {
    pub ph: f64,
    pub flash_point_c: f64,
    pub toxicity: ToxicityLevel,
}

impl WasteProperties {
    fn is_flammable(&self) -> bool {
        self.flash_point_c < FLAMMABLE_FLASH_POINT_C
    }

    fn is_corrosive(&self) -> bool {
        self.ph < CORROSIVE_PH_LOW || self.ph > CORROSIVE_PH_HIGH
    }

    fn is_toxic(&self) -> bool {
        self.toxicity == ToxicityLevel::High
    }
}

/// Classifies a sample. Rules are checked in order: flammable, corrosive, toxic.
pub fn classify(properties: &WasteProperties) -> WasteCategory {
    if properties.is_flammable() {
        WasteCategory::Flammable
    } else if properties.is_corrosive() {
        WasteCategory::Corrosive
    } else if properties.is_toxic() {
        WasteCategory::Toxic
    } else {
        WasteCategory::General
    }
}

/// Coarse hazard rating shown next to a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Counts how many hazard rules a sample trips.
pub fn risk_level(properties: &WasteProperties) -> RiskLevel {
    let hits = [
        properties.is_corrosive(),
        properties.is_flammable(),
        properties.is_toxic(),
    ]
    .into_iter()
    .filter(|hit| *hit)
    .count();

    match hits {
        0 => RiskLevel::Low,
        1 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}
