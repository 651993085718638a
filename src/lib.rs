//! waste-router core
//!
//! Scores and searches routes for hazardous waste loads over a small, static
//! transport network.

pub mod error;
pub mod network;
pub mod waste;
pub mod fitness;
pub mod traits;
pub mod solver;
pub mod config;
