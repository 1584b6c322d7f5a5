//! Simulation data types.

use crate::disaster::DisasterReport;
use crate::geography::IslandId;
use crate::mitigation::CommonPool;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State of the simulation at a given turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    /// Number of turns played so far.
    pub turn: usize,

    /// Resources held by each island.
    pub islands: BTreeMap<IslandId, f64>,

    /// Shared disaster-mitigation pool.
    pub pool: CommonPool,

    /// Disaster sampled in the last turn.
    pub last_report: DisasterReport,
}

impl State {
    pub fn total_resources(&self) -> f64 {
        self.islands.values().sum()
    }
}

/// Outcome of a single turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turn {
    pub turn: usize,
    pub report: DisasterReport,
    pub pool_before: f64,
    pub pool_after: f64,
    pub total_effect: f64,
    pub cost: f64,
    pub leftover: f64,
    pub forage_yield: u64,
}

/// Record of the simulation at a single turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Current turn.
    pub turn: usize,

    /// Disaster sampled this turn.
    pub report: DisasterReport,

    /// Pool resources before and after mitigation.
    pub pool_before: f64,
    pub pool_after: f64,

    /// Sum of the raw effects over all islands.
    pub total_effect: f64,
    /// Disaster cost in resource units.
    pub cost: f64,
    /// Cost the pool could not absorb.
    pub leftover: f64,

    /// Total yield of this turn's foraging round.
    pub forage_yield: u64,

    /// Resources held by each island at the end of the turn.
    pub islands: BTreeMap<IslandId, f64>,
}

impl Record {
    pub fn new(turn: &Turn, state: &State) -> Self {
        Self {
            turn: turn.turn,
            report: turn.report,
            pool_before: turn.pool_before,
            pool_after: turn.pool_after,
            total_effect: turn.total_effect,
            cost: turn.cost,
            leftover: turn.leftover,
            forage_yield: turn.forage_yield,
            islands: state.islands.clone(),
        }
    }
}
