//! Foraging payoff and split rules.
//!
//! A foraging round gathers the investments of every island, turns their sum
//! into a total yield with a [`PayoffRule`] and hands the yield back with a
//! [`SplitRule`]. Amounts are whole resource units and any rounding remainder
//! stays with the house.

use crate::geography::IslandId;
use std::collections::BTreeMap;

/// Amount per island, used for both investments and returns.
pub type ForageMap = BTreeMap<IslandId, u64>;

/// Rule mapping the total investment to the total yield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayoffRule {
    #[default]
    Square,
    Cube,
}

impl PayoffRule {
    /// Look up a rule by name, falling back to the default for unknown names.
    pub fn from_key(key: &str) -> Self {
        match key {
            "square" => Self::Square,
            "cube" => Self::Cube,
            _ => {
                let default = Self::default();
                log::warn!("unknown payoff rule {key:?}, using {default:?}");
                default
            }
        }
    }

    /// Total yield of a round, saturating at `u64::MAX`.
    pub fn compute_payoff(self, total_investment: u64) -> u64 {
        self.checked_payoff(total_investment).unwrap_or(u64::MAX)
    }

    /// Total yield of a round, or `None` if it does not fit in a `u64`.
    pub fn checked_payoff(self, total_investment: u64) -> Option<u64> {
        match self {
            Self::Square => total_investment.checked_pow(2),
            Self::Cube => total_investment.checked_pow(3),
        }
    }
}

/// Rule distributing the total yield among the islands that took part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitRule {
    #[default]
    Even,
    Proportional,
}

impl SplitRule {
    /// Look up a rule by name, falling back to the default for unknown names.
    pub fn from_key(key: &str) -> Self {
        match key {
            "even" => Self::Even,
            "proportional" => Self::Proportional,
            _ => {
                let default = Self::default();
                log::warn!("unknown split rule {key:?}, using {default:?}");
                default
            }
        }
    }

    pub fn compute_split(self, investments: &ForageMap, total_yield: u64) -> ForageMap {
        match self {
            Self::Even => split_even(investments, total_yield),
            Self::Proportional => split_proportional(investments, total_yield),
        }
    }
}

fn split_even(investments: &ForageMap, total_yield: u64) -> ForageMap {
    let n_isl = investments.len() as u64;
    if n_isl == 0 {
        return ForageMap::new();
    }
    let share = total_yield / n_isl;
    investments.keys().map(|&id| (id, share)).collect()
}

fn split_proportional(investments: &ForageMap, total_yield: u64) -> ForageMap {
    let total_investment: u128 = investments.values().map(|&inv| u128::from(inv)).sum();
    investments
        .iter()
        .map(|(&id, &inv)| {
            if total_investment == 0 {
                return (id, 0);
            }
            // Never exceeds total_yield, so the narrowing cannot truncate.
            let share = u128::from(total_yield) * u128::from(inv) / total_investment;
            (id, share as u64)
        })
        .collect()
}
