use crate::effect::EffectMap;
use serde::{Deserialize, Serialize};

/// Resource units per unit of disaster effect.
pub const DEFAULT_MITIGATION_SCALE: f64 = 1000.0;

/// Shared resource pool that absorbs disaster damage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommonPool {
    pub resource: f64,
    /// Level at or above which the archipelago is prepared and damage is halved.
    pub threshold: f64,
}

impl CommonPool {
    pub fn is_prepared(&self) -> bool {
        self.resource >= self.threshold
    }
}

/// Result of mitigating one disaster.
#[derive(Debug, Clone, PartialEq)]
pub struct Mitigation {
    /// Damage each island still has to bear, in resource units.
    pub residual: EffectMap,
    /// Pool after paying for the disaster.
    pub pool: CommonPool,
    /// Total cost of the disaster in resource units.
    pub cost: f64,
    /// Part of the cost the pool could not cover.
    pub leftover: f64,
}

/// Pay for a disaster out of the common pool.
///
/// The cost is the total effect times `scale`, halved when the pool is
/// prepared. If the pool covers the cost nobody is harmed, otherwise the pool
/// is emptied and the leftover is split in proportion to `proportional`.
pub fn mitigate(
    individual: &EffectMap,
    proportional: &EffectMap,
    pool: CommonPool,
    scale: f64,
) -> Mitigation {
    let total_effect: f64 = individual.values().sum();
    let cost = if pool.is_prepared() {
        total_effect * scale / 2.0
    } else {
        total_effect * scale
    };

    if cost <= pool.resource {
        let residual = individual.keys().map(|&id| (id, 0.0)).collect();
        return Mitigation {
            residual,
            pool: CommonPool {
                resource: pool.resource - cost,
                ..pool
            },
            cost,
            leftover: 0.0,
        };
    }

    let leftover = cost - pool.resource;
    let residual = individual
        .keys()
        .map(|id| {
            let frac = proportional.get(id).copied().unwrap_or(0.0);
            (*id, leftover * frac)
        })
        .collect();

    Mitigation {
        residual,
        pool: CommonPool {
            resource: 0.0,
            ..pool
        },
        cost,
        leftover,
    }
}
