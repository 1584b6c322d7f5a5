use crate::disaster::DisasterReport;
use crate::geography::{Geography, IslandId};
use std::collections::BTreeMap;

/// Effect of a disaster on each island.
pub type EffectMap = BTreeMap<IslandId, f64>;

/// Distances below this are clamped so that an island at the epicentre
/// receives at most the full magnitude.
pub const MIN_EFFECT_DISTANCE: f64 = 1.0;

/// Compute the raw effect `magnitude / distance^2` of a disaster on every island.
pub fn compute_effects(report: &DisasterReport, geography: &Geography) -> EffectMap {
    geography
        .islands()
        .map(|island| {
            if !report.occurred() {
                return (island.id(), 0.0);
            }
            let dist = (island.x() - report.x).hypot(island.y() - report.y);
            let dist = dist.max(MIN_EFFECT_DISTANCE);
            (island.id(), report.magnitude / (dist * dist))
        })
        .collect()
}

/// Express each effect as a fraction of the total effect.
///
/// All fractions are zero when the total effect is zero.
pub fn proportional_effects(effects: &EffectMap) -> EffectMap {
    let total: f64 = effects.values().sum();
    effects
        .iter()
        .map(|(&id, &eff)| (id, if total > 0.0 { eff / total } else { 0.0 }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geography::{Bounds, Island};

    fn geography() -> Geography {
        let bounds = Bounds {
            x_min: 0.0,
            x_max: 10.0,
            y_min: 0.0,
            y_max: 10.0,
        };
        let islands = [
            Island::new(IslandId(0), 0.0, 0.0),
            Island::new(IslandId(1), 3.0, 4.0),
            Island::new(IslandId(2), 6.0, 8.0),
        ];
        Geography::from_positions(bounds, islands).expect("invalid geography")
    }

    #[test]
    fn effect_decays_with_squared_distance() {
        let report = DisasterReport {
            magnitude: 50.0,
            x: 0.0,
            y: 0.0,
        };
        let effects = compute_effects(&report, &geography());
        assert_eq!(effects[&IslandId(1)], 2.0);
        assert_eq!(effects[&IslandId(2)], 0.5);
    }

    #[test]
    fn island_at_epicentre_gets_finite_effect() {
        let report = DisasterReport {
            magnitude: 50.0,
            x: 0.0,
            y: 0.0,
        };
        let effects = compute_effects(&report, &geography());
        assert_eq!(effects[&IslandId(0)], 50.0);
        assert!(effects.values().all(|eff| eff.is_finite()));
    }

    #[test]
    fn no_disaster_means_no_effect() {
        let effects = compute_effects(&DisasterReport::none(), &geography());
        assert_eq!(effects.len(), 3);
        assert!(effects.values().all(|&eff| eff == 0.0));
    }

    #[test]
    fn proportional_effects_sum_to_one() {
        let report = DisasterReport {
            magnitude: 3.0,
            x: 5.0,
            y: 5.0,
        };
        let prop = proportional_effects(&compute_effects(&report, &geography()));
        let sum: f64 = prop.values().sum();
        assert!((sum - 1.0).abs() < 1e-12);

        let zero = proportional_effects(&compute_effects(&DisasterReport::none(), &geography()));
        assert!(zero.values().all(|&frac| frac == 0.0));
    }
}
