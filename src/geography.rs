//! Island positions and the bounding rectangle of the archipelago.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Opaque identifier of an island (simulation participant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IslandId(pub usize);

impl fmt::Display for IslandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "island-{}", self.0)
    }
}

/// Island with a fixed location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Island {
    id: IslandId,
    x: f64,
    y: f64,
}

impl Island {
    pub fn new(id: IslandId, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }

    pub fn id(&self) -> IslandId {
        self.id
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

/// Bounding rectangle of the archipelago.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }
}

/// Registry of islands and their positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Geography {
    bounds: Bounds,
    islands: BTreeMap<IslandId, Island>,
}

impl Geography {
    /// Place the given islands at equidistant points along the x-axis.
    ///
    /// Every island gets `y = 0`, and a lone island sits at `x_min`.
    /// The bounds are expected to be well formed (`x_min <= x_max`).
    pub fn build(ids: &[IslandId], bounds: Bounds) -> Self {
        let n_gaps = ids.len().saturating_sub(1).max(1);
        let step = (bounds.x_max - bounds.x_min) / n_gaps as f64;

        let islands = ids
            .iter()
            .enumerate()
            .map(|(i_isl, &id)| (id, Island::new(id, bounds.x_min + step * i_isl as f64, 0.0)))
            .collect();

        Self { bounds, islands }
    }

    /// Build a geography from explicitly placed islands.
    ///
    /// # Errors
    /// Returns an error if any island lies outside the bounds.
    #[cfg(test)]
    pub fn from_positions<I>(bounds: Bounds, islands: I) -> Result<Self>
    where
        I: IntoIterator<Item = Island>,
    {
        let islands = islands.into_iter().map(|isl| (isl.id, isl)).collect();
        let geography = Self { bounds, islands };
        geography.check_bounds()?;
        Ok(geography)
    }

    /// Check that every island lies within the bounds.
    ///
    /// # Errors
    /// Returns an error naming the first island found outside the bounds.
    pub fn check_bounds(&self) -> Result<()> {
        for island in self.islands.values() {
            if !self.bounds.contains(island.x, island.y) {
                bail!(
                    "{} at ({}, {}) lies outside {:?}",
                    island.id,
                    island.x,
                    island.y,
                    self.bounds
                );
            }
        }
        Ok(())
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn islands(&self) -> impl Iterator<Item = &Island> {
        self.islands.values()
    }

    pub fn len(&self) -> usize {
        self.islands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds {
            x_min: 0.0,
            x_max: 10.0,
            y_min: -1.0,
            y_max: 1.0,
        }
    }

    #[test]
    fn islands_are_equidistant_along_x() {
        let ids: Vec<_> = (0..6).map(IslandId).collect();
        let geo = Geography::build(&ids, bounds());

        let xs: Vec<_> = geo.islands().map(|isl| isl.x()).collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert!(geo.islands().all(|isl| isl.y() == 0.0));
        assert!(geo.islands().all(|isl| geo.bounds().contains(isl.x(), isl.y())));
    }

    #[test]
    fn single_island_sits_at_x_min() {
        let geo = Geography::build(&[IslandId(7)], bounds());
        let island = geo.islands().next().expect("missing island");
        assert_eq!(island.id(), IslandId(7));
        assert_eq!(island.x(), 0.0);
        assert_eq!(geo.len(), 1);
    }

    #[test]
    fn out_of_bounds_position_is_rejected() {
        let inside = Island::new(IslandId(0), 5.0, 0.5);
        let outside = Island::new(IslandId(1), 11.0, 0.0);
        assert!(Geography::from_positions(bounds(), [inside]).is_ok());
        assert!(Geography::from_positions(bounds(), [inside, outside]).is_err());
    }

    #[test]
    fn placement_respects_degenerate_bounds() {
        let flat = Bounds {
            x_min: 3.0,
            x_max: 3.0,
            y_min: 0.0,
            y_max: 0.0,
        };
        let ids: Vec<_> = (0..4).map(IslandId).collect();
        let geo = Geography::build(&ids, flat);
        assert_eq!(geo.len(), 4);
        assert!(geo.check_bounds().is_ok());
        assert!(geo.islands().all(|isl| isl.x() == 3.0));
    }

    #[test]
    fn placement_outside_bounds_is_reported() {
        // Bounds that exclude the x-axis violate the placement contract.
        let off_axis = Bounds {
            x_min: 0.0,
            x_max: 10.0,
            y_min: 1.0,
            y_max: 2.0,
        };
        let geo = Geography::build(&[IslandId(0), IslandId(1)], off_axis);
        assert!(geo.check_bounds().is_err());
    }
}
