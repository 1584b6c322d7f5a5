use crate::config::Config;
use crate::disaster::{DisasterReport, Environment};
use crate::forage::{ForageMap, PayoffRule, SplitRule};
use crate::geography::{Geography, IslandId};
use crate::mitigation::mitigate;
use crate::model::{Record, State, Turn};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Simulation engine.
///
/// Holds the configuration, current state, and random number generator,
/// and provides methods to initialize, run, save, and load simulations.
#[derive(Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
    state: State,
    rng: ChaCha12Rng,
    #[serde(skip)]
    saturation_warned: bool,
}

impl Engine {
    /// Create a new `Engine` with the given configuration and its initial state.
    ///
    /// The generator is seeded from the configuration when a seed is given.
    pub fn generate_initial_condition(cfg: Config) -> Result<Self> {
        let rng = match cfg.init.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };

        let islands = island_ids(&cfg)
            .into_iter()
            .map(|id| (id, cfg.init.island_resources))
            .collect();

        let state = State {
            turn: 0,
            islands,
            pool: cfg.initial_pool(),
            last_report: DisasterReport::none(),
        };

        Ok(Self {
            cfg,
            state,
            rng,
            saturation_warned: false,
        })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Perform the simulation and save the resulting records to a binary file.
    pub fn perform_simulation<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        let env = self.build_environment()?;
        let payoff = self.cfg.payoff_rule();
        let split = self.cfg.split_rule();

        for i_save in 0..self.cfg.output.saves_per_file {
            let mut turn = None;
            for _ in 0..self.cfg.output.turns_per_save {
                turn = Some(self.perform_turn(&env, payoff, split));
            }

            let turn = turn.context("no turns were performed")?;
            let record = Record::new(&turn, &self.state);
            encode::write(&mut writer, &record).context("failed to serialize record")?;

            let progress = 100.0 * (i_save + 1) as f64 / self.cfg.output.saves_per_file as f64;
            log::info!("completed {progress:06.2}%");
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Save a checkpoint of the entire engine state.
    ///
    /// Can be used to resume the simulation later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize engine")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved engine checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let engine = decode::from_read(&mut reader).context("failed to deserialize engine")?;
        Ok(engine)
    }

    fn build_environment(&self) -> Result<Environment> {
        let ids = island_ids(&self.cfg);
        let geography = Geography::build(&ids, self.cfg.bounds());
        geography
            .check_bounds()
            .context("failed to place islands")?;

        let env = Environment::new(geography, self.cfg.disaster_params())
            .context("failed to construct environment")?;
        log::debug!("placed {} islands", env.geography().len());
        Ok(env)
    }

    fn perform_turn(
        &mut self,
        env: &Environment,
        payoff: PayoffRule,
        split: SplitRule,
    ) -> Turn {
        self.state.turn += 1;

        // Islands pay into the common pool first.
        self.collect_contributions();

        // Forage before the disaster strikes.
        let forage_yield = self.forage_round(payoff, split);

        // Sample the disaster and pay for it out of the pool.
        self.state.last_report = env.sample_disaster(&mut self.rng);
        let report = self.state.last_report;
        let (individual, proportional) = env.effects(&report);
        let total_effect: f64 = individual.values().sum();

        let pool_before = self.state.pool.resource;
        let mit = mitigate(
            &individual,
            &proportional,
            self.state.pool,
            self.cfg.disaster.mitigation_scale,
        );
        self.state.pool = mit.pool;

        // Damage the pool could not absorb hits the islands directly.
        for (id, damage) in &mit.residual {
            if let Some(res) = self.state.islands.get_mut(id) {
                *res = (*res - damage).max(0.0);
            }
        }

        if report.occurred() {
            log::debug!(
                "turn {}: {report}, cost {:.3}, leftover {:.3}",
                self.state.turn,
                mit.cost,
                mit.leftover
            );
        }

        Turn {
            turn: self.state.turn,
            report,
            pool_before,
            pool_after: self.state.pool.resource,
            total_effect,
            cost: mit.cost,
            leftover: mit.leftover,
            forage_yield,
        }
    }

    fn collect_contributions(&mut self) {
        let contribution = self.cfg.init.contribution;
        for res in self.state.islands.values_mut() {
            let paid = contribution.min(*res);
            *res -= paid;
            self.state.pool.resource += paid;
        }
    }

    fn forage_round(&mut self, payoff: PayoffRule, split: SplitRule) -> u64 {
        let invest_frac = self.cfg.forage.invest_frac;
        let mut saturated = false;

        let investments: ForageMap = self
            .state
            .islands
            .iter_mut()
            .map(|(&id, res)| {
                let inv = (*res * invest_frac).floor();
                saturated |= inv >= u64::MAX as f64;
                let inv = inv as u64;
                *res -= inv as f64;
                (id, inv)
            })
            .collect();

        let total_investment = investments
            .values()
            .try_fold(0, |acc: u64, &inv| acc.checked_add(inv))
            .unwrap_or_else(|| {
                saturated = true;
                u64::MAX
            });
        let total_yield = payoff
            .checked_payoff(total_investment)
            .unwrap_or_else(|| {
                saturated = true;
                u64::MAX
            });

        if saturated && !self.saturation_warned {
            log::warn!(
                "turn {}: forage amounts saturated at {}",
                self.state.turn,
                u64::MAX
            );
            self.saturation_warned = true;
        }

        let returns = split.compute_split(&investments, total_yield);

        for (id, ret) in returns {
            if let Some(res) = self.state.islands.get_mut(&id) {
                *res += ret as f64;
            }
        }

        total_yield
    }
}

fn island_ids(cfg: &Config) -> Vec<IslandId> {
    (0..cfg.geography.n_islands).map(IslandId).collect()
}
