use crate::disaster::{DisasterParameters, SpatialPdf};
use crate::forage::{PayoffRule, SplitRule};
use crate::geography::Bounds;
use crate::mitigation::{CommonPool, DEFAULT_MITIGATION_SCALE};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Archipelago layout.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct GeographyConfig {
    /// Number of islands.
    pub n_islands: usize,

    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Disaster process and mitigation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DisasterConfig {
    /// Probability of a disaster per turn.
    pub global_prob: f64,
    /// Distribution of epicentres.
    #[serde(default)]
    pub spatial_pdf: SpatialPdf,
    /// Rate of the exponential magnitude distribution.
    pub magnitude_lambda: f64,
    /// Resource units per unit of disaster effect.
    #[serde(default = "default_mitigation_scale")]
    pub mitigation_scale: f64,
}

/// Foraging rules and participation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ForageConfig {
    /// Name of the payoff rule.
    #[serde(default = "default_payoff_rule")]
    pub payoff_rule: String,
    /// Name of the split rule.
    #[serde(default = "default_split_rule")]
    pub split_rule: String,
    /// Fraction of its resources each island invests per round.
    pub invest_frac: f64,
}

/// Initial state.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    /// Starting resources of each island.
    pub island_resources: f64,
    /// Starting common pool resources.
    pub pool_resources: f64,
    /// Common pool preparedness threshold.
    pub pool_threshold: f64,
    /// Resources each island pays into the pool per turn.
    pub contribution: f64,
    /// Random seed, OS entropy when absent.
    pub seed: Option<u64>,
}

/// Output layout.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of turns between saves.
    pub turns_per_save: usize,
    /// Number of saves written per file.
    pub saves_per_file: usize,
}

/// Simulation configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub geography: GeographyConfig,
    pub disaster: DisasterConfig,
    pub forage: ForageConfig,
    pub init: InitConfig,
    pub output: OutputConfig,
}

fn default_mitigation_scale() -> f64 {
    DEFAULT_MITIGATION_SCALE
}

fn default_payoff_rule() -> String {
    "square".to_string()
}

fn default_split_rule() -> String {
    "even".to_string()
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;
        config.validate().context("failed to validate config")?;
        Ok(config)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            x_min: self.geography.x_min,
            x_max: self.geography.x_max,
            y_min: self.geography.y_min,
            y_max: self.geography.y_max,
        }
    }

    pub fn disaster_params(&self) -> DisasterParameters {
        DisasterParameters {
            global_prob: self.disaster.global_prob,
            spatial_pdf: self.disaster.spatial_pdf,
            magnitude_lambda: self.disaster.magnitude_lambda,
        }
    }

    pub fn initial_pool(&self) -> CommonPool {
        CommonPool {
            resource: self.init.pool_resources,
            threshold: self.init.pool_threshold,
        }
    }

    pub fn payoff_rule(&self) -> PayoffRule {
        PayoffRule::from_key(&self.forage.payoff_rule)
    }

    pub fn split_rule(&self) -> SplitRule {
        SplitRule::from_key(&self.forage.split_rule)
    }

    fn validate(&self) -> Result<()> {
        let geo = &self.geography;
        check_num(geo.n_islands, 1..10_000).context("invalid number of islands")?;
        check_bounds(geo.x_min, geo.x_max).context("invalid x bounds")?;
        check_bounds(geo.y_min, geo.y_max).context("invalid y bounds")?;
        // Islands are placed along the x-axis.
        check_num(0.0, geo.y_min..=geo.y_max).context("y bounds must contain the x-axis")?;

        let dis = &self.disaster;
        check_num(dis.global_prob, 0.0..=1.0).context("invalid disaster probability")?;
        if !(dis.magnitude_lambda > 0.0 && dis.magnitude_lambda.is_finite()) {
            bail!("magnitude rate must be positive and finite, but is {}", dis.magnitude_lambda);
        }
        check_num(dis.mitigation_scale, 0.0..).context("invalid mitigation scale")?;

        check_num(self.forage.invest_frac, 0.0..=1.0).context("invalid investment fraction")?;

        let init = &self.init;
        check_num(init.island_resources, 0.0..).context("invalid island resources")?;
        check_num(init.pool_resources, 0.0..).context("invalid pool resources")?;
        check_num(init.pool_threshold, 0.0..).context("invalid pool threshold")?;
        check_num(init.contribution, 0.0..).context("invalid contribution")?;

        let out = &self.output;
        check_num(out.turns_per_save, 1..10_000).context("invalid number of turns per save")?;
        check_num(out.saves_per_file, 1..10_000).context("invalid number of saves per file")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_bounds(min: f64, max: f64) -> Result<()> {
    if !(min.is_finite() && max.is_finite()) {
        bail!("bounds must be finite, but are [{min}, {max}]");
    }
    if max < min {
        bail!("upper bound {max} must not be below lower bound {min}");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) const TEST_CONFIG: &str = r#"
[geography]
n_islands = 6
x_min = 0.0
x_max = 10.0
y_min = -5.0
y_max = 5.0

[disaster]
global_prob = 0.5
spatial_pdf = "uniform"
magnitude_lambda = 1.0

[forage]
payoff_rule = "square"
split_rule = "proportional"
invest_frac = 0.1

[init]
island_resources = 100.0
pool_resources = 500.0
pool_threshold = 200.0
contribution = 5.0
seed = 42

[output]
turns_per_save = 4
saves_per_file = 8
"#;
