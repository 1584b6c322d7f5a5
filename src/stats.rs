use serde::{Deserialize, Serialize};

/// Running mean and variance of a stream of values (Welford's algorithm).
#[derive(Default)]
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;
        let diff_old = val - self.mean;
        self.mean += diff_old / self.n_vals as f64;
        self.diff_2_sum += diff_old * (val - self.mean);
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            n_vals: self.n_vals,
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals - 1) as f64).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

/// Correlated series of values, such as a resource level sampled every save.
#[derive(Default)]
pub struct TimeSeries {
    vals: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimeSeriesReport {
    pub mean: f64,
    pub std_dev: f64,
    pub sem: f64,
    pub min: f64,
    pub max: f64,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, val: f64) {
        self.vals.push(val);
    }

    pub fn report(&self) -> TimeSeriesReport {
        let (min, max) = if self.vals.is_empty() {
            (f64::NAN, f64::NAN)
        } else {
            self.vals
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &val| {
                    (lo.min(val), hi.max(val))
                })
        };
        TimeSeriesReport {
            mean: mean(&self.vals),
            std_dev: variance(&self.vals).sqrt(),
            sem: blocked_sem(&self.vals),
            min,
            max,
        }
    }
}

fn mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

fn variance(vals: &[f64]) -> f64 {
    if vals.len() < 2 {
        return f64::NAN;
    }
    let avg = mean(vals);
    vals.iter().map(|&val| (val - avg).powi(2)).sum::<f64>() / (vals.len() - 1) as f64
}

/// Standard error of the mean of a correlated series (Flyvbjerg-Petersen blocking).
///
/// The series is repeatedly halved by averaging neighbouring pairs. The first
/// block level whose estimate lies above every later estimate minus its error
/// is taken as the plateau.
fn blocked_sem(vals: &[f64]) -> f64 {
    let mut blocks = vals.to_vec();
    let mut levels: Vec<(f64, f64)> = Vec::new();

    while blocks.len() >= 2 {
        let n_blk = blocks.len() as f64;
        let sem_2 = variance(&blocks) / n_blk;
        levels.push((sem_2, sem_2 * (2.0 / (n_blk - 1.0)).sqrt()));

        blocks = blocks
            .chunks_exact(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect();
    }

    for (i_lvl, &(sem_2, _)) in levels.iter().enumerate() {
        let lower = levels[i_lvl..]
            .iter()
            .map(|(est, err)| est - err)
            .fold(f64::NEG_INFINITY, f64::max);
        if sem_2 > lower {
            return sem_2.sqrt();
        }
    }

    levels.last().map_or(f64::NAN, |(sem_2, _)| sem_2.sqrt())
}
