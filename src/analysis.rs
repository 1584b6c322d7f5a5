use crate::config::Config;
use crate::model::Record;
use crate::stats::{Accumulator, AccumulatorReport, TimeSeries, TimeSeriesReport};
use anyhow::{Context, Result};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Summary statistics of one run.
#[derive(Debug, Serialize, Deserialize)]
pub struct Results {
    /// Indicator of a disaster occurring.
    pub disaster_freq: AccumulatorReport,
    /// Magnitude of the disasters that occurred.
    pub magnitude: AccumulatorReport,
    /// Indicator of a disaster not being fully absorbed by the pool.
    pub overflow_freq: AccumulatorReport,
    /// Common pool level after mitigation.
    pub pool: TimeSeriesReport,
    /// Resources held by all islands together.
    pub island_resources: TimeSeriesReport,
}

pub struct Analyzer {
    cfg: Config,
    disaster_freq: Accumulator,
    magnitude: Accumulator,
    overflow_freq: Accumulator,
    pool: TimeSeries,
    island_resources: TimeSeries,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            disaster_freq: Accumulator::new(),
            magnitude: Accumulator::new(),
            overflow_freq: Accumulator::new(),
            pool: TimeSeries::new(),
            island_resources: TimeSeries::new(),
        }
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        for _ in 0..self.cfg.output.saves_per_file {
            let record: Record = decode::from_read(&mut reader).context("failed to read record")?;
            self.update(&record);
        }
        Ok(())
    }

    fn update(&mut self, record: &Record) {
        let occurred = record.report.occurred();
        self.disaster_freq.add(if occurred { 1.0 } else { 0.0 });
        if occurred {
            self.magnitude.add(record.report.magnitude);
            self.overflow_freq
                .add(if record.leftover > 0.0 { 1.0 } else { 0.0 });
        }
        self.pool.push(record.pool_after);
        self.island_resources.push(record.islands.values().sum());
    }

    pub fn results(&self) -> Results {
        Results {
            disaster_freq: self.disaster_freq.report(),
            magnitude: self.magnitude.report(),
            overflow_freq: self.overflow_freq.report(),
            pool: self.pool.report(),
            island_resources: self.island_resources.report(),
        }
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        let results = self.results();
        log::info!("{results:#?}");

        encode::write(&mut writer, &results).context("failed to serialize results")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }
}
