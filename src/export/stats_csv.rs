//! Training statistics log
//!
//! A `;`-separated file with one header row and one row per logging interval.
//! Old logs can be archived under a timestamped name before a new run starts.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use chrono::Local;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

use crate::{Result, error::Error};

/// One row of the stats log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRow {
    /// Ticks simulated so far
    pub steps: u64,
    /// Wall-clock time of the row (RFC 3339)
    pub time: String,
    /// States in the value table
    pub states: usize,
    /// Mean wall-clock time per tick over the interval, microseconds
    pub avg_step_micros: f64,
    /// Exploration rate at the end of the interval
    pub epsilon: f64,
    /// Sum of rewards collected over the interval
    pub rewards_collected: f64,
    /// Rewards collected per tick over the interval
    pub reward_rate: f64,
    /// Balls lost so far
    pub game_overs: u64,
    /// Mean reward collected per ball so far
    pub score: f64,
}

impl StatsRow {
    pub const COLUMNS: [&'static str; 9] = [
        "steps",
        "time",
        "states",
        "avg_step_micros",
        "epsilon",
        "rewards_collected",
        "reward_rate",
        "game_overs",
        "score",
    ];

    /// Rewards per tick over an interval; the comparable form of a raw sum.
    pub fn normalize_reward(rewards: f64, interval_steps: u64) -> f64 {
        if interval_steps == 0 {
            0.0
        } else {
            rewards / interval_steps as f64
        }
    }
}

/// Writer for the stats log.
#[derive(Debug, Clone)]
pub struct StatsLogger {
    path: PathBuf,
}

impl StatsLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create (or truncate) the log and write the header row.
    pub fn init_log(&self) -> Result<()> {
        let file = File::create(&self.path).map_err(|source| Error::Io {
            operation: format!("create stats file {:?}", self.path),
            source,
        })?;
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_writer(file);
        writer.write_record(StatsRow::COLUMNS)?;
        writer.flush()?;
        Ok(())
    }

    /// Append one row.
    pub fn log(&self, row: &StatsRow) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|source| Error::Io {
                operation: format!("append to stats file {:?}", self.path),
                source,
            })?;
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }

    /// Rename an existing log to `<stem>-YYYY-MM-DD-HH-MM.<ext>`.
    ///
    /// Returns the new path, or `None` if there was nothing to archive.
    pub fn archive_log(&self) -> Result<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let stamp = Local::now().format("%Y-%m-%d-%H-%M").to_string();
        let archived = archive_name(&self.path, &stamp);
        std::fs::rename(&self.path, &archived).map_err(|source| Error::Io {
            operation: format!("archive stats file {:?}", self.path),
            source,
        })?;
        Ok(Some(archived))
    }
}

fn archive_name(path: &Path, stamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "stats".to_string());
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}-{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{stamp}"),
    };
    path.with_file_name(file_name)
}
