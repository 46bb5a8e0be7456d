//! Run configuration shared by the CLI and the Python binding.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::registry::{pair_end_stat, single_read_stat};

/// Configuration for one window-statistics run
#[derive(Debug, Clone)]
pub struct WindowStatsConfig {
    /// Coordinate-sorted BAM
    pub bam: PathBuf,
    /// Output TSV; stdout when `None`
    pub output: Option<PathBuf>,
    /// Tiling window size, used when `windows` is not set (default: 1000bp)
    pub window_size: u64,
    /// BED file of windows, replaces tiling
    pub windows: Option<PathBuf>,
    /// Single-read statistic names, in column order
    pub single_stats: Vec<String>,
    /// Pair-end statistic names, in column order after the single-read ones
    pub pair_stats: Vec<String>,
    /// Also write windows that saw no records
    pub print_all: bool,
    /// htslib decompression threads (0 = none)
    pub threads: usize,
    /// Hide the progress spinner
    pub silent: bool,
}

impl Default for WindowStatsConfig {
    fn default() -> Self {
        Self {
            bam: PathBuf::new(),
            output: None,
            window_size: 1000,
            windows: None,
            single_stats: Vec::new(),
            pair_stats: Vec::new(),
            print_all: false,
            threads: 0,
            silent: false,
        }
    }
}

impl WindowStatsConfig {
    pub fn new(bam: impl Into<PathBuf>) -> Self {
        Self { bam: bam.into(), ..Self::default() }
    }

    /// Reject settings that would fail only after the BAM is opened.
    pub fn validate(&self) -> Result<()> {
        if self.bam.as_os_str().is_empty() {
            bail!("no input BAM given");
        }
        if !self.bam.exists() {
            bail!("input BAM {:?} does not exist", self.bam);
        }
        match &self.windows {
            Some(bed) if !bed.exists() => bail!("window BED {:?} does not exist", bed),
            None if self.window_size == 0 => bail!("window size must be positive"),
            _ => {}
        }
        for name in &self.single_stats {
            single_read_stat(name)?;
        }
        for name in &self.pair_stats {
            pair_end_stat(name)?;
        }
        Ok(())
    }
}
