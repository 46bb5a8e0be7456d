//! Per-window single-read and pair-end statistics over coordinate-sorted BAM files.
//!
//! Wraps the `pairwin-core` engine with a BAM reader, BED window lists, a set
//! of concrete statistics and the run pipeline used by the CLI.

pub mod bam;
pub mod bed;
pub mod config;
pub mod pair_stats;
pub mod pipeline;
pub mod read_stats;
pub mod registry;

pub use config::WindowStatsConfig;
pub use pipeline::{process_alignments, run_window_stats, RunSummary};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(feature = "python")]
#[pymodule]
fn pairwin(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // stderr logging, filtered by RUST_LOG
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).try_init();

    m.add_function(wrap_pyfunction!(pipeline::compute_window_stats, m)?)?;
    m.add_function(wrap_pyfunction!(version, m)?)?;
    Ok(())
}
