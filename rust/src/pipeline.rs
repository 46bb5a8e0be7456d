//! Window statistics pipeline orchestration
//!
//! Single pass over a coordinate-sorted BAM:
//! - windows come from fixed-size tiling of the header's contigs or a BED file
//! - statistics are resolved by name through the registry
//! - the window engine writes one TSV row per finished window
//!
//! Entry point: `run_window_stats()`, used by the CLI and exposed to Python
//! as `compute_window_stats()` when the `python` feature is enabled.

use std::fs::File;
use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info, warn};

use pairwin_core::{column_names, tile_windows, validate_windows, IncompleteWindow, TableWriter, WindowEngine};

use crate::bam::{Alignment, AlignmentSource};
use crate::bed::read_windows;
use crate::config::WindowStatsConfig;
use crate::registry::{pair_end_stat, single_read_stat};

/// Incomplete windows reported one by one before the rest are summarized.
const MAX_INCOMPLETE_WARNINGS: usize = 10;

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rows_written: u64,
    pub windows_omitted: u64,
    pub incomplete_windows: u64,
    /// Primary records handed to the engine
    pub records_processed: u64,
    /// Secondary and supplementary records dropped by the reader
    pub records_filtered: u64,
    pub unmapped_skipped: u64,
}

/// Spinner on stderr, hidden when `silent`.
pub fn make_progress_bar(silent: bool) -> ProgressBar {
    if silent {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(4));
    let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {human_pos} records ({per_sec})")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(250));
    pb
}

/// Feed every primary record of `source` to `engine`.
///
/// Stops early once the engine has finalized its last window. Returns the
/// number of records fed.
pub fn process_alignments<W: Write>(
    source: &mut AlignmentSource,
    engine: &mut WindowEngine<Alignment, W>,
    progress: &ProgressBar,
) -> Result<u64> {
    let mut alignment = Alignment::new();
    let mut fed = 0u64;

    while source.read_next(&mut alignment)? {
        engine.add_read(&alignment)?;
        fed += 1;
        progress.inc(1);

        if engine.is_exhausted() {
            debug!("All windows finalized after {} records; skipping the rest of the input", fed);
            break;
        }
    }
    Ok(fed)
}

/// Warning lines for windows finalized with unmatched fragments: the first
/// `limit` individually, then one line counting the rest.
fn incomplete_warnings(incomplete: &[IncompleteWindow], limit: usize) -> Vec<String> {
    let mut lines: Vec<String> = incomplete
        .iter()
        .take(limit)
        .map(|w| format!("Window {} finished with {} fragments whose mate was never seen", w.window, w.missing))
        .collect();
    if incomplete.len() > limit {
        lines.push(format!("... and {} more windows with unmatched fragments", incomplete.len() - limit));
    }
    lines
}

fn open_sink(config: &WindowStatsConfig) -> Result<TableWriter<Box<dyn Write>>> {
    match &config.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create output: {:?}", path))?;
            Ok(TableWriter::new(Box::new(file), path.display().to_string()))
        }
        None => Ok(TableWriter::new(Box::new(io::stdout()), "stdout")),
    }
}

pub fn run_window_stats(config: &WindowStatsConfig) -> Result<RunSummary> {
    config.validate()?;

    // 1. Input and reference dictionary
    let mut source = AlignmentSource::from_path(&config.bam, config.threads)?;
    let dictionary = source.dictionary().clone();

    // 2. Windows
    let windows = match &config.windows {
        Some(bed) => read_windows(bed, &dictionary)?,
        None => {
            let windows = tile_windows(&dictionary, config.window_size)?;
            info!(
                "Tiled {} contigs into {} windows of {}bp",
                dictionary.len(),
                windows.len(),
                config.window_size
            );
            windows
        }
    };

    // 3. Statistics
    let single = config.single_stats.iter().map(|s| single_read_stat(s)).collect::<Result<Vec<_>>>()?;
    let pair = config.pair_stats.iter().map(|s| pair_end_stat(s)).collect::<Result<Vec<_>>>()?;
    info!("Statistics: {} single-read, {} pair-end", single.len(), pair.len());

    // 4. Engine; everything that can reject the configuration runs before the
    // output file is created
    validate_windows(&dictionary, &windows).context("Invalid window list")?;
    column_names(&single, &pair)?;
    let sink = open_sink(config)?;
    let destination = sink.destination().to_string();
    let mut engine = WindowEngine::new(&dictionary, &windows, &single, &pair, sink, config.print_all)
        .context("Failed to set up window engine")?;

    let pb = make_progress_bar(config.silent);
    let fed = process_alignments(&mut source, &mut engine, &pb)?;
    pb.finish_and_clear();

    let (report, _) = engine.close()?;

    // 5. Diagnostics
    for line in incomplete_warnings(&report.incomplete, MAX_INCOMPLETE_WARNINGS) {
        warn!("{}", line);
    }

    let source_stats = source.stats();
    let summary = RunSummary {
        rows_written: report.windows_written,
        windows_omitted: report.windows_omitted,
        incomplete_windows: report.incomplete.len() as u64,
        records_processed: fed,
        records_filtered: source_stats.filtered(),
        unmapped_skipped: report.unmapped_skipped,
    };
    info!(
        "Wrote {} windows to {} ({} empty omitted); {} records processed, {} secondary/supplementary skipped",
        summary.rows_written, destination, summary.windows_omitted, summary.records_processed, summary.records_filtered
    );
    Ok(summary)
}


// ============================================================================
// Python binding
// ============================================================================

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Compute per-window statistics for a coordinate-sorted BAM.
///
/// Returns `(rows_written, windows_omitted, incomplete_windows, records_processed)`.
#[cfg(feature = "python")]
#[pyfunction]
#[allow(clippy::too_many_arguments)]
#[pyo3(signature = (bam_path, output_path=None, window_size=1000, windows_path=None, stats=None, pair_stats=None, print_all=false, threads=0, silent=true))]
pub fn compute_window_stats(
    bam_path: std::path::PathBuf,
    output_path: Option<std::path::PathBuf>,
    window_size: u64,
    windows_path: Option<std::path::PathBuf>,
    stats: Option<Vec<String>>,
    pair_stats: Option<Vec<String>>,
    print_all: bool,
    threads: usize,
    silent: bool,
) -> PyResult<(u64, u64, u64, u64)> {
    let config = WindowStatsConfig {
        bam: bam_path,
        output: output_path,
        window_size,
        windows: windows_path,
        single_stats: stats.unwrap_or_default(),
        pair_stats: pair_stats.unwrap_or_default(),
        print_all,
        threads,
        silent,
    };

    let summary = run_window_stats(&config)
        .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(format!("{:#}", e)))?;
    Ok((summary.rows_written, summary.windows_omitted, summary.incomplete_windows, summary.records_processed))
}
