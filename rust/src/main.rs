use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::error;

use pairwin::registry::{PAIR_END_STATS, SINGLE_READ_STATS};
use pairwin::{run_window_stats, WindowStatsConfig};

/// Per-window read and fragment statistics for a coordinate-sorted BAM.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Coordinate-sorted input BAM
    #[arg(short, long)]
    input: PathBuf,

    /// Output TSV (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tile every contig with windows of this size
    #[arg(short = 'w', long, default_value_t = 1000, conflicts_with = "windows")]
    window_size: u64,

    /// BED file of windows to report instead of tiling
    #[arg(short = 'b', long)]
    windows: Option<PathBuf>,

    /// Single-read statistic (repeatable)
    #[arg(short, long = "stat", value_name = "NAME", long_help = single_read_help())]
    stat: Vec<String>,

    /// Pair-end statistic (repeatable)
    #[arg(short, long = "pair-stat", value_name = "NAME", long_help = pair_end_help())]
    pair_stat: Vec<String>,

    /// Also report windows without any record
    #[arg(long, action)]
    print_all: bool,

    /// BAM decompression threads
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Hide the progress spinner
    #[arg(long, action)]
    silent: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn single_read_help() -> String {
    format!("Single-read statistic (repeatable). Available: {}", SINGLE_READ_STATS.join(", "))
}

fn pair_end_help() -> String {
    format!("Pair-end statistic (repeatable). Available: {}", PAIR_END_STATS.join(", "))
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let config = WindowStatsConfig {
        bam: args.input,
        output: args.output,
        window_size: args.window_size,
        windows: args.windows,
        single_stats: args.stat,
        pair_stats: args.pair_stat,
        print_all: args.print_all,
        threads: args.threads,
        silent: args.silent,
    };

    match run_window_stats(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
