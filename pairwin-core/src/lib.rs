//! Streaming per-window aggregation of alignment statistics.
//!
//! The engine consumes a coordinate-sorted stream of alignment records and a
//! sorted list of genomic windows, and writes one tab-delimited row per window:
//! - `total`, `proper` and `missing` counts
//! - one column per single-read statistic, folded over proper in-window reads
//! - one column per pair-end statistic, merged once both mates are seen
//!
//! Records are abstracted by [`AlignmentRecord`], so the engine never depends
//! on a particular alignment file reader.

pub mod calculator;
pub mod engine;
pub mod error;
pub mod record;
pub mod stat;
pub mod table;
pub mod window;

#[cfg(test)]
mod testing;

pub use calculator::WindowCalculator;
pub use engine::{column_names, EngineReport, IncompleteWindow, WindowEngine};
pub use error::{Result, WindowError};
pub use record::{is_proper, AlignmentRecord, ContigId};
pub use stat::{PairEndStat, SharedPairEndStat, SharedSingleReadStat, SingleReadStat};
pub use table::{TableWriter, WINDOW_HEADER};
pub use window::{tile_windows, validate_windows, GenomicWindow, SequenceDictionary};
