//! Per-window running state.
//!
//! A `WindowCalculator` attributes single-read and pair-end statistics to one
//! genomic window while the coordinate-sorted stream goes past:
//! - `total` counts every record whose own start is in the window
//! - `proper` and the single-read aggregates only count proper records
//! - pair-end aggregates are merged when the window has seen both mates,
//!   either directly or through the mate position of a record outside it
//!
//! Fragments straddling two windows are credited to both. A fragment whose
//! mate never shows up is reported as missing only by the window holding the
//! unmatched read's own start.

use std::collections::HashMap;
use std::sync::Arc;

use crate::record::{is_proper, AlignmentRecord, ContigId};
use crate::stat::{
    PairEndAccumulator, PendingValue, SharedPairEndStat, SharedSingleReadStat, SingleReadAccumulator,
};
use crate::window::GenomicWindow;

/// First sighting of a fragment, waiting for its mate.
struct PendingPair {
    /// Whether the read that created the entry started inside this window.
    seen_in_window: bool,
    firsts: Vec<PendingValue>,
}

pub struct WindowCalculator<R> {
    window: GenomicWindow,
    contig: ContigId,
    columns: Arc<[String]>,
    total: u64,
    proper: u64,
    single: Vec<Box<dyn SingleReadAccumulator<R>>>,
    pair: Vec<Box<dyn PairEndAccumulator<R>>>,
    cache: HashMap<Box<[u8]>, PendingPair>,
}

impl<R: AlignmentRecord> WindowCalculator<R> {
    /// `columns` is the shared column list (`total`, `proper`, `missing`, then
    /// the statistic names) in the order `to_row` reports values.
    pub fn new(
        window: GenomicWindow,
        contig: ContigId,
        columns: Arc<[String]>,
        single: &[SharedSingleReadStat<R>],
        pair: &[SharedPairEndStat<R>],
    ) -> Self {
        Self {
            window,
            contig,
            columns,
            total: 0,
            proper: 0,
            single: single.iter().map(|s| Arc::clone(s).accumulator()).collect(),
            pair: pair.iter().map(|p| Arc::clone(p).accumulator()).collect(),
            cache: HashMap::new(),
        }
    }

    pub fn window(&self) -> &GenomicWindow {
        &self.window
    }

    pub fn contig(&self) -> ContigId {
        self.contig
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn proper(&self) -> u64 {
        self.proper
    }

    /// Fragments still waiting for a mate, whichever window saw them first.
    pub fn pending(&self) -> usize {
        self.cache.len()
    }

    fn contains(&self, contig: Option<ContigId>, pos: u64) -> bool {
        contig == Some(self.contig) && self.window.contains(pos)
    }

    /// True if the record's own start is in the window, or it is proper and
    /// its mate starts in the window.
    pub fn fragment_overlaps(&self, record: &R) -> bool {
        self.contains(record.contig(), record.start())
            || (is_proper(record) && self.contains(record.mate_contig(), record.mate_start()))
    }

    pub fn add_read(&mut self, record: &R) {
        let in_window = self.contains(record.contig(), record.start());
        let proper = is_proper(record);

        if in_window {
            self.total += 1;
            if proper {
                self.proper += 1;
                for acc in &mut self.single {
                    acc.add(record);
                }
            }
        }

        if !proper || !(in_window || self.contains(record.mate_contig(), record.mate_start())) {
            return;
        }

        match self.cache.remove(record.name()) {
            Some(pending) => {
                for (acc, first) in self.pair.iter_mut().zip(pending.firsts) {
                    acc.complete(first, record);
                }
            }
            None => {
                let firsts = self.pair.iter().map(|acc| acc.first(record)).collect();
                let pending = PendingPair { seen_in_window: in_window, firsts };
                self.cache.insert(record.name().into(), pending);
            }
        }
    }

    /// Unmatched fragments whose cached read started inside this window.
    ///
    /// Only final once every record overlapping the window (and its mates)
    /// has been fed.
    pub fn missing_count(&self) -> usize {
        self.cache.values().filter(|p| p.seen_in_window).count()
    }

    /// `[contig, start, end, total, proper, missing, single..., pair...]`
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(3 + self.columns.len());
        row.push(self.window.contig.clone());
        row.push(self.window.start.to_string());
        row.push(self.window.end.to_string());
        row.push(self.total.to_string());
        row.push(self.proper.to_string());
        row.push(self.missing_count().to_string());
        row.extend(self.single.iter().map(|acc| acc.format()));
        row.extend(self.pair.iter().map(|acc| acc.format()));
        row
    }
}
