//! BAM input: record adapter, sequence dictionary and a sorted record stream.
//!
//! `Alignment` owns a `bam::Record` and exposes it to the window engine with
//! 1-based coordinates. `AlignmentSource` reads primary records one at a time
//! and refuses to continue past a coordinate-order violation.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use rust_htslib::bam::{self, Read};

use pairwin_core::{AlignmentRecord, ContigId, SequenceDictionary};

/// Alignment record as seen by the window engine.
#[derive(Debug, Clone, Default)]
pub struct Alignment {
    record: bam::Record,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &bam::Record {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut bam::Record {
        &mut self.record
    }
}

impl From<bam::Record> for Alignment {
    fn from(record: bam::Record) -> Self {
        Self { record }
    }
}

fn contig_id(tid: i32) -> Option<ContigId> {
    usize::try_from(tid).ok()
}

fn one_based(pos: i64) -> u64 {
    u64::try_from(pos).map(|p| p + 1).unwrap_or(0)
}

impl AlignmentRecord for Alignment {
    fn name(&self) -> &[u8] {
        self.record.qname()
    }

    fn contig(&self) -> Option<ContigId> {
        contig_id(self.record.tid())
    }

    fn start(&self) -> u64 {
        one_based(self.record.pos())
    }

    fn mate_contig(&self) -> Option<ContigId> {
        contig_id(self.record.mtid())
    }

    fn mate_start(&self) -> u64 {
        one_based(self.record.mpos())
    }

    fn is_mapped(&self) -> bool {
        !self.record.is_unmapped() && self.record.tid() >= 0
    }

    fn is_mate_mapped(&self) -> bool {
        !self.record.is_mate_unmapped() && self.record.mtid() >= 0
    }

    fn is_paired(&self) -> bool {
        self.record.is_paired()
    }
}

// ============================================================================
// Header
// ============================================================================

/// Reference dictionary in `@SQ` order.
pub fn dictionary_from_header(header: &bam::HeaderView) -> Result<SequenceDictionary> {
    let mut dictionary = SequenceDictionary::new();
    for (tid, name) in header.target_names().iter().enumerate() {
        let name = String::from_utf8_lossy(name).to_string();
        let length = header.target_len(tid as u32).unwrap_or(0);
        dictionary.push(name, length).context("Invalid BAM header")?;
    }
    Ok(dictionary)
}

/// `SO` field of the `@HD` line, if any.
pub fn sort_order(header: &bam::HeaderView) -> Option<String> {
    let records = bam::Header::from_template(header).to_hashmap();
    records.get("HD")?.first()?.get("SO").cloned()
}

// ============================================================================
// Sorted record stream
// ============================================================================

/// Counters of what the source has read and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub records_read: u64,
    pub secondary_skipped: u64,
    pub supplementary_skipped: u64,
}

impl SourceStats {
    pub fn filtered(&self) -> u64 {
        self.secondary_skipped + self.supplementary_skipped
    }
}

/// Tracks the last `(tid, pos)` and rejects records that go backwards.
///
/// Unplaced records (`tid < 0`) form the tail of a sorted file; nothing
/// placed may follow them.
#[derive(Debug, Default)]
struct OrderCheck {
    last: Option<(i32, i64)>,
    in_unplaced_tail: bool,
}

impl OrderCheck {
    fn check(&mut self, tid: i32, pos: i64) -> std::result::Result<(), String> {
        if tid < 0 {
            self.in_unplaced_tail = true;
            return Ok(());
        }
        if self.in_unplaced_tail {
            return Err(format!("placed record at tid {} pos {} follows unplaced records", tid, pos));
        }
        if let Some(last) = self.last {
            if (tid, pos) < last {
                return Err(format!(
                    "record at tid {} pos {} precedes previous record at tid {} pos {}",
                    tid, pos, last.0, last.1
                ));
            }
        }
        self.last = Some((tid, pos));
        Ok(())
    }
}

pub struct AlignmentSource {
    reader: bam::Reader,
    path: PathBuf,
    dictionary: SequenceDictionary,
    order: OrderCheck,
    stats: SourceStats,
}

impl AlignmentSource {
    /// Open a coordinate-sorted BAM. `threads` > 0 enables htslib
    /// decompression threads.
    pub fn from_path(path: &Path, threads: usize) -> Result<Self> {
        let mut reader = bam::Reader::from_path(path)
            .with_context(|| format!("Failed to open BAM: {:?}", path))?;
        if threads > 0 {
            reader
                .set_threads(threads)
                .with_context(|| format!("Failed to set {} decompression threads", threads))?;
        }

        let header = reader.header();
        match sort_order(header).as_deref() {
            Some("coordinate") => {}
            Some(other) => warn!("{:?} declares sort order '{}', expected coordinate", path, other),
            None => warn!("{:?} has no @HD sort order; assuming coordinate", path),
        }
        let dictionary = dictionary_from_header(header)?;
        debug!("{:?}: {} reference sequences", path, dictionary.len());

        Ok(Self {
            reader,
            path: path.to_path_buf(),
            dictionary,
            order: OrderCheck::default(),
            stats: SourceStats::default(),
        })
    }

    pub fn dictionary(&self) -> &SequenceDictionary {
        &self.dictionary
    }

    pub fn stats(&self) -> SourceStats {
        self.stats
    }

    /// Read the next primary record into `alignment`.
    ///
    /// Returns `Ok(false)` at end of file. Secondary and supplementary
    /// records are skipped and counted.
    pub fn read_next(&mut self, alignment: &mut Alignment) -> Result<bool> {
        loop {
            match self.reader.read(alignment.record_mut()) {
                None => return Ok(false),
                Some(result) => result.with_context(|| format!("Failed to read record from {:?}", self.path))?,
            }
            self.stats.records_read += 1;

            let record = alignment.record();
            if record.is_secondary() {
                self.stats.secondary_skipped += 1;
                continue;
            }
            if record.is_supplementary() {
                self.stats.supplementary_skipped += 1;
                continue;
            }

            if let Err(msg) = self.order.check(record.tid(), record.pos()) {
                bail!(
                    "{:?} is not coordinate-sorted: {} (read {})",
                    self.path,
                    msg,
                    String::from_utf8_lossy(record.qname())
                );
            }
            return Ok(true);
        }
    }
}
