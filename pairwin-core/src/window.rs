//! Genomic windows and the contig ordering they are sorted by.
//!
//! Windows are 1-based and inclusive on both ends. A window list handed to the
//! engine must be sorted by dictionary index then start, non-overlapping, and
//! confined to one contig per window.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, WindowError};
use crate::record::ContigId;

/// Contig entry of a sequence dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contig {
    pub name: String,
    pub length: u64,
}

/// Total ordering over contig names, taken from the reference dictionary
/// (`@SQ` order of a BAM header).
#[derive(Debug, Default, Clone)]
pub struct SequenceDictionary {
    contigs: Vec<Contig>,
    name_to_id: HashMap<String, ContigId>,
}

impl SequenceDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from `(name, length)` pairs in reference order.
    pub fn from_contigs<I, S>(contigs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut dictionary = Self::new();
        for (name, length) in contigs {
            dictionary.push(name, length)?;
        }
        Ok(dictionary)
    }

    pub fn push(&mut self, name: impl Into<String>, length: u64) -> Result<ContigId> {
        let name = name.into();
        if self.name_to_id.contains_key(&name) {
            return Err(WindowError::DuplicateContig(name));
        }
        let id = self.contigs.len();
        self.name_to_id.insert(name.clone(), id);
        self.contigs.push(Contig { name, length });
        Ok(id)
    }

    pub fn id(&self, name: &str) -> Option<ContigId> {
        self.name_to_id.get(name).copied()
    }

    pub fn name(&self, id: ContigId) -> Option<&str> {
        self.contigs.get(id).map(|c| c.name.as_str())
    }

    pub fn length(&self, id: ContigId) -> Option<u64> {
        self.contigs.get(id).map(|c| c.length)
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContigId, &Contig)> {
        self.contigs.iter().enumerate()
    }
}

/// Immutable genomic interval; identity is `(contig, start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomicWindow {
    pub contig: String,
    /// 1-based, inclusive
    pub start: u64,
    /// 1-based, inclusive
    pub end: u64,
}

impl GenomicWindow {
    pub fn new(contig: impl Into<String>, start: u64, end: u64) -> Self {
        Self { contig: contig.into(), start, end }
    }

    pub fn contains(&self, pos: u64) -> bool {
        pos >= self.start && pos <= self.end
    }

    pub fn len(&self) -> u64 {
        (self.end + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for GenomicWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

/// Largest coordinate the engine's interval index can hold.
pub const MAX_WINDOW_END: u64 = i32::MAX as u64;

/// Tile every contig of the dictionary with fixed-size, non-overlapping windows.
///
/// The last window of a contig is truncated to the contig length; contigs of
/// length zero get no window.
pub fn tile_windows(dictionary: &SequenceDictionary, window_size: u64) -> Result<Vec<GenomicWindow>> {
    if window_size == 0 {
        return Err(WindowError::InvalidWindowSize);
    }

    let mut windows = Vec::new();
    for (_, contig) in dictionary.iter() {
        let mut start = 1;
        while start <= contig.length {
            let end = start.saturating_add(window_size - 1).min(contig.length);
            windows.push(GenomicWindow::new(contig.name.clone(), start, end));
            start = end + 1;
        }
    }
    Ok(windows)
}

/// Check the window list preconditions and resolve each window's contig.
///
/// Returns the dictionary index of every window, in input order.
pub fn validate_windows(dictionary: &SequenceDictionary, windows: &[GenomicWindow]) -> Result<Vec<ContigId>> {
    if windows.is_empty() {
        return Err(WindowError::EmptyWindows);
    }

    let mut ids = Vec::with_capacity(windows.len());
    let mut previous: Option<(ContigId, &GenomicWindow)> = None;

    for window in windows {
        let id = dictionary
            .id(&window.contig)
            .ok_or_else(|| WindowError::UnknownContig { window: window.clone() })?;

        if window.start == 0 {
            return Err(WindowError::MalformedWindow { window: window.clone(), reason: "start must be 1-based" });
        }
        if window.end < window.start {
            return Err(WindowError::MalformedWindow { window: window.clone(), reason: "end precedes start" });
        }
        if window.end > MAX_WINDOW_END {
            return Err(WindowError::MalformedWindow {
                window: window.clone(),
                reason: "end exceeds the supported coordinate range",
            });
        }

        if let Some((prev_id, prev)) = previous {
            let ordered = id > prev_id || (id == prev_id && window.start > prev.end);
            if !ordered {
                return Err(WindowError::UnsortedWindows { previous: prev.clone(), current: window.clone() });
            }
        }

        previous = Some((id, window));
        ids.push(id);
    }

    Ok(ids)
}
