//! BED window lists.
//!
//! Handles plain, gzip and BGZF-compressed BED files. Intervals are converted
//! from BED's 0-based half-open coordinates to 1-based inclusive windows and
//! sorted in reference dictionary order.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use pairwin_core::{GenomicWindow, SequenceDictionary};

/// Check if a file appears to be BGZF format by examining the header.
///
/// BGZF files have the gzip magic bytes (0x1f 0x8b), the FEXTRA flag set, and
/// a "BC" subfield identifier.
fn is_bgzf_file(path: &Path) -> bool {
    let mut header = [0u8; 18];
    match File::open(path).and_then(|mut file| file.read_exact(&mut header)) {
        Ok(()) => header[0] == 0x1f && header[1] == 0x8b && header[3] & 0x04 != 0 && &header[12..14] == b"BC",
        Err(_) => false,
    }
}

/// Open a file and return a buffered reader, handling compression transparently.
///
/// `.gz` files are read with `noodles::bgzf` when they are BGZF and with
/// `flate2::MultiGzDecoder` otherwise.
pub fn get_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let is_gz = path.extension().map(|ext| ext == "gz").unwrap_or(false);

    if !is_gz {
        return Ok(Box::new(BufReader::new(file)));
    }
    if is_bgzf_file(path) {
        Ok(Box::new(BufReader::new(noodles::bgzf::Reader::new(file))))
    } else {
        use flate2::read::MultiGzDecoder;
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    }
}

/// Parse one BED line into `(chrom, start, end)`, 0-based half-open.
fn parse_interval(line: &str) -> Result<(&str, u64, u64)> {
    let mut fields = line.split('\t');
    let (Some(chrom), Some(start), Some(end)) = (fields.next(), fields.next(), fields.next()) else {
        bail!("expected at least 3 tab-separated fields");
    };
    let start: u64 = start.trim().parse().with_context(|| format!("invalid start '{}'", start))?;
    let end: u64 = end.trim().parse().with_context(|| format!("invalid end '{}'", end))?;
    if end <= start {
        bail!("empty interval {}:{}-{}", chrom, start, end);
    }
    Ok((chrom, start, end))
}

/// Read windows from a BED file.
///
/// Header, comment and blank lines are ignored. Intervals on contigs missing
/// from `dictionary` are skipped with one warning per contig. The result is
/// sorted by dictionary index then start; overlap is left for the engine to
/// reject.
pub fn read_windows(path: &Path, dictionary: &SequenceDictionary) -> Result<Vec<GenomicWindow>> {
    let reader = get_reader(path)?;
    let mut keyed: Vec<(usize, GenomicWindow)> = Vec::new();
    let mut unknown: HashSet<String> = HashSet::new();
    let mut skipped = 0u64;

    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {:?}", path))?;
        if line.trim().is_empty() || line.starts_with('#') || line.starts_with("track") || line.starts_with("browser") {
            continue;
        }

        let (chrom, start, end) =
            parse_interval(&line).with_context(|| format!("{:?} line {}", path, i + 1))?;

        let Some(id) = dictionary.id(chrom) else {
            if unknown.insert(chrom.to_string()) {
                warn!("Skipping windows on {}: not in the BAM header", chrom);
            }
            skipped += 1;
            continue;
        };
        keyed.push((id, GenomicWindow::new(chrom, start + 1, end)));
    }

    keyed.sort_by_key(|(id, window)| (*id, window.start));
    info!("Loaded {} windows from {:?} ({} skipped)", keyed.len(), path, skipped);
    Ok(keyed.into_iter().map(|(_, window)| window).collect())
}
