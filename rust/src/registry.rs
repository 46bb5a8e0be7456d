//! Statistic lookup by name.
//!
//! Names are matched case-insensitively on the keyword; parameters follow
//! the keyword separated by colons, e.g. `PairTagThreshold:NM:3:all`.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};

use pairwin_core::{SharedPairEndStat, SharedSingleReadStat};

use crate::bam::Alignment;
use crate::pair_stats::{PairContainSoftclip, PairFirstSeenSoftclip, PairTagThreshold, TagMode};
use crate::read_stats::{ContainIndel, ContainSoftclip, MeanMapq, SoftclippedBases};

pub const SINGLE_READ_STATS: [&str; 4] = ["ContainSoftclip", "ContainIndel", "SoftclippedBases", "MeanMapq"];

pub const PAIR_END_STATS: [&str; 3] =
    ["PairTagThreshold:<TAG>:<N>[:any|:all]", "PairContainSoftclip", "PairFirstSeenSoftclip"];

fn split_name(name: &str) -> (String, Vec<&str>) {
    let mut parts = name.trim().split(':');
    let keyword = parts.next().unwrap_or_default().to_ascii_lowercase();
    (keyword, parts.collect())
}

fn no_parameters(name: &str, params: &[&str]) -> Result<()> {
    if !params.is_empty() {
        bail!("statistic '{}' takes no parameters", name);
    }
    Ok(())
}

pub fn single_read_stat(name: &str) -> Result<SharedSingleReadStat<Alignment>> {
    let (keyword, params) = split_name(name);
    let stat: SharedSingleReadStat<Alignment> = match keyword.as_str() {
        "containsoftclip" => Arc::new(ContainSoftclip),
        "containindel" => Arc::new(ContainIndel),
        "softclippedbases" => Arc::new(SoftclippedBases),
        "meanmapq" => Arc::new(MeanMapq),
        _ => {
            return Err(anyhow!(
                "unknown single-read statistic '{}' (available: {})",
                name,
                SINGLE_READ_STATS.join(", ")
            ))
        }
    };
    no_parameters(name, &params)?;
    Ok(stat)
}

pub fn pair_end_stat(name: &str) -> Result<SharedPairEndStat<Alignment>> {
    let (keyword, params) = split_name(name);
    let stat: SharedPairEndStat<Alignment> = match keyword.as_str() {
        "pairtagthreshold" => Arc::new(parse_tag_threshold(&params).with_context(|| format!("in '{}'", name))?),
        "paircontainsoftclip" => {
            no_parameters(name, &params)?;
            Arc::new(PairContainSoftclip)
        }
        "pairfirstseensoftclip" => {
            no_parameters(name, &params)?;
            Arc::new(PairFirstSeenSoftclip)
        }
        _ => {
            return Err(anyhow!(
                "unknown pair-end statistic '{}' (available: {})",
                name,
                PAIR_END_STATS.join(", ")
            ))
        }
    };
    Ok(stat)
}

fn parse_tag_threshold(params: &[&str]) -> Result<PairTagThreshold> {
    let (tag, threshold, mode) = match params {
        [tag, threshold] => (tag, threshold, TagMode::Any),
        [tag, threshold, mode] => {
            let mode = match mode.to_ascii_lowercase().as_str() {
                "any" => TagMode::Any,
                "all" => TagMode::All,
                other => bail!("mode must be 'any' or 'all', got '{}'", other),
            };
            (tag, threshold, mode)
        }
        _ => bail!("expected PairTagThreshold:<TAG>:<N>[:any|:all]"),
    };

    let tag: [u8; 2] = match tag.as_bytes() {
        [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphanumeric() => [*a, *b],
        _ => bail!("invalid SAM tag '{}'", tag),
    };
    let threshold: i64 = threshold.parse().with_context(|| format!("invalid threshold '{}'", threshold))?;
    Ok(PairTagThreshold::new(tag, threshold, mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_read_lookup_is_case_insensitive() {
        for name in ["ContainSoftclip", "containsoftclip", "MEANMAPQ", " SoftclippedBases "] {
            assert!(single_read_stat(name).is_ok(), "{}", name);
        }
        assert_eq!(single_read_stat("meanmapq").unwrap().name(), "MeanMapq");
    }

    #[test]
    fn test_unknown_stat_lists_available_names() {
        let err = single_read_stat("Coverage").err().expect("expected an error").to_string();
        assert!(err.contains("Coverage"));
        assert!(err.contains("ContainIndel"));

        let err = pair_end_stat("ContainSoftclip").err().expect("expected an error").to_string();
        assert!(err.contains("PairContainSoftclip"));
    }

    #[test]
    fn test_parameters_rejected_where_not_taken() {
        assert!(single_read_stat("MeanMapq:20").is_err());
        assert!(pair_end_stat("PairContainSoftclip:1").is_err());
    }

    #[test]
    fn test_tag_threshold_parsing() {
        assert_eq!(pair_end_stat("PairTagThreshold:NM:3").unwrap().name(), "PairTagThreshold:NM:3");
        assert_eq!(pair_end_stat("pairtagthreshold:NM:3:ALL").unwrap().name(), "PairTagThreshold:NM:3:all");
        assert_eq!(pair_end_stat("PairTagThreshold:XS:-2:any").unwrap().name(), "PairTagThreshold:XS:-2");

        for bad in [
            "PairTagThreshold",
            "PairTagThreshold:NM",
            "PairTagThreshold:NMX:3",
            "PairTagThreshold:1M:3",
            "PairTagThreshold:NM:three",
            "PairTagThreshold:NM:3:some",
        ] {
            assert!(pair_end_stat(bad).is_err(), "{}", bad);
        }
    }
}
