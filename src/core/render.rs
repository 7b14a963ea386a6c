//! Plain-text listings
//!
//! Advisory warnings are printed inline under the block they concern, so a
//! corrupted dump reads as a normal listing with the anomalies marked.

use crate::adjacency::{AdjacencyReport, Relation};
use crate::decoder::DecodeWarning;
use crate::fragmentation::FragmentationSummary;
use std::fmt::{self, Display, Write};

/// Prefix for advisory lines
pub const WARNING_MARK: &str = "!";

/// List blocks in input order with their warnings underneath
pub fn write_blocks<W: Write, B: Display>(
    out: &mut W,
    blocks: &[B],
    warnings: &[DecodeWarning],
) -> fmt::Result {
    for warning in warnings.iter().filter(|w| w.record.is_none()) {
        writeln!(out, "{} {}", WARNING_MARK, warning)?;
    }

    for (index, block) in blocks.iter().enumerate() {
        writeln!(out, "#{:<5} {}", index, block)?;
        for warning in warnings.iter().filter(|w| w.record == Some(index)) {
            writeln!(out, "       {} {}", WARNING_MARK, warning.kind)?;
        }
    }

    Ok(())
}

/// Describe each block's neighbours in address order
pub fn write_adjacency<W: Write, B: Display>(
    out: &mut W,
    blocks: &[B],
    report: &AdjacencyReport,
) -> fmt::Result {
    for entry in report.in_address_order() {
        let block = &blocks[entry.id];

        if entry.is_isolated() {
            writeln!(out, "Block #{} {} is not next to any other block", entry.id, block)?;
            continue;
        }

        for relation in &entry.relations {
            let other = relation.other();
            let verb = match relation {
                Relation::AdjacentTo(_) => "is next to",
                Relation::Overlapping(_) => "overlaps",
                Relation::DuplicateAddress(_) => "shares its address with",
            };
            writeln!(
                out,
                "Block #{} {} {} block #{} {}",
                entry.id, block, verb, other, blocks[other]
            )?;
        }
    }

    Ok(())
}

pub fn write_summary<W: Write>(out: &mut W, summary: &FragmentationSummary) -> fmt::Result {
    writeln!(
        out,
        "blocks: {} ({} free, {} used, {} reusable)",
        summary.total_blocks, summary.free_blocks, summary.used_blocks, summary.reusable_blocks
    )?;
    writeln!(
        out,
        "bytes:  {:#x} ({:#x} free, {:#x} used)",
        summary.total_bytes, summary.free_bytes, summary.used_bytes
    )?;
    writeln!(
        out,
        "free runs: {}, largest {:#x}, fragmentation {:.1}%",
        summary.free_runs.len(),
        summary.largest_free_run,
        summary.fragmentation * 100.0
    )?;

    if summary.free_list_is_coalesced() {
        writeln!(out, "free list: fully coalesced")?;
    } else {
        for merge in &summary.missed_merges {
            writeln!(
                out,
                "{} missed merge: free blocks #{} and #{} touch at {:#x}",
                WARNING_MARK, merge.first, merge.second, merge.boundary
            )?;
        }
    }

    Ok(())
}
