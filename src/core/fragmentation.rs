//! Free-list health of a heap snapshot
//!
//! A coalescing allocator merges a freed block with any free neighbour, so in
//! a healthy snapshot no two free blocks touch. Chains of touching free blocks
//! are therefore both what the free list *could* merge (free runs) and
//! evidence that it *failed* to (missed merges).

use crate::adjacency::AdjacencyReport;
use crate::block::HeapBlock;
use serde::{Deserialize, Serialize};

/// Contiguous stretch of free blocks, as a coalescing allocator would see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeRun {
    /// Start address of the run
    pub address: u64,
    /// Total bytes of all blocks in the run
    pub size: u64,
    /// Block identities in address order
    pub blocks: Vec<usize>,
}

impl FreeRun {
    fn start<B: HeapBlock>(id: usize, block: &B) -> Self {
        FreeRun {
            address: block.address(),
            size: block.size(),
            blocks: vec![id],
        }
    }

    pub fn end(&self) -> u64 {
        self.address.saturating_add(self.size)
    }

    /// Check if `block` continues this run
    fn is_continued_by<B: HeapBlock>(&self, block: &B) -> bool {
        block.is_free() && self.end() == block.address()
    }

    fn extend<B: HeapBlock>(&mut self, id: usize, block: &B) {
        self.size = self.size.saturating_add(block.size());
        self.blocks.push(id);
    }
}

/// Two touching free blocks the allocator should have merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedMerge {
    /// Lower-address block
    pub first: usize,
    /// Higher-address block
    pub second: usize,
    /// Shared boundary
    pub boundary: u64,
}

/// Totals and free-list findings for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentationSummary {
    pub total_blocks: usize,
    pub free_blocks: usize,
    pub used_blocks: usize,
    pub reusable_blocks: usize,

    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_bytes: u64,

    /// Free runs in address order
    pub free_runs: Vec<FreeRun>,

    /// Size of the largest free run
    pub largest_free_run: u64,

    /// `1 - largest_free_run / free_bytes`, 0 when nothing is free
    pub fragmentation: f64,

    pub missed_merges: Vec<MissedMerge>,
}

impl FragmentationSummary {
    /// True when no free blocks were left unmerged
    pub fn free_list_is_coalesced(&self) -> bool {
        self.missed_merges.is_empty()
    }
}

/// Fragmentation ratio: `1 - largest / total`, clamped to `[0, 1]`
pub fn fragmentation_ratio(free_bytes: u64, largest_run: u64) -> f64 {
    if free_bytes == 0 {
        return 0.0;
    }

    let largest = largest_run.min(free_bytes) as f64;
    (1.0 - largest / free_bytes as f64).clamp(0.0, 1.0)
}

/// Summarize a snapshot given its adjacency analysis
///
/// Only neighbours in address order are linked, matching the analyzer. Blocks
/// sharing a start address never form a run.
pub fn summarize<B: HeapBlock>(blocks: &[B], adjacency: &AdjacencyReport) -> FragmentationSummary {
    let mut free_blocks = 0;
    let mut reusable_blocks = 0;
    let mut total_bytes = 0u64;
    let mut free_bytes = 0u64;

    for block in blocks {
        total_bytes = total_bytes.saturating_add(block.size());
        if block.is_free() {
            free_blocks += 1;
            free_bytes = free_bytes.saturating_add(block.size());
        }
        if block.is_reusable() {
            reusable_blocks += 1;
        }
    }

    let mut free_runs: Vec<FreeRun> = Vec::new();
    let mut missed_merges = Vec::new();
    let mut current: Option<FreeRun> = None;
    let mut previous: Option<usize> = None;

    for &id in &adjacency.order {
        let block = &blocks[id];

        if !block.is_free() {
            free_runs.extend(current.take());
            previous = None;
            continue;
        }

        match (current.as_mut(), previous) {
            (Some(run), Some(prev))
                if run.is_continued_by(block) && blocks[prev].address() != block.address() =>
            {
                missed_merges.push(MissedMerge {
                    first: prev,
                    second: id,
                    boundary: block.address(),
                });
                run.extend(id, block);
            }
            _ => {
                free_runs.extend(current.take());
                current = Some(FreeRun::start(id, block));
            }
        }

        previous = Some(id);
    }
    free_runs.extend(current);

    let largest_free_run = free_runs.iter().map(|r| r.size).max().unwrap_or(0);

    FragmentationSummary {
        total_blocks: blocks.len(),
        free_blocks,
        used_blocks: blocks.len() - free_blocks,
        reusable_blocks,
        total_bytes,
        free_bytes,
        used_bytes: total_bytes - free_bytes,
        free_runs,
        largest_free_run,
        fragmentation: fragmentation_ratio(free_bytes, largest_free_run),
        missed_merges,
    }
}
