//! Interval adjacency analysis
//!
//! Sorts heap blocks by start address and checks each block against its
//! immediate neighbours in that order. Two blocks are adjacent when one ends
//! exactly where the other starts; size, allocation state and flags play no
//! part. This is a contiguity check over sorted intervals, not a general
//! interval-overlap detector: a block swallowed by a non-neighbouring block is
//! not reported here (see [`crate::decoder::check_overlaps`] for that).

use crate::block::HeapBlock;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How many adjacency relations a block keeps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportPolicy {
    /// Only the first adjacency, preferring the predecessor
    FirstMatch,
    /// Both the predecessor and the successor adjacency
    #[default]
    ReportBoth,
}

/// Relation between a block and one of its sorted neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "relation", content = "block", rename_all = "snake_case")]
pub enum Relation {
    /// Intervals share a boundary
    AdjacentTo(usize),
    /// Intervals intersect, which a healthy heap never shows
    Overlapping(usize),
    /// Both blocks start at the same address
    DuplicateAddress(usize),
}

impl Relation {
    /// Identity of the other block
    pub fn other(&self) -> usize {
        match *self {
            Relation::AdjacentTo(id) | Relation::Overlapping(id) | Relation::DuplicateAddress(id) => {
                id
            }
        }
    }
}

/// Two blocks with identical start addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegeneratePair {
    pub first: usize,
    pub second: usize,
    pub address: u64,
}

/// Adjacency result for one input block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAdjacency {
    /// Position of the block in the input
    pub id: usize,
    pub address: u64,
    pub end: u64,
    pub relations: Vec<Relation>,
}

impl BlockAdjacency {
    /// True when the block touches, overlaps or duplicates nothing
    pub fn is_isolated(&self) -> bool {
        self.relations.is_empty()
    }

    /// Blocks this one is adjacent to
    pub fn adjacent(&self) -> impl Iterator<Item = usize> + '_ {
        self.relations.iter().filter_map(|r| match r {
            Relation::AdjacentTo(id) => Some(*id),
            _ => None,
        })
    }

    /// Blocks this one overlaps
    pub fn overlapping(&self) -> impl Iterator<Item = usize> + '_ {
        self.relations.iter().filter_map(|r| match r {
            Relation::Overlapping(id) => Some(*id),
            _ => None,
        })
    }

    pub fn is_adjacent_to(&self, other: usize) -> bool {
        self.relations.contains(&Relation::AdjacentTo(other))
    }
}

/// Adjacency of every block in a heap snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyReport {
    pub policy: ReportPolicy,

    /// Block identities in ascending address order
    pub order: Vec<usize>,

    /// One entry per input block, indexed by identity
    pub blocks: Vec<BlockAdjacency>,

    /// Pairs of blocks sharing a start address
    pub degenerate: Vec<DegeneratePair>,
}

impl AdjacencyReport {
    pub fn get(&self, id: usize) -> Option<&BlockAdjacency> {
        self.blocks.get(id)
    }

    /// Entries in ascending address order
    pub fn in_address_order(&self) -> impl Iterator<Item = &BlockAdjacency> {
        self.order.iter().map(move |&id| &self.blocks[id])
    }

    /// Whether the input already was in address order
    pub fn input_was_sorted(&self) -> bool {
        self.order.iter().enumerate().all(|(pos, &id)| pos == id)
    }

    /// Touching pairs, lower address first, each reported once
    pub fn adjacent_pairs(&self) -> Vec<(usize, usize)> {
        self.order
            .windows(2)
            .filter(|w| {
                self.blocks[w[0]].is_adjacent_to(w[1]) || self.blocks[w[1]].is_adjacent_to(w[0])
            })
            .map(|w| (w[0], w[1]))
            .collect()
    }

    /// Overlapping pairs, lower address first
    pub fn overlapping_pairs(&self) -> Vec<(usize, usize)> {
        self.order
            .windows(2)
            .filter(|w| {
                self.blocks[w[0]]
                    .relations
                    .contains(&Relation::Overlapping(w[1]))
            })
            .map(|w| (w[0], w[1]))
            .collect()
    }

    pub fn isolated_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_isolated()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}

/// Analyze address contiguity between blocks
///
/// Identity of each block is its position in `blocks`; the input order is
/// never changed.
///
/// # Examples
///
/// ```
/// use heapdump_rs::adjacency::{analyze, ReportPolicy, Relation};
/// use heapdump_rs::BlockRecord;
///
/// let blocks = [
///     BlockRecord::new(0, 10, false, false),
///     BlockRecord::new(10, 5, true, false),
///     BlockRecord::new(100, 1, false, false),
/// ];
///
/// let report = analyze(&blocks, ReportPolicy::ReportBoth);
/// assert_eq!(report.blocks[0].relations, vec![Relation::AdjacentTo(1)]);
/// assert_eq!(report.blocks[1].relations, vec![Relation::AdjacentTo(0)]);
/// assert!(report.blocks[2].is_isolated());
/// ```
pub fn analyze<B: HeapBlock>(blocks: &[B], policy: ReportPolicy) -> AdjacencyReport {
    let mut order: Vec<usize> = (0..blocks.len()).collect();
    order.sort_by_key(|&i| (blocks[i].address(), i));

    let mut entries: Vec<BlockAdjacency> = blocks
        .iter()
        .enumerate()
        .map(|(id, block)| BlockAdjacency {
            id,
            address: block.address(),
            end: block.end(),
            relations: Vec::new(),
        })
        .collect();

    let mut degenerate = Vec::new();

    // Walking neighbouring pairs in address order pushes a block's
    // predecessor relation before its successor relation.
    for pair in order.windows(2) {
        let (low, high) = (pair[0], pair[1]);
        let (low_block, high_block) = (&blocks[low], &blocks[high]);

        if low_block.address() == high_block.address() {
            degenerate.push(DegeneratePair {
                first: low,
                second: high,
                address: low_block.address(),
            });
            entries[low].relations.push(Relation::DuplicateAddress(high));
            entries[high].relations.push(Relation::DuplicateAddress(low));
            continue;
        }

        if low_block.end() == high_block.address() {
            entries[low].relations.push(Relation::AdjacentTo(high));
            entries[high].relations.push(Relation::AdjacentTo(low));
        } else if high_block.address() < low_block.end() {
            entries[low].relations.push(Relation::Overlapping(high));
            entries[high].relations.push(Relation::Overlapping(low));
        }
    }

    if policy == ReportPolicy::FirstMatch {
        for entry in &mut entries {
            let mut seen_adjacent = false;
            entry.relations.retain(|relation| match relation {
                Relation::AdjacentTo(_) if seen_adjacent => false,
                Relation::AdjacentTo(_) => {
                    seen_adjacent = true;
                    true
                }
                _ => true,
            });
        }
    }

    let report = AdjacencyReport {
        policy,
        order,
        blocks: entries,
        degenerate,
    };

    debug!(
        "Adjacency: {} blocks, {} touching pairs, {} overlapping pairs, {} isolated, {} duplicate addresses",
        report.len(),
        report.adjacent_pairs().len(),
        report.overlapping_pairs().len(),
        report.isolated_count(),
        report.degenerate.len()
    );

    report
}
