//! Heap dump decoding and analysis
//!
//! - [`block`] - Block records and the [`block::HeapBlock`] interval view
//! - [`signature`] - Allocator address tags
//! - [`decoder`] - Raw and framed dump decoding with advisory warnings
//! - [`adjacency`] - Address contiguity between sorted blocks
//! - [`fragmentation`] - Free runs, missed merges and fragmentation ratio
//! - [`rows`] - CSV block lists
//! - [`render`] - Plain-text listings

pub mod adjacency;
pub mod block;
pub mod decoder;
pub mod error;
pub mod fragmentation;
pub mod render;
pub mod rows;
pub mod signature;

pub use adjacency::{analyze, AdjacencyReport, BlockAdjacency, DegeneratePair, Relation, ReportPolicy};
pub use block::{BlockRecord, HeapBlock, FRAMED_RECORD_SIZE, RAW_RECORD_SIZE};
pub use decoder::{
    decode, Command, DecodeMode, DecodeOptions, DecodeWarning, DecodedStream, StreamHeader,
    WarningKind,
};
pub use error::{HeapDumpError, Result};
pub use fragmentation::{summarize, FragmentationSummary, FreeRun, MissedMerge};
pub use rows::{parse_rows, BlockRow};
pub use signature::AllocatorSignature;
