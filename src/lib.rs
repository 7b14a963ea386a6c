//! # heapdump - Kernel Heap Dump Inspection
//!
//! `heapdump-rs` decodes the block metadata a kernel heap allocator dumps,
//! either to a `heap.raw` file or over a serial line, and checks it:
//!
//! - **Decoding** of raw 32-byte record arrays and framed serial streams
//! - **Advisory validation**: allocator address tags, zero sizes, implausible
//!   announced sizes, bad filenames
//! - **Adjacency analysis**: which blocks touch, overlap or share an address
//! - **Free-list checks**: free runs, fragmentation ratio, missed merges
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use heapdump_rs::{HeapDump, Result};
//!
//! # fn main() -> Result<()> {
//! // Decode a raw dump written by the kernel panic handler
//! let dump = HeapDump::open_raw("output/heap.raw")?;
//!
//! for warning in dump.warnings() {
//!     println!("{}", warning);
//! }
//!
//! if !dump.summary().free_list_is_coalesced() {
//!     println!("free list left {} merges undone", dump.summary().missed_merges.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Advanced Usage
//!
//! ```rust,no_run
//! use heapdump_rs::{AllocatorSignature, DecodeMode, HeapDumpBuilder, ReportPolicy, Result};
//!
//! # fn main() -> Result<()> {
//! let dump = HeapDumpBuilder::new()
//!     .mode(DecodeMode::FramedSerial)
//!     .signature(AllocatorSignature::TEST)
//!     .strict_overlap()
//!     .policy(ReportPolicy::FirstMatch)
//!     .open("COM2.out")?;
//!
//! println!("{}", dump);
//! # Ok(())
//! # }
//! ```

pub mod core;

// Re-export core modules so crate:: paths inside core resolve
pub use crate::core::{
    adjacency, block, decoder, error, fragmentation, render, rows, signature,
};

pub use crate::core::{
    adjacency::{AdjacencyReport, BlockAdjacency, DegeneratePair, Relation, ReportPolicy},
    block::{BlockRecord, HeapBlock, FRAMED_RECORD_SIZE, RAW_RECORD_SIZE},
    decoder::{
        Command, DecodeMode, DecodeOptions, DecodeWarning, DecodedStream, StreamHeader,
        WarningKind,
    },
    error::{HeapDumpError, Result},
    fragmentation::{FragmentationSummary, FreeRun, MissedMerge},
    rows::BlockRow,
    signature::AllocatorSignature,
};

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Provider of the bytes of one dump
///
/// Lets callers feed dumps from files, memory, or a capture of their own
/// without the decoder knowing where the bytes came from.
///
/// # Examples
///
/// ```rust,no_run
/// use heapdump_rs::{ByteSource, FileSource, HeapDumpBuilder};
///
/// fn inspect<S: ByteSource + ?Sized>(source: &S) -> heapdump_rs::Result<usize> {
///     let dump = HeapDumpBuilder::new().load(source)?;
///     Ok(dump.records().len())
/// }
///
/// inspect(&FileSource::new("output/heap.raw"))?;
/// inspect(&vec![0u8; 64])?;
/// # Ok::<(), heapdump_rs::HeapDumpError>(())
/// ```
pub trait ByteSource {
    /// Read the complete dump into memory
    fn load(&self) -> Result<Vec<u8>>;

    /// Human-readable name used in reports
    fn describe(&self) -> String;
}

/// Dump stored in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn load(&self) -> Result<Vec<u8>> {
        debug!("Reading dump from {:?}", self.path);
        Ok(std::fs::read(&self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl ByteSource for [u8] {
    fn load(&self) -> Result<Vec<u8>> {
        Ok(self.to_vec())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

impl ByteSource for Vec<u8> {
    fn load(&self) -> Result<Vec<u8>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

/// Serializable view of a whole inspection
#[derive(Debug, Serialize)]
pub struct Report<'a, B: Serialize> {
    pub source: &'a str,
    pub mode: Option<DecodeMode>,
    pub header: Option<&'a StreamHeader>,
    pub blocks: &'a [B],
    pub warnings: &'a [DecodeWarning],
    pub adjacency: &'a AdjacencyReport,
    pub summary: &'a FragmentationSummary,
}

/// A decoded and analyzed heap dump
///
/// # Examples
///
/// ```
/// use heapdump_rs::{BlockRecord, DecodeMode, HeapDump};
///
/// let bytes: Vec<u8> = [
///     BlockRecord::new(0x1000, 0x40, false, false),
///     BlockRecord::new(0x1040, 0x40, true, true),
/// ]
/// .iter()
/// .flat_map(|b| b.to_raw_bytes())
/// .collect();
///
/// let dump = HeapDump::from_bytes(&bytes, DecodeMode::RawArray).unwrap();
/// assert_eq!(dump.records().len(), 2);
/// assert!(dump.adjacency().blocks[0].is_adjacent_to(1));
/// ```
#[derive(Debug, Clone)]
pub struct HeapDump {
    source: String,
    stream: DecodedStream,
    adjacency: AdjacencyReport,
    summary: FragmentationSummary,
}

impl HeapDump {
    /// Decode a raw `heap.raw` dump with default options
    pub fn open_raw<P: AsRef<Path>>(path: P) -> Result<Self> {
        HeapDumpBuilder::new()
            .mode(DecodeMode::RawArray)
            .open(path)
    }

    /// Decode a framed serial capture with default options
    pub fn open_serial<P: AsRef<Path>>(path: P) -> Result<Self> {
        HeapDumpBuilder::new()
            .mode(DecodeMode::FramedSerial)
            .open(path)
    }

    /// Decode in-memory bytes with the defaults of `mode`
    pub fn from_bytes(bytes: &[u8], mode: DecodeMode) -> Result<Self> {
        HeapDumpBuilder::new().mode(mode).decode(bytes)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn mode(&self) -> DecodeMode {
        self.stream.mode
    }

    pub fn header(&self) -> Option<&StreamHeader> {
        self.stream.header.as_ref()
    }

    pub fn records(&self) -> &[BlockRecord] {
        &self.stream.records
    }

    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.stream.warnings
    }

    /// Full decoder output, including consumed and trailing byte counts
    pub fn stream(&self) -> &DecodedStream {
        &self.stream
    }

    pub fn adjacency(&self) -> &AdjacencyReport {
        &self.adjacency
    }

    pub fn summary(&self) -> &FragmentationSummary {
        &self.summary
    }

    pub fn report(&self) -> Report<'_, BlockRecord> {
        Report {
            source: &self.source,
            mode: Some(self.stream.mode),
            header: self.stream.header.as_ref(),
            blocks: &self.stream.records,
            warnings: &self.stream.warnings,
            adjacency: &self.adjacency,
            summary: &self.summary,
        }
    }

    /// Pretty-printed JSON of [`HeapDump::report`]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.report())?)
    }
}

impl std::fmt::Display for HeapDump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "=== {} ({:?}, {} blocks) ===",
            self.source,
            self.stream.mode,
            self.stream.records.len()
        )?;

        if let Some(header) = &self.stream.header {
            writeln!(
                f,
                "command: {:?}, filename: '{}', file size: {:#x}",
                header.command,
                header.filename_lossy(),
                header.file_size
            )?;
        }
        if self.stream.trailing > 0 {
            writeln!(f, "trailing bytes discarded: {}", self.stream.trailing)?;
        }

        render::write_blocks(f, &self.stream.records, &self.stream.warnings)?;
        writeln!(f, "--- adjacency ---")?;
        render::write_adjacency(f, &self.stream.records, &self.adjacency)?;
        writeln!(f, "--- summary ---")?;
        render::write_summary(f, &self.summary)
    }
}

/// Builder for customizing how a dump is decoded and analyzed
///
/// # Examples
///
/// ```rust,no_run
/// use heapdump_rs::{AllocatorSignature, HeapDumpBuilder};
///
/// # fn main() -> heapdump_rs::Result<()> {
/// // Check the main heap dump against the NOVA allocator tag
/// let dump = HeapDumpBuilder::new()
///     .signature(AllocatorSignature::MAIN)
///     .open("output/heap.raw")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HeapDumpBuilder {
    mode: DecodeMode,
    signature: Option<Option<AllocatorSignature>>,
    strict_overlap: bool,
    policy: ReportPolicy,
}

impl HeapDumpBuilder {
    /// Raw-array decoding, mode-default signature, report-both adjacency
    pub fn new() -> Self {
        HeapDumpBuilder {
            mode: DecodeMode::RawArray,
            signature: None,
            strict_overlap: false,
            policy: ReportPolicy::default(),
        }
    }

    pub fn mode(mut self, mode: DecodeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Require every address to carry `signature`
    pub fn signature(mut self, signature: AllocatorSignature) -> Self {
        self.signature = Some(Some(signature));
        self
    }

    /// Skip the address tag check even where the mode enables it
    pub fn without_signature(mut self) -> Self {
        self.signature = Some(None);
        self
    }

    /// Fail decoding when two blocks overlap
    pub fn strict_overlap(mut self) -> Self {
        self.strict_overlap = true;
        self
    }

    pub fn policy(mut self, policy: ReportPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Decoder options this builder resolves to
    pub fn options(&self) -> DecodeOptions {
        let defaults = DecodeOptions::for_mode(self.mode);
        DecodeOptions {
            mode: self.mode,
            signature: self.signature.unwrap_or(defaults.signature),
            strict_overlap: self.strict_overlap,
        }
    }

    /// Decode and analyze in-memory bytes
    pub fn decode(&self, bytes: &[u8]) -> Result<HeapDump> {
        self.inspect("<memory>".to_string(), bytes)
    }

    /// Load a dump from any source, then decode and analyze it
    pub fn load<S: ByteSource + ?Sized>(&self, source: &S) -> Result<HeapDump> {
        let bytes = source.load()?;
        self.inspect(source.describe(), &bytes)
    }

    /// Open a dump file, then decode and analyze it
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<HeapDump> {
        info!("Opening heap dump at {:?}", path.as_ref());
        self.load(&FileSource::new(path.as_ref()))
    }

    fn inspect(&self, source: String, bytes: &[u8]) -> Result<HeapDump> {
        let options = self.options();
        debug!("Decoding {} with {:?}", source, options);

        let stream = decoder::decode(bytes, &options)?;
        let adjacency = adjacency::analyze(&stream.records, self.policy);
        let summary = fragmentation::summarize(&stream.records, &adjacency);

        Ok(HeapDump {
            source,
            stream,
            adjacency,
            summary,
        })
    }
}

impl Default for HeapDumpBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An analyzed CSV block list
#[derive(Debug, Clone)]
pub struct RowDump {
    source: String,
    rows: Vec<BlockRow>,
    adjacency: AdjacencyReport,
    summary: FragmentationSummary,
}

impl RowDump {
    /// Load and analyze a CSV block list file
    pub fn open<P: AsRef<Path>>(path: P, policy: ReportPolicy) -> Result<Self> {
        info!("Opening block list at {:?}", path.as_ref());
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::analyze(path.as_ref().display().to_string(), &text, policy)
    }

    /// Analyze CSV text
    pub fn parse(text: &str, policy: ReportPolicy) -> Result<Self> {
        Self::analyze("<memory>".to_string(), text, policy)
    }

    fn analyze(source: String, text: &str, policy: ReportPolicy) -> Result<Self> {
        let rows = rows::parse_rows(text)?;
        let adjacency = adjacency::analyze(&rows, policy);
        let summary = fragmentation::summarize(&rows, &adjacency);

        Ok(RowDump {
            source,
            rows,
            adjacency,
            summary,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rows(&self) -> &[BlockRow] {
        &self.rows
    }

    pub fn adjacency(&self) -> &AdjacencyReport {
        &self.adjacency
    }

    pub fn summary(&self) -> &FragmentationSummary {
        &self.summary
    }

    pub fn report(&self) -> Report<'_, BlockRow> {
        Report {
            source: &self.source,
            mode: None,
            header: None,
            blocks: &self.rows,
            warnings: &[],
            adjacency: &self.adjacency,
            summary: &self.summary,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.report())?)
    }
}

impl std::fmt::Display for RowDump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== {} ({} rows) ===", self.source, self.rows.len())?;
        writeln!(
            f,
            "Does sorted data match original data? {}",
            self.adjacency.input_was_sorted()
        )?;
        writeln!(f, "--- adjacency ---")?;
        render::write_adjacency(f, &self.rows, &self.adjacency)?;
        writeln!(f, "--- summary ---")?;
        render::write_summary(f, &self.summary)
    }
}
