//! Heap dump stream decoder
//!
//! Turns the bytes of a heap dump into [`BlockRecord`]s. Two layouts exist:
//!
//! - **Raw array** (`heap.raw`): a flat array of 32-byte records, no header.
//! - **Framed serial** (`COM2.out`): a file announcement header followed by
//!   back-to-back 18-byte records.
//!
//! ```text
//! ┌─────────┬────────┬──────────────┬───────────┬──────────────────────┐
//! │ command │ len: L │ filename (L) │ size: u32 │ records (18 bytes)…  │
//! │  0x01   │   u8   │  UTF-8 text  │    LE     │                      │
//! └─────────┴────────┴──────────────┴───────────┴──────────────────────┘
//! ```
//!
//! Only conditions that decide where later bytes live are fatal: a bad
//! command byte, a truncated header, or a raw dump whose length is not a
//! whole number of records. Everything else is recorded as a
//! [`DecodeWarning`] next to the affected record so a corrupted dump can still
//! be inspected in full.

use crate::block::{BlockRecord, HeapBlock, FRAMED_RECORD_SIZE, RAW_RECORD_SIZE};
use crate::error::{HeapDumpError, Result};
use crate::signature::AllocatorSignature;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, info, trace, warn};

/// Layout of the bytes handed to the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecodeMode {
    /// Flat array of 32-byte records
    RawArray,
    /// Command header followed by 18-byte records
    FramedSerial,
}

impl DecodeMode {
    /// Size of one record in this layout
    pub fn record_size(&self) -> usize {
        match self {
            DecodeMode::RawArray => RAW_RECORD_SIZE,
            DecodeMode::FramedSerial => FRAMED_RECORD_SIZE,
        }
    }
}

/// Command byte at the start of a framed stream
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// A file transfer follows: name, size, then the file contents
    FileAnnouncement = 0x01,
}

impl Command {
    /// Parse a command from its byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::FileAnnouncement),
            _ => None,
        }
    }
}

/// Header of a framed serial stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamHeader {
    pub command: Command,

    /// Filename bytes as sent, not necessarily valid UTF-8
    pub filename: Vec<u8>,

    /// Size the sender announced for the file
    pub file_size: u32,
}

impl StreamHeader {
    pub fn new(filename: impl Into<Vec<u8>>, file_size: u32) -> Self {
        StreamHeader {
            command: Command::FileAnnouncement,
            filename: filename.into(),
            file_size,
        }
    }

    /// Filename for display, with invalid UTF-8 replaced
    pub fn filename_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.filename)
    }

    /// Number of bytes the header occupies on the wire
    pub fn encoded_len(&self) -> usize {
        1 + 1 + self.filename.len() + 4
    }

    /// Serialize the header.
    ///
    /// Filenames longer than 255 bytes are truncated, since the length prefix
    /// is a single byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        let name_len = self.filename.len().min(u8::MAX as usize);
        let mut bytes = Vec::with_capacity(2 + name_len + 4);

        bytes.push(self.command as u8);
        bytes.push(name_len as u8);
        bytes.extend_from_slice(&self.filename[..name_len]);
        bytes.extend_from_slice(&self.file_size.to_le_bytes());

        bytes
    }
}

/// What went wrong in an advisory warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    /// Address does not carry the expected allocator tag
    SignatureMismatch { address: u64, expected: u16, found: u64 },

    /// Announced file size cannot fit in the stream that carries it
    ImplausibleFileSize { announced: u32, stream_len: usize },

    /// Filename is not valid UTF-8
    InvalidFilename { raw: Vec<u8> },

    /// Block spans zero bytes
    ZeroSize,

    /// `address + size` does not fit in 64 bits
    AddressOverflow { address: u64, size: u64 },

    /// Flag byte is neither 0 nor 1
    NonBooleanFlag { field: String, value: u8 },
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::SignatureMismatch {
                address,
                expected,
                found,
            } => write!(
                f,
                "invalid address {:#x}: tag {:#x} (expected {:#06x})",
                address, found, expected
            ),
            WarningKind::ImplausibleFileSize {
                announced,
                stream_len,
            } => write!(
                f,
                "announced file size {:#x} is implausible for a {}-byte stream",
                announced, stream_len
            ),
            WarningKind::InvalidFilename { raw } => {
                write!(f, "filename is not valid UTF-8: {:02x?}", raw)
            }
            WarningKind::ZeroSize => write!(f, "block has zero size"),
            WarningKind::AddressOverflow { address, size } => write!(
                f,
                "block end overflows: {:#x} + {:#x}",
                address, size
            ),
            WarningKind::NonBooleanFlag { field, value } => {
                write!(f, "{} flag byte is {:#04x}, read as false", field, value)
            }
        }
    }
}

/// Non-fatal anomaly found while decoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeWarning {
    /// Index of the affected record, `None` for stream-level warnings
    pub record: Option<usize>,

    /// Byte offset the anomaly was found at
    pub offset: usize,

    #[serde(flatten)]
    pub kind: WarningKind,
}

impl std::fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.record {
            Some(index) => write!(f, "block {} @ {:#x}: {}", index, self.offset, self.kind),
            None => write!(f, "stream @ {:#x}: {}", self.offset, self.kind),
        }
    }
}

/// Decoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub mode: DecodeMode,

    /// Tag every address must carry, `None` to skip the check
    pub signature: Option<AllocatorSignature>,

    /// Reject streams containing overlapping blocks
    pub strict_overlap: bool,
}

impl DecodeOptions {
    /// Defaults for `heap.raw` dumps: no signature check
    pub fn raw() -> Self {
        DecodeOptions {
            mode: DecodeMode::RawArray,
            signature: None,
            strict_overlap: false,
        }
    }

    /// Defaults for serial dumps: addresses must come from the test allocator
    pub fn framed() -> Self {
        DecodeOptions {
            mode: DecodeMode::FramedSerial,
            signature: Some(AllocatorSignature::TEST),
            strict_overlap: false,
        }
    }

    pub fn for_mode(mode: DecodeMode) -> Self {
        match mode {
            DecodeMode::RawArray => Self::raw(),
            DecodeMode::FramedSerial => Self::framed(),
        }
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::raw()
    }
}

/// Result of decoding one dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedStream {
    pub mode: DecodeMode,

    /// Present for framed streams only
    pub header: Option<StreamHeader>,

    pub records: Vec<BlockRecord>,

    /// Advisory warnings in the order they were found
    pub warnings: Vec<DecodeWarning>,

    /// Bytes consumed by the header and whole records
    pub consumed: usize,

    /// Bytes left over after the last whole record
    pub trailing: usize,
}

impl DecodedStream {
    /// Warnings attached to one record
    pub fn warnings_for(&self, index: usize) -> impl Iterator<Item = &DecodeWarning> {
        self.warnings
            .iter()
            .filter(move |w| w.record == Some(index))
    }

    /// Warnings about the stream itself rather than a record
    pub fn stream_warnings(&self) -> impl Iterator<Item = &DecodeWarning> {
        self.warnings.iter().filter(|w| w.record.is_none())
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Read position over a borrowed buffer
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn position(&self) -> usize {
        self.pos
    }

    /// Take `n` header bytes, failing if the stream ends first
    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(HeapDumpError::TruncatedHeader {
                field,
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }

        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn take_u32_le(&mut self, field: &'static str) -> Result<u32> {
        let slice = self.take(4, field)?;
        Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
    }

    /// Take the next framed record if a whole one remains
    fn next_record(&mut self) -> Option<&'a [u8; FRAMED_RECORD_SIZE]> {
        if self.remaining() < FRAMED_RECORD_SIZE {
            return None;
        }

        let slice = &self.bytes[self.pos..self.pos + FRAMED_RECORD_SIZE];
        self.pos += FRAMED_RECORD_SIZE;
        slice.try_into().ok()
    }
}

/// Decode a heap dump
///
/// # Errors
///
/// - `MisalignedLength` if a raw dump is not a whole number of records
/// - `UnrecognizedCommand` / `TruncatedHeader` if a framed header is unusable
/// - `OverlappingBlocks` if `strict_overlap` is set and two blocks overlap
///
/// # Examples
///
/// ```
/// use heapdump_rs::decoder::{decode, DecodeOptions};
/// use heapdump_rs::BlockRecord;
///
/// let mut bytes = Vec::new();
/// bytes.extend_from_slice(&BlockRecord::new(0x1000, 0x40, false, false).to_raw_bytes());
/// bytes.extend_from_slice(&BlockRecord::new(0x1040, 0x80, true, true).to_raw_bytes());
///
/// let stream = decode(&bytes, &DecodeOptions::raw()).unwrap();
/// assert_eq!(stream.records.len(), 2);
/// assert!(stream.is_clean());
/// ```
pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<DecodedStream> {
    let stream = match options.mode {
        DecodeMode::RawArray => decode_raw(bytes, options)?,
        DecodeMode::FramedSerial => decode_framed(bytes, options)?,
    };

    if options.strict_overlap {
        check_overlaps(&stream.records)?;
    }

    info!(
        "Decoded {} blocks from {} bytes ({:?}, {} warnings)",
        stream.records.len(),
        bytes.len(),
        stream.mode,
        stream.warnings.len()
    );

    Ok(stream)
}

fn decode_raw(bytes: &[u8], options: &DecodeOptions) -> Result<DecodedStream> {
    let remainder = bytes.len() % RAW_RECORD_SIZE;
    if remainder != 0 {
        return Err(HeapDumpError::MisalignedLength {
            len: bytes.len(),
            record_size: RAW_RECORD_SIZE,
            remainder,
            offset: bytes.len() - remainder,
        });
    }

    let mut records = Vec::with_capacity(bytes.len() / RAW_RECORD_SIZE);
    let mut warnings = Vec::new();

    for (index, chunk) in bytes.chunks_exact(RAW_RECORD_SIZE).enumerate() {
        let offset = index * RAW_RECORD_SIZE;
        let Ok(chunk) = <&[u8; RAW_RECORD_SIZE]>::try_from(chunk) else {
            continue;
        };

        let record = BlockRecord::from_raw_bytes(chunk);
        trace!("Block {} @ {:#x}: {}", index, offset, record);

        check_record(index, offset, &record, options, &mut warnings);
        records.push(record);
    }

    Ok(DecodedStream {
        mode: DecodeMode::RawArray,
        header: None,
        records,
        warnings,
        consumed: bytes.len(),
        trailing: 0,
    })
}

fn decode_framed(bytes: &[u8], options: &DecodeOptions) -> Result<DecodedStream> {
    let mut cursor = Cursor::new(bytes);
    let mut warnings = Vec::new();

    let command_offset = cursor.position();
    let command_byte = cursor.take_u8("command")?;
    let command =
        Command::from_u8(command_byte).ok_or(HeapDumpError::UnrecognizedCommand {
            command: command_byte,
            offset: command_offset,
        })?;

    let filename_len = cursor.take_u8("filename length")? as usize;
    let filename_offset = cursor.position();
    let filename = cursor.take(filename_len, "filename")?.to_vec();

    if std::str::from_utf8(&filename).is_err() {
        push_warning(
            &mut warnings,
            None,
            filename_offset,
            WarningKind::InvalidFilename {
                raw: filename.clone(),
            },
        );
    }

    let size_offset = cursor.position();
    let file_size = cursor.take_u32_le("file size")?;

    if file_size as usize >= bytes.len() {
        push_warning(
            &mut warnings,
            None,
            size_offset,
            WarningKind::ImplausibleFileSize {
                announced: file_size,
                stream_len: bytes.len(),
            },
        );
    }

    let header = StreamHeader {
        command,
        filename,
        file_size,
    };

    debug!(
        "Stream header: command {:?}, filename '{}', file size {:#x}",
        header.command,
        header.filename_lossy(),
        header.file_size
    );

    let mut records = Vec::with_capacity(cursor.remaining() / FRAMED_RECORD_SIZE);

    loop {
        let offset = cursor.position();
        let Some(chunk) = cursor.next_record() else {
            break;
        };

        let index = records.len();
        let fields = BlockRecord::fields_from_bytes(chunk);
        let record = BlockRecord::from_framed_bytes(chunk);
        trace!("Block {} @ {:#x}: {}", index, offset, record);

        for (field, value) in [("free", fields.free), ("reusable", fields.reusable)] {
            if value > 1 {
                push_warning(
                    &mut warnings,
                    Some(index),
                    offset,
                    WarningKind::NonBooleanFlag {
                        field: field.to_string(),
                        value,
                    },
                );
            }
        }

        check_record(index, offset, &record, options, &mut warnings);
        records.push(record);
    }

    let trailing = cursor.remaining();
    if trailing > 0 {
        debug!("Discarding {} trailing bytes", trailing);
    }

    Ok(DecodedStream {
        mode: DecodeMode::FramedSerial,
        header: Some(header),
        records,
        warnings,
        consumed: cursor.position(),
        trailing,
    })
}

/// Per-record advisory checks shared by both layouts
fn check_record(
    index: usize,
    offset: usize,
    record: &BlockRecord,
    options: &DecodeOptions,
    warnings: &mut Vec<DecodeWarning>,
) {
    if record.size == 0 {
        push_warning(warnings, Some(index), offset, WarningKind::ZeroSize);
    }

    if record.checked_end().is_none() {
        push_warning(
            warnings,
            Some(index),
            offset,
            WarningKind::AddressOverflow {
                address: record.address,
                size: record.size,
            },
        );
    }

    if let Some(signature) = options.signature {
        if !signature.matches(record.address) {
            push_warning(
                warnings,
                Some(index),
                offset,
                WarningKind::SignatureMismatch {
                    address: record.address,
                    expected: signature.tag(),
                    found: AllocatorSignature::tag_of(record.address),
                },
            );
        }
    }
}

fn push_warning(
    warnings: &mut Vec<DecodeWarning>,
    record: Option<usize>,
    offset: usize,
    kind: WarningKind,
) {
    let warning = DecodeWarning {
        record,
        offset,
        kind,
    };
    warn!("{}", warning);
    warnings.push(warning);
}

/// Verify that no two blocks overlap
///
/// Tracks the furthest end seen so far in address order, so a block buried
/// inside a large predecessor is caught even when it is not the immediate
/// neighbour.
pub fn check_overlaps<B: HeapBlock>(blocks: &[B]) -> Result<()> {
    let mut order: Vec<usize> = (0..blocks.len()).collect();
    order.sort_by_key(|&i| (blocks[i].address(), i));

    let mut furthest: Option<(usize, u64)> = None;

    for &index in &order {
        let block = &blocks[index];

        if let Some((owner, end)) = furthest {
            if block.address() < end {
                return Err(HeapDumpError::OverlappingBlocks {
                    first: owner,
                    second: index,
                    address: block.address(),
                    first_end: end,
                });
            }
        }

        match furthest {
            Some((_, end)) if end >= block.end() => {}
            _ => furthest = Some((index, block.end())),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::TEST_HEAP_BASE;

    fn framed(header: &StreamHeader, records: &[BlockRecord]) -> Vec<u8> {
        let mut bytes = header.to_bytes();
        for record in records {
            bytes.extend_from_slice(&record.to_framed_bytes());
        }
        bytes
    }

    #[test]
    fn test_raw_decodes_every_chunk() {
        let blocks = [
            BlockRecord::new(0x1000, 0x100, false, false),
            BlockRecord::new(0x1100, 0x200, true, true),
            BlockRecord::new(0x1300, 0x40, true, false),
        ];
        let bytes: Vec<u8> = blocks.iter().flat_map(|b| b.to_raw_bytes()).collect();

        let stream = decode(&bytes, &DecodeOptions::raw()).unwrap();
        assert_eq!(stream.records, blocks);
        assert_eq!(stream.consumed, bytes.len());
        assert!(stream.header.is_none());
    }

    #[test]
    fn test_raw_empty_buffer() {
        let stream = decode(&[], &DecodeOptions::raw()).unwrap();
        assert!(stream.records.is_empty());
    }

    #[test]
    fn test_raw_misaligned_reports_offset() {
        let bytes = vec![0u8; RAW_RECORD_SIZE * 2 + 5];

        match decode(&bytes, &DecodeOptions::raw()) {
            Err(HeapDumpError::MisalignedLength {
                len,
                remainder,
                offset,
                ..
            }) => {
                assert_eq!(len, 69);
                assert_eq!(remainder, 5);
                assert_eq!(offset, 64);
            }
            other => panic!("expected MisalignedLength, got {:?}", other),
        }
    }

    #[test]
    fn test_framed_header_fields() {
        let header = StreamHeader::new("heap.raw", 36);
        let block = BlockRecord::new(TEST_HEAP_BASE, 0x40, false, false);
        let bytes = framed(&header, &[block, block]);

        let stream = decode(&bytes, &DecodeOptions::framed()).unwrap();
        assert_eq!(stream.header, Some(header));
        assert_eq!(stream.records.len(), 2);
    }

    #[test]
    fn test_framed_rejects_unknown_command() {
        let bytes = [0x02, 0x03, b'a', b'b', b'c'];
        assert!(matches!(
            decode(&bytes, &DecodeOptions::framed()),
            Err(HeapDumpError::UnrecognizedCommand {
                command: 0x02,
                offset: 0
            })
        ));
    }

    #[test]
    fn test_framed_empty_stream_is_truncated() {
        assert!(matches!(
            decode(&[], &DecodeOptions::framed()),
            Err(HeapDumpError::TruncatedHeader {
                field: "command",
                ..
            })
        ));
    }

    #[test]
    fn test_framed_short_filename_is_truncated() {
        let bytes = [0x01, 0x08, b'a', b'b'];
        match decode(&bytes, &DecodeOptions::framed()) {
            Err(HeapDumpError::TruncatedHeader {
                field,
                offset,
                needed,
                available,
            }) => {
                assert_eq!(field, "filename");
                assert_eq!(offset, 2);
                assert_eq!(needed, 8);
                assert_eq!(available, 2);
            }
            other => panic!("expected TruncatedHeader, got {:?}", other),
        }
    }

    #[test]
    fn test_framed_invalid_filename_is_advisory() {
        let header = StreamHeader::new(vec![0xFF, 0xFE], 0);
        let bytes = framed(&header, &[BlockRecord::new(TEST_HEAP_BASE, 8, true, false)]);

        let stream = decode(&bytes, &DecodeOptions::framed()).unwrap();
        assert_eq!(stream.records.len(), 1);

        let warnings: Vec<_> = stream.stream_warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0].kind,
            WarningKind::InvalidFilename { .. }
        ));
        assert_eq!(warnings[0].offset, 2);
    }

    #[test]
    fn test_framed_implausible_size_is_advisory() {
        let header = StreamHeader::new("x", 0x1000);
        let bytes = framed(&header, &[BlockRecord::new(TEST_HEAP_BASE, 8, true, false)]);

        let stream = decode(&bytes, &DecodeOptions::framed()).unwrap();
        assert_eq!(stream.records.len(), 1);
        assert!(matches!(
            stream.warnings[0].kind,
            WarningKind::ImplausibleFileSize {
                announced: 0x1000,
                ..
            }
        ));
    }

    #[test]
    fn test_framed_trailing_bytes_discarded() {
        let header = StreamHeader::new("x", 18);
        let mut bytes = framed(&header, &[BlockRecord::new(TEST_HEAP_BASE, 8, true, false)]);
        bytes.extend_from_slice(&[0xAA; 17]);

        let stream = decode(&bytes, &DecodeOptions::framed()).unwrap();
        assert_eq!(stream.records.len(), 1);
        assert_eq!(stream.trailing, 17);
        assert_eq!(stream.consumed, bytes.len() - 17);
        assert!(stream.is_clean());
    }

    #[test]
    fn test_framed_non_boolean_flag() {
        let header = StreamHeader::new("x", 18);
        let mut bytes = framed(&header, &[BlockRecord::new(TEST_HEAP_BASE, 8, false, false)]);
        let flag_at = header.encoded_len() + 8;
        bytes[flag_at] = 7;

        let stream = decode(&bytes, &DecodeOptions::framed()).unwrap();
        assert!(!stream.records[0].is_free);
        assert_eq!(stream.warnings_for(0).count(), 1);
    }

    #[test]
    fn test_signature_mismatch_per_record() {
        let header = StreamHeader::new("x", 36);
        let bytes = framed(
            &header,
            &[
                BlockRecord::new(TEST_HEAP_BASE, 8, false, false),
                BlockRecord::new(0xDEAD_0000, 8, false, false),
            ],
        );

        let stream = decode(&bytes, &DecodeOptions::framed()).unwrap();
        assert_eq!(stream.warnings_for(0).count(), 0);

        let flagged: Vec<_> = stream.warnings_for(1).collect();
        assert_eq!(flagged.len(), 1);
        assert!(matches!(
            flagged[0].kind,
            WarningKind::SignatureMismatch {
                address: 0xDEAD_0000,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_size_and_overflow_warnings() {
        let bytes: Vec<u8> = [
            BlockRecord::new(0x1000, 0, false, false),
            BlockRecord::new(u64::MAX - 1, 8, false, false),
        ]
        .iter()
        .flat_map(|b| b.to_raw_bytes())
        .collect();

        let stream = decode(&bytes, &DecodeOptions::raw()).unwrap();
        assert_eq!(stream.warnings_for(0).next().unwrap().kind, WarningKind::ZeroSize);
        assert!(matches!(
            stream.warnings_for(1).next().unwrap().kind,
            WarningKind::AddressOverflow { .. }
        ));
    }

    #[test]
    fn test_strict_overlap_rejects() {
        let bytes: Vec<u8> = [
            BlockRecord::new(0x1000, 0x100, false, false),
            BlockRecord::new(0x1080, 0x100, false, false),
        ]
        .iter()
        .flat_map(|b| b.to_raw_bytes())
        .collect();

        assert!(decode(&bytes, &DecodeOptions::raw()).is_ok());

        let strict = DecodeOptions {
            strict_overlap: true,
            ..DecodeOptions::raw()
        };
        assert!(matches!(
            decode(&bytes, &strict),
            Err(HeapDumpError::OverlappingBlocks {
                first: 0,
                second: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_check_overlaps_sees_past_immediate_neighbour() {
        let blocks = [
            BlockRecord::new(0x1000, 0x1000, false, false),
            BlockRecord::new(0x1100, 0x10, false, false),
            BlockRecord::new(0x1200, 0x10, false, false),
        ];

        match check_overlaps(&blocks) {
            Err(HeapDumpError::OverlappingBlocks { first, second, .. }) => {
                assert_eq!(first, 0);
                assert_eq!(second, 1);
            }
            other => panic!("expected OverlappingBlocks, got {:?}", other),
        }
    }

    #[test]
    fn test_check_overlaps_allows_touching() {
        let blocks = [
            BlockRecord::new(0x1010, 0x10, false, false),
            BlockRecord::new(0x1000, 0x10, false, false),
        ];
        assert!(check_overlaps(&blocks).is_ok());
    }
}
