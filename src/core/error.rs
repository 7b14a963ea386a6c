use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeapDumpError {
    #[error(
        "Misaligned dump: {len} bytes is not a multiple of the {record_size}-byte record size \
         ({remainder} stray bytes starting at offset {offset:#x})"
    )]
    MisalignedLength {
        len: usize,
        record_size: usize,
        remainder: usize,
        offset: usize,
    },

    #[error("Unrecognized command byte {command:#04x} at offset {offset:#x}")]
    UnrecognizedCommand { command: u8, offset: usize },

    #[error("Truncated header: {field} needs {needed} bytes at offset {offset:#x}, {available} available")]
    TruncatedHeader {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Overlapping blocks: record {second} at {address:#x} starts inside record {first} (ends at {first_end:#x})")]
    OverlappingBlocks {
        first: usize,
        second: usize,
        address: u64,
        first_end: u64,
    },

    #[error("Invalid row on line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },

    #[error("Invalid allocator signature: {0} (expected none, test, nova or a hex tag)")]
    InvalidSignature(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HeapDumpError {
    /// True for errors that stop decoding because later bytes cannot be located
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            HeapDumpError::MisalignedLength { .. }
                | HeapDumpError::UnrecognizedCommand { .. }
                | HeapDumpError::TruncatedHeader { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, HeapDumpError>;
