//! Allocator address signatures
//!
//! The kernel maps each heap region at `u32::from_le_bytes(NAME) << 16`, so the
//! upper 16 bits of a 48-bit virtual address (bits 32..48) identify which
//! allocator owns a block. Bits 48..64 are zero for every valid heap address.

use crate::error::{HeapDumpError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Bit position of the tag inside an address
pub const TAG_SHIFT: u32 = 32;

/// Base address of a heap region named by four ASCII bytes
pub const fn region_base(name: &[u8; 4]) -> u64 {
    (u32::from_le_bytes(*name) as u64) << 16
}

/// Base of the test allocator's heap region ("TEST")
pub const TEST_HEAP_BASE: u64 = region_base(b"TEST");

/// Base of the main kernel heap region ("NOVA")
pub const MAIN_HEAP_BASE: u64 = region_base(b"NOVA");

/// Tag that addresses of one allocator instance carry in their high bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocatorSignature {
    tag: u16,
}

impl AllocatorSignature {
    /// Signature of the test allocator, used by serial dumps
    pub const TEST: AllocatorSignature = AllocatorSignature::from_region_base(TEST_HEAP_BASE);

    /// Signature of the main kernel heap
    pub const MAIN: AllocatorSignature = AllocatorSignature::from_region_base(MAIN_HEAP_BASE);

    pub const fn new(tag: u16) -> Self {
        AllocatorSignature { tag }
    }

    pub const fn from_region_base(base: u64) -> Self {
        AllocatorSignature {
            tag: (base >> TAG_SHIFT) as u16,
        }
    }

    pub fn tag(&self) -> u16 {
        self.tag
    }

    /// Everything above bit 32 of `address`, i.e. the tag plus the
    /// non-canonical upper bits
    pub fn tag_of(address: u64) -> u64 {
        address >> TAG_SHIFT
    }

    /// Check that `address` belongs to this allocator
    pub fn matches(&self, address: u64) -> bool {
        Self::tag_of(address) == self.tag as u64
    }
}

impl std::fmt::Display for AllocatorSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::TEST => write!(f, "test ({:#06x})", self.tag),
            Self::MAIN => write!(f, "nova ({:#06x})", self.tag),
            _ => write!(f, "{:#06x}", self.tag),
        }
    }
}

/// Parse a signature from a CLI-style name
///
/// Accepts `test`, `nova`/`main`, or a hex tag such as `0x5453`.
impl FromStr for AllocatorSignature {
    type Err = HeapDumpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "test" => Ok(Self::TEST),
            "nova" | "main" => Ok(Self::MAIN),
            other => {
                let digits = other.strip_prefix("0x").unwrap_or(other);
                u16::from_str_radix(digits, 16)
                    .map(Self::new)
                    .map_err(|_| HeapDumpError::InvalidSignature(s.to_string()))
            }
        }
    }
}
