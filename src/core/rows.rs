//! Tabular block lists
//!
//! The allocator's test harness can print its block list as CSV:
//!
//! ```text
//! address,size,is_allocated,is_free
//! 545345540000,64,true,false
//! 0x545345540040,128,false,true
//! ```
//!
//! The first line is a header and is skipped. Addresses are hex (an `0x`
//! prefix is optional), sizes are decimal, flags are `true` or `false`.

use crate::block::HeapBlock;
use crate::error::{HeapDumpError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const COLUMNS: usize = 4;

/// One row of a tabular block list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRow {
    pub address: u64,
    pub size: u64,
    pub is_allocated: bool,
    pub is_free: bool,
}

impl HeapBlock for BlockRow {
    fn address(&self) -> u64 {
        self.address
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn is_free(&self) -> bool {
        self.is_free
    }
}

impl std::fmt::Display for BlockRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Block({:#x} ({}), {}, {}, {})",
            self.address, self.address, self.size, self.is_allocated, self.is_free
        )
    }
}

/// Parse a CSV block list
///
/// Blank lines are skipped. Line numbers in errors are 1-based and count the
/// header.
pub fn parse_rows(text: &str) -> Result<Vec<BlockRow>> {
    let rows = text
        .lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_row(index + 1, line))
        .collect::<Result<Vec<_>>>()?;

    debug!("Parsed {} block rows", rows.len());
    Ok(rows)
}

fn parse_row(line: usize, text: &str) -> Result<BlockRow> {
    let columns: Vec<&str> = text.split(',').map(str::trim).collect();
    if columns.len() != COLUMNS {
        return Err(HeapDumpError::InvalidRow {
            line,
            reason: format!("expected {} columns, found {}", COLUMNS, columns.len()),
        });
    }

    let digits = columns[0]
        .strip_prefix("0x")
        .or_else(|| columns[0].strip_prefix("0X"))
        .unwrap_or(columns[0]);
    let address = u64::from_str_radix(digits, 16).map_err(|e| HeapDumpError::InvalidRow {
        line,
        reason: format!("address '{}': {}", columns[0], e),
    })?;

    let size = columns[1]
        .parse::<u64>()
        .map_err(|e| HeapDumpError::InvalidRow {
            line,
            reason: format!("size '{}': {}", columns[1], e),
        })?;

    Ok(BlockRow {
        address,
        size,
        is_allocated: parse_flag(line, "is_allocated", columns[2])?,
        is_free: parse_flag(line, "is_free", columns[3])?,
    })
}

fn parse_flag(line: usize, name: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(HeapDumpError::InvalidRow {
            line,
            reason: format!("{} must be true or false, found '{}'", name, value),
        }),
    }
}
