//! Durable record format
//!
//! The registry is persisted as one contiguous blob of fixed-size little-endian
//! records plus a separate record count:
//!
//! | offset | size | field                         |
//! |--------|------|-------------------------------|
//! | 0      | 8    | function entry address        |
//! | 8      | 4    | location kind                 |
//! | 12     | 4    | reserved (zero)               |
//! | 16     | 8    | location value                |
//! | 24     | 8    | defining address              |

use scroll::{Pread, Pwrite, LE};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::{Ea, LVar, LVarLocator, VarLocation, BADADDR};
use crate::error::{Error, Result};

/// Size in bytes of one encoded record
pub const RECORD_SIZE: usize = 32;

/// A variable marked superfluous in one function.
///
/// Two records are equal when function address, location and defining address all
/// match. Records have no ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SfLVar {
    pub func_ea: Ea,
    pub locator: LVarLocator,
}

impl SfLVar {
    pub fn new(func_ea: Ea, locator: LVarLocator) -> Self {
        Self { func_ea, locator }
    }

    /// Record for a variable of the function at `func_ea`
    pub fn for_lvar(func_ea: Ea, lvar: &LVar) -> Self {
        Self::new(func_ea, lvar.locator())
    }
}

impl Default for SfLVar {
    fn default() -> Self {
        Self::new(BADADDR, LVarLocator::default())
    }
}

impl fmt::Display for SfLVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "func {:#x}, def @ {:#x}, {}",
            self.func_ea, self.locator.defea, self.locator.location
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, scroll::Pread, scroll::Pwrite, scroll::SizeWith)]
#[repr(C)]
struct RawSfLVar {
    func_ea: u64,
    loc_kind: u32,
    reserved: u32,
    loc_value: u64,
    defea: u64,
}

impl From<&SfLVar> for RawSfLVar {
    fn from(record: &SfLVar) -> Self {
        let (loc_kind, loc_value) = record.locator.location.to_descriptor();
        Self {
            func_ea: record.func_ea,
            loc_kind,
            reserved: 0,
            loc_value,
            defea: record.locator.defea,
        }
    }
}

/// Serialize the whole record set
pub fn encode_records(records: &[SfLVar]) -> Result<Vec<u8>> {
    let mut blob = vec![0u8; records.len() * RECORD_SIZE];
    let mut offset = 0;
    for record in records {
        blob.gwrite_with(RawSfLVar::from(record), &mut offset, LE)?;
    }
    Ok(blob)
}

/// Deserialize `count` records stored under `node`
pub fn decode_records(blob: &[u8], count: usize, node: &str) -> Result<Vec<SfLVar>> {
    let needed = count
        .checked_mul(RECORD_SIZE)
        .ok_or_else(|| Error::corrupt_store(node, format!("record count {} overflows", count)))?;
    if blob.len() < needed {
        return Err(Error::corrupt_store(
            node,
            format!(
                "blob holds {} bytes, {} records need {}",
                blob.len(),
                count,
                needed
            ),
        ));
    }

    let mut records = Vec::with_capacity(count);
    let mut offset = 0;
    for i in 0..count {
        let raw: RawSfLVar = blob.gread_with(&mut offset, LE)?;
        let location = VarLocation::from_descriptor(raw.loc_kind, raw.loc_value).ok_or_else(|| {
            Error::corrupt_store(
                node,
                format!("record {} has unknown location kind {}", i, raw.loc_kind),
            )
        })?;
        records.push(SfLVar::new(
            raw.func_ea,
            LVarLocator::new(location, raw.defea),
        ));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scroll::ctx::SizeWith;

    #[test]
    fn test_record_size_matches_layout() {
        assert_eq!(RawSfLVar::size_with(&LE), RECORD_SIZE);
    }

    #[test]
    fn test_encoded_layout() {
        let record = SfLVar::new(
            0x1000,
            LVarLocator::new(VarLocation::Stack { offset: -8 }, 0x1004),
        );
        let blob = encode_records(&[record]).unwrap();
        assert_eq!(blob.len(), RECORD_SIZE);
        assert_eq!(&blob[0..8], &0x1000u64.to_le_bytes());
        assert_eq!(&blob[8..12], &2u32.to_le_bytes());
        assert_eq!(&blob[16..24], &(-8i64 as u64).to_le_bytes());
        assert_eq!(&blob[24..32], &0x1004u64.to_le_bytes());

        assert_eq!(decode_records(&blob, 1, "n").unwrap(), vec![record]);
    }

    #[test]
    fn test_decode_short_blob_is_corrupt() {
        let blob = vec![0u8; RECORD_SIZE];
        assert!(matches!(
            decode_records(&blob, 2, "n"),
            Err(Error::CorruptStore { .. })
        ));
    }

    #[test]
    fn test_decode_unknown_location_kind_is_corrupt() {
        let mut blob = vec![0u8; RECORD_SIZE];
        blob[8] = 0x7f;
        assert!(matches!(
            decode_records(&blob, 1, "n"),
            Err(Error::CorruptStore { .. })
        ));
    }

    #[test]
    fn test_records_compare_on_all_identity_fields() {
        let loc = VarLocation::Register { reg: 1 };
        let a = SfLVar::new(0x1000, LVarLocator::new(loc, 0x1004));
        assert_eq!(a, SfLVar::new(0x1000, LVarLocator::new(loc, 0x1004)));
        assert_ne!(a, SfLVar::new(0x2000, LVarLocator::new(loc, 0x1004)));
        assert_ne!(a, SfLVar::new(0x1000, LVarLocator::new(loc, 0x1008)));
        assert_ne!(
            a,
            SfLVar::new(
                0x1000,
                LVarLocator::new(VarLocation::Register { reg: 2 }, 0x1004)
            )
        );
    }
}
