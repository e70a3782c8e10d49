//! 4.5.3 -Zip64 Extended Information Extra Field (0x0001)
//!
//! | Value                  | Size    | Description                                  |
//! | ---------------------- | ------- | -------------------------------------------- |
//! | `0x0001`               | 2 bytes | Tag for this "extra" block type              |
//! | Size                   | 2 bytes | Size of this "extra" block                   |
//! | Original Size          | 8 bytes | Original uncompressed file size              |
//! | Compressed Size        | 8 bytes | Size of compressed data                      |
//! | Relative Header Offset | 8 bytes | Offset of local header record                |
//! | Disk Start Number      | 4 bytes | Number of the disk on which this file starts |
//!
//! Each value is present only when the matching 32-bit header field holds the sentinel.

use core::mem;

use crate::extra_fields::UsedExtraField;
use crate::result::{ZipResult, invalid};
use crate::spec::ZIP64_BYTES_THR;

/// Zip64 extended information extra field
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Zip64ExtendedInformation {
    pub uncompressed_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub header_start: Option<u64>,
    pub disk_start: Option<u32>,
}

impl Zip64ExtendedInformation {
    const MAGIC: UsedExtraField = UsedExtraField::Zip64ExtendedInfo;

    /// Parse the payload of a `0x0001` block.
    ///
    /// The 32-bit values from the enclosing header decide which fields are present: a value is
    /// only read if its header field is the sentinel, in the fixed order uncompressed size,
    /// compressed size, header offset, disk start. Payload bytes left over after that are
    /// ignored.
    pub fn parse(
        payload: &[u8],
        uncompressed_size: u32,
        compressed_size: u32,
        header_start: u32,
        disk_start: u16,
    ) -> ZipResult<Self> {
        let mut cursor = payload;
        let mut take_u64 = |wanted: bool| -> ZipResult<Option<u64>> {
            if !wanted {
                return Ok(None);
            }
            let Some((head, rest)) = cursor.split_first_chunk::<8>() else {
                invalid!("ZIP64 extra-data field is the wrong length");
            };
            cursor = rest;
            Ok(Some(u64::from_le_bytes(*head)))
        };
        let uncompressed_size = take_u64(uncompressed_size as u64 == ZIP64_BYTES_THR)?;
        let compressed_size = take_u64(compressed_size as u64 == ZIP64_BYTES_THR)?;
        let header_start = take_u64(header_start as u64 == ZIP64_BYTES_THR)?;
        let disk_start = if disk_start == u16::MAX {
            let Some((head, _)) = cursor.split_first_chunk::<4>() else {
                invalid!("ZIP64 extra-data field is the wrong length");
            };
            Some(u32::from_le_bytes(*head))
        } else {
            None
        };
        Ok(Self {
            uncompressed_size,
            compressed_size,
            header_start,
            disk_start,
        })
    }

    /// The block for a local header, which MUST include BOTH original and compressed size.
    pub fn local_header(uncompressed_size: u64, compressed_size: u64) -> Option<Self> {
        if uncompressed_size < ZIP64_BYTES_THR && compressed_size < ZIP64_BYTES_THR {
            return None;
        }
        Some(Self {
            uncompressed_size: Some(uncompressed_size),
            compressed_size: Some(compressed_size),
            header_start: None,
            disk_start: None,
        })
    }

    /// The block for a central directory header, holding only the values that overflow.
    pub fn central_header(
        uncompressed_size: u64,
        compressed_size: u64,
        header_start: u64,
    ) -> Option<Self> {
        let overflow = |value: u64| (value >= ZIP64_BYTES_THR).then_some(value);
        let info = Self {
            uncompressed_size: overflow(uncompressed_size),
            compressed_size: overflow(compressed_size),
            header_start: overflow(header_start),
            disk_start: None,
        };
        (info != Self::default()).then_some(info)
    }

    fn payload_size(&self) -> u16 {
        let words = [self.uncompressed_size, self.compressed_size, self.header_start]
            .iter()
            .flatten()
            .count();
        let disk = if self.disk_start.is_some() {
            mem::size_of::<u32>()
        } else {
            0
        };
        (words * mem::size_of::<u64>() + disk) as u16
    }

    /// Get the full size of the block
    pub fn full_size(&self) -> usize {
        self.payload_size() as usize + mem::size_of::<UsedExtraField>() + mem::size_of::<u16>()
    }

    /// Serialize the block, tag and size included.
    pub fn serialize(&self) -> Box<[u8]> {
        let mut ret = Vec::with_capacity(self.full_size());
        ret.extend((Self::MAGIC as u16).to_le_bytes());
        ret.extend(self.payload_size().to_le_bytes());
        for value in [self.uncompressed_size, self.compressed_size, self.header_start]
            .into_iter()
            .flatten()
        {
            ret.extend(value.to_le_bytes());
        }
        if let Some(disk_start) = self.disk_start {
            ret.extend(disk_start.to_le_bytes());
        }
        debug_assert_eq!(ret.len(), self.full_size());
        ret.into_boxed_slice()
    }
}
