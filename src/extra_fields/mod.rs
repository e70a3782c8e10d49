//! Types for extra fields

mod zip64_extended_information;

pub use zip64_extended_information::Zip64ExtendedInformation;

use crate::result::ZipResult;

/// Extra field used in this crate
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum UsedExtraField {
    /// ZIP64 extended information extra field
    Zip64ExtendedInfo = 0x0001,
}

/// One `(tag, payload)` block of an extra field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraFieldBlock<'a> {
    pub tag: u16,
    pub payload: &'a [u8],
}

/// Iterate over the blocks of an extra field.
///
/// Iteration stops at the first block whose declared size runs past the end of the field; such
/// trailing bytes are treated as opaque padding, as other readers do.
pub fn blocks(extra_field: &[u8]) -> impl Iterator<Item = ExtraFieldBlock<'_>> {
    let mut rest = extra_field;
    std::iter::from_fn(move || {
        let (head, tail) = rest.split_first_chunk::<4>()?;
        let tag = u16::from_le_bytes([head[0], head[1]]);
        let len = u16::from_le_bytes([head[2], head[3]]) as usize;
        if tail.len() < len {
            return None;
        }
        let (payload, tail) = tail.split_at(len);
        rest = tail;
        Some(ExtraFieldBlock { tag, payload })
    })
}

/// Split a central directory extra field into its Zip64 information and everything else.
///
/// The 32-bit header values decide which Zip64 fields are expected. The returned bytes hold the
/// remaining blocks unchanged, so the Zip64 block can be regenerated on write.
pub(crate) fn take_zip64(
    extra_field: &[u8],
    uncompressed_size: u32,
    compressed_size: u32,
    header_start: u32,
    disk_start: u16,
) -> ZipResult<(Option<Zip64ExtendedInformation>, Vec<u8>)> {
    let mut zip64 = None;
    let mut remaining = Vec::with_capacity(extra_field.len());
    let mut consumed = 0;
    for block in blocks(extra_field) {
        consumed += 4 + block.payload.len();
        if block.tag == UsedExtraField::Zip64ExtendedInfo as u16 && zip64.is_none() {
            zip64 = Some(Zip64ExtendedInformation::parse(
                block.payload,
                uncompressed_size,
                compressed_size,
                header_start,
                disk_start,
            )?);
            continue;
        }
        remaining.extend((block.tag).to_le_bytes());
        remaining.extend((block.payload.len() as u16).to_le_bytes());
        remaining.extend_from_slice(block.payload);
    }
    remaining.extend_from_slice(&extra_field[consumed..]);
    Ok((zip64, remaining))
}
