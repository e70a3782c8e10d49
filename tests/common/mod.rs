//! Hand-assembled archives, for layouts the high-level API never writes.
#![allow(dead_code)]

use zipkit::crc32;
use zipkit::spec::{
    CentralDirectoryRecord, FixedSizeBlock, Zip32CentralDirectoryEnd, Zip64CentralDirectoryEnd,
    Zip64CentralDirectoryEndLocator, ZipCentralEntryBlock, ZipLocalEntry, ZipLocalEntryBlock,
};

/// DOS date of 1980-01-01.
pub const EPOCH_DATE: u16 = 0x21;

#[derive(Clone, Debug, Default)]
pub struct RawEntry {
    pub name: Vec<u8>,
    pub flags: u16,
    pub method: u16,
    pub time: u16,
    pub date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    /// Offset written to the central record instead of the real one.
    pub offset: Option<u32>,
    pub local_extra: Vec<u8>,
    pub central_extra: Vec<u8>,
    /// Stored bytes, exactly as they appear after the local header.
    pub data: Vec<u8>,
    /// Bytes between the data and the next header, e.g. a data descriptor.
    pub trailer: Vec<u8>,
    /// Write zero CRC and sizes to the local header, as streaming writers do.
    pub zeroed_local: bool,
}

impl RawEntry {
    pub fn stored(name: &str, contents: &[u8]) -> Self {
        Self {
            name: name.into(),
            date: EPOCH_DATE,
            crc32: crc32(contents),
            compressed_size: contents.len() as u32,
            uncompressed_size: contents.len() as u32,
            data: contents.to_vec(),
            ..Default::default()
        }
    }
}

/// Local headers and data, followed by the central directory records.
pub fn entries_and_directory(entries: &[RawEntry]) -> (Vec<u8>, Vec<u8>) {
    let mut out = Vec::new();
    let mut central = Vec::new();
    for entry in entries {
        let offset = out.len() as u32;
        let (crc32, compressed_size, uncompressed_size) = if entry.zeroed_local {
            (0, 0, 0)
        } else {
            (entry.crc32, entry.compressed_size, entry.uncompressed_size)
        };
        let local = ZipLocalEntry {
            block: ZipLocalEntryBlock {
                version_needed: 20,
                flags: entry.flags,
                compression_method: entry.method,
                last_mod_time: entry.time,
                last_mod_date: entry.date,
                crc32,
                compressed_size,
                uncompressed_size,
                ..Default::default()
            },
            file_name: entry.name.clone().into(),
            extra_field: entry.local_extra.clone().into(),
        };
        out.extend(local.encode().unwrap());
        out.extend_from_slice(&entry.data);
        out.extend_from_slice(&entry.trailer);

        let record = CentralDirectoryRecord {
            block: ZipCentralEntryBlock {
                version_made_by: 20,
                version_needed: 20,
                flags: entry.flags,
                compression_method: entry.method,
                last_mod_time: entry.time,
                last_mod_date: entry.date,
                crc32: entry.crc32,
                compressed_size: entry.compressed_size,
                uncompressed_size: entry.uncompressed_size,
                offset: entry.offset.unwrap_or(offset),
                ..Default::default()
            },
            file_name: entry.name.clone().into(),
            extra_field: entry.central_extra.clone().into(),
            file_comment: Box::default(),
        };
        central.extend(record.encode().unwrap());
    }
    (out, central)
}

/// A complete archive with a plain end of central directory record.
pub fn build(entries: &[RawEntry], comment: &[u8]) -> Vec<u8> {
    let (mut out, central) = entries_and_directory(entries);
    let start = out.len() as u32;
    out.extend_from_slice(&central);
    let footer = Zip32CentralDirectoryEnd {
        number_of_files_on_this_disk: entries.len() as u16,
        number_of_files: entries.len() as u16,
        central_directory_size: central.len() as u32,
        central_directory_offset: start,
        zip_file_comment: comment.into(),
        ..Default::default()
    };
    out.extend(footer.encode().unwrap());
    out
}

/// A complete archive whose end record defers every value to a Zip64 end record.
pub fn build_zip64(entries: &[RawEntry]) -> Vec<u8> {
    let (mut out, central) = entries_and_directory(entries);
    let start = out.len() as u64;
    out.extend_from_slice(&central);
    let zip64_start = out.len() as u64;
    let zip64_footer = Zip64CentralDirectoryEnd {
        record_size: Zip64CentralDirectoryEnd::MINIMUM_RECORD_SIZE,
        version_made_by: 45,
        version_needed_to_extract: 45,
        number_of_files_on_this_disk: entries.len() as u64,
        number_of_files: entries.len() as u64,
        central_directory_size: central.len() as u64,
        central_directory_offset: start,
        ..Default::default()
    };
    out.extend(zip64_footer.encode());
    let locator = Zip64CentralDirectoryEndLocator {
        disk_with_central_directory: 0,
        end_of_central_directory_offset: zip64_start,
        number_of_disks: 1,
    };
    out.extend(locator.encode());
    let footer = Zip32CentralDirectoryEnd {
        number_of_files_on_this_disk: u16::MAX,
        number_of_files: u16::MAX,
        central_directory_size: u32::MAX,
        central_directory_offset: u32::MAX,
        ..Default::default()
    };
    out.extend(footer.encode().unwrap());
    out
}
