//! Types for creating ZIP archives

use std::borrow::Cow;
use std::io::Write;

use log::debug;

use crate::archive::ZipArchive;
use crate::compression::{CodecRegistry, CompressionMethod};
use crate::cp437::encode_text;
use crate::crc32::crc32;
use crate::extra_fields::Zip64ExtendedInformation;
use crate::result::ZipResult;
use crate::spec::{
    self, CentralDirectoryRecord, FixedSizeBlock, Zip32CentralDirectoryEnd,
    Zip64CentralDirectoryEnd, Zip64CentralDirectoryEndLocator, ZipCentralEntryBlock,
    ZipDataDescriptor, ZipLocalEntry, ZipLocalEntryBlock,
};
use crate::types::{
    DEFAULT_VERSION, EntryData, FLAG_DATA_DESCRIPTOR, FLAG_ENCRYPTED, FLAG_UTF8, ZIP64_VERSION,
    ZipEntry,
};
use crate::zipcrypto;

/// The bytes and header values of one entry as it will be written.
struct StoredEntry<'a> {
    flags: u16,
    compression_method: CompressionMethod,
    version_needed: u16,
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
    /// DOS time and date for the local header.
    local_time: (u16, u16),
    data: Cow<'a, [u8]>,
}

impl StoredEntry<'_> {
    fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }
}

/// Clamp a size or offset to its 32-bit field, using the sentinel when Zip64 holds the value.
fn clamp_u32(value: u64) -> u32 {
    if value >= spec::ZIP64_BYTES_THR {
        u32::MAX
    } else {
        value as u32
    }
}

/// Work out what to write for `entry`.
///
/// An entry read from an archive and left untouched is copied as stored, encryption and data
/// descriptor included. Anything else is compressed, and encrypted if it has a password.
fn prepare<'a>(entry: &'a ZipEntry, codecs: &CodecRegistry) -> ZipResult<StoredEntry<'a>> {
    let time = entry.last_modified_time;
    if let (false, EntryData::Archived(buffer)) = (entry.modified, &entry.data) {
        let (local, stored) = entry.stored_data(buffer)?;
        // The Info-ZIP check byte inside the stored data was derived from this local time.
        let local_time = if entry.is_encrypted() && entry.has_data_descriptor() {
            (local.last_mod_time, local.last_mod_date)
        } else {
            (time.timepart(), time.datepart())
        };
        return Ok(StoredEntry {
            flags: entry.flags,
            compression_method: entry.compression_method,
            version_needed: entry.version_needed,
            crc32: entry.crc32,
            compressed_size: entry.compressed_size,
            uncompressed_size: entry.uncompressed_size,
            local_time,
            data: Cow::Borrowed(stored),
        });
    }

    let password = entry.password.as_deref().map(|password| &**password);
    let contents = entry.contents(codecs, password)?;
    let crc32 = crc32(&contents);
    let compressed = codecs
        .get(entry.compression_method)?
        .compress(&contents, entry.compression_level)?;
    let mut flags = entry.flags & FLAG_UTF8;
    let data = match password {
        Some(password) => {
            flags |= FLAG_ENCRYPTED;
            zipcrypto::encrypt(&compressed, crc32, password, entry.legacy_two_byte_check)?
        }
        None => compressed,
    };
    Ok(StoredEntry {
        flags,
        compression_method: entry.compression_method,
        version_needed: DEFAULT_VERSION as u16,
        crc32,
        compressed_size: data.len() as u64,
        uncompressed_size: contents.len() as u64,
        local_time: (time.timepart(), time.datepart()),
        data: Cow::Owned(data),
    })
}

/// Append the local header, data and data descriptor of `entry` to `out`, returning the
/// central directory record that points at them.
fn write_entry(
    out: &mut Vec<u8>,
    entry: &ZipEntry,
    codecs: &CodecRegistry,
) -> ZipResult<CentralDirectoryRecord> {
    let stored = prepare(entry, codecs)?;
    let header_start = out.len() as u64;
    let descriptor = stored.has_data_descriptor();

    let local_zip64 =
        Zip64ExtendedInformation::local_header(stored.uncompressed_size, stored.compressed_size);
    let central_zip64 = Zip64ExtendedInformation::central_header(
        stored.uncompressed_size,
        stored.compressed_size,
        header_start,
    );
    let version_needed = if central_zip64.is_some() || local_zip64.is_some() {
        stored.version_needed.max(ZIP64_VERSION as u16)
    } else {
        stored.version_needed
    };

    let mut local_extra = Vec::new();
    if let Some(zip64) = &local_zip64 {
        local_extra.extend_from_slice(&zip64.serialize());
    }
    local_extra.extend_from_slice(&entry.extra_field);
    // With a data descriptor the real values follow the data.
    let (local_crc32, local_compressed, local_uncompressed) = match (descriptor, &local_zip64) {
        (true, Some(_)) => (0, u32::MAX, u32::MAX),
        (false, Some(_)) => (stored.crc32, u32::MAX, u32::MAX),
        (true, None) => (0, 0, 0),
        (false, None) => (
            stored.crc32,
            stored.compressed_size as u32,
            stored.uncompressed_size as u32,
        ),
    };
    let time = entry.last_modified_time;
    let local = ZipLocalEntry {
        block: ZipLocalEntryBlock {
            version_needed,
            flags: stored.flags,
            compression_method: stored.compression_method.to_u16(),
            last_mod_time: stored.local_time.0,
            last_mod_date: stored.local_time.1,
            crc32: local_crc32,
            compressed_size: local_compressed,
            uncompressed_size: local_uncompressed,
            ..Default::default()
        },
        file_name: entry.raw_name.clone(),
        extra_field: local_extra.into(),
    };
    out.extend(local.encode()?);
    out.extend_from_slice(&stored.data);
    if descriptor {
        let data_descriptor = ZipDataDescriptor {
            crc32: stored.crc32,
            compressed_size: clamp_u32(stored.compressed_size),
            uncompressed_size: clamp_u32(stored.uncompressed_size),
        };
        out.extend(data_descriptor.encode());
    }

    let mut central_extra = Vec::new();
    if let Some(zip64) = &central_zip64 {
        central_extra.extend_from_slice(&zip64.serialize());
    }
    central_extra.extend_from_slice(&entry.extra_field);
    Ok(CentralDirectoryRecord {
        block: ZipCentralEntryBlock {
            version_made_by: entry.version_made_by,
            version_needed,
            flags: stored.flags,
            compression_method: stored.compression_method.to_u16(),
            last_mod_time: time.timepart(),
            last_mod_date: time.datepart(),
            crc32: stored.crc32,
            compressed_size: clamp_u32(stored.compressed_size),
            uncompressed_size: clamp_u32(stored.uncompressed_size),
            disk_number: 0,
            internal_file_attributes: entry.internal_attributes,
            external_file_attributes: entry.external_attributes,
            offset: clamp_u32(header_start),
            ..Default::default()
        },
        file_name: entry.raw_name.clone(),
        extra_field: central_extra.into(),
        file_comment: entry.raw_comment.clone(),
    })
}

fn write_central_and_footer(
    out: &mut Vec<u8>,
    records: &[CentralDirectoryRecord],
    comment: &[u8],
) -> ZipResult<()> {
    let central_start = out.len() as u64;
    let mut version_needed = DEFAULT_VERSION as u16;
    for record in records {
        out.extend(record.encode()?);
        version_needed = version_needed.max(record.block.version_needed);
    }
    let central_size = out.len() as u64 - central_start;

    if records.len() >= spec::ZIP64_ENTRY_THR
        || central_size.max(central_start) >= spec::ZIP64_BYTES_THR
    {
        let zip64_start = out.len() as u64;
        let zip64_footer = Zip64CentralDirectoryEnd {
            record_size: Zip64CentralDirectoryEnd::MINIMUM_RECORD_SIZE,
            version_made_by: version_needed,
            version_needed_to_extract: version_needed,
            disk_number: 0,
            disk_with_central_directory: 0,
            number_of_files_on_this_disk: records.len() as u64,
            number_of_files: records.len() as u64,
            central_directory_size: central_size,
            central_directory_offset: central_start,
        };
        out.extend(zip64_footer.encode());

        let locator = Zip64CentralDirectoryEndLocator {
            disk_with_central_directory: 0,
            end_of_central_directory_offset: zip64_start,
            number_of_disks: 1,
        };
        out.extend(locator.encode());
    }

    let number_of_files = records.len().min(spec::ZIP64_ENTRY_THR) as u16;
    let footer = Zip32CentralDirectoryEnd {
        disk_number: 0,
        disk_with_central_directory: 0,
        number_of_files_on_this_disk: number_of_files,
        number_of_files,
        central_directory_size: clamp_u32(central_size),
        central_directory_offset: clamp_u32(central_start),
        zip_file_comment: comment.into(),
    };
    out.extend(footer.encode()?);
    Ok(())
}

impl ZipArchive {
    /// Serialize the archive.
    ///
    /// Offsets are computed from scratch: the result never shares layout with the bytes the
    /// archive was read from, only the stored entry data.
    pub fn to_bytes(&self) -> ZipResult<Vec<u8>> {
        let codecs = &*self.config.codecs;
        let mut out = Vec::new();
        let mut records = Vec::with_capacity(self.entries.len());
        for entry in self.entries.values() {
            records.push(write_entry(&mut out, entry, codecs)?);
        }
        let (comment, _) = encode_text(&*self.config.name_codec, &self.comment);
        write_central_and_footer(&mut out, &records, &comment)?;
        debug!(
            "serialized {} entries into {} bytes",
            records.len(),
            out.len()
        );
        Ok(out)
    }

    /// Serialize the archive into `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> ZipResult<()> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }
}
