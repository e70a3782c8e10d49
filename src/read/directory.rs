//! Building entries from the central directory.

use std::sync::Arc;

use indexmap::IndexMap;
use log::warn;

use crate::compression::CompressionMethod;
use crate::cp437::{NameCodec, decode_text};
use crate::extra_fields::take_zip64;
use crate::read::Config;
use crate::read::locator::CentralDirectoryInfo;
use crate::result::{ZipError, ZipResult, invalid};
use crate::spec::{CentralDirectoryRecord, FixedSizeBlock, ZipCentralEntryBlock};
use crate::types::{DateTime, FLAG_UTF8, ZipEntry};

/// Decode the central directory record starting at `position`.
///
/// Returns the entry and the size of the record.
fn central_header_to_zip_entry(
    buffer: &Arc<[u8]>,
    position: u64,
    archive_offset: u64,
    name_codec: &dyn NameCodec,
) -> ZipResult<(ZipEntry, usize)> {
    let Some(rest) = usize::try_from(position)
        .ok()
        .and_then(|position| buffer.get(position..))
    else {
        invalid!("central directory record at {} is past the end of the archive", position);
    };
    let block = ZipCentralEntryBlock::decode(rest)?;
    let size = block.entry_header_size();
    let Some(record) = rest.get(..size) else {
        invalid!("central directory record extends past the end of the archive");
    };
    let record = CentralDirectoryRecord::decode(record)?;

    let is_utf8 = block.flags & FLAG_UTF8 != 0;
    let name = decode_text(name_codec, &record.file_name, is_utf8);
    let comment = decode_text(name_codec, &record.file_comment, is_utf8);
    let (zip64, extra_field) = take_zip64(
        &record.extra_field,
        block.uncompressed_size,
        block.compressed_size,
        block.offset,
        block.disk_number,
    )?;
    let zip64 = zip64.unwrap_or_default();

    let mut entry = ZipEntry::archived(
        name.into(),
        record.file_name,
        comment.into(),
        record.file_comment,
        Arc::clone(buffer),
    );
    entry.extra_field = extra_field.into();
    entry.compression_method = CompressionMethod::from_u16(block.compression_method);
    entry.stored_method = entry.compression_method;
    entry.last_modified_time = DateTime::from_msdos(block.last_mod_date, block.last_mod_time);
    entry.crc32 = block.crc32;
    entry.compressed_size = zip64
        .compressed_size
        .unwrap_or(block.compressed_size as u64);
    entry.uncompressed_size = zip64
        .uncompressed_size
        .unwrap_or(block.uncompressed_size as u64);
    entry.flags = block.flags;
    entry.version_made_by = block.version_made_by;
    entry.version_needed = block.version_needed;
    entry.internal_attributes = block.internal_file_attributes;
    entry.external_attributes = block.external_file_attributes;
    let offset = zip64.header_start.unwrap_or(block.offset as u64);
    entry.header_start = offset
        .checked_add(archive_offset)
        .ok_or(ZipError::InvalidArchive("local header offset overflows".into()))?;
    Ok((entry, size))
}

/// Walk the central directory described by `info`, in on-disk order.
///
/// A later record with the same name as an earlier one replaces it, keeping the earlier
/// position. A malformed record fails the whole walk with [`ZipError::CorruptDirectory`],
/// unless [`Config::lenient_directory`] is set, in which case the entries read so far are kept.
pub(crate) fn read_entries(
    buffer: &Arc<[u8]>,
    info: &CentralDirectoryInfo,
    config: &Config,
) -> ZipResult<IndexMap<Box<str>, ZipEntry>> {
    let mut entries = IndexMap::with_capacity(info.number_of_files);
    let mut position = info.directory_start;
    for index in 0..info.number_of_files {
        match central_header_to_zip_entry(
            buffer,
            position,
            info.archive_offset,
            &*config.name_codec,
        ) {
            Ok((entry, size)) => {
                position += size as u64;
                entries.insert(entry.name.clone(), entry);
            }
            Err(source) if config.lenient_directory => {
                warn!(
                    "stopping at corrupt central directory record #{index} of {}: {source}",
                    info.number_of_files
                );
                break;
            }
            Err(source) => {
                return Err(ZipError::CorruptDirectory {
                    index,
                    source: Box::new(source),
                });
            }
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spec::{ZIP64_BYTES_THR, ZipCentralEntryBlock};

    fn record(name: &str, extra: &[u8], offset: u32, sizes: (u32, u32)) -> Vec<u8> {
        CentralDirectoryRecord {
            block: ZipCentralEntryBlock {
                version_made_by: 0x0314,
                version_needed: 20,
                compressed_size: sizes.0,
                uncompressed_size: sizes.1,
                offset,
                ..Default::default()
            },
            file_name: name.as_bytes().into(),
            extra_field: extra.into(),
            file_comment: Box::default(),
        }
        .encode()
        .unwrap()
    }

    fn info(files: usize, size: usize) -> CentralDirectoryInfo {
        CentralDirectoryInfo {
            archive_offset: 0,
            directory_start: 0,
            directory_size: size as u64,
            number_of_files: files,
            eocd_position: size as u64,
            is_zip64: false,
            comment: Box::default(),
        }
    }

    #[test]
    fn order_and_duplicates() {
        let mut directory = record("b", b"", 0, (0, 0));
        directory.extend(record("a", b"", 10, (0, 0)));
        directory.extend(record("b", b"", 20, (0, 0)));
        let buffer: Arc<[u8]> = directory.into();
        let entries = read_entries(&buffer, &info(3, buffer.len()), &Config::default()).unwrap();
        let names: Vec<&str> = entries.keys().map(|k| &**k).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(entries["b"].header_start(), 20);
    }

    #[test]
    fn zip64_sentinel_sizes() {
        let mut extra = vec![1, 0, 16, 0];
        extra.extend(5_000_000_000u64.to_le_bytes());
        extra.extend(4_000_000_000u64.to_le_bytes());
        let directory = record("big", &extra, 0, (u32::MAX, u32::MAX));
        let buffer: Arc<[u8]> = directory.into();
        let entries = read_entries(&buffer, &info(1, buffer.len()), &Config::default()).unwrap();
        let entry = &entries["big"];
        assert_eq!(entry.size(), 5_000_000_000);
        assert_eq!(entry.compressed_size(), 4_000_000_000);
        assert!(entry.compressed_size() > ZIP64_BYTES_THR);
        assert!(entry.extra_data().is_empty());
    }

    #[test]
    fn strict_and_lenient_walk() {
        let mut directory = record("a", b"", 0, (0, 0));
        directory.extend(record("b", b"", 0, (0, 0)));
        directory.extend(b"garbage that is not a directory record at all, no no no");
        let buffer: Arc<[u8]> = directory.into();
        let info = info(3, buffer.len());

        match read_entries(&buffer, &info, &Config::default()) {
            Err(ZipError::CorruptDirectory { index, source }) => {
                assert_eq!(index, 2);
                assert!(matches!(*source, ZipError::InvalidSignature { .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let lenient = Config::default().lenient_directory(true);
        let entries = read_entries(&buffer, &info, &lenient).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn truncated_record() {
        let mut directory = record("name.txt", b"", 0, (0, 0));
        directory.truncate(50);
        let buffer: Arc<[u8]> = directory.into();
        let result = read_entries(&buffer, &info(1, buffer.len()), &Config::default());
        assert!(matches!(
            result,
            Err(ZipError::CorruptDirectory { index: 0, .. })
        ));
    }
}
