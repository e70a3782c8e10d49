//! Finding the end of central directory record and the directory it describes.

use log::warn;
use memchr::memmem::FinderRev;

use crate::result::{ZipError, ZipResult, invalid};
use crate::spec::{
    self, FixedSizeBlock, Zip32CDEBlock, Zip32CentralDirectoryEnd, Zip64CentralDirectoryEnd,
    Zip64CentralDirectoryEndLocator, ZipCentralEntryBlock,
};

/// The end of central directory record can only be followed by its comment, so it starts at
/// most this many bytes before the end of the archive.
const MAX_EOCD_DISTANCE: usize = Zip32CDEBlock::SIZE + u16::MAX as usize;
/// Most archives have no or a short comment; look at this many trailing bytes first.
const QUICK_SEARCH_WINDOW: usize = 1024;

/// Where the central directory lives, after reconciling the 32-bit and Zip64 end records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryInfo {
    /// Bytes prepended to the archive (e.g. a self-extractor stub); added to every offset.
    pub archive_offset: u64,
    /// Absolute position of the first central directory record.
    pub directory_start: u64,
    pub directory_size: u64,
    pub number_of_files: usize,
    /// Absolute position of the 32-bit end of central directory record.
    pub eocd_position: u64,
    pub is_zip64: bool,
    pub comment: Box<[u8]>,
}

/// Search `haystack` from its end for `magic`, returning candidate positions last to first.
fn rfind_all<'a>(haystack: &'a [u8], magic: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    let finder = FinderRev::new(magic);
    let mut end = haystack.len();
    std::iter::from_fn(move || {
        let position = finder.rfind(&haystack[..end])?;
        // Allow overlapping candidates: the next search must still see position + 1.
        end = position + magic.len() - 1;
        Some(position)
    })
}

/// Find the end of central directory record.
///
/// A candidate signature is only accepted if its comment ends exactly at the end of the
/// buffer, so a signature that appears inside the comment itself is skipped.
pub fn find_eocd(buffer: &[u8]) -> ZipResult<(u64, Zip32CentralDirectoryEnd)> {
    let magic = spec::CENTRAL_DIRECTORY_END_SIGNATURE.to_le_bytes();
    for window in [QUICK_SEARCH_WINDOW, MAX_EOCD_DISTANCE] {
        let search_start = buffer.len().saturating_sub(window);
        for offset in rfind_all(&buffer[search_start..], &magic) {
            let position = search_start + offset;
            let Some(block) = buffer.get(position..position + Zip32CDEBlock::SIZE) else {
                continue;
            };
            let comment_length = u16::from_le_bytes([block[20], block[21]]) as usize;
            if position + Zip32CDEBlock::SIZE + comment_length == buffer.len() {
                let footer = Zip32CentralDirectoryEnd::decode(&buffer[position..])?;
                return Ok((position as u64, footer));
            }
        }
        if search_start == 0 {
            break;
        }
    }
    Err(ZipError::NotAZipArchive)
}

/// Locate the Zip64 end of central directory record through the locator that precedes the
/// 32-bit record, if there is one.
///
/// Returns the absolute position of the Zip64 record and the record itself.
fn find_zip64_eocd(
    buffer: &[u8],
    eocd_position: usize,
) -> ZipResult<Option<(u64, Zip64CentralDirectoryEnd)>> {
    let Some(locator_position) = eocd_position.checked_sub(Zip64CentralDirectoryEndLocator::SIZE)
    else {
        return Ok(None);
    };
    let Ok(locator) = Zip64CentralDirectoryEndLocator::decode(&buffer[locator_position..]) else {
        return Ok(None);
    };

    // The locator's offset does not account for prepended data. Trust it when it points at a
    // Zip64 record, otherwise take the last Zip64 record before the locator.
    let declared = locator.end_of_central_directory_offset;
    let at_declared = usize::try_from(declared)
        .ok()
        .filter(|&position| position < locator_position)
        .and_then(|position| {
            Zip64CentralDirectoryEnd::decode(&buffer[position..locator_position]).ok()
        });
    if let Some(record) = at_declared {
        return Ok(Some((declared, record)));
    }

    let magic = spec::ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE.to_le_bytes();
    for position in rfind_all(&buffer[..locator_position], &magic) {
        if let Ok(record) = Zip64CentralDirectoryEnd::decode(&buffer[position..locator_position])
        {
            return Ok(Some((position as u64, record)));
        }
    }
    invalid!("zip64 locator present but no zip64 end of central directory record found")
}

/// Work out where the central directory is and how many records it holds.
pub fn locate(buffer: &[u8]) -> ZipResult<CentralDirectoryInfo> {
    let (eocd_position, footer) = find_eocd(buffer)?;
    if footer.disk_number != footer.disk_with_central_directory {
        invalid!("multi-disk archives are not supported");
    }

    let mut number_of_files = footer.number_of_files as u64;
    let mut directory_size = footer.central_directory_size as u64;
    let mut directory_offset = footer.central_directory_offset as u64;
    let mut directory_end = eocd_position;
    let mut is_zip64 = false;

    if let Some((zip64_position, zip64)) = find_zip64_eocd(buffer, eocd_position as usize)? {
        if zip64.disk_number != zip64.disk_with_central_directory {
            invalid!("multi-disk archives are not supported");
        }
        if footer.number_of_files as usize == spec::ZIP64_ENTRY_THR {
            number_of_files = zip64.number_of_files;
        }
        if footer.central_directory_size as u64 == spec::ZIP64_BYTES_THR {
            directory_size = zip64.central_directory_size;
        }
        if footer.central_directory_offset as u64 == spec::ZIP64_BYTES_THR {
            directory_offset = zip64.central_directory_offset;
        }
        directory_end = zip64_position;
        is_zip64 = true;
    }

    // Some zip files have data prepended to them, resulting in the offsets all being too
    // small. The error is the gap between where the directory ends and where the end record
    // actually is.
    let Some(mut archive_offset) = directory_end
        .checked_sub(directory_size)
        .and_then(|x| x.checked_sub(directory_offset))
    else {
        return Err(ZipError::DirectoryTooLarge(
            format!(
                "directory of {directory_size} bytes at offset {directory_offset} does not fit \
                 before the end record at {directory_end}"
            )
            .into(),
        ));
    };

    if archive_offset > 0 {
        // Only believe the offset if a directory record is where it says; some writers leave
        // a gap between the directory and the end record.
        let start = (directory_offset + archive_offset) as usize;
        let expected = spec::CENTRAL_DIRECTORY_HEADER_SIGNATURE.to_le_bytes();
        if number_of_files > 0 && buffer.get(start..start + 4) == Some(&expected[..]) {
            warn!("archive has {archive_offset} bytes of data prepended");
        } else {
            archive_offset = 0;
        }
    }

    let minimum_size = number_of_files.saturating_mul(ZipCentralEntryBlock::SIZE as u64);
    if minimum_size > directory_size {
        return Err(ZipError::DirectoryTooLarge(
            format!("{number_of_files} entries cannot fit in a directory of {directory_size} bytes")
                .into(),
        ));
    }
    let Ok(number_of_files) = usize::try_from(number_of_files) else {
        return Err(ZipError::DirectoryTooLarge(
            format!("{number_of_files} entries").into(),
        ));
    };

    Ok(CentralDirectoryInfo {
        archive_offset,
        directory_start: directory_offset + archive_offset,
        directory_size,
        number_of_files,
        eocd_position,
        is_zip64,
        comment: footer.zip_file_comment,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn eocd(files: u16, size: u32, offset: u32, comment: &[u8]) -> Vec<u8> {
        Zip32CentralDirectoryEnd {
            number_of_files_on_this_disk: files,
            number_of_files: files,
            central_directory_size: size,
            central_directory_offset: offset,
            zip_file_comment: comment.into(),
            ..Default::default()
        }
        .encode()
        .unwrap()
    }

    #[test]
    fn empty_archive() {
        let buffer = eocd(0, 0, 0, b"");
        let info = locate(&buffer).unwrap();
        assert_eq!(info.number_of_files, 0);
        assert_eq!(info.directory_start, 0);
        assert_eq!(info.eocd_position, 0);
        assert!(!info.is_zip64);
    }

    #[test]
    fn comment_containing_signature() {
        let mut comment = b"see ".to_vec();
        comment.extend(spec::CENTRAL_DIRECTORY_END_SIGNATURE.to_le_bytes());
        comment.extend([0u8; 18]);
        comment.extend(b" for details");
        let buffer = eocd(0, 0, 0, &comment);
        let info = locate(&buffer).unwrap();
        assert_eq!(info.eocd_position, 0);
        assert_eq!(&*info.comment, &comment[..]);
    }

    #[test]
    fn long_comment_needs_the_wide_search() {
        let comment = vec![b'z'; 5000];
        let mut buffer = vec![0u8; 100];
        buffer.extend(eocd(0, 0, 100, &comment));
        let info = locate(&buffer).unwrap();
        assert_eq!(info.eocd_position, 100);
        assert_eq!(info.comment.len(), 5000);
    }

    #[test]
    fn not_a_zip() {
        assert!(matches!(locate(b""), Err(ZipError::NotAZipArchive)));
        assert!(matches!(
            locate(&[0u8; 4096]),
            Err(ZipError::NotAZipArchive)
        ));
        // The comment length runs past the end of the buffer.
        let mut buffer = eocd(0, 0, 0, b"abc");
        buffer.pop();
        assert!(matches!(locate(&buffer), Err(ZipError::NotAZipArchive)));
    }

    #[test]
    fn hostile_entry_count() {
        let buffer = eocd(u16::MAX - 1, 0, 0, b"");
        assert!(matches!(
            locate(&buffer),
            Err(ZipError::DirectoryTooLarge(_))
        ));
    }

    #[test]
    fn directory_past_end_record() {
        let buffer = eocd(1, 46, 10, b"");
        assert!(matches!(
            locate(&buffer),
            Err(ZipError::DirectoryTooLarge(_))
        ));
    }

    #[test]
    fn zip64_records_replace_sentinels() {
        let mut buffer = vec![0u8; 8];
        let zip64_position = buffer.len() as u64;
        buffer.extend(
            Zip64CentralDirectoryEnd {
                record_size: Zip64CentralDirectoryEnd::MINIMUM_RECORD_SIZE,
                version_made_by: 45,
                version_needed_to_extract: 45,
                number_of_files_on_this_disk: 0,
                number_of_files: 0,
                central_directory_size: 0,
                central_directory_offset: 8,
                ..Default::default()
            }
            .encode(),
        );
        buffer.extend(
            Zip64CentralDirectoryEndLocator {
                disk_with_central_directory: 0,
                end_of_central_directory_offset: zip64_position,
                number_of_disks: 1,
            }
            .encode(),
        );
        buffer.extend(eocd(0, 0, u32::MAX, b""));

        let info = locate(&buffer).unwrap();
        assert!(info.is_zip64);
        assert_eq!(info.directory_start, 8);
        assert_eq!(info.archive_offset, 0);
    }
}
