//! Fixed-layout ZIP records and their little-endian wire encoding.
//!
//! Every record starts with a four-byte magic. Decoding checks the magic before looking at any
//! other field, and encoding writes the fixed block at its documented offsets followed by the
//! variable-length parts verbatim.

use crate::result::{ZipError, ZipResult, invalid};

pub type Magic = u32;

pub const LOCAL_FILE_HEADER_SIGNATURE: Magic = 0x04034b50;
pub const CENTRAL_DIRECTORY_HEADER_SIGNATURE: Magic = 0x02014b50;
pub const CENTRAL_DIRECTORY_END_SIGNATURE: Magic = 0x06054b50;
pub const ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE: Magic = 0x06064b50;
pub const ZIP64_CENTRAL_DIRECTORY_END_LOCATOR_SIGNATURE: Magic = 0x07064b50;
pub const DATA_DESCRIPTOR_SIGNATURE: Magic = 0x08074b50;

/// Sentinel stored in 32-bit size and offset fields whose real value lives in a Zip64 record.
pub const ZIP64_BYTES_THR: u64 = u32::MAX as u64;
/// Sentinel stored in 16-bit entry counts whose real value lives in the Zip64 end record.
pub const ZIP64_ENTRY_THR: usize = u16::MAX as usize;

#[inline]
fn le_u16(block: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([block[at], block[at + 1]])
}

#[inline]
fn le_u32(block: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([block[at], block[at + 1], block[at + 2], block[at + 3]])
}

#[inline]
fn le_u64(block: &[u8], at: usize) -> u64 {
    let mut out = [0u8; 8];
    out.copy_from_slice(&block[at..at + 8]);
    u64::from_le_bytes(out)
}

pub(crate) fn variable_length(len: usize, what: &'static str) -> ZipResult<u16> {
    u16::try_from(len).map_err(|_| {
        ZipError::InvalidArchive(format!("{what} is longer than {} bytes", u16::MAX).into())
    })
}

/// A record with a constant-size block that begins with a magic signature.
pub trait FixedSizeBlock: Sized {
    const MAGIC: Magic;
    /// Size of the block in bytes, magic included.
    const SIZE: usize;
    /// Human-readable record name used in error messages.
    const NAME: &'static str;

    /// Read the fields following the magic. `block` is exactly [`Self::SIZE`] bytes long.
    fn decode_fields(block: &[u8]) -> Self;

    /// Append the fields following the magic.
    fn encode_fields(&self, out: &mut Vec<u8>);

    fn decode(bytes: &[u8]) -> ZipResult<Self> {
        if bytes.len() < 4 {
            invalid!("{} is truncated", Self::NAME);
        }
        let found = le_u32(bytes, 0);
        if found != Self::MAGIC {
            return Err(ZipError::InvalidSignature {
                record: Self::NAME,
                expected: Self::MAGIC,
                found,
            });
        }
        if bytes.len() < Self::SIZE {
            invalid!("{} is truncated", Self::NAME);
        }
        Ok(Self::decode_fields(&bytes[..Self::SIZE]))
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend(Self::MAGIC.to_le_bytes());
        self.encode_fields(&mut out);
        debug_assert_eq!(out.len(), Self::SIZE);
        out
    }
}

/// The 30-byte block at the start of every local file header.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ZipLocalEntryBlock {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl FixedSizeBlock for ZipLocalEntryBlock {
    const MAGIC: Magic = LOCAL_FILE_HEADER_SIGNATURE;
    const SIZE: usize = 30;
    const NAME: &'static str = "local file header";

    fn decode_fields(block: &[u8]) -> Self {
        Self {
            version_needed: le_u16(block, 4),
            flags: le_u16(block, 6),
            compression_method: le_u16(block, 8),
            last_mod_time: le_u16(block, 10),
            last_mod_date: le_u16(block, 12),
            crc32: le_u32(block, 14),
            compressed_size: le_u32(block, 18),
            uncompressed_size: le_u32(block, 22),
            file_name_length: le_u16(block, 26),
            extra_field_length: le_u16(block, 28),
        }
    }

    fn encode_fields(&self, out: &mut Vec<u8>) {
        out.extend(self.version_needed.to_le_bytes());
        out.extend(self.flags.to_le_bytes());
        out.extend(self.compression_method.to_le_bytes());
        out.extend(self.last_mod_time.to_le_bytes());
        out.extend(self.last_mod_date.to_le_bytes());
        out.extend(self.crc32.to_le_bytes());
        out.extend(self.compressed_size.to_le_bytes());
        out.extend(self.uncompressed_size.to_le_bytes());
        out.extend(self.file_name_length.to_le_bytes());
        out.extend(self.extra_field_length.to_le_bytes());
    }
}

impl ZipLocalEntryBlock {
    /// Offset of the entry data relative to the start of this header.
    pub fn header_size(&self) -> u64 {
        // Each length must be widened before adding, as the sum may overflow a u16.
        Self::SIZE as u64 + self.file_name_length as u64 + self.extra_field_length as u64
    }
}

/// A complete local file header: the fixed block plus file name and extra field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZipLocalEntry {
    pub block: ZipLocalEntryBlock,
    pub file_name: Box<[u8]>,
    pub extra_field: Box<[u8]>,
}

impl ZipLocalEntry {
    pub fn decode(bytes: &[u8]) -> ZipResult<Self> {
        let block = ZipLocalEntryBlock::decode(bytes)?;
        let end = usize::try_from(block.header_size())
            .map_err(|_| ZipError::InvalidArchive("local header too large".into()))?;
        if bytes.len() < end {
            invalid!("local file header fields extend past the end of the archive");
        }
        let name_end = ZipLocalEntryBlock::SIZE + block.file_name_length as usize;
        Ok(Self {
            block,
            file_name: bytes[ZipLocalEntryBlock::SIZE..name_end].into(),
            extra_field: bytes[name_end..end].into(),
        })
    }

    /// Encode the header, deriving the length fields from the variable parts.
    pub fn encode(&self) -> ZipResult<Vec<u8>> {
        let block = ZipLocalEntryBlock {
            file_name_length: variable_length(self.file_name.len(), "file name")?,
            extra_field_length: variable_length(self.extra_field.len(), "extra field")?,
            ..self.block
        };
        let mut out = block.encode();
        out.extend_from_slice(&self.file_name);
        out.extend_from_slice(&self.extra_field);
        Ok(out)
    }
}

/// The 46-byte block at the start of every central directory header.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ZipCentralEntryBlock {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    pub file_comment_length: u16,
    pub disk_number: u16,
    pub internal_file_attributes: u16,
    pub external_file_attributes: u32,
    pub offset: u32,
}

impl FixedSizeBlock for ZipCentralEntryBlock {
    const MAGIC: Magic = CENTRAL_DIRECTORY_HEADER_SIGNATURE;
    const SIZE: usize = 46;
    const NAME: &'static str = "central directory header";

    fn decode_fields(block: &[u8]) -> Self {
        Self {
            version_made_by: le_u16(block, 4),
            version_needed: le_u16(block, 6),
            flags: le_u16(block, 8),
            compression_method: le_u16(block, 10),
            last_mod_time: le_u16(block, 12),
            last_mod_date: le_u16(block, 14),
            crc32: le_u32(block, 16),
            compressed_size: le_u32(block, 20),
            uncompressed_size: le_u32(block, 24),
            file_name_length: le_u16(block, 28),
            extra_field_length: le_u16(block, 30),
            file_comment_length: le_u16(block, 32),
            disk_number: le_u16(block, 34),
            internal_file_attributes: le_u16(block, 36),
            external_file_attributes: le_u32(block, 38),
            offset: le_u32(block, 42),
        }
    }

    fn encode_fields(&self, out: &mut Vec<u8>) {
        out.extend(self.version_made_by.to_le_bytes());
        out.extend(self.version_needed.to_le_bytes());
        out.extend(self.flags.to_le_bytes());
        out.extend(self.compression_method.to_le_bytes());
        out.extend(self.last_mod_time.to_le_bytes());
        out.extend(self.last_mod_date.to_le_bytes());
        out.extend(self.crc32.to_le_bytes());
        out.extend(self.compressed_size.to_le_bytes());
        out.extend(self.uncompressed_size.to_le_bytes());
        out.extend(self.file_name_length.to_le_bytes());
        out.extend(self.extra_field_length.to_le_bytes());
        out.extend(self.file_comment_length.to_le_bytes());
        out.extend(self.disk_number.to_le_bytes());
        out.extend(self.internal_file_attributes.to_le_bytes());
        out.extend(self.external_file_attributes.to_le_bytes());
        out.extend(self.offset.to_le_bytes());
    }
}

impl ZipCentralEntryBlock {
    /// Total size of the record this block introduces: fixed block, name, extra and comment.
    pub fn entry_header_size(&self) -> usize {
        Self::SIZE
            + self.file_name_length as usize
            + self.extra_field_length as usize
            + self.file_comment_length as usize
    }
}

/// A complete central directory record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CentralDirectoryRecord {
    pub block: ZipCentralEntryBlock,
    pub file_name: Box<[u8]>,
    pub extra_field: Box<[u8]>,
    pub file_comment: Box<[u8]>,
}

impl CentralDirectoryRecord {
    /// Decode a record from exactly `block.entry_header_size()` bytes.
    pub fn decode(record: &[u8]) -> ZipResult<Self> {
        let block = ZipCentralEntryBlock::decode(record)?;
        let size = block.entry_header_size();
        if record.len() != size {
            invalid!(
                "central directory record is {} bytes but its header declares {}",
                record.len(),
                size
            );
        }
        let name_end = ZipCentralEntryBlock::SIZE + block.file_name_length as usize;
        let extra_end = name_end + block.extra_field_length as usize;
        Ok(Self {
            block,
            file_name: record[ZipCentralEntryBlock::SIZE..name_end].into(),
            extra_field: record[name_end..extra_end].into(),
            file_comment: record[extra_end..].into(),
        })
    }

    /// Encode the record, deriving the length fields from the variable parts.
    pub fn encode(&self) -> ZipResult<Vec<u8>> {
        let block = ZipCentralEntryBlock {
            file_name_length: variable_length(self.file_name.len(), "file name")?,
            extra_field_length: variable_length(self.extra_field.len(), "extra field")?,
            file_comment_length: variable_length(self.file_comment.len(), "file comment")?,
            ..self.block
        };
        let mut out = Vec::with_capacity(block.entry_header_size());
        out.extend(block.encode());
        out.extend_from_slice(&self.file_name);
        out.extend_from_slice(&self.extra_field);
        out.extend_from_slice(&self.file_comment);
        Ok(out)
    }
}

/// The 22-byte end of central directory record, without its comment.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Zip32CDEBlock {
    pub disk_number: u16,
    pub disk_with_central_directory: u16,
    pub number_of_files_on_this_disk: u16,
    pub number_of_files: u16,
    pub central_directory_size: u32,
    pub central_directory_offset: u32,
    pub zip_file_comment_length: u16,
}

impl FixedSizeBlock for Zip32CDEBlock {
    const MAGIC: Magic = CENTRAL_DIRECTORY_END_SIGNATURE;
    const SIZE: usize = 22;
    const NAME: &'static str = "end of central directory record";

    fn decode_fields(block: &[u8]) -> Self {
        Self {
            disk_number: le_u16(block, 4),
            disk_with_central_directory: le_u16(block, 6),
            number_of_files_on_this_disk: le_u16(block, 8),
            number_of_files: le_u16(block, 10),
            central_directory_size: le_u32(block, 12),
            central_directory_offset: le_u32(block, 16),
            zip_file_comment_length: le_u16(block, 20),
        }
    }

    fn encode_fields(&self, out: &mut Vec<u8>) {
        out.extend(self.disk_number.to_le_bytes());
        out.extend(self.disk_with_central_directory.to_le_bytes());
        out.extend(self.number_of_files_on_this_disk.to_le_bytes());
        out.extend(self.number_of_files.to_le_bytes());
        out.extend(self.central_directory_size.to_le_bytes());
        out.extend(self.central_directory_offset.to_le_bytes());
        out.extend(self.zip_file_comment_length.to_le_bytes());
    }
}

/// End of central directory record with its trailing archive comment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Zip32CentralDirectoryEnd {
    pub disk_number: u16,
    pub disk_with_central_directory: u16,
    pub number_of_files_on_this_disk: u16,
    pub number_of_files: u16,
    pub central_directory_size: u32,
    pub central_directory_offset: u32,
    pub zip_file_comment: Box<[u8]>,
}

impl Zip32CentralDirectoryEnd {
    /// Decode the record and the comment that follows it.
    pub fn decode(bytes: &[u8]) -> ZipResult<Self> {
        let block = Zip32CDEBlock::decode(bytes)?;
        let end = Zip32CDEBlock::SIZE + block.zip_file_comment_length as usize;
        if bytes.len() < end {
            invalid!("archive comment extends past the end of the archive");
        }
        Ok(Self {
            disk_number: block.disk_number,
            disk_with_central_directory: block.disk_with_central_directory,
            number_of_files_on_this_disk: block.number_of_files_on_this_disk,
            number_of_files: block.number_of_files,
            central_directory_size: block.central_directory_size,
            central_directory_offset: block.central_directory_offset,
            zip_file_comment: bytes[Zip32CDEBlock::SIZE..end].into(),
        })
    }

    pub fn encode(&self) -> ZipResult<Vec<u8>> {
        let block = Zip32CDEBlock {
            disk_number: self.disk_number,
            disk_with_central_directory: self.disk_with_central_directory,
            number_of_files_on_this_disk: self.number_of_files_on_this_disk,
            number_of_files: self.number_of_files,
            central_directory_size: self.central_directory_size,
            central_directory_offset: self.central_directory_offset,
            zip_file_comment_length: variable_length(self.zip_file_comment.len(), "archive comment")?,
        };
        let mut out = block.encode();
        out.extend_from_slice(&self.zip_file_comment);
        Ok(out)
    }
}

/// The 20-byte record that points at the Zip64 end of central directory record.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Zip64CentralDirectoryEndLocator {
    pub disk_with_central_directory: u32,
    pub end_of_central_directory_offset: u64,
    pub number_of_disks: u32,
}

impl FixedSizeBlock for Zip64CentralDirectoryEndLocator {
    const MAGIC: Magic = ZIP64_CENTRAL_DIRECTORY_END_LOCATOR_SIGNATURE;
    const SIZE: usize = 20;
    const NAME: &'static str = "zip64 end of central directory locator";

    fn decode_fields(block: &[u8]) -> Self {
        Self {
            disk_with_central_directory: le_u32(block, 4),
            end_of_central_directory_offset: le_u64(block, 8),
            number_of_disks: le_u32(block, 16),
        }
    }

    fn encode_fields(&self, out: &mut Vec<u8>) {
        out.extend(self.disk_with_central_directory.to_le_bytes());
        out.extend(self.end_of_central_directory_offset.to_le_bytes());
        out.extend(self.number_of_disks.to_le_bytes());
    }
}

/// The fixed 56-byte part of the Zip64 end of central directory record.
///
/// The extensible data sector that may follow is neither read nor written.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Zip64CentralDirectoryEnd {
    pub record_size: u64,
    pub version_made_by: u16,
    pub version_needed_to_extract: u16,
    pub disk_number: u32,
    pub disk_with_central_directory: u32,
    pub number_of_files_on_this_disk: u64,
    pub number_of_files: u64,
    pub central_directory_size: u64,
    pub central_directory_offset: u64,
}

impl Zip64CentralDirectoryEnd {
    /// Value of `record_size` when there is no extensible data sector: the record size
    /// excludes the leading magic and the size field itself.
    pub const MINIMUM_RECORD_SIZE: u64 = 44;
}

impl FixedSizeBlock for Zip64CentralDirectoryEnd {
    const MAGIC: Magic = ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE;
    const SIZE: usize = 56;
    const NAME: &'static str = "zip64 end of central directory record";

    fn decode_fields(block: &[u8]) -> Self {
        Self {
            record_size: le_u64(block, 4),
            version_made_by: le_u16(block, 12),
            version_needed_to_extract: le_u16(block, 14),
            disk_number: le_u32(block, 16),
            disk_with_central_directory: le_u32(block, 20),
            number_of_files_on_this_disk: le_u64(block, 24),
            number_of_files: le_u64(block, 32),
            central_directory_size: le_u64(block, 40),
            central_directory_offset: le_u64(block, 48),
        }
    }

    fn encode_fields(&self, out: &mut Vec<u8>) {
        out.extend(self.record_size.to_le_bytes());
        out.extend(self.version_made_by.to_le_bytes());
        out.extend(self.version_needed_to_extract.to_le_bytes());
        out.extend(self.disk_number.to_le_bytes());
        out.extend(self.disk_with_central_directory.to_le_bytes());
        out.extend(self.number_of_files_on_this_disk.to_le_bytes());
        out.extend(self.number_of_files.to_le_bytes());
        out.extend(self.central_directory_size.to_le_bytes());
        out.extend(self.central_directory_offset.to_le_bytes());
    }
}

/// Data descriptor trailing the data of an entry that has general purpose flag bit 3 set.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ZipDataDescriptor {
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl FixedSizeBlock for ZipDataDescriptor {
    const MAGIC: Magic = DATA_DESCRIPTOR_SIGNATURE;
    const SIZE: usize = 16;
    const NAME: &'static str = "data descriptor";

    fn decode_fields(block: &[u8]) -> Self {
        Self {
            crc32: le_u32(block, 4),
            compressed_size: le_u32(block, 8),
            uncompressed_size: le_u32(block, 12),
        }
    }

    fn encode_fields(&self, out: &mut Vec<u8>) {
        out.extend(self.crc32.to_le_bytes());
        out.extend(self.compressed_size.to_le_bytes());
        out.extend(self.uncompressed_size.to_le_bytes());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_central_record() -> CentralDirectoryRecord {
        CentralDirectoryRecord {
            block: ZipCentralEntryBlock {
                version_made_by: 0x031e,
                version_needed: 20,
                flags: 1 << 11,
                compression_method: 8,
                last_mod_time: 0x6d2c,
                last_mod_date: 0x5a21,
                crc32: 0xcbf43926,
                compressed_size: 11,
                uncompressed_size: 9,
                file_name_length: 9,
                extra_field_length: 4,
                file_comment_length: 2,
                disk_number: 0,
                internal_file_attributes: 1,
                external_file_attributes: 0o100644 << 16,
                offset: 1234,
            },
            file_name: b"dir/a.txt".to_vec().into(),
            extra_field: vec![0xfe, 0xca, 0, 0].into(),
            file_comment: b"hi".to_vec().into(),
        }
    }

    #[test]
    fn central_record_round_trip() {
        let record = sample_central_record();
        let bytes = record.encode().unwrap();
        assert_eq!(bytes.len(), 46 + 9 + 4 + 2);
        assert_eq!(bytes.len(), record.block.entry_header_size());
        assert_eq!(&bytes[..4], &[0x50, 0x4b, 0x01, 0x02]);
        assert_eq!(CentralDirectoryRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn central_record_requires_exact_length() {
        let mut bytes = sample_central_record().encode().unwrap();
        bytes.push(0);
        assert!(matches!(
            CentralDirectoryRecord::decode(&bytes),
            Err(ZipError::InvalidArchive(_))
        ));
        bytes.truncate(bytes.len() - 2);
        assert!(CentralDirectoryRecord::decode(&bytes).is_err());
    }

    #[test]
    fn encode_derives_lengths() {
        let mut record = sample_central_record();
        record.block.file_name_length = 0;
        record.block.file_comment_length = 77;
        let bytes = record.encode().unwrap();
        let decoded = CentralDirectoryRecord::decode(&bytes).unwrap();
        assert_eq!(decoded.block.file_name_length, 9);
        assert_eq!(decoded.block.file_comment_length, 2);
    }

    #[test]
    fn local_header_round_trip() {
        let header = ZipLocalEntry {
            block: ZipLocalEntryBlock {
                version_needed: 20,
                flags: 0b1001,
                compression_method: 0,
                last_mod_time: 0xbf7d,
                last_mod_date: 0x2a41,
                crc32: 0xe8b7be43,
                compressed_size: 13,
                uncompressed_size: 1,
                file_name_length: 1,
                extra_field_length: 0,
            },
            file_name: b"a".to_vec().into(),
            extra_field: Box::new([]),
        };
        let mut bytes = header.encode().unwrap();
        assert_eq!(header.block.header_size(), 31);
        // Trailing data after the header is ignored.
        bytes.extend_from_slice(b"payload");
        assert_eq!(ZipLocalEntry::decode(&bytes).unwrap(), header);
    }

    #[test]
    fn end_records_round_trip() {
        let end = Zip32CentralDirectoryEnd {
            disk_number: 0,
            disk_with_central_directory: 0,
            number_of_files_on_this_disk: 3,
            number_of_files: 3,
            central_directory_size: 150,
            central_directory_offset: 4000,
            zip_file_comment: b"comment".to_vec().into(),
        };
        let bytes = end.encode().unwrap();
        assert_eq!(bytes.len(), 22 + 7);
        assert_eq!(Zip32CentralDirectoryEnd::decode(&bytes).unwrap(), end);

        let end64 = Zip64CentralDirectoryEnd {
            record_size: Zip64CentralDirectoryEnd::MINIMUM_RECORD_SIZE,
            version_made_by: 45,
            version_needed_to_extract: 45,
            disk_number: 0,
            disk_with_central_directory: 0,
            number_of_files_on_this_disk: 70_000,
            number_of_files: 70_000,
            central_directory_size: 1 << 33,
            central_directory_offset: 1 << 34,
        };
        assert_eq!(Zip64CentralDirectoryEnd::decode(&end64.encode()).unwrap(), end64);

        let locator = Zip64CentralDirectoryEndLocator {
            disk_with_central_directory: 0,
            end_of_central_directory_offset: (1 << 34) + (1 << 33),
            number_of_disks: 1,
        };
        let bytes = locator.encode();
        assert_eq!(bytes.len(), 20);
        assert_eq!(Zip64CentralDirectoryEndLocator::decode(&bytes).unwrap(), locator);

        let descriptor = ZipDataDescriptor {
            crc32: 1,
            compressed_size: 2,
            uncompressed_size: 3,
        };
        assert_eq!(ZipDataDescriptor::decode(&descriptor.encode()).unwrap(), descriptor);
    }

    #[test]
    fn signature_checked_first() {
        let bytes = Zip64CentralDirectoryEndLocator::default().encode();
        match ZipLocalEntryBlock::decode(&bytes) {
            Err(ZipError::InvalidSignature {
                expected, found, ..
            }) => {
                assert_eq!(expected, LOCAL_FILE_HEADER_SIGNATURE);
                assert_eq!(found, ZIP64_CENTRAL_DIRECTORY_END_LOCATOR_SIGNATURE);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        // A correct magic on a too-short buffer is a truncation, not a signature error.
        assert!(matches!(
            Zip32CDEBlock::decode(&CENTRAL_DIRECTORY_END_SIGNATURE.to_le_bytes()),
            Err(ZipError::InvalidArchive(_))
        ));
    }
}
