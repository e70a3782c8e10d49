//! Entries, their timestamps and the host systems that wrote them.

use std::fmt;
use std::sync::{Arc, OnceLock};

#[cfg(feature = "time")]
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, error::ComponentRange};
use zeroize::Zeroizing;

use crate::compression::{CodecRegistry, CompressionMethod};
use crate::cp437::{NameCodec, encode_text};
use crate::crc32;
use crate::result::{DateTimeRangeError, ZipError, ZipResult, invalid};
use crate::spec::{FixedSizeBlock, ZipLocalEntryBlock};
use crate::zipcrypto::{self, ZipCryptoValidator};

pub(crate) mod ffi {
    pub const S_IFDIR: u32 = 0o0040000;
    pub const S_IFREG: u32 = 0o0100000;
}

/// General purpose flag bit 0: the entry is encrypted.
pub(crate) const FLAG_ENCRYPTED: u16 = 1 << 0;
/// General purpose flag bit 3: CRC and sizes follow the data in a data descriptor.
pub(crate) const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;
/// General purpose flag bit 11: name and comment are UTF-8.
pub(crate) const FLAG_UTF8: u16 = 1 << 11;

/// Version of the format this crate writes by default.
pub(crate) const DEFAULT_VERSION: u8 = 20;
/// Version needed to extract entries that carry Zip64 information.
pub(crate) const ZIP64_VERSION: u8 = 45;

/// Host system recorded in the high byte of "version made by".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum System {
    Dos,
    Unix,
    Unknown(u8),
}

impl From<u8> for System {
    fn from(value: u8) -> Self {
        match value {
            0 => System::Dos,
            3 => System::Unix,
            other => System::Unknown(other),
        }
    }
}

impl From<System> for u8 {
    fn from(system: System) -> u8 {
        match system {
            System::Dos => 0,
            System::Unix => 3,
            System::Unknown(other) => other,
        }
    }
}

/// A DOS timestamp, as stored in local and central headers.
///
/// Fields are kept as given, so a value read from a damaged archive may not be a valid date.
/// Seconds are stored with a two-second resolution, and there is no time zone: treat the
/// value as local time of whoever wrote the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl Default for DateTime {
    /// 1980-01-01 00:00:00, the earliest DOS timestamp.
    fn default() -> DateTime {
        DateTime {
            year: 1980,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl DateTime {
    /// Timestamp for a newly added entry: the current UTC time when the `time` feature is
    /// enabled, 1980-01-01 otherwise.
    pub fn default_for_write() -> Self {
        #[cfg(feature = "time")]
        {
            OffsetDateTime::now_utc().try_into().unwrap_or_default()
        }
        #[cfg(not(feature = "time"))]
        {
            DateTime::default()
        }
    }

    /// Split the packed DOS date and time words into their fields.
    ///
    /// Layout, high bit first: date is `yyyyyyy mmmm ddddd` (years since 1980), time is
    /// `hhhhh mmmmmm sssss` (seconds halved).
    pub const fn from_msdos(datepart: u16, timepart: u16) -> DateTime {
        DateTime {
            year: (datepart >> 9) + 1980,
            month: ((datepart >> 5) & 0x0f) as u8,
            day: (datepart & 0x1f) as u8,
            hour: (timepart >> 11) as u8,
            minute: ((timepart >> 5) & 0x3f) as u8,
            second: ((timepart & 0x1f) << 1) as u8,
        }
    }

    /// Build a timestamp from its fields.
    ///
    /// Accepts years 1980 to 2107, months 1 to 12, days 1 to 31, hours 0 to 23, minutes 0 to
    /// 59 and seconds 0 to 60 (leap second). An odd second is kept in memory but rounded down
    /// when written.
    pub fn from_date_and_time(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<DateTime, DateTimeRangeError> {
        let in_range = (1980..=2107).contains(&year)
            && (1..=12).contains(&month)
            && (1..=31).contains(&day)
            && hour <= 23
            && minute <= 59
            && second <= 60;
        if !in_range {
            return Err(DateTimeRangeError);
        }
        Ok(DateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// The packed DOS time word.
    pub const fn timepart(&self) -> u16 {
        ((self.hour as u16) << 11) | ((self.minute as u16) << 5) | ((self.second as u16) >> 1)
    }

    /// The packed DOS date word.
    pub const fn datepart(&self) -> u16 {
        ((self.year - 1980) << 9) | ((self.month as u16) << 5) | (self.day as u16)
    }

    /// This timestamp as a UTC `OffsetDateTime`; fails if the fields are not a real date.
    #[cfg(feature = "time")]
    pub fn to_time(&self) -> Result<OffsetDateTime, ComponentRange> {
        let date =
            Date::from_calendar_date(self.year as i32, Month::try_from(self.month)?, self.day)?;
        let time = Time::from_hms(self.hour, self.minute, self.second)?;
        Ok(PrimitiveDateTime::new(date, time).assume_utc())
    }

    pub const fn year(&self) -> u16 {
        self.year
    }

    /// 1 is January. Not validated for timestamps read from an archive.
    pub const fn month(&self) -> u8 {
        self.month
    }

    pub const fn day(&self) -> u8 {
        self.day
    }

    pub const fn hour(&self) -> u8 {
        self.hour
    }

    pub const fn minute(&self) -> u8 {
        self.minute
    }

    pub const fn second(&self) -> u8 {
        self.second
    }
}

#[cfg(feature = "time")]
impl TryFrom<OffsetDateTime> for DateTime {
    type Error = DateTimeRangeError;

    fn try_from(dt: OffsetDateTime) -> Result<Self, Self::Error> {
        let year = u16::try_from(dt.year())?;
        DateTime::from_date_and_time(
            year,
            dt.month().into(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )
    }
}

/// Where an entry's bytes come from.
#[derive(Clone)]
pub(crate) enum EntryData {
    /// Still inside the archive buffer the entry was read from, compressed (and possibly
    /// encrypted) at `header_start`.
    Archived(Arc<[u8]>),
    /// Uncompressed content supplied by the caller.
    Pending(Arc<[u8]>),
}

/// One member of a [`ZipArchive`](crate::ZipArchive).
///
/// The metadata mirrors the central directory record. The content is decoded on first access
/// and then kept until it is replaced.
#[derive(Clone)]
pub struct ZipEntry {
    pub(crate) name: Box<str>,
    pub(crate) raw_name: Box<[u8]>,
    pub(crate) comment: Box<str>,
    pub(crate) raw_comment: Box<[u8]>,
    /// Extra field blocks other than Zip64, which is regenerated on write.
    pub(crate) extra_field: Box<[u8]>,
    /// Method used on the next write.
    pub(crate) compression_method: CompressionMethod,
    /// Method the archived data was compressed with.
    pub(crate) stored_method: CompressionMethod,
    pub(crate) compression_level: Option<i64>,
    pub(crate) last_modified_time: DateTime,
    pub(crate) crc32: u32,
    pub(crate) compressed_size: u64,
    pub(crate) uncompressed_size: u64,
    pub(crate) flags: u16,
    pub(crate) version_made_by: u16,
    pub(crate) version_needed: u16,
    pub(crate) internal_attributes: u16,
    pub(crate) external_attributes: u32,
    /// Offset of the local header in the source buffer.
    pub(crate) header_start: u64,
    pub(crate) data: EntryData,
    /// Set when the stored bytes no longer match the content and must be rebuilt on write.
    pub(crate) modified: bool,
    pub(crate) password: Option<Zeroizing<Box<[u8]>>>,
    pub(crate) legacy_two_byte_check: bool,
    cache: OnceLock<Arc<[u8]>>,
}

impl fmt::Debug for ZipEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipEntry")
            .field("name", &self.name)
            .field("compression_method", &self.compression_method)
            .field("crc32", &format_args!("{:#010x}", self.crc32))
            .field("compressed_size", &self.compressed_size)
            .field("uncompressed_size", &self.uncompressed_size)
            .field("flags", &format_args!("{:#06x}", self.flags))
            .field("header_start", &self.header_start)
            .field("modified", &self.modified)
            .field("cached", &self.is_cached())
            .finish_non_exhaustive()
    }
}

impl ZipEntry {
    /// An entry decoded from a central directory record whose data lives in `buffer`.
    pub(crate) fn archived(
        name: Box<str>,
        raw_name: Box<[u8]>,
        comment: Box<str>,
        raw_comment: Box<[u8]>,
        buffer: Arc<[u8]>,
    ) -> Self {
        Self {
            name,
            raw_name,
            comment,
            raw_comment,
            extra_field: Box::default(),
            compression_method: CompressionMethod::STORE,
            stored_method: CompressionMethod::STORE,
            compression_level: None,
            last_modified_time: DateTime::default(),
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            flags: 0,
            version_made_by: 0,
            version_needed: DEFAULT_VERSION as u16,
            internal_attributes: 0,
            external_attributes: 0,
            header_start: 0,
            data: EntryData::Archived(buffer),
            modified: false,
            password: None,
            legacy_two_byte_check: false,
            cache: OnceLock::new(),
        }
    }

    /// A new entry with caller-supplied content, encoded with `codec` when needed.
    pub(crate) fn new(
        name: &str,
        contents: Arc<[u8]>,
        method: CompressionMethod,
        codec: &dyn NameCodec,
    ) -> Self {
        let mut entry = Self::archived(
            name.into(),
            Box::default(),
            Box::default(),
            Box::default(),
            Arc::clone(&contents),
        );
        entry.version_made_by = (u16::from(u8::from(System::Unix)) << 8) | DEFAULT_VERSION as u16;
        entry.last_modified_time = DateTime::default_for_write();
        entry.compression_method = method;
        entry.external_attributes = if entry.is_dir() {
            (ffi::S_IFDIR | 0o755) << 16
        } else {
            (ffi::S_IFREG | 0o644) << 16
        };
        entry.encode_text(codec);
        entry.set_contents(contents);
        entry
    }

    /// Re-encode the name and comment. Both use UTF-8 with the flag set if either needs it.
    pub(crate) fn encode_text(&mut self, codec: &dyn NameCodec) {
        let (name, name_utf8) = encode_text(codec, &self.name);
        let (comment, comment_utf8) = encode_text(codec, &self.comment);
        if name_utf8 || comment_utf8 {
            self.raw_name = self.name.as_bytes().into();
            self.raw_comment = self.comment.as_bytes().into();
            self.flags |= FLAG_UTF8;
        } else {
            self.raw_name = name.into();
            self.raw_comment = comment.into();
            self.flags &= !FLAG_UTF8;
        }
    }

    /// Name of the entry, `/`-separated; directories end with `/`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name bytes as stored in the archive.
    pub fn name_raw(&self) -> &[u8] {
        &self.raw_name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// Whether CRC and sizes follow the data in a data descriptor.
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }

    /// General purpose bit flags
    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn compression(&self) -> CompressionMethod {
        self.compression_method
    }

    /// Change the compression method. The content is recompressed on the next write.
    pub fn set_compression(&mut self, method: CompressionMethod, level: Option<i64>) {
        self.compression_method = method;
        self.compression_level = level;
        self.modified = true;
    }

    pub fn last_modified(&self) -> DateTime {
        self.last_modified_time
    }

    pub fn set_last_modified(&mut self, time: DateTime) {
        self.last_modified_time = time;
    }

    /// CRC-32 of the uncompressed content
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Size of the stored data, including the ZipCrypto header of encrypted entries
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Size of the content when extracted
    pub fn size(&self) -> u64 {
        self.uncompressed_size
    }

    pub fn extra_data(&self) -> &[u8] {
        &self.extra_field
    }

    /// Offset of the local header within the buffer the entry was read from
    pub fn header_start(&self) -> u64 {
        self.header_start
    }

    pub fn system(&self) -> System {
        System::from((self.version_made_by >> 8) as u8)
    }

    pub fn version_made_by(&self) -> u16 {
        self.version_made_by
    }

    pub fn external_attributes(&self) -> u32 {
        self.external_attributes
    }

    /// Get unix mode for the file
    pub fn unix_mode(&self) -> Option<u32> {
        if self.external_attributes == 0 {
            return None;
        }

        match self.system() {
            System::Unix => Some(self.external_attributes >> 16),
            System::Dos => {
                // Interpret MS-DOS directory bit
                let mut mode = if 0x10 == (self.external_attributes & 0x10) {
                    ffi::S_IFDIR | 0o0775
                } else {
                    ffi::S_IFREG | 0o0664
                };
                if 0x01 == (self.external_attributes & 0x01) {
                    // Read-only bit; strip write permissions
                    mode &= !0o0222;
                }
                Some(mode)
            }
            System::Unknown(_) => None,
        }
    }

    /// Set the permission bits, marking the entry as made on Unix.
    pub fn set_unix_mode(&mut self, mode: u32) {
        let file_type = if self.is_dir() {
            ffi::S_IFDIR
        } else {
            ffi::S_IFREG
        };
        self.external_attributes = ((file_type | (mode & 0o7777)) << 16)
            | (self.external_attributes & 0xffff);
        self.version_made_by = (u16::from(u8::from(System::Unix)) << 8) | (self.version_made_by & 0xff);
    }

    /// Encrypt this entry with ZipCrypto on the next write, or store it unencrypted with
    /// `None`.
    ///
    /// For an entry read from an encrypted archive, the content must be readable (either
    /// already read, or decryptable with the new password) when the archive is written.
    pub fn set_password(&mut self, password: Option<&[u8]>) {
        self.password = password.map(|p| Zeroizing::new(p.into()));
        self.modified = true;
    }

    /// Also store the second CRC byte in the encryption header, as PKZIP before 2.04g did.
    pub fn set_legacy_two_byte_check(&mut self, legacy: bool) {
        self.legacy_two_byte_check = legacy;
    }

    /// Replace the content. The cached content is dropped and the entry is rebuilt on write.
    pub(crate) fn set_contents(&mut self, contents: Arc<[u8]>) {
        self.crc32 = crc32::crc32(&contents);
        self.uncompressed_size = contents.len() as u64;
        self.data = EntryData::Pending(contents);
        self.cache = OnceLock::new();
        self.modified = true;
    }

    pub(crate) fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }

    /// The local header and the stored bytes of an archived entry.
    ///
    /// The local header is authoritative for where the data starts, as its name and extra
    /// field lengths may differ from the central directory's.
    pub(crate) fn stored_data<'a>(
        &self,
        buffer: &'a [u8],
    ) -> ZipResult<(ZipLocalEntryBlock, &'a [u8])> {
        let Ok(start) = usize::try_from(self.header_start) else {
            invalid!("local header offset {} is out of range", self.header_start);
        };
        let Some(header) = buffer.get(start..) else {
            invalid!("local header of {} is past the end of the archive", self.name);
        };
        let block = ZipLocalEntryBlock::decode(header)?;
        let data_start = self.header_start + block.header_size();
        let Some(data_end) = data_start.checked_add(self.compressed_size) else {
            invalid!("data of {} overflows the archive", self.name);
        };
        if data_end > buffer.len() as u64 {
            invalid!("data of {} extends past the end of the archive", self.name);
        }
        Ok((block, &buffer[data_start as usize..data_end as usize]))
    }

    /// The uncompressed content, decoded on first use.
    ///
    /// Once a read succeeds the result is cached and returned for later calls, whatever
    /// password they pass.
    pub(crate) fn contents(
        &self,
        codecs: &CodecRegistry,
        password: Option<&[u8]>,
    ) -> ZipResult<Arc<[u8]>> {
        if let Some(cached) = self.cache.get() {
            return Ok(Arc::clone(cached));
        }
        let contents: Arc<[u8]> = match &self.data {
            EntryData::Pending(contents) => Arc::clone(contents),
            EntryData::Archived(buffer) => self.decode(buffer, codecs, password)?.into(),
        };
        Ok(Arc::clone(self.cache.get_or_init(|| contents)))
    }

    fn decode(
        &self,
        buffer: &[u8],
        codecs: &CodecRegistry,
        password: Option<&[u8]>,
    ) -> ZipResult<Vec<u8>> {
        let (local, stored) = self.stored_data(buffer)?;
        let decrypted;
        let compressed = if self.is_encrypted() {
            let password = password.ok_or_else(|| ZipError::PasswordRequired(self.name.clone()))?;
            let validator = if self.has_data_descriptor() {
                ZipCryptoValidator::InfoZipMsdosTime(local.last_mod_time)
            } else {
                ZipCryptoValidator::PkzipCrc32(self.crc32)
            };
            decrypted = Zeroizing::new(zipcrypto::decrypt(&self.name, stored, validator, password)?);
            &decrypted[..]
        } else {
            stored
        };
        let contents = codecs
            .get(self.stored_method)?
            .decompress(compressed, self.uncompressed_size)?;
        crc32::verify(&self.name, &contents, self.crc32)?;
        Ok(contents)
    }
}
